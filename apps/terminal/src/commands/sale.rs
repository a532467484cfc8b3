//! # Sale Commands
//!
//! Checkout details, payment, and the sales report.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  :customer 123.456.789-09 ──► PendingCheckout.customer                  │
//! │  :note entregar à tarde   ──► PendingCheckout.note                      │
//! │  :total 10                ──► PendingCheckout.discount_percent          │
//! │                                   │                                     │
//! │  :pay pix ────────────────────────┤                                     │
//! │                                   ▼                                     │
//! │              CheckoutRequest ──► SaleCommitter::commit                  │
//! │                                   │                                     │
//! │               ┌───────────────────┴──────────────────┐                  │
//! │           rejected                                committed             │
//! │     (cart, stock, ledger untouched)     receipt printed, pending reset  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Local;
use pdv_core::receipt::render_receipt;
use pdv_core::{
    CheckoutRequest, CollectionStore, CustomerInput, Money, PaymentMethod, SalesSummary,
};
use tracing::{debug, info, warn};

use crate::commands::SalesPeriod;
use crate::error::CommandError;
use crate::state::Session;

/// Attaches, registers, or clears the sale's customer.
///
/// - no argument: clear
/// - `id` or document: attach an existing customer
/// - `name;document[;phone[;email]]`: register (or update) and attach
pub async fn customer<S: CollectionStore>(
    session: &mut Session<S>,
    key: Option<String>,
) -> Result<String, CommandError> {
    let Some(key) = key else {
        session.pending_mut().customer = None;
        return Ok("Cliente removido".to_string());
    };

    let customers = session.committer().customers();
    let customer = if key.contains(';') {
        let fields: Vec<&str> = key.split(';').map(str::trim).collect();
        if fields.len() < 2 || fields.len() > 4 {
            return Err(CommandError::usage(
                "usage: :customer <name>;<document>[;<phone>[;<email>]]",
            ));
        }
        let mut input = CustomerInput::new(fields[0], fields[1]);
        if let Some(existing) = customers.get(fields[1]).await? {
            input.id = Some(existing.id);
        }
        input.phone = fields.get(2).filter(|p| !p.is_empty()).map(|p| p.to_string());
        input.email = fields.get(3).filter(|e| !e.is_empty()).map(|e| e.to_string());
        customers.upsert(input).await?
    } else {
        customers.require(&key).await?
    };

    debug!(customer_id = %customer.id, "Customer attached");
    let text = format!("Cliente: {} ({})", customer.name, customer.document);
    session.pending_mut().customer = Some(customer.id);
    Ok(text)
}

/// Sets or clears the sale note.
pub fn note<S: CollectionStore>(
    session: &mut Session<S>,
    text: Option<String>,
) -> Result<String, CommandError> {
    let reply = match &text {
        Some(text) => format!("Obs: {}", text),
        None => "Obs removida".to_string(),
    };
    session.pending_mut().note = text;
    Ok(reply)
}

/// Commits the cart and returns the receipt.
pub async fn pay<S: CollectionStore>(
    session: &mut Session<S>,
    method: PaymentMethod,
    discount_percent: Option<f64>,
) -> Result<String, CommandError> {
    let pending = session.pending().clone();
    let mut request = CheckoutRequest::new(method, session.config().cashier_name.clone())
        .with_discount(discount_percent.unwrap_or(pending.discount_percent));
    if let Some(customer) = pending.customer {
        request = request.with_customer(customer);
    }
    if let Some(note) = pending.note {
        request = request.with_note(note);
    }

    let (committer, cart) = session.checkout_parts();
    let sale = committer.commit(cart, request).await?;
    session.reset_pending();

    // The sale is already recorded; a failed lookup only drops the customer
    // block from the receipt.
    let customer = match &sale.customer_id {
        Some(id) => match session.committer().customers().get(id).await {
            Ok(customer) => customer,
            Err(e) => {
                warn!(receipt = %sale.receipt_number, error = %e, "Receipt printed without customer");
                None
            }
        },
        None => None,
    };
    let receipt = render_receipt(
        &sale,
        session.settings(),
        customer.as_ref(),
        session.config().receipt_width,
    );

    info!(
        receipt = %sale.receipt_number,
        total_cents = sale.total_cents,
        method = %sale.payment_method.as_str(),
        "Sale completed"
    );
    Ok(format!("{}\nVenda {} registrada", receipt, sale.receipt_number))
}

/// Summarizes the ledger for a period.
pub async fn summary<S: CollectionStore>(
    session: &Session<S>,
    period: SalesPeriod,
) -> Result<String, CommandError> {
    let (day, title) = match period {
        SalesPeriod::Today => {
            let today = Local::now().date_naive();
            (Some(today), format!("Vendas de {}", today.format("%d/%m/%Y")))
        }
        SalesPeriod::Day(day) => (Some(day), format!("Vendas de {}", day.format("%d/%m/%Y"))),
        SalesPeriod::All => (None, "Todas as vendas".to_string()),
    };
    let summary = session.committer().ledger().summary(day).await?;
    Ok(render_summary(&title, &summary, session))
}

fn render_summary<S: CollectionStore>(
    title: &str,
    summary: &SalesSummary,
    session: &Session<S>,
) -> String {
    let settings = session.settings();
    let mut out = vec![
        title.to_string(),
        format!("  Vendas:    {}", summary.sale_count),
        format!("  Itens:     {}", summary.item_count),
        format!("  Bruto:     {}", settings.format_currency(Money::from_cents(summary.gross_cents))),
        format!("  Descontos: {}", settings.format_currency(Money::from_cents(summary.discount_cents))),
        format!("  Líquido:   {}", settings.format_currency(Money::from_cents(summary.net_cents))),
    ];
    for payment in &summary.by_payment {
        out.push(format!(
            "  {:<20} {:>3}  {}",
            payment.method.label(),
            payment.count,
            settings.format_currency(Money::from_cents(payment.total_cents))
        ));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{execute, Outcome};
    use crate::error::ErrorCode;
    use crate::state::{PendingCheckout, TerminalConfig};
    use pdv_core::{
        Collection, ErrorKind, Inventory, MemoryStore, ProductInput, SaleLedger, StoreError,
        StoreResult,
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn session() -> (Arc<MemoryStore>, Session<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let inventory = Inventory::new(Arc::clone(&store));
        inventory
            .upsert(ProductInput::new("Arroz 5kg", 1000, 10).with_barcode("7891234567895"))
            .await
            .unwrap();
        inventory
            .upsert(ProductInput::new("Feijão 1kg", 550, 3).with_barcode("4006381333931"))
            .await
            .unwrap();
        let config = TerminalConfig {
            cashier_name: "Maria".to_string(),
            ..TerminalConfig::default()
        };
        let session = Session::open(Arc::clone(&store), config).await.unwrap();
        (store, session)
    }

    async fn run(session: &mut Session<MemoryStore>, line: &str) -> String {
        match execute(session, line).await.unwrap() {
            Outcome::Continue(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_pay_prints_receipt_and_updates_stock() {
        let (store, mut session) = session().await;
        run(&mut session, "2*7891234567895").await;
        run(&mut session, "4006381333931").await;
        run(&mut session, ":note entregar").await;

        let out = run(&mut session, ":pay pix 10").await;
        assert!(out.contains("Operador: Maria"));
        assert!(out.contains("Pagamento: PIX"));
        assert!(out.contains("R$ 22,95"));
        assert!(out.contains("Obs: entregar"));
        assert!(out.contains("registrada"));

        assert!(session.cart().is_empty());
        assert_eq!(session.pending(), &PendingCheckout::default());
        let arroz = session.inventory().require("7891234567895").await.unwrap();
        assert_eq!(arroz.stock_quantity, 8);
        assert_eq!(SaleLedger::new(store).len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pay_empty_cart_fails() {
        let (_store, mut session) = session().await;
        let err = execute(&mut session, ":pay dinheiro").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Core(ErrorKind::EmptyCart));
    }

    #[tokio::test]
    async fn test_register_and_attach_customer() {
        let (_store, mut session) = session().await;
        let out = run(&mut session, ":customer Ana Souza;123.456.789-09;11 99999-0000").await;
        assert_eq!(out, "Cliente: Ana Souza (12345678909)");
        assert!(session.pending().customer.is_some());

        run(&mut session, ":customer").await;
        assert!(session.pending().customer.is_none());

        run(&mut session, ":customer 12345678909").await;
        run(&mut session, "7891234567895").await;
        let out = run(&mut session, ":pay credito").await;
        assert!(out.contains("Cliente: Ana Souza (12345678909)"));
    }

    /// Store whose customer reads start failing once `allowed` is used up.
    #[derive(Default)]
    struct CustomerReadsFail {
        inner: MemoryStore,
        customer_loads: AtomicUsize,
        allowed: AtomicUsize,
    }

    impl CollectionStore for CustomerReadsFail {
        async fn load_collection(&self, collection: Collection) -> StoreResult<Vec<Value>> {
            if collection == Collection::Customers {
                let n = self.customer_loads.fetch_add(1, Ordering::SeqCst);
                if n >= self.allowed.load(Ordering::SeqCst) {
                    return Err(StoreError::Unavailable("customers offline".to_string()));
                }
            }
            self.inner.load_collection(collection).await
        }

        async fn save_collection(&self, collection: Collection, records: Vec<Value>) -> StoreResult<()> {
            self.inner.save_collection(collection, records).await
        }
    }

    #[tokio::test]
    async fn test_pay_succeeds_when_receipt_customer_lookup_fails() {
        let store = Arc::new(CustomerReadsFail {
            allowed: AtomicUsize::new(usize::MAX),
            ..CustomerReadsFail::default()
        });
        Inventory::new(Arc::clone(&store))
            .upsert(ProductInput::new("Arroz 5kg", 1000, 10).with_barcode("7891234567895"))
            .await
            .unwrap();
        let mut session = Session::open(Arc::clone(&store), TerminalConfig::default())
            .await
            .unwrap();

        match execute(&mut session, ":customer Ana Souza;123.456.789-09").await.unwrap() {
            Outcome::Continue(_) => {}
            Outcome::Quit => panic!("unexpected quit"),
        }
        match execute(&mut session, "7891234567895").await.unwrap() {
            Outcome::Continue(_) => {}
            Outcome::Quit => panic!("unexpected quit"),
        }

        // The commit's own customer check is the last read that succeeds
        let used = store.customer_loads.load(Ordering::SeqCst);
        store.allowed.store(used + 1, Ordering::SeqCst);

        let out = match execute(&mut session, ":pay pix").await.unwrap() {
            Outcome::Continue(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        };
        assert!(out.contains("registrada"));
        assert!(!out.contains("Ana Souza"));
        assert!(session.cart().is_empty());
        assert_eq!(session.committer().ledger().len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let (_store, mut session) = session().await;
        let err = execute(&mut session, ":customer 00000000000").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Core(ErrorKind::CustomerNotFound));
        assert!(session.pending().customer.is_none());
    }

    #[tokio::test]
    async fn test_sales_summary() {
        let (_store, mut session) = session().await;
        run(&mut session, "7891234567895").await;
        run(&mut session, ":pay dinheiro").await;
        run(&mut session, "4006381333931").await;
        run(&mut session, ":pay pix").await;

        let out = run(&mut session, ":sales").await;
        assert!(out.contains("Vendas:    2"));
        assert!(out.contains("Líquido:   R$ 15,50"));
        assert!(out.contains("Dinheiro"));
        assert!(out.contains("PIX"));

        let out = run(&mut session, ":sales 2000-01-01").await;
        assert!(out.contains("Vendas:    0"));
    }
}
