//! # Cart Commands
//!
//! Cart manipulation from the console.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  :pay    │────►│ Receipt  │       │
//! │  │  Cart    │     │          │     │          │     │ printed  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │                                  │             │
//! │       │          <code>, :qty                             │             │
//! │       │          :rm, :total                              │             │
//! │       │                │                                  │             │
//! │       └──── :clear ────┘◄─────────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation is persisted by the engine before these handlers return,
//! so a restarted console shows the same cart.

use pdv_core::{CartTotals, CollectionStore, CoreError, Settings};
use tracing::debug;

use crate::error::CommandError;
use crate::state::Session;

/// Adds `quantity` units of the product a code resolves to.
pub async fn add<S: CollectionStore>(
    session: &mut Session<S>,
    code: &str,
    quantity: i64,
) -> Result<String, CommandError> {
    debug!(code = %code, quantity, "add command");
    let line = session.cart_mut().add_by_code(code, quantity).await?;

    let settings = session.settings();
    let mut text = format!(
        "+ {} x {} @ {} = {}",
        quantity,
        line.name,
        settings.format_amount(line.unit_price()),
        settings.format_amount(line.unit_price() * quantity)
    );
    if line.quantity != quantity {
        text.push_str(&format!(" ({} no carrinho)", line.quantity));
    }
    text.push('\n');
    text.push_str(&running_total(session)?);
    Ok(text)
}

/// Removes the line for `barcode`.
pub async fn remove<S: CollectionStore>(
    session: &mut Session<S>,
    barcode: &str,
) -> Result<String, CommandError> {
    debug!(barcode = %barcode, "remove command");
    if !session.cart_mut().remove_item(barcode).await? {
        return Err(CoreError::NotInCart(barcode.to_string()).into());
    }
    Ok(format!("- {}\n{}", barcode, running_total(session)?))
}

/// Sets a line's quantity; zero removes the line.
pub async fn set_quantity<S: CollectionStore>(
    session: &mut Session<S>,
    barcode: &str,
    quantity: i64,
) -> Result<String, CommandError> {
    if quantity == 0 {
        return remove(session, barcode).await;
    }
    debug!(barcode = %barcode, quantity, "qty command");
    let line = session.cart_mut().update_quantity(barcode, quantity).await?;
    Ok(format!(
        "= {} x {}\n{}",
        line.quantity,
        line.name,
        running_total(session)?
    ))
}

pub async fn clear<S: CollectionStore>(session: &mut Session<S>) -> Result<String, CommandError> {
    session.cart_mut().clear().await?;
    session.reset_pending();
    Ok("Carrinho vazio".to_string())
}

/// Lists the cart lines and totals.
pub fn show<S: CollectionStore>(session: &Session<S>) -> Result<String, CommandError> {
    let cart = session.cart();
    if cart.is_empty() {
        return Ok("Carrinho vazio".to_string());
    }

    let settings = session.settings();
    let width = session.config().receipt_width;
    let mut out = Vec::new();
    for (index, line) in cart.lines().iter().enumerate() {
        out.push(format!("{:>2}. {} [{}]", index + 1, line.name, line.barcode));
        out.push(columns(
            &format!(
                "    {} x {}",
                line.quantity,
                settings.format_amount(line.unit_price())
            ),
            &settings.format_amount(line.line_subtotal()),
            width,
        ));
    }
    out.push("-".repeat(width));
    let totals = cart.compute_totals(session.pending().discount_percent)?;
    out.push(render_totals(&totals, settings, width));
    Ok(out.join("\n"))
}

/// Shows totals, optionally setting the discount used by `:pay`.
pub fn total<S: CollectionStore>(
    session: &mut Session<S>,
    discount_percent: Option<f64>,
) -> Result<String, CommandError> {
    let percent = discount_percent.unwrap_or(session.pending().discount_percent);
    let totals = session.cart().compute_totals(percent)?;
    session.pending_mut().discount_percent = percent;

    Ok(render_totals(
        &totals,
        session.settings(),
        session.config().receipt_width,
    ))
}

/// Subtotal / discount / total block.
pub(crate) fn render_totals(totals: &CartTotals, settings: &Settings, width: usize) -> String {
    let mut out = vec![columns(
        &format!("Subtotal ({} itens)", totals.total_quantity),
        &settings.format_currency(totals.subtotal()),
        width,
    )];
    if totals.discount_cents > 0 {
        out.push(columns(
            &format!("Desconto ({})", settings.format_percent(totals.discount_bps)),
            &format!("-{}", settings.format_currency(totals.discount())),
            width,
        ));
    }
    out.push(columns("TOTAL", &settings.format_currency(totals.total()), width));
    out.join("\n")
}

fn running_total<S: CollectionStore>(session: &Session<S>) -> Result<String, CommandError> {
    let totals = session
        .cart()
        .compute_totals(session.pending().discount_percent)?;
    Ok(format!(
        "  Total: {}",
        session.settings().format_currency(totals.total())
    ))
}

fn columns(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}
