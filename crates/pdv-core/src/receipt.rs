//! # Receipt Rendering
//!
//! Plain-text receipts for thermal printers and the console.
//!
//! ## Layout (40 columns)
//! ```text
//! ┌────────────────────────────────────────┐
//! │           MERCADINHO CENTRAL           │
//! │          CNPJ 12.345.678/0001-95       │
//! │----------------------------------------│
//! │Cupom: 20240307-000001                  │
//! │Data: 07/03/2024 14:05                  │
//! │Operador: Maria                         │
//! │----------------------------------------│
//! │Arroz 5kg                               │
//! │  2 x 10,00                        20,00│
//! │----------------------------------------│
//! │Subtotal                        R$ 25,50│
//! │Desconto (10%)                  -R$ 2,55│
//! │TOTAL                           R$ 22,95│
//! │Pagamento: PIX                          │
//! │----------------------------------------│
//! │       Obrigado pela preferência!       │
//! └────────────────────────────────────────┘
//! ```

use chrono::Local;

use crate::money::Money;
use crate::settings::Settings;
use crate::types::{Customer, Sale};

/// Narrowest paper the layout supports.
pub const MIN_WIDTH: usize = 24;

/// Renders `sale` as lines of at most `width` characters.
///
/// `customer` is the resolved customer, when the sale references one that
/// still exists.
pub fn render_receipt(
    sale: &Sale,
    settings: &Settings,
    customer: Option<&Customer>,
    width: usize,
) -> String {
    let width = width.max(MIN_WIDTH);
    let rule = "-".repeat(width);
    let mut out: Vec<String> = Vec::new();

    out.push(center(&settings.store_name.to_uppercase(), width));
    if !settings.document.is_empty() {
        out.push(center(&settings.document, width));
    }
    for line in &settings.address_lines {
        out.push(center(line, width));
    }
    if let Some(phone) = &settings.phone {
        out.push(center(phone, width));
    }
    out.push(rule.clone());

    out.push(truncate(&format!("Cupom: {}", sale.receipt_number), width));
    out.push(truncate(
        &format!(
            "Data: {}",
            sale.created_at.with_timezone(&Local).format("%d/%m/%Y %H:%M")
        ),
        width,
    ));
    out.push(truncate(&format!("Operador: {}", sale.cashier_name), width));
    match (customer, &sale.customer_id) {
        (Some(c), _) => out.push(truncate(&format!("Cliente: {} ({})", c.name, c.document), width)),
        (None, Some(id)) => out.push(truncate(&format!("Cliente: {}", id), width)),
        (None, None) => {}
    }
    out.push(rule.clone());

    for line in &sale.lines {
        out.push(truncate(&line.name, width));
        out.push(columns(
            &format!(
                "  {} x {}",
                line.quantity,
                settings.format_amount(line.unit_price())
            ),
            &settings.format_amount(line.line_subtotal()),
            width,
        ));
    }
    out.push(rule.clone());

    out.push(columns("Subtotal", &settings.format_currency(sale.subtotal()), width));
    if sale.discount_cents > 0 {
        out.push(columns(
            &format!("Desconto ({})", settings.format_percent(sale.discount_bps)),
            &settings.format_currency(Money::zero() - sale.discount()),
            width,
        ));
    }
    out.push(columns("TOTAL", &settings.format_currency(sale.total()), width));
    out.push(truncate(
        &format!("Pagamento: {}", sale.payment_method.label()),
        width,
    ));
    if let Some(note) = sale.note.as_deref().filter(|n| !n.is_empty()) {
        out.push(truncate(&format!("Obs: {}", note), width));
    }

    if !settings.receipt_footer.is_empty() {
        out.push(rule);
        out.push(center(&settings.receipt_footer, width));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

fn center(s: &str, width: usize) -> String {
    let s = truncate(s.trim(), width);
    let pad = (width - char_len(&s)) / 2;
    format!("{}{}", " ".repeat(pad), s)
}

/// Left text and right-aligned value on one line. The left side is cut to
/// leave at least one space before the value.
fn columns(left: &str, right: &str, width: usize) -> String {
    let right = truncate(right, width);
    let room = width - char_len(&right);
    let left = truncate(left, room.saturating_sub(1));
    let gap = room - char_len(&left);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLine, PaymentMethod};
    use chrono::Utc;

    fn sale() -> Sale {
        Sale {
            id: "s1".to_string(),
            receipt_number: "20240307-000001".to_string(),
            customer_id: None,
            payment_method: PaymentMethod::Pix,
            lines: vec![
                CartLine {
                    product_id: "a".to_string(),
                    barcode: "7891234567895".to_string(),
                    name: "Arroz 5kg".to_string(),
                    unit_price_cents: 1000,
                    quantity: 2,
                    line_subtotal_cents: 2000,
                },
                CartLine {
                    product_id: "b".to_string(),
                    barcode: "4006381333931".to_string(),
                    name: "Feijão Carioca Tipo 1 Pacote Econômico 1kg".to_string(),
                    unit_price_cents: 550,
                    quantity: 1,
                    line_subtotal_cents: 550,
                },
            ],
            subtotal_cents: 2550,
            discount_bps: 1000,
            discount_cents: 255,
            total_cents: 2295,
            note: Some("entregar".to_string()),
            cashier_name: "Maria".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_receipt_contents() {
        let text = render_receipt(&sale(), &Settings::default(), None, 40);

        assert!(text.contains("Cupom: 20240307-000001"));
        assert!(text.contains("Operador: Maria"));
        assert!(text.contains("  2 x 10,00"));
        assert!(text.contains("Desconto (10%)"));
        assert!(text.contains("-R$ 2,55"));
        assert!(text.contains("R$ 22,95"));
        assert!(text.contains("Pagamento: PIX"));
        assert!(text.contains("Obs: entregar"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_lines_fit_width() {
        for width in [24, 32, 40, 48] {
            let text = render_receipt(&sale(), &Settings::default(), None, width);
            for line in text.lines() {
                assert!(line.chars().count() <= width, "{:?} exceeds {}", line, width);
            }
        }
    }

    #[test]
    fn test_totals_are_right_aligned() {
        let text = render_receipt(&sale(), &Settings::default(), None, 40);
        let total = text.lines().find(|l| l.starts_with("TOTAL")).unwrap();
        assert_eq!(total.chars().count(), 40);
        assert!(total.ends_with("R$ 22,95"));
    }

    #[test]
    fn test_customer_line() {
        let mut s = sale();
        s.customer_id = Some("c1".to_string());

        let text = render_receipt(&s, &Settings::default(), None, 40);
        assert!(text.contains("Cliente: c1"));

        let customer = Customer {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            document: "12345678909".to_string(),
            phone: None,
            email: None,
            address: None,
            created_at: Utc::now(),
        };
        let text = render_receipt(&s, &Settings::default(), Some(&customer), 40);
        assert!(text.contains("Cliente: Ana (12345678909)"));
    }

    #[test]
    fn test_no_discount_line_without_discount() {
        let mut s = sale();
        s.discount_bps = 0;
        s.discount_cents = 0;
        s.total_cents = 2550;
        let text = render_receipt(&s, &Settings::default(), None, 40);
        assert!(!text.contains("Desconto"));
    }

    #[test]
    fn test_narrow_width_is_clamped() {
        let text = render_receipt(&sale(), &Settings::default(), None, 5);
        assert!(text.lines().all(|l| l.chars().count() <= MIN_WIDTH));
    }
}
