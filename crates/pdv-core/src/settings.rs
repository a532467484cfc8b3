//! # Store Settings
//!
//! Store identity printed on receipts and the currency format, kept as a
//! single record in the `config` collection.
//!
//! ## Currency Formatting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Money(123456)  ──format_currency──►  "R$ 1.234,56"                     │
//! │  Money(-255)    ──format_currency──►  "-R$ 2,55"                        │
//! │                                                                         │
//! │  symbol, decimal separator and thousands separator are configurable     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::store::{self, Collection, CollectionStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Settings {
    /// Trade name at the top of the receipt.
    pub store_name: String,
    /// CNPJ or CPF of the store, printed as given.
    pub document: String,
    pub address_lines: Vec<String>,
    pub phone: Option<String>,
    pub currency_symbol: String,
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub receipt_footer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_name: "PDV".to_string(),
            document: String::new(),
            address_lines: Vec::new(),
            phone: None,
            currency_symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
            receipt_footer: "Obrigado pela preferência!".to_string(),
        }
    }
}

impl Settings {
    /// Loads the stored settings, or the defaults when none were saved.
    pub async fn load<S: CollectionStore>(store: &S) -> CoreResult<Self> {
        let records: Vec<Settings> = store::load_records(store, Collection::Config).await?;
        Ok(records.into_iter().next().unwrap_or_default())
    }

    /// Validates and saves the settings as the only `config` record.
    pub async fn save<S: CollectionStore>(&self, store: &S) -> CoreResult<()> {
        self.validate()?;
        store::save_records(store, Collection::Config, std::slice::from_ref(self)).await?;
        debug!(store_name = %self.store_name, "Settings saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.store_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "store_name".to_string(),
            });
        }
        if self.decimal_separator == self.thousands_separator {
            return Err(ValidationError::InvalidFormat {
                field: "decimal_separator".to_string(),
                reason: "must differ from the thousands separator".to_string(),
            });
        }
        if self.decimal_separator.is_ascii_digit() || self.thousands_separator.is_ascii_digit() {
            return Err(ValidationError::InvalidFormat {
                field: "separators".to_string(),
                reason: "digits cannot be separators".to_string(),
            });
        }
        Ok(())
    }

    /// Formats an amount without the currency symbol: `1.234,56`.
    pub fn format_amount(&self, money: Money) -> String {
        let major = money.major().unsigned_abs().to_string();
        let mut grouped = String::with_capacity(major.len() + major.len() / 3);
        for (i, digit) in major.chars().enumerate() {
            if i > 0 && (major.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(digit);
        }

        let sign = if money.is_negative() { "-" } else { "" };
        format!("{}{}{}{:02}", sign, grouped, self.decimal_separator, money.minor())
    }

    /// Formats an amount with the currency symbol: `R$ 1.234,56`.
    pub fn format_currency(&self, money: Money) -> String {
        let amount = self.format_amount(money.abs());
        if money.is_negative() {
            format!("-{} {}", self.currency_symbol, amount)
        } else {
            format!("{} {}", self.currency_symbol, amount)
        }
    }

    /// Formats basis points as a percentage: `10%`, `12,5%`.
    pub fn format_percent(&self, bps: u32) -> String {
        let whole = bps / 100;
        let fraction = bps % 100;
        match fraction {
            0 => format!("{}%", whole),
            f if f % 10 == 0 => format!("{}{}{}%", whole, self.decimal_separator, f / 10),
            f => format!("{}{}{:02}%", whole, self.decimal_separator, f),
        }
    }
}
