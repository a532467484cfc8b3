//! # Console Commands
//!
//! Every line the operator types (or the scanner reports) becomes a
//! [`Command`], which [`dispatch`] runs against the [`Session`].
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (parsing + dispatch)
//! ├── cart.rs     ◄─── <code>, n*<code>, :rm, :qty, :clear, :cart, :total
//! ├── sale.rs     ◄─── :customer, :note, :pay, :sales
//! ├── product.rs  ◄─── :find, :product, :restock
//! ├── backup.rs   ◄─── :export, :import
//! └── config.rs   ◄─── :settings, :set
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "3*7891234567895"                                                      │
//! │         │  Command::parse                                               │
//! │         ▼                                                               │
//! │  Command::Add { code: "7891234567895", quantity: 3 }                    │
//! │         │  dispatch(&mut session, command)                              │
//! │         ▼                                                               │
//! │  cart::add ──► CartEngine::add_by_code ──► cart persisted               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Outcome::Continue("+ 3 x Arroz 5kg ...")  or  CommandError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod backup;
pub mod cart;
pub mod config;
pub mod product;
pub mod sale;

use std::path::PathBuf;

use chrono::NaiveDate;
use pdv_core::{CollectionStore, Money, PaymentMethod, ProductInput};

use crate::error::CommandError;
use crate::state::Session;

/// Help text printed by `:help`.
pub const HELP: &str = "\
Cart
  <code>                   add one unit (barcode or product name)
  <n>*<code>               add n units
  :rm <barcode>            remove a line
  :qty <barcode> <n>       set a line's quantity (0 removes)
  :clear                   empty the cart
  :cart                    show the cart
  :total [pct]             show totals with an optional discount
Checkout
  :customer [id|document]  attach a customer (no argument clears)
  :note [text]             attach a note (no argument clears)
  :pay <method> [pct]      finish the sale: dinheiro, credito, debito, pix
  :sales [today|all|YYYY-MM-DD]
                           sales summary
Catalog
  :find <query>            search products
  :product <name>;<price>;<stock>[;<group>[;<barcode>]]
                           register a product
  :restock <code> <n>      add n units to stock
Store
  :settings                show store settings
  :set <name|document|phone|footer> <value>
  :export [path]           write a JSON backup
  :import <path>           restore a JSON backup
  :help                    this text
  :quit                    leave";

/// Which sales `:sales` summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesPeriod {
    Today,
    All,
    Day(NaiveDate),
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { code: String, quantity: i64 },
    Remove { barcode: String },
    SetQuantity { barcode: String, quantity: i64 },
    Clear,
    ShowCart,
    Total { discount_percent: Option<f64> },
    Customer { key: Option<String> },
    Note { text: Option<String> },
    Pay { method: PaymentMethod, discount_percent: Option<f64> },
    Sales { period: SalesPeriod },
    Find { query: String },
    NewProduct(ProductInput),
    Restock { code: String, quantity: i64 },
    ShowSettings,
    Set { key: String, value: String },
    Export { path: Option<PathBuf> },
    Import { path: PathBuf },
    Help,
    Quit,
}

/// What the console does after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this text and read the next line.
    Continue(String),
    /// Leave the console.
    Quit,
}

impl Command {
    /// Parses one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix(':') else {
            return parse_add(line).map(Some);
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let arg = (!args.is_empty()).then(|| args.to_string());

        let command = match name.to_lowercase().as_str() {
            "rm" | "remove" => Command::Remove {
                barcode: required(arg, ":rm <barcode>")?,
            },
            "qty" => {
                let (barcode, quantity) = split_pair(args, ":qty <barcode> <n>")?;
                Command::SetQuantity {
                    barcode,
                    quantity: parse_quantity(&quantity)?,
                }
            }
            "clear" => Command::Clear,
            "cart" => Command::ShowCart,
            "total" => Command::Total {
                discount_percent: arg.as_deref().map(parse_percent).transpose()?,
            },
            "customer" => Command::Customer { key: arg },
            "note" => Command::Note { text: arg },
            "pay" => {
                let mut parts = args.split_whitespace();
                let method = parts
                    .next()
                    .ok_or_else(|| CommandError::usage("usage: :pay <method> [pct]"))?;
                let method: PaymentMethod = method
                    .parse()
                    .map_err(|e: pdv_core::ValidationError| CommandError::usage(e.to_string()))?;
                let discount_percent = parts.next().map(parse_percent).transpose()?;
                Command::Pay {
                    method,
                    discount_percent,
                }
            }
            "sales" => Command::Sales {
                period: parse_period(arg.as_deref())?,
            },
            "find" => Command::Find {
                query: required(arg, ":find <query>")?,
            },
            "product" => Command::NewProduct(parse_product(args)?),
            "restock" => {
                let (code, quantity) = split_pair(args, ":restock <code> <n>")?;
                Command::Restock {
                    code,
                    quantity: parse_quantity(&quantity)?,
                }
            }
            "settings" => Command::ShowSettings,
            "set" => {
                let (key, value) = split_pair(args, ":set <key> <value>")?;
                Command::Set { key, value }
            }
            "export" => Command::Export {
                path: arg.map(PathBuf::from),
            },
            "import" => Command::Import {
                path: PathBuf::from(required(arg, ":import <path>")?),
            },
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => {
                return Err(CommandError::usage(format!(
                    "unknown command :{} (try :help)",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

/// Runs `command` against the session.
pub async fn dispatch<S: CollectionStore>(
    session: &mut Session<S>,
    command: Command,
) -> Result<Outcome, CommandError> {
    let text = match command {
        Command::Add { code, quantity } => cart::add(session, &code, quantity).await?,
        Command::Remove { barcode } => cart::remove(session, &barcode).await?,
        Command::SetQuantity { barcode, quantity } => {
            cart::set_quantity(session, &barcode, quantity).await?
        }
        Command::Clear => cart::clear(session).await?,
        Command::ShowCart => cart::show(session)?,
        Command::Total { discount_percent } => cart::total(session, discount_percent)?,
        Command::Customer { key } => sale::customer(session, key).await?,
        Command::Note { text } => sale::note(session, text)?,
        Command::Pay {
            method,
            discount_percent,
        } => sale::pay(session, method, discount_percent).await?,
        Command::Sales { period } => sale::summary(session, period).await?,
        Command::Find { query } => product::find(session, &query).await?,
        Command::NewProduct(input) => product::create(session, input).await?,
        Command::Restock { code, quantity } => product::restock(session, &code, quantity).await?,
        Command::ShowSettings => config::show(session),
        Command::Set { key, value } => config::set(session, &key, &value).await?,
        Command::Export { path } => backup::export(session, path).await?,
        Command::Import { path } => backup::import(session, &path).await?,
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Outcome::Quit),
    };
    Ok(Outcome::Continue(text))
}

/// Parses and dispatches one line. Blank lines print nothing.
pub async fn execute<S: CollectionStore>(
    session: &mut Session<S>,
    line: &str,
) -> Result<Outcome, CommandError> {
    match Command::parse(line)? {
        Some(command) => dispatch(session, command).await,
        None => Ok(Outcome::Continue(String::new())),
    }
}

// =============================================================================
// Argument Parsing
// =============================================================================

/// `code` or `n*code`.
fn parse_add(line: &str) -> Result<Command, CommandError> {
    if let Some((count, code)) = line.split_once('*') {
        let count = count.trim();
        if !count.is_empty() && count.chars().all(|c| c.is_ascii_digit()) {
            let code = code.trim();
            if code.is_empty() {
                return Err(CommandError::usage("usage: <n>*<code>"));
            }
            return Ok(Command::Add {
                code: code.to_string(),
                quantity: parse_quantity(count)?,
            });
        }
    }
    Ok(Command::Add {
        code: line.to_string(),
        quantity: 1,
    })
}

fn required(arg: Option<String>, usage: &str) -> Result<String, CommandError> {
    arg.ok_or_else(|| CommandError::usage(format!("usage: {}", usage)))
}

/// First word and the rest of the line.
fn split_pair(args: &str, usage: &str) -> Result<(String, String), CommandError> {
    match args.split_once(char::is_whitespace) {
        Some((first, rest)) if !rest.trim().is_empty() => {
            Ok((first.to_string(), rest.trim().to_string()))
        }
        _ => Err(CommandError::usage(format!("usage: {}", usage))),
    }
}

fn parse_quantity(raw: &str) -> Result<i64, CommandError> {
    raw.trim()
        .parse()
        .map_err(|_| CommandError::usage(format!("'{}' is not a whole quantity", raw.trim())))
}

/// `10`, `12.5`, `12,5` and `10%` all parse.
fn parse_percent(raw: &str) -> Result<f64, CommandError> {
    let cleaned = raw.trim().trim_end_matches('%').replace(',', ".");
    cleaned
        .parse()
        .map_err(|_| CommandError::usage(format!("'{}' is not a percentage", raw.trim())))
}

fn parse_period(raw: Option<&str>) -> Result<SalesPeriod, CommandError> {
    match raw.map(str::to_lowercase).as_deref() {
        None | Some("today") | Some("hoje") => Ok(SalesPeriod::Today),
        Some("all") | Some("tudo") => Ok(SalesPeriod::All),
        Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(SalesPeriod::Day)
            .map_err(|_| CommandError::usage("usage: :sales [today|all|YYYY-MM-DD]")),
    }
}

/// `name;price;stock[;group[;barcode]]` with a decimal price.
fn parse_product(args: &str) -> Result<ProductInput, CommandError> {
    const USAGE: &str = "usage: :product <name>;<price>;<stock>[;<group>[;<barcode>]]";

    let fields: Vec<&str> = args.split(';').map(str::trim).collect();
    if fields.len() < 3 || fields.len() > 5 {
        return Err(CommandError::usage(USAGE));
    }

    let price = Money::parse_decimal(fields[1])
        .ok_or_else(|| CommandError::usage(format!("'{}' is not a price", fields[1])))?;
    let stock = parse_quantity(fields[2])?;

    let mut input = ProductInput::new(fields[0], price.cents(), stock);
    if let Some(group) = fields.get(3).filter(|g| !g.is_empty()) {
        input = input.with_group(*group);
    }
    if let Some(barcode) = fields.get(4).filter(|b| !b.is_empty()) {
        input = input.with_barcode(*barcode);
    }
    Ok(input)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_add_forms() {
        assert_eq!(
            parse("7891234567895"),
            Command::Add {
                code: "7891234567895".into(),
                quantity: 1
            }
        );
        assert_eq!(
            parse("3*7891234567895"),
            Command::Add {
                code: "7891234567895".into(),
                quantity: 3
            }
        );
        assert_eq!(
            parse("arroz 5kg"),
            Command::Add {
                code: "arroz 5kg".into(),
                quantity: 1
            }
        );
        assert!(Command::parse("3*").is_err());
    }

    #[test]
    fn test_cart_commands() {
        assert_eq!(
            parse(":qty 7891234567895 4"),
            Command::SetQuantity {
                barcode: "7891234567895".into(),
                quantity: 4
            }
        );
        assert_eq!(parse(":total"), Command::Total { discount_percent: None });
        assert_eq!(
            parse(":total 12,5%"),
            Command::Total {
                discount_percent: Some(12.5)
            }
        );
        assert!(Command::parse(":qty 7891234567895").is_err());
        assert!(Command::parse(":qty 7891234567895 two").is_err());
    }

    #[test]
    fn test_pay() {
        assert_eq!(
            parse(":pay pix"),
            Command::Pay {
                method: PaymentMethod::Pix,
                discount_percent: None
            }
        );
        assert_eq!(
            parse(":PAY dinheiro 10"),
            Command::Pay {
                method: PaymentMethod::Cash,
                discount_percent: Some(10.0)
            }
        );
        let err = Command::parse(":pay cheque").unwrap_err();
        assert_eq!(err.code, ErrorCode::Usage);
    }

    #[test]
    fn test_product() {
        match parse(":product Café 500g; 12,90; 30; Mercearia") {
            Command::NewProduct(input) => {
                assert_eq!(input.name, "Café 500g");
                assert_eq!(input.price_cents, 1290);
                assert_eq!(input.stock_quantity, 30);
                assert_eq!(input.group, "Mercearia");
                assert_eq!(input.barcode, None);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Command::parse(":product Café;abc;3").is_err());
        assert!(Command::parse(":product Café;1,00").is_err());
    }

    #[test]
    fn test_sales_period() {
        assert_eq!(parse(":sales"), Command::Sales { period: SalesPeriod::Today });
        assert_eq!(parse(":sales all"), Command::Sales { period: SalesPeriod::All });
        assert_eq!(
            parse(":sales 2024-03-07"),
            Command::Sales {
                period: SalesPeriod::Day(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
            }
        );
        assert!(Command::parse(":sales yesterday").is_err());
    }

    #[test]
    fn test_optional_args_and_unknown() {
        assert_eq!(parse(":customer"), Command::Customer { key: None });
        assert_eq!(
            parse(":note entregar amanhã"),
            Command::Note {
                text: Some("entregar amanhã".into())
            }
        );
        assert_eq!(parse(":q"), Command::Quit);
        assert!(Command::parse(":frobnicate").is_err());
    }
}
