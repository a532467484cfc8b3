//! # State Module
//!
//! Everything the console holds between two commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐        ┌──────────────────────────────────────┐  │
//! │  │  TerminalConfig  │        │  Session<S: CollectionStore>         │  │
//! │  │                  │        │                                      │  │
//! │  │  cashier_name    │───────►│  Inventory   CartEngine   Settings   │  │
//! │  │  stock_policy    │        │  SaleCommitter (ledger, customers)   │  │
//! │  │  receipt_width   │        │  GroupBook   PendingCheckout         │  │
//! │  └──────────────────┘        └──────────────────────────────────────┘  │
//! │                                                                         │
//! │  The session is owned by the console loop; commands get `&mut` to it, │
//! │  so there is exactly one writer and no locking.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;

pub use config::{ConfigError, TerminalConfig, CONFIG_FILE, DB_FILE};
pub use session::{PendingCheckout, Session};

/// `directories::ProjectDirs` identity.
pub const QUALIFIER: &str = "br";
pub const ORGANIZATION: &str = "pdv";
pub const APPLICATION: &str = "pdv-terminal";
