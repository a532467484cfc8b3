//! # PDV Terminal Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin ──────► commands ──┐                                             │
//! │                           ├──► Session ──► SQLite (pdv.db)              │
//! │  scanner ────► barcodes ──┘       │                                     │
//! │                                   ▼                                     │
//! │                          stdout: cart, receipts, reports                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The actual setup is in lib.rs for testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match pdv_terminal::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pdv-terminal: {}", e);
            ExitCode::FAILURE
        }
    }
}
