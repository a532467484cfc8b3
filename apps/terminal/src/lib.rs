//! # PDV Terminal Library
//!
//! Line-oriented checkout console over the PDV core.
//!
//! ## Module Organization
//! ```text
//! pdv_terminal/
//! ├── lib.rs          ◄─── You are here (startup & console loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── config.rs   ◄─── config.toml + PDV_* overrides
//! │   └── session.rs  ◄─── Inventory, cart, committer, settings
//! ├── commands/
//! │   ├── mod.rs      ◄─── Parsing + dispatch
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── sale.rs     ◄─── Checkout + sales report
//! │   ├── product.rs  ◄─── Catalog search/registration
//! │   ├── backup.rs   ◄─── JSON export/import
//! │   └── config.rs   ◄─── Store settings
//! ├── scanner.rs      ◄─── Line-mode barcode device
//! └── error.rs        ◄─── Command and startup errors
//! ```

pub mod commands;
pub mod error;
pub mod scanner;
pub mod state;

use std::sync::Arc;

use pdv_core::scanner::{validating, Scanner};
use pdv_core::{Barcode, CollectionStore};
use pdv_db::{Database, DbConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::{execute, Command, Outcome};
use error::StartupError;
use scanner::LineScanner;
use state::{Session, TerminalConfig};

/// Runs the console until `:quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize Logging ──► stderr, RUST_LOG overrides the default      │
/// │  2. Load Configuration ──► config.toml, then PDV_* variables           │
/// │  3. Open Database ───────► SQLite (WAL), migrations applied            │
/// │  4. Open Session ────────► settings + persisted cart restored          │
/// │  5. Start Scanner ───────► optional; failure only logs a warning       │
/// │  6. Console Loop ────────► stdin lines and scans, one at a time        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), StartupError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting PDV terminal");

    let config = TerminalConfig::load()?;
    let db_path = config.database_path()?;
    let db = Database::new(DbConfig::new(&db_path))
        .await
        .map_err(|source| StartupError::Database {
            path: db_path.clone(),
            source,
        })?;
    info!(path = %db_path.display(), "Database ready");

    let (scan_tx, scans) = mpsc::unbounded_channel();
    let mut scanner = config.scanner_device.as_ref().map(LineScanner::new);
    if let Some(device) = scanner.as_mut() {
        let on_scan = validating(config.scan_debounce(), move |barcode| {
            let _ = scan_tx.send(barcode);
        });
        if let Err(e) = device.start(on_scan).await {
            warn!(device = %device.path().display(), error = %e, "Scanner disabled");
        }
    }

    let mut session = Session::open(Arc::new(db.collections()), config).await?;
    let stdin = BufReader::new(tokio::io::stdin());
    let result = serve(&mut session, stdin, scans, tokio::io::stdout()).await;

    if let Some(device) = scanner.as_mut() {
        device.stop();
    }
    db.close().await;
    info!("PDV terminal stopped");
    result.map_err(StartupError::from)
}

/// Feeds typed lines and scanned barcodes to the session.
///
/// Scans become a one-unit add. Errors are printed and the loop goes on.
pub async fn serve<S, R, W>(
    session: &mut Session<S>,
    input: R,
    mut scans: mpsc::UnboundedReceiver<Barcode>,
    mut out: W,
) -> std::io::Result<()>
where
    S: CollectionStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut scans_open = true;

    write_line(&mut out, &format!("{} (:help para ajuda)", session.settings().store_name)).await?;
    loop {
        let result = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => execute(session, &line).await,
                None => break,
            },
            scan = scans.recv(), if scans_open => match scan {
                Some(barcode) => {
                    let add = Command::Add { code: barcode.to_string(), quantity: 1 };
                    commands::dispatch(session, add).await
                }
                None => {
                    scans_open = false;
                    continue;
                }
            },
        };

        match result {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Continue(text)) if text.is_empty() => {}
            Ok(Outcome::Continue(text)) => write_line(&mut out, &text).await?,
            Err(e) => write_line(&mut out, &format!("✗ {}", e)).await?,
        }
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so receipts on stdout stay clean.
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,pdv=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pdv=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdv_core::{Inventory, MemoryStore, ProductInput};

    async fn session() -> Session<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        Inventory::new(Arc::clone(&store))
            .upsert(ProductInput::new("Arroz 5kg", 1000, 10).with_barcode("7891234567895"))
            .await
            .unwrap();
        Session::open(store, TerminalConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_serve_runs_lines_until_quit() {
        let mut session = session().await;
        let (_tx, rx) = mpsc::unbounded_channel();
        let input: &[u8] = b"2*7891234567895\n:bogus\n:quit\n7891234567895\n";
        let mut out = Vec::new();

        serve(&mut session, input, rx, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("PDV (:help para ajuda)"));
        assert!(text.contains("+ 2 x Arroz 5kg"));
        assert!(text.contains("✗ [USAGE] unknown command :bogus"));
        assert_eq!(session.cart().lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_serve_adds_scanned_barcodes() {
        let mut session = session().await;
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Barcode::parse("7891234567895").unwrap()).unwrap();
        drop(tx);

        let (mut writer, reader) = tokio::io::duplex(64);
        let mut out = Vec::new();
        let serving = serve(&mut session, BufReader::new(reader), rx, &mut out);
        let typing = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            writer.write_all(b":cart\n").await.unwrap();
            drop(writer);
        };
        let (result, ()) = tokio::join!(serving, typing);
        result.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("+ 1 x Arroz 5kg"));
        assert!(text.contains(" 1. Arroz 5kg [7891234567895]"));
    }
}
