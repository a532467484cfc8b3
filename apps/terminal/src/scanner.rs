//! # Line-Device Scanner
//!
//! Most USB and serial barcode scanners can run in line mode: each read
//! arrives as one line of text. [`LineScanner`] reads such a device (or a
//! FIFO that something else writes to) and hands every line to the
//! detection callback.
//!
//! ```text
//! /dev/ttyACM0 ──lines──► LineScanner task ──► on_detect(raw)
//!                                                  │
//!                                      pdv_core::scanner::validating
//!                                                  │
//!                                     mpsc ──► console loop (add to cart)
//! ```

use std::path::{Path, PathBuf};

use pdv_core::scanner::{DetectCallback, Scanner, ScannerError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Scanner reading newline-terminated codes from a file-like device.
#[derive(Debug)]
pub struct LineScanner {
    path: PathBuf,
    task: Option<JoinHandle<()>>,
}

impl LineScanner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LineScanner {
            path: path.into(),
            task: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Scanner for LineScanner {
    /// Checks the device exists and starts the reader task.
    ///
    /// The device is opened inside the task, since opening a FIFO waits
    /// for a writer.
    async fn start(&mut self, mut on_detect: DetectCallback) -> Result<(), ScannerError> {
        if self.is_running() {
            return Err(ScannerError::AlreadyRunning);
        }
        tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| ScannerError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let path = self.path.clone();
        self.task = Some(tokio::spawn(async move {
            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(device = %path.display(), error = %e, "Could not open scanner");
                    return;
                }
            };
            info!(device = %path.display(), "Scanner listening");

            let mut lines = BufReader::new(file).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let code = line.trim();
                        if !code.is_empty() {
                            debug!(raw = %code, "Scanner read");
                            on_detect(code.to_string());
                        }
                    }
                    Ok(None) => {
                        info!(device = %path.display(), "Scanner device closed");
                        break;
                    }
                    Err(e) => {
                        warn!(device = %path.display(), error = %e, "Scanner read failed");
                        break;
                    }
                }
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(device = %self.path.display(), "Scanner stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for LineScanner {
    fn drop(&mut self) {
        self.stop();
    }
}
