//! # Scanner Seam
//!
//! Barcode scanners are a capability the application plugs in. The core
//! never trusts a raw read: everything a scanner reports goes through
//! [`Barcode::parse`], the same path typed codes take.
//!
//! ## Detection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  device ──raw──► Scanner ──► on_detect(raw)                             │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                     validating(): Barcode::parse                        │
//! │                        │                    │                           │
//! │                    invalid               valid                          │
//! │                        │                    ▼                           │
//! │                   warn! + drop     ScanDebouncer::accept               │
//! │                                     │              │                    │
//! │                                  repeat         new read                │
//! │                                     │              ▼                    │
//! │                                   drop        on_valid(barcode)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::barcode::Barcode;

/// Callback receiving every raw read, in order.
pub type DetectCallback = Box<dyn FnMut(String) + Send + 'static>;

/// Why a scanner could not start.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("scanner is already running")]
    AlreadyRunning,

    #[error("scanner device unavailable: {0}")]
    Unavailable(String),
}

/// A source of barcode reads.
///
/// `start` begins delivering reads to `on_detect` until `stop` is called.
/// Stopping a scanner that is not running is a no-op.
pub trait Scanner: Send {
    fn start(
        &mut self,
        on_detect: DetectCallback,
    ) -> impl Future<Output = Result<(), ScannerError>> + Send;

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Suppresses repeated reads of the same code within a time window.
///
/// Handheld scanners often fire twice for one trigger pull.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl ScanDebouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns true when `code` should be processed now.
    pub fn accept(&mut self, code: &str) -> bool {
        self.accept_at(code, Instant::now())
    }

    /// Like [`ScanDebouncer::accept`] with an explicit clock reading.
    pub fn accept_at(&mut self, code: &str, now: Instant) -> bool {
        if let Some((last_code, at)) = &self.last {
            if last_code == code && now.saturating_duration_since(*at) < self.window {
                return false;
            }
        }
        self.last = Some((code.to_string(), now));
        true
    }
}

/// Wraps `on_valid` into a [`DetectCallback`] that validates and debounces.
///
/// A zero `debounce` window disables debouncing.
pub fn validating<F>(debounce: Duration, mut on_valid: F) -> DetectCallback
where
    F: FnMut(Barcode) + Send + 'static,
{
    let mut debouncer = ScanDebouncer::new(debounce);
    Box::new(move |raw: String| match Barcode::parse(&raw) {
        Ok(barcode) => {
            if debouncer.accept(barcode.as_str()) {
                on_valid(barcode);
            } else {
                debug!(code = %barcode, "Repeated scan ignored");
            }
        }
        Err(e) => warn!(raw = %raw.trim(), error = %e, "Rejected scanner read"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Scanner driven by the test itself.
    #[derive(Default)]
    struct FakeScanner {
        callback: Option<DetectCallback>,
    }

    impl FakeScanner {
        fn emit(&mut self, raw: &str) {
            if let Some(callback) = self.callback.as_mut() {
                callback(raw.to_string());
            }
        }
    }

    impl Scanner for FakeScanner {
        async fn start(&mut self, on_detect: DetectCallback) -> Result<(), ScannerError> {
            if self.callback.is_some() {
                return Err(ScannerError::AlreadyRunning);
            }
            self.callback = Some(on_detect);
            Ok(())
        }

        fn stop(&mut self) {
            self.callback = None;
        }

        fn is_running(&self) -> bool {
            self.callback.is_some()
        }
    }

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl FnMut(Barcode) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |b: Barcode| sink.lock().unwrap().push(b.into_inner()))
    }

    #[tokio::test]
    async fn test_only_valid_codes_reach_callback() {
        let (seen, on_valid) = collector();
        let mut scanner = FakeScanner::default();
        scanner
            .start(validating(Duration::ZERO, on_valid))
            .await
            .unwrap();

        scanner.emit("7891234567895\r\n");
        scanner.emit("7891234567890");
        scanner.emit("garbage");
        scanner.emit("4006381333931");

        assert_eq!(*seen.lock().unwrap(), ["7891234567895", "4006381333931"]);
    }

    #[tokio::test]
    async fn test_start_twice_and_stop() {
        let mut scanner = FakeScanner::default();
        scanner.start(Box::new(|_| {})).await.unwrap();
        assert!(matches!(
            scanner.start(Box::new(|_| {})).await,
            Err(ScannerError::AlreadyRunning)
        ));

        scanner.stop();
        assert!(!scanner.is_running());
        scanner.stop();
    }

    #[tokio::test]
    async fn test_repeated_reads_are_debounced() {
        let (seen, on_valid) = collector();
        let mut scanner = FakeScanner::default();
        scanner
            .start(validating(Duration::from_secs(60), on_valid))
            .await
            .unwrap();

        scanner.emit("7891234567895");
        scanner.emit("7891234567895");
        scanner.emit("4006381333931");
        scanner.emit("7891234567895");

        assert_eq!(
            *seen.lock().unwrap(),
            ["7891234567895", "4006381333931", "7891234567895"]
        );
    }

    #[test]
    fn test_debouncer_window() {
        let mut debouncer = ScanDebouncer::new(Duration::from_millis(500));
        let t0 = Instant::now();

        assert!(debouncer.accept_at("A", t0));
        assert!(!debouncer.accept_at("A", t0 + Duration::from_millis(100)));
        assert!(debouncer.accept_at("A", t0 + Duration::from_millis(700)));
        assert!(debouncer.accept_at("B", t0 + Duration::from_millis(750)));
    }
}
