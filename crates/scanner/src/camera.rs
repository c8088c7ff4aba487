//! Camera session abstraction for testability.
//!
//! The [`CameraSession`] trait abstracts the capture subsystem: the
//! coordinator only needs authorization, configure-and-start into an event
//! channel, and stop. Production implementations wrap a real capture device
//! (or a headless stand-in such as the daemon's stdin session); tests use
//! [`MockCameraSession`].
//!
//! # Contract
//!
//! - `configure_and_start` attaches a barcode observer restricted to the
//!   symbologies it is given and delivers every decoded code as a
//!   [`BarcodeEvent`] on the provided channel, from its own producer task.
//! - The capture session is exclusively owned by one coordinator; no other
//!   component may reconfigure it.
//! - `stop` is idempotent.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;

use foodscan_core::error::CameraError;
use foodscan_core::event::BarcodeEvent;
use foodscan_core::types::Symbology;

/// Trait abstracting the camera capture session.
///
/// `Send + Sync + 'static` so the coordinator can share the session with its
/// background tasks.
pub trait CameraSession: Send + Sync + 'static {
    /// Requests camera authorization from the platform.
    ///
    /// # Errors
    ///
    /// - `CameraError::AuthorizationDenied`: the user denied access
    /// - `CameraError::AuthorizationRestricted`: access is restricted by policy
    fn request_authorization(&self) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Acquires the capture device, attaches a barcode observer for the
    /// given symbologies, and starts the session.
    ///
    /// Decoded barcodes are delivered as [`BarcodeEvent`]s on `events`.
    ///
    /// # Errors
    ///
    /// - `CameraError::DeviceUnavailable`: no capture device could be opened
    /// - `CameraError::OutputAttach`: the barcode observer could not be attached
    fn configure_and_start(
        &self,
        symbologies: &[Symbology],
        events: mpsc::Sender<BarcodeEvent>,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Stops the capture session. Safe to call when not running.
    fn stop(&self) -> impl Future<Output = ()> + Send;

    /// Returns whether the session is currently running.
    fn is_running(&self) -> bool;
}

/// Test double with scripted authorization and configuration outcomes.
///
/// Captures the event sender handed to `configure_and_start` so tests can
/// inject barcode detections with [`emit`](MockCameraSession::emit).
pub struct MockCameraSession {
    auth_result: Mutex<Result<(), CameraError>>,
    configure_result: Mutex<Result<(), CameraError>>,
    events: Mutex<Option<mpsc::Sender<BarcodeEvent>>>,
    symbologies: Mutex<Vec<Symbology>>,
    running: AtomicBool,
    stop_calls: AtomicU64,
}

impl MockCameraSession {
    /// Creates a mock that authorizes and configures successfully.
    pub fn new() -> Self {
        Self {
            auth_result: Mutex::new(Ok(())),
            configure_result: Mutex::new(Ok(())),
            events: Mutex::new(None),
            symbologies: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            stop_calls: AtomicU64::new(0),
        }
    }

    /// Scripts the authorization request to fail.
    pub fn with_authorization_error(self, error: CameraError) -> Self {
        *self.auth_result.lock().expect("mock auth lock poisoned") = Err(error);
        self
    }

    /// Scripts the configuration step to fail.
    pub fn with_configure_error(self, error: CameraError) -> Self {
        *self
            .configure_result
            .lock()
            .expect("mock configure lock poisoned") = Err(error);
        self
    }

    /// Injects a decoded barcode into the captured event channel.
    ///
    /// Returns `false` if the session was never configured or the channel
    /// is closed.
    pub async fn emit(&self, barcode: &str, symbology: Symbology) -> bool {
        let tx = self
            .events
            .lock()
            .expect("mock events lock poisoned")
            .clone();
        match tx {
            Some(tx) => tx.send(BarcodeEvent::new(barcode, symbology)).await.is_ok(),
            None => false,
        }
    }

    /// Returns the symbologies the observer was configured with.
    pub fn configured_symbologies(&self) -> Vec<Symbology> {
        self.symbologies
            .lock()
            .expect("mock symbologies lock poisoned")
            .clone()
    }

    /// Returns how many times `stop` was called.
    pub fn stop_calls(&self) -> u64 {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSession for MockCameraSession {
    async fn request_authorization(&self) -> Result<(), CameraError> {
        self.auth_result
            .lock()
            .expect("mock auth lock poisoned")
            .clone()
    }

    async fn configure_and_start(
        &self,
        symbologies: &[Symbology],
        events: mpsc::Sender<BarcodeEvent>,
    ) -> Result<(), CameraError> {
        let result = self
            .configure_result
            .lock()
            .expect("mock configure lock poisoned")
            .clone();
        result?;

        *self
            .symbologies
            .lock()
            .expect("mock symbologies lock poisoned") = symbologies.to_vec();
        *self.events.lock().expect("mock events lock poisoned") = Some(events);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        *self.events.lock().expect("mock events lock poisoned") = None;
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
