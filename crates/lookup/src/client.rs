//! Product database lookup abstraction for testability.
//!
//! The [`ProductLookup`] trait abstracts the HTTP product lookup, allowing
//! production code to use [`HttpLookupClient`] while tests use [`MockLookupClient`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ ScanCoordinator │
//! └────────┬────────┘
//!          │
//!          ▼
//!  ┌───────────────┐
//!  │ ProductLookup │ (trait)
//!  └───────────────┘
//!      │       │
//!      ▼       ▼
//!  ┌──────┐ ┌──────┐
//!  │ Http │ │ Mock │
//!  └──┬───┘ └──────┘
//!     │
//!     ▼
//!  Product Database API
//! ```
//!
//! # Error Handling
//!
//! - **URL construction failures**: `LookupError::InvalidRequest`
//! - **Transport errors and non-2xx statuses**: `LookupError::Transport`
//! - **Envelope status "not found"**: `LookupError::NotFound`
//! - **Found without a product record**: `LookupError::EmptyPayload`
//! - **Invalid JSON or schema mismatch**: `LookupError::Decode`
//!
//! No failure is retried automatically; the coordinator publishes the
//! user-facing message and waits for the next admitted barcode.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::counter;
use tracing::debug;
use url::Url;

use foodscan_core::config::LookupConfig;
use foodscan_core::error::{ConfigError, LookupError};
use foodscan_core::metrics::{LOOKUP_FAILURES_TOTAL, LOOKUP_REQUESTS_TOTAL};
use foodscan_core::types::Product;

use crate::response::LookupEnvelope;

/// Trait abstracting the product lookup operation.
///
/// All lookups go through this trait, enabling testability via mocking.
/// The trait is `Send + Sync + 'static`, allowing safe sharing across
/// async tasks (the coordinator spawns one lookup task per admitted barcode).
///
/// # Implementations
///
/// - [`HttpLookupClient`]: Production implementation using `reqwest`
/// - [`MockLookupClient`]: Test implementation with scripted responses
pub trait ProductLookup: Send + Sync + 'static {
    /// Fetches the product record for a barcode.
    ///
    /// The barcode is not validated beyond URL encoding; the camera decoder
    /// is trusted to produce well-formed EAN-8/EAN-13/UPC-E/Code128 strings.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] classifying the failure. Nothing is retried.
    fn fetch_product(
        &self,
        barcode: &str,
    ) -> impl Future<Output = Result<Product, LookupError>> + Send;
}

/// Production lookup client backed by `reqwest`.
///
/// Issues `GET {base_url}/product/{barcode}.json` and decodes the response
/// envelope. Stateless beyond the connection pool; no caching.
pub struct HttpLookupClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLookupClient {
    /// Creates a client from the lookup configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the underlying HTTP client
    /// cannot be constructed from the configured timeout/user-agent.
    pub fn new(config: &LookupConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "lookup".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Builds the lookup URL, percent-encoding the barcode as a path segment.
    fn build_url(&self, barcode: &str) -> Result<Url, LookupError> {
        if barcode.is_empty() {
            return Err(LookupError::InvalidRequest {
                barcode: barcode.to_owned(),
            });
        }

        let mut url =
            Url::parse(&self.base_url).map_err(|_| LookupError::InvalidRequest {
                barcode: barcode.to_owned(),
            })?;

        url.path_segments_mut()
            .map_err(|()| LookupError::InvalidRequest {
                barcode: barcode.to_owned(),
            })?
            .push("product")
            .push(&format!("{barcode}.json"));

        Ok(url)
    }
}

impl ProductLookup for HttpLookupClient {
    async fn fetch_product(&self, barcode: &str) -> Result<Product, LookupError> {
        let url = self.build_url(barcode)?;
        debug!(barcode = barcode, url = %url, "fetching product");
        counter!(LOOKUP_REQUESTS_TOTAL).increment(1);

        let result = self.fetch_inner(barcode, url).await;
        if result.is_err() {
            counter!(LOOKUP_FAILURES_TOTAL).increment(1);
        }
        result
    }
}

impl HttpLookupClient {
    async fn fetch_inner(&self, barcode: &str, url: Url) -> Result<Product, LookupError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Transport {
                reason: e.to_string(),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Transport {
                reason: format!("server returned {status}"),
                status: Some(status.as_u16()),
            });
        }

        let body = response.bytes().await.map_err(|e| LookupError::Transport {
            reason: format!("failed to read response body: {e}"),
            status: None,
        })?;

        let envelope: LookupEnvelope =
            serde_json::from_slice(&body).map_err(|e| LookupError::Decode {
                reason: e.to_string(),
            })?;

        let product = envelope.into_product(barcode)?;
        debug!(barcode = barcode, product = %product, "product decoded");
        Ok(product)
    }
}

/// Test double with scripted responses.
///
/// Responses are consumed in FIFO order; once the script is exhausted every
/// call returns `LookupError::NotFound`. An optional per-call delay simulates
/// network latency so in-flight admission behavior can be exercised with
/// `tokio::time` test utilities.
pub struct MockLookupClient {
    responses: Mutex<VecDeque<Result<Product, LookupError>>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicU64,
    delay: Option<Duration>,
}

impl MockLookupClient {
    /// Creates a mock with an empty response script.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requested: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
            delay: None,
        }
    }

    /// Queues a response to be returned by the next unserved call.
    pub fn push_response(&self, response: Result<Product, LookupError>) {
        self.responses
            .lock()
            .expect("mock responses lock poisoned")
            .push_back(response);
    }

    /// Sets a delay applied before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of `fetch_product` calls made so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the barcodes requested so far, in call order.
    pub fn requested_barcodes(&self) -> Vec<String> {
        self.requested
            .lock()
            .expect("mock requested lock poisoned")
            .clone()
    }
}

impl Default for MockLookupClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductLookup for MockLookupClient {
    async fn fetch_product(&self, barcode: &str) -> Result<Product, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .expect("mock requested lock poisoned")
            .push(barcode.to_owned());

        let response = self
            .responses
            .lock()
            .expect("mock responses lock poisoned")
            .pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        response.unwrap_or_else(|| {
            Err(LookupError::NotFound {
                barcode: barcode.to_owned(),
            })
        })
    }
}
