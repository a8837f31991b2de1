//! Utility modules supporting catalog calls and book matching.
//!
//! - [`with_timeout`]: Bound a call by a deadline, OR'd with a cancellation token
//! - [`with_retry`]: Repeat a call with exponential backoff and jitter on transient errors
//! - [`RetryPolicy`]: Retry configuration, with `quick`, `standard`, `patient` and `none` presets
//! - [`HttpClient`]: Shared HTTP client; `get_json` composes retry and timeout
//! - [`isbn`]: ISBN detection and ISBN-10 / ISBN-13 conversion
//! - [`text`]: Diacritic folding and key normalization
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use shelf_scout::catalogs::CatalogError;
//! use shelf_scout::utils::{standard_retry_policy, with_retry, with_timeout};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn fetch() -> Result<String, CatalogError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), CatalogError> {
//! let cancel = CancellationToken::new();
//! let policy = standard_retry_policy();
//! let data = with_retry(&policy, &cancel, || {
//!     with_timeout(fetch(), Duration::from_secs(8), Some(&cancel))
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod http;
pub mod isbn;
mod retry;
pub mod text;
mod timeout;

pub use http::{HttpClient, DEFAULT_REQUEST_TIMEOUT};
pub use isbn::{alternate_isbn, clean_isbn, extract_isbn13, is_isbn, to_isbn10, to_isbn13};
pub use retry::{
    no_retry_policy, patient_retry_policy, quick_retry_policy, retry_policy_named,
    standard_retry_policy, with_retry, RetryPolicy, DEFAULT_RETRYABLE_STATUS_CODES, MAX_JITTER,
};
pub use timeout::with_timeout;
