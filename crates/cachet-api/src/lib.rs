//! cachet-api: status-page client for the monitoring engine.
//!
//! The engine talks to the status page exclusively through the
//! [`StatusPage`] trait. [`CachetClient`] implements it over the Cachet v1
//! REST API; [`HttpTransport`] is the small hyper + rustls client it is
//! built on, shared with the HTTP probe.
//!
//! # Architecture
//!
//! ```text
//! StatusPage (trait, boxed futures)
//!   ├── CachetClient ── HttpTransport ── hyper http1 ── TCP / rustls
//!   └── FakeStatusPage (feature "test-util")
//! ```

pub mod cachet;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod transport;

#[cfg(test)]
mod test_server;

pub use cachet::CachetClient;
pub use client::{ApiFuture, StatusPage};
pub use error::{ApiError, ApiResult};
#[cfg(any(test, feature = "test-util"))]
pub use fake::{Call, FakeStatusPage};
pub use transport::{HttpResponse, HttpTransport};
