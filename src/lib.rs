//! # vultr-rest - Vultr v2 REST API core
//!
//! vultr-rest issues calls against the Vultr API and hands every outcome back
//! in one shape: `Result<SuccessResponse, ErrorResponse>`. Network failures,
//! HTML error pages, malformed JSON and provider error messages all end up as
//! an [`ErrorResponse`] with a status code and a readable message; successful
//! responses have Vultr's single-key envelope (`{"instance": {...}}`) removed
//! and pagination metadata split out.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vultr_rest::{endpoints, Client, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .credentials(Credentials::from_env()?)
//!         .build()?;
//!
//!     let path = endpoints::INSTANCE
//!         .assign("instance-id", "cb676a46-66fd-4dfb-b839-443f2e6c0b60")
//!         .path()?;
//!
//!     match client.get(path).await {
//!         Ok(instance) => println!("Instance: {:?}", instance.data),
//!         Err(failure) => eprintln!("{} ({})", failure.error, failure.status_code),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Uniform results** - one success type and one failure type for every endpoint
//! - **Envelope unwrapping** - single-key payloads are unwrapped, `meta` is kept aside
//! - **Immutable request descriptors** - built once, safe to share, log and re-run
//! - **Pluggable transport** - reqwest by default, any [`Transport`] for tests or embedding
//! - **Explicit credentials** - the API key is injected, never read implicitly
//! - **Opt-in retries** - exponential, linear or custom strategies on the client
//! - **Structured logging** - `tracing` events at each decision point
//!
//! ## Lower-level use
//!
//! [`execute`] works without a [`Client`]: build a [`RequestDescriptor`] and
//! pass it with any transport.
//!
//! ```no_run
//! use vultr_rest::{execute, Method, ReqwestTransport, RequestDescriptor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/plans")?
//!     .method(Method::Get)
//!     .header("Authorization", "Bearer my-api-key")?
//!     .query("type", "vc2")
//!     .build();
//!
//! let plans = execute(&ReqwestTransport::new()?, &descriptor).await?;
//! println!("{} plans", plans.meta.map(|m| m.total).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod client;
mod credentials;
pub mod endpoints;
mod error;
mod normalize;
mod request;
mod response;
pub mod retry;
mod transport;

pub use client::{Client, ClientBuilder};
pub use credentials::{Credentials, API_KEY_ENV};
pub use error::{Error, ErrorResponse, Result, TransportError};
pub use normalize::execute;
pub use request::{Method, ParamValue, RequestBuilder, RequestDescriptor};
pub use response::{ApiResult, Meta, SuccessResponse};
pub use retry::{RetryPredicate, RetryStrategy};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
