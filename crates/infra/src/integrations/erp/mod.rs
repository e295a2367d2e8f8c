/// Remote ERP integration
///
/// REST gateway to the external accounting system, implementing the
/// `ErpGateway` port from `orderbridge-core`.
///
/// # Architecture
///
/// - **Client**: `ErpClient` - REST client over the rate-limited `HttpClient`
/// - **Errors**: `ErpError` - response classification with retry metadata
/// - **Types**: wire payloads mirroring the remote's PascalCase document
///   shapes
///
/// # Authentication
///
/// Every call carries the caller-supplied bearer credential. Token
/// acquisition and refresh are out of scope; callers obtain credentials out
/// of band.
///
/// # Error Handling
///
/// - 404 on lookups: `Ok(None)` - absence is a branch signal upstream
/// - 409: `Conflict` - expected under creation races
/// - 429: retried once by the transport, then surfaced as `RateLimited`
/// - 5xx / transport failures: retried with backoff, then surfaced
pub mod client;
pub mod errors;
pub(crate) mod types;

pub use client::ErpClient;
pub use errors::{ErpError, ErpErrorCategory};
