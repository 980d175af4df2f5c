//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch handler)
//!     → request.rs (host key, access key, raw query, request ID)
//!     → [routing decides: management or redirect]
//!     → response.rs (OtherResult emission, redirect write)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{
    extract_access_key, extract_host, raw_query_string, QueryParameters, UuidRequestId,
    X_FORWARDED_HOST, X_REQUEST_ID,
};
pub use response::{emit, redirect, OtherResult};
pub use server::{AppState, HttpServer};
