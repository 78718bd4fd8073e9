//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout layers)
//!     → request.rs (buffer body under the size limit, collect route params)
//!     → DecisionEngine (per-resource decision graph)
//!     → response.rs (Outcome → axum Response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{BodyError, Request, RequestBody, RequestHead};
pub use response::Outcome;
pub use server::{AppState, HttpServer, X_REQUEST_ID};
