//! Resource engine library.
//!
//! HTTP resources described as data and evaluated by a decision graph:
//! content negotiation, conditional requests and a versioned in-memory store.

pub mod conditional;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod negotiation;
pub mod observability;
pub mod resource;
pub mod resources;
pub mod store;

pub use config::schema::ServiceConfig;
pub use engine::DecisionEngine;
pub use error::{ResourceError, ResourceResult};
pub use http::{HttpServer, Outcome, Request};
pub use lifecycle::Shutdown;
pub use resource::{Action, DecisionPoint, Handler, ResourceDescriptor};
pub use store::ResourceStore;
