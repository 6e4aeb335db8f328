//! REST implementation of the Certihub document gateway.
//!
//! Talks to a document-store HTTP API rooted at `/v1/users/{uid}/...` and
//! approximates live subscriptions by polling, emitting a snapshot event only
//! when the remote payload actually changed.

pub mod client;
pub mod config;

pub use client::RestDocumentGateway;
pub use config::RestGatewayConfig;
