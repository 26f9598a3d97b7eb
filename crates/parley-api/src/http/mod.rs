//! HTTP/REST API layer for Parley.
//!
//! Axum-based JSON API at `/api/chat` consumed by the embeddable widget,
//! with permissive CORS and request tracing.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
