//! Shared domain types for Parley.
//!
//! This crate contains the types every layer agrees on: chat sessions and
//! their messages, LLM request/stream shapes, the error taxonomy, and the
//! deployment configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
