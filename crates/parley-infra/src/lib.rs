//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: SQLite and
//! in-memory session stores, the OpenAI-compatible model provider, and the
//! configuration loader.

pub mod config;
pub mod llm;
pub mod memory;
pub mod sqlite;
pub mod store;
