//! Business logic and port trait definitions for Parley.
//!
//! This crate defines the "ports" (`SessionStore`, `LlmProvider`) that the
//! infrastructure layer implements, plus the conversation assembler and the
//! exchange service built on top of them. It depends only on `parley-types`
//! -- never on `parley-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
