//! LLM provider abstractions for Parley.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `collect_reply`: drains a provider stream into one reply, bounded by a
//!   timeout and a cancellation token

pub mod box_provider;
pub mod collect;
pub mod provider;
