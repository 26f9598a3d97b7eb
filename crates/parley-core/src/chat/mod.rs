//! Chat sessions: persistence port, conversation assembly, and the
//! request/response exchange that ties them to the model provider.

pub mod assembler;
pub mod service;
pub mod session;
pub mod store;
