//! Drive Mail.app through its scripting interpreter.
//!
//! The [`bridge`] renders or resolves a script, runs it as a child process
//! under a timeout, classifies the outcome, and parses the text it prints.
//! [`operations`] is the catalog of mail operations built on it, and
//! [`server`] exposes that catalog to remote callers.

pub mod bridge;
pub mod config;
pub mod error;
pub mod operations;
pub mod printer;
pub mod server;

pub use bridge::{Bridge, EmailRecord, ExecutionOutcome, ScriptArg, ScriptInvocation};
pub use error::BridgeError;
