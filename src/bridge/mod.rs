//! The automation bridge: render, run, classify, parse.
//!
//! Both invocation modes go through the same [`Invoker`] and the same
//! [`parser`] functions.

use std::time::Duration;

pub mod invoker;
pub mod marshal;
pub mod parser;
pub mod template;

pub use invoker::{ExecutionOutcome, Interpreter, Invoker, ScriptInvocation};
pub use marshal::ScriptArg;
pub use parser::EmailRecord;
pub use template::TemplateStore;

use crate::{config::Config, error::Result};

/// A template store paired with an invoker.
#[derive(Debug, Clone)]
pub struct Bridge {
    store: TemplateStore,
    invoker: Invoker,
}

impl Bridge {
    pub fn new(store: TemplateStore, invoker: Invoker) -> Self {
        Self { store, invoker }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let interpreter = Interpreter::new(cfg.interpreter(), cfg.inline_flag());
        Self::new(
            TemplateStore::new(cfg.script_root()),
            Invoker::new(interpreter, cfg.timeout()),
        )
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.invoker.timeout()
    }

    /// Run one invocation and return its outcome.
    pub async fn run(&self, invocation: &ScriptInvocation) -> Result<ExecutionOutcome> {
        self.invoker.run(&self.store, invocation).await
    }

    /// Run one invocation and return captured stdout, or the failure as an
    /// error.
    pub async fn execute(&self, invocation: &ScriptInvocation) -> Result<String> {
        let outcome = self.run(invocation).await?;
        outcome.into_result(&self.invoker.interpreter().program, self.invoker.timeout())
    }
}
