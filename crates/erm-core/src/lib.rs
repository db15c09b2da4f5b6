//! Script index and compiler configuration for ERM scripts.

pub mod config;
pub mod index;

pub use config::{CompilerConfig, ConfigError, DEFAULT_RECEIVERS};
pub use index::{
    BucketSummary, IndexError, IndexSummary, LineClass, ScriptIndex, TriggerDecl, TriggerKind,
    POST_TRIGGER_SYMBOL, TRIGGER_SYMBOL,
};

#[cfg(test)]
mod tests;
