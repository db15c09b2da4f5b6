//! Lua backend for ERM scripts.
//!
//! [`load_script`] runs the whole pipeline for one script: preprocess, parse,
//! index, then generate a Lua chunk for the embedded runtime. The chunk
//! requires the runtime helper modules named in [`CompilerConfig`] and is
//! returned as a single string; any failure aborts the script.

mod codegen;

pub use codegen::{generate, CompileError};

use erm_core::{CompilerConfig, IndexError, ScriptIndex};
use erm_syntax::SyntaxError;
use mlua::Lua;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Pipeline stage that rejected a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Parse,
    Classification,
    Semantic,
    Unsupported,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preprocess => "preprocess",
            Stage::Parse => "parse",
            Stage::Classification => "classification",
            Stage::Semantic => "semantic",
            Stage::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Syntax(SyntaxError::Preprocess { .. }) => Stage::Preprocess,
            StageError::Syntax(SyntaxError::Parse { .. }) => Stage::Parse,
            StageError::Compile(CompileError::Index(err)) => match err {
                IndexError::Classification { .. } => Stage::Classification,
                IndexError::Semantic { .. } => Stage::Semantic,
            },
            StageError::Compile(CompileError::Semantic { .. }) => Stage::Semantic,
            StageError::Compile(CompileError::Unsupported { .. }) => Stage::Unsupported,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            StageError::Syntax(err) => err.line(),
            StageError::Compile(err) => err.line(),
        }
    }
}

/// The single failure result of [`load_script`].
#[derive(Debug, Error)]
#[error("{script}: {source}")]
pub struct LoadError {
    pub script: String,
    pub stage: Stage,
    pub line: usize,
    #[source]
    pub source: StageError,
}

impl LoadError {
    fn new(script: &str, source: impl Into<StageError>) -> Self {
        let source = source.into();
        Self {
            script: script.to_string(),
            stage: source.stage(),
            line: source.line(),
            source,
        }
    }
}

/// Translate one script into a Lua chunk.
pub fn load_script(name: &str, source: &str, config: &CompilerConfig) -> Result<String, LoadError> {
    let preprocessed = erm_syntax::preprocess(source).map_err(|e| LoadError::new(name, e))?;
    let lines = erm_syntax::parse(&preprocessed, config.max_nesting_depth)
        .map_err(|e| LoadError::new(name, e))?;
    let index = ScriptIndex::build(lines);
    let code =
        generate(&index, preprocessed.dialect, config).map_err(|e| LoadError::new(name, e))?;
    debug!(script = name, bytes = code.len(), "generated lua chunk");
    Ok(code)
}

/// Compile a generated chunk with LuaJIT without running it.
pub fn check_syntax(name: &str, code: &str) -> Result<(), mlua::Error> {
    let lua = Lua::new();
    lua.load(code).set_name(name).into_function()?;
    Ok(())
}
