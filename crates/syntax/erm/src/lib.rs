//! ERM/VERM preprocessor and parser.
//!
//! Raw script text is first normalized into logical lines (comments dropped,
//! multi-line strings and S-expressions joined), then each logical line is
//! parsed on its own into an [`erm_ir::Line`].

mod parser;
mod preprocess;

pub use parser::{parse, ParsedLine, DEFAULT_MAX_DEPTH};
pub use preprocess::{preprocess, Dialect, Preprocessed, SourceLine};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("preprocess error at line {line}: {reason}")]
    Preprocess { line: usize, reason: String },

    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl SyntaxError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Preprocess { line, .. } | SyntaxError::Parse { line, .. } => *line,
        }
    }
}

/// Preprocess and parse a whole script.
pub fn parse_source(
    source: &str,
    max_depth: usize,
) -> Result<(Dialect, Vec<ParsedLine>), SyntaxError> {
    let preprocessed = preprocess(source)?;
    let lines = parse(&preprocessed, max_depth)?;
    Ok((preprocessed.dialect, lines))
}

#[cfg(test)]
mod tests;
