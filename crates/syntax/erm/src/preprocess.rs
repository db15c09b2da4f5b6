//! Script preprocessing.
//!
//! Only physical lines starting with `!` carry script content. ERM commands
//! end at the first `;` outside a `^...^` string, VERM forms end when their
//! brackets balance; everything after that on the physical line is a comment.
//! An open string or bracket carries the logical line over to the next
//! physical line.

use crate::SyntaxError;
use serde::Serialize;
use tracing::debug;

/// Script dialect, selected by the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
    /// Line-oriented ERM (`ZVSE` header, or no header).
    Erm,
    /// ERM extended with S-expression lines (`VERM` header).
    Verm,
}

impl Dialect {
    fn from_header(line: &str) -> Option<Self> {
        match line.trim() {
            "ZVSE" => Some(Dialect::Erm),
            "VERM" => Some(Dialect::Verm),
            _ => None,
        }
    }
}

/// A normalized logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    /// 1-based physical line the logical line started on.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub dialect: Dialect,
    pub lines: Vec<SourceLine>,
}

struct Pending {
    text: String,
    start: usize,
    verm: bool,
    depth: usize,
    in_string: bool,
    string_start: usize,
}

impl Pending {
    fn is_open(&self) -> bool {
        self.in_string || (self.verm && self.depth > 0)
    }
}

/// Normalize raw script text into logical lines.
pub fn preprocess(source: &str) -> Result<Preprocessed, SyntaxError> {
    let mut physical = source
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text.trim_end_matches('\r')))
        .peekable();

    let dialect = match physical.peek().and_then(|(_, text)| Dialect::from_header(text)) {
        Some(dialect) => {
            physical.next();
            dialect
        }
        None => Dialect::Erm,
    };

    let mut lines = Vec::new();
    let mut current: Option<Pending> = None;

    for (no, raw) in physical {
        let mut pending = match current.take() {
            Some(mut pending) => {
                pending.text.push('\n');
                pending
            }
            None => {
                if raw.len() < 2 || !raw.starts_with('!') {
                    continue;
                }
                Pending {
                    text: String::new(),
                    start: no,
                    verm: raw[1..].starts_with('['),
                    depth: 0,
                    in_string: false,
                    string_start: no,
                }
            }
        };

        let mut end = raw.len();
        for (i, c) in raw.char_indices() {
            if pending.in_string {
                if c == '^' {
                    pending.in_string = false;
                }
                continue;
            }
            match c {
                '^' => {
                    pending.in_string = true;
                    pending.string_start = no;
                }
                '[' if pending.verm => pending.depth += 1,
                ']' if pending.verm => {
                    pending.depth = pending.depth.saturating_sub(1);
                    if pending.depth == 0 {
                        end = i + 1;
                        break;
                    }
                }
                ';' if !pending.verm => {
                    end = i + 1;
                    break;
                }
                _ => {}
            }
        }

        pending.text.push_str(&raw[..end]);

        if pending.is_open() {
            current = Some(pending);
        } else {
            lines.push(SourceLine {
                text: pending.text,
                line: pending.start,
            });
        }
    }

    if let Some(pending) = current {
        return Err(if pending.in_string {
            SyntaxError::Preprocess {
                line: pending.string_start,
                reason: "unterminated string literal".into(),
            }
        } else {
            SyntaxError::Preprocess {
                line: pending.start,
                reason: "unclosed '[' at end of script".into(),
            }
        });
    }

    debug!(?dialect, lines = lines.len(), "preprocessed script");
    Ok(Preprocessed { dialect, lines })
}
