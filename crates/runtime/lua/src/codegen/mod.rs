//! ERM script to Lua code generation.

mod condition;
mod do_loop;
mod fu;
mod generic;
mod mc;
mod triggers;
mod variables;
mod verm;
mod vr;

use erm_core::{CompilerConfig, IndexError, ScriptIndex};
use erm_ir::{Line, LineCommand, LinePointer};
use erm_syntax::Dialect;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub(crate) use condition::lower_condition;
pub(crate) use variables::{MacroTable, Scope};

/// Errors that can occur during generation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("semantic error at line {line}: {reason}")]
    Semantic { line: usize, reason: String },

    #[error("unsupported feature at line {line}: {feature}")]
    Unsupported { line: usize, feature: String },

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            CompileError::Semantic { line, .. } | CompileError::Unsupported { line, .. } => *line,
            CompileError::Index(err) => err.line(),
        }
    }
}

/// Error raised while lowering a single line; the walker adds the line number.
#[derive(Debug, Error)]
pub(crate) enum LowerError {
    #[error("{0}")]
    Semantic(String),

    #[error("{0} not implemented")]
    Unsupported(String),
}

impl LowerError {
    pub(crate) fn semantic(reason: impl Into<String>) -> Self {
        LowerError::Semantic(reason.into())
    }

    fn at(self, ptr: LinePointer) -> CompileError {
        let line = ptr.real_line();
        match self {
            LowerError::Semantic(reason) => CompileError::Semantic { line, reason },
            LowerError::Unsupported(feature) => CompileError::Unsupported {
                line,
                feature: format!("{} not implemented", feature),
            },
        }
    }
}

/// Lua reserved keywords that need escaping.
fn lua_keywords() -> HashSet<&'static str> {
    [
        "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
        "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
    ]
    .into_iter()
    .collect()
}

pub(crate) fn is_lua_keyword(name: &str) -> bool {
    lua_keywords().contains(name)
}

/// Convert a receiver name to a safe Lua identifier.
pub(crate) fn to_lua_name(name: &str) -> String {
    let mut safe: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    // Cannot start with digit
    if safe.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        safe = format!("_{}", safe);
    }

    if is_lua_keyword(&safe) {
        format!("_{}", safe)
    } else {
        safe
    }
}

pub(crate) fn lua_string_literal(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("\"{}\"", escaped)
}

/// Single-quoted Lua string, used for table keys and names.
pub(crate) fn lua_quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("'{}'", escaped)
}

/// Long-bracket Lua string. Script text is copied verbatim, so the bracket
/// level grows until the closing bracket cannot appear in the text.
pub(crate) fn lua_long_string(s: &str) -> String {
    let mut level = 3;
    loop {
        let eq = "=".repeat(level);
        let close = format!("]{}]", eq);
        if !s.contains(&close) {
            return format!("[{}[{}{}", eq, s, close);
        }
        level += 1;
    }
}

/// Line-based output buffer with block indentation.
#[derive(Debug, Default)]
pub(crate) struct Emitter {
    out: String,
    depth: usize,
}

impl Emitter {
    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Emit a block opener and indent what follows.
    pub(crate) fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedent and emit a block closer.
    pub(crate) fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Emit a line between two blocks at the enclosing depth.
    pub(crate) fn branch(&mut self, text: impl AsRef<str>) {
        self.close(text);
        self.depth += 1;
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Per-script generation state.
pub(crate) struct Generator<'a> {
    index: &'a ScriptIndex,
    config: &'a CompilerConfig,
    dialect: Dialect,
    macros: MacroTable,
    out: Emitter,
}

/// Generate the Lua chunk for an indexed script.
pub fn generate(
    index: &ScriptIndex,
    dialect: Dialect,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    let macros = MacroTable::collect(index);
    debug!(macros = macros.len(), "collected macro bindings");

    let mut generator = Generator {
        index,
        config,
        dialect,
        macros,
        out: Emitter::default(),
    };
    generator.preamble();
    generator.entry_point()?;
    generator.functions()?;
    generator.named_triggers()?;
    generator.post_triggers();
    generator.out.line("ERM:callInstructions(instructions)");
    Ok(generator.out.finish())
}

impl Generator<'_> {
    /// Lower a sequence of lines into the current block.
    fn lower_lines(
        &mut self,
        lines: impl IntoIterator<Item = LinePointer>,
    ) -> Result<(), CompileError> {
        // one entry per open `if`, set once its `el` has been seen
        let mut open_ifs: Vec<bool> = Vec::new();
        let mut last = None;
        for ptr in lines {
            last = Some(ptr);
            let index = self.index;
            let line = index.line(ptr).ok_or_else(|| IndexError::Classification {
                line: ptr.real_line(),
                reason: "line pointer does not resolve".into(),
            })?;
            match line {
                Line::Comment(text) => {
                    for part in text.lines() {
                        self.out.line(format!("-- {}", part));
                    }
                }
                Line::Command(cmd) => self
                    .lower_command(cmd, ptr, &mut open_ifs)
                    .map_err(|e| e.at(ptr))?,
                Line::SExpression(node) => {
                    let expr = verm::lower_form(node, self.config.max_nesting_depth)
                        .map_err(|e| e.at(ptr))?;
                    self.out.line(format!("VERM:eval({})", expr));
                }
            }
        }
        if !open_ifs.is_empty() {
            if let Some(ptr) = last {
                return Err(LowerError::semantic("'if' block is not closed by 'en'").at(ptr));
            }
        }
        Ok(())
    }

    fn lower_command(
        &mut self,
        cmd: &LineCommand,
        at: LinePointer,
        open_ifs: &mut Vec<bool>,
    ) -> Result<(), LowerError> {
        let scope = Scope {
            macros: &self.macros,
            config: self.config,
            at,
        };
        let condition = cmd
            .condition
            .as_ref()
            .map(|cond| lower_condition(cond, &scope))
            .transpose()?;

        match cmd.name.as_str() {
            "if" => {
                let condition = condition.as_deref().unwrap_or("true");
                self.out.open(format!("if {} then", condition));
                open_ifs.push(false);
                return Ok(());
            }
            "el" => {
                match open_ifs.last_mut() {
                    None => return Err(LowerError::semantic("'el' without a matching 'if'")),
                    Some(true) => {
                        return Err(LowerError::semantic("'el' repeated in the same 'if' block"));
                    }
                    Some(seen_else) => *seen_else = true,
                }
                self.out.branch("else");
                return Ok(());
            }
            "en" => {
                if open_ifs.pop().is_none() {
                    return Err(LowerError::semantic("'en' without a matching 'if'"));
                }
                self.out.close("end");
                return Ok(());
            }
            _ => {}
        }

        if let Some(condition) = &condition {
            self.out.open(format!("if {} then", condition));
        }
        let out = &mut self.out;
        match cmd.name.as_str() {
            "VR" => vr::lower_vr(cmd, &scope, out)?,
            "FU" => fu::lower_fu(cmd, &scope, out)?,
            "MC" => mc::lower_mc(cmd, &scope, out)?,
            "DO" => do_loop::lower_do(cmd, &scope, out)?,
            _ => generic::lower_generic(cmd, &scope, out)?,
        }
        if condition.is_some() {
            self.out.close("end");
        }
        Ok(())
    }
}
