//! Script index: line storage and trigger classification.
//!
//! The index owns every parsed line of one script and hands out
//! [`LinePointer`]s. Classification is a single pass over the lines that only
//! looks at the top-level shape of each line:
//!
//! - `!?XX` and `[trigger XX ...]` declare a trigger of kind `XX`
//! - `!$XX` and `[postTrigger XX ...]` declare a post-trigger
//! - comments are neither
//! - everything else is an instruction
//!
//! A trigger body is every line after the declaration up to the next trigger
//! or post-trigger declaration. Instructions outside any body form the
//! script's entry point.

use erm_ir::{CommandKind, Condition, Iexp, Line, LineCommand, LinePointer, Literal, VNode, VOption};
use erm_syntax::ParsedLine;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Head symbol of a VERM trigger declaration.
pub const TRIGGER_SYMBOL: &str = "trigger";
/// Head symbol of a VERM post-trigger declaration.
pub const POST_TRIGGER_SYMBOL: &str = "postTrigger";

const FUNCTION_KIND: &str = "FU";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("classification error at line {line}: {reason}")]
    Classification { line: usize, reason: String },

    #[error("semantic error at line {line}: {reason}")]
    Semantic { line: usize, reason: String },
}

impl IndexError {
    pub fn line(&self) -> usize {
        match self {
            IndexError::Classification { line, .. } | IndexError::Semantic { line, .. } => *line,
        }
    }
}

/// Registry key of a trigger bucket.
///
/// Numbered functions sort before named triggers; named kinds sort by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TriggerKind {
    /// `FU`: numbered functions, qualified by their identifier.
    Function,
    /// Any other two-letter event trigger (`TR`, `OB`, `TM`...).
    Named(String),
}

impl TriggerKind {
    pub fn from_name(name: &str) -> Self {
        if name == FUNCTION_KIND {
            TriggerKind::Function
        } else {
            TriggerKind::Named(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TriggerKind::Function => FUNCTION_KIND,
            TriggerKind::Named(name) => name,
        }
    }
}

/// Top-level shape of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LineClass {
    Comment,
    Trigger(TriggerKind),
    PostTrigger(TriggerKind),
    Instruction,
}

impl LineClass {
    pub fn is_declaration(&self) -> bool {
        matches!(self, LineClass::Trigger(_) | LineClass::PostTrigger(_))
    }
}

/// A trigger declaration, read uniformly from either dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDecl {
    pub pointer: LinePointer,
    pub name: String,
    pub identifiers: Vec<Iexp>,
    pub condition: Option<Condition>,
}

struct IndexedLine {
    pointer: LinePointer,
    line: Line,
    class: LineClass,
    /// Declaration whose body this line belongs to.
    owner: Option<LinePointer>,
}

/// Parsed lines of one script plus their classification.
pub struct ScriptIndex {
    lines: Vec<IndexedLine>,
    triggers: BTreeMap<TriggerKind, Vec<LinePointer>>,
    post_triggers: BTreeMap<TriggerKind, Vec<LinePointer>>,
    instructions: Vec<LinePointer>,
}

impl ScriptIndex {
    /// Store all lines, then classify them in one pass.
    pub fn build(parsed: Vec<ParsedLine>) -> Self {
        let line_count = parsed.len();
        let mut lines: Vec<IndexedLine> = parsed
            .into_iter()
            .enumerate()
            .map(|(index, parsed)| IndexedLine {
                pointer: LinePointer::new(line_count, index, parsed.real_line),
                line: parsed.line,
                class: LineClass::Comment,
                owner: None,
            })
            .collect();

        let mut triggers: BTreeMap<TriggerKind, Vec<LinePointer>> = BTreeMap::new();
        let mut post_triggers: BTreeMap<TriggerKind, Vec<LinePointer>> = BTreeMap::new();
        let mut instructions = Vec::new();
        let mut owner = None;

        for entry in &mut lines {
            entry.class = classify(&entry.line);
            match &entry.class {
                LineClass::Trigger(kind) => {
                    triggers.entry(kind.clone()).or_default().push(entry.pointer);
                    owner = Some(entry.pointer);
                }
                LineClass::PostTrigger(kind) => {
                    post_triggers
                        .entry(kind.clone())
                        .or_default()
                        .push(entry.pointer);
                    owner = Some(entry.pointer);
                }
                LineClass::Instruction => {
                    instructions.push(entry.pointer);
                    entry.owner = owner;
                }
                LineClass::Comment => entry.owner = owner,
            }
        }

        debug!(
            lines = line_count,
            triggers = triggers.values().map(Vec::len).sum::<usize>(),
            post_triggers = post_triggers.values().map(Vec::len).sum::<usize>(),
            instructions = instructions.len(),
            "indexed script"
        );

        Self {
            lines,
            triggers,
            post_triggers,
            instructions,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Pointer to the first line, if any.
    pub fn first(&self) -> Option<LinePointer> {
        self.lines.first().map(|entry| entry.pointer)
    }

    /// Pointer to the line after `ptr`, or `None` past the end.
    pub fn next(&self, ptr: LinePointer) -> Option<LinePointer> {
        self.lines.get(ptr.index() + 1).map(|entry| entry.pointer)
    }

    pub fn pointers(&self) -> impl Iterator<Item = LinePointer> + '_ {
        self.lines.iter().map(|entry| entry.pointer)
    }

    fn entry(&self, ptr: LinePointer) -> Option<&IndexedLine> {
        self.lines
            .get(ptr.index())
            .filter(|entry| entry.pointer == ptr)
    }

    /// Resolve a pointer handed out by this index.
    pub fn line(&self, ptr: LinePointer) -> Option<&Line> {
        self.entry(ptr).map(|entry| &entry.line)
    }

    pub fn class(&self, ptr: LinePointer) -> Option<&LineClass> {
        self.entry(ptr).map(|entry| &entry.class)
    }

    pub fn is_declaration(&self, ptr: LinePointer) -> bool {
        self.class(ptr).is_some_and(LineClass::is_declaration)
    }

    pub fn triggers(&self) -> &BTreeMap<TriggerKind, Vec<LinePointer>> {
        &self.triggers
    }

    pub fn post_triggers(&self) -> &BTreeMap<TriggerKind, Vec<LinePointer>> {
        &self.post_triggers
    }

    /// Every non-comment line that is not a declaration, in source order.
    pub fn instructions(&self) -> &[LinePointer] {
        &self.instructions
    }

    /// Instructions that precede the first declaration and so belong to no
    /// trigger body.
    pub fn entry_instructions(&self) -> impl Iterator<Item = LinePointer> + '_ {
        self.instructions
            .iter()
            .copied()
            .filter(|ptr| self.entry(*ptr).is_some_and(|entry| entry.owner.is_none()))
    }

    /// Lines of the body of the declaration at `decl`, comments included.
    pub fn body(&self, decl: LinePointer) -> Vec<LinePointer> {
        let mut body = Vec::new();
        let mut cursor = self.next(decl);
        while let Some(ptr) = cursor {
            if self.is_declaration(ptr) {
                break;
            }
            body.push(ptr);
            cursor = self.next(ptr);
        }
        body
    }

    /// Read the declaration at `ptr`.
    pub fn trigger_decl(&self, ptr: LinePointer) -> Result<TriggerDecl, IndexError> {
        let entry = self.entry(ptr).ok_or_else(|| IndexError::Classification {
            line: ptr.real_line(),
            reason: "line pointer does not belong to this script".into(),
        })?;
        if !entry.class.is_declaration() {
            return Err(IndexError::Classification {
                line: ptr.real_line(),
                reason: "line is not a trigger declaration".into(),
            });
        }

        match &entry.line {
            Line::Command(cmd) => Ok(TriggerDecl {
                pointer: ptr,
                name: cmd.name.clone(),
                identifiers: cmd.identifiers().to_vec(),
                condition: cmd.condition.clone(),
            }),
            Line::SExpression(node) => match node.children.first() {
                Some(VOption::Command(cmd)) => Ok(TriggerDecl {
                    pointer: ptr,
                    name: cmd.name.clone(),
                    identifiers: cmd.identifiers().to_vec(),
                    condition: cmd.condition.clone(),
                }),
                _ => verm_decl(node, ptr),
            },
            Line::Comment(_) => Err(IndexError::Classification {
                line: ptr.real_line(),
                reason: "comment classified as a declaration".into(),
            }),
        }
    }

    /// Serializable view of the classification.
    pub fn summary(&self) -> IndexSummary {
        let bucket = |map: &BTreeMap<TriggerKind, Vec<LinePointer>>| {
            map.iter()
                .map(|(kind, ptrs)| BucketSummary {
                    kind: kind.name().to_string(),
                    lines: ptrs.iter().map(LinePointer::real_line).collect(),
                })
                .collect()
        };
        IndexSummary {
            lines: self.len(),
            triggers: bucket(&self.triggers),
            post_triggers: bucket(&self.post_triggers),
            instructions: self.instructions.iter().map(LinePointer::real_line).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketSummary {
    pub kind: String,
    pub lines: Vec<usize>,
}

/// Classification of one script, keyed by source line numbers.
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub lines: usize,
    pub triggers: Vec<BucketSummary>,
    pub post_triggers: Vec<BucketSummary>,
    pub instructions: Vec<usize>,
}

/// Forms that only look like declarations, such as `[trigger 5]`, stay instructions.
fn classify(line: &Line) -> LineClass {
    match line {
        Line::Comment(_) => LineClass::Comment,
        Line::Command(cmd) => classify_command(cmd),
        Line::SExpression(node) => match (node.children.first(), verm_name(node)) {
            (Some(VOption::Command(cmd)), _) => classify_command(cmd),
            (Some(VOption::Symbol(head)), Some(name)) if head == TRIGGER_SYMBOL => {
                LineClass::Trigger(TriggerKind::from_name(name))
            }
            (Some(VOption::Symbol(head)), Some(name)) if head == POST_TRIGGER_SYMBOL => {
                LineClass::PostTrigger(TriggerKind::from_name(name))
            }
            _ => LineClass::Instruction,
        },
    }
}

fn classify_command(cmd: &LineCommand) -> LineClass {
    match cmd.kind {
        CommandKind::Trigger => LineClass::Trigger(TriggerKind::from_name(&cmd.name)),
        CommandKind::PostTrigger => LineClass::PostTrigger(TriggerKind::from_name(&cmd.name)),
        CommandKind::Instruction | CommandKind::Receiver => LineClass::Instruction,
    }
}

fn verm_name(node: &VNode) -> Option<&str> {
    node.children.get(1).and_then(VOption::as_symbol)
}

fn verm_decl(node: &VNode, ptr: LinePointer) -> Result<TriggerDecl, IndexError> {
    let name = verm_name(node).ok_or_else(|| IndexError::Classification {
        line: ptr.real_line(),
        reason: "trigger declaration requires a trigger name".into(),
    })?;
    let identifiers = node.children.as_slice()[2..]
        .iter()
        .map(|child| match child {
            VOption::Literal(Literal::Int(n)) => {
                i32::try_from(*n)
                    .map(Iexp::Constant)
                    .map_err(|_| IndexError::Semantic {
                        line: ptr.real_line(),
                        reason: format!("trigger identifier {} out of range", n),
                    })
            }
            _ => Err(IndexError::Semantic {
                line: ptr.real_line(),
                reason: "trigger identifiers must be integer literals".into(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TriggerDecl {
        pointer: ptr,
        name: name.to_string(),
        identifiers,
        condition: None,
    })
}
