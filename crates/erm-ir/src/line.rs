//! ERM line types.

use crate::VNode;
use serde::Serialize;

/// One logical script line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Line {
    /// Comment text, without the leading `!`.
    Comment(String),
    /// A line-oriented ERM command.
    Command(LineCommand),
    /// A VERM S-expression.
    SExpression(VNode),
}

impl Line {
    /// Returns the command if this is an ERM command line.
    pub fn as_command(&self) -> Option<&LineCommand> {
        match self {
            Line::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Line::Comment(_))
    }
}

/// The four ERM command families, selected by the character after `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandKind {
    /// `!?XX` - event trigger or function declaration.
    Trigger,
    /// `!$XX` - deferred trigger declaration.
    PostTrigger,
    /// `!#XX` - instruction, body required.
    Instruction,
    /// `!!XX` - receiver, body optional.
    Receiver,
}

impl CommandKind {
    pub fn is_trigger(self) -> bool {
        matches!(self, CommandKind::Trigger | CommandKind::PostTrigger)
    }
}

/// An ERM command: receiver name, identifier list, condition and body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineCommand {
    pub kind: CommandKind,
    pub name: String,
    pub identifier: Option<Vec<Iexp>>,
    pub condition: Option<Condition>,
    pub body: Option<Vec<BodyOption>>,
}

impl LineCommand {
    /// Identifier list, empty when the command has none.
    pub fn identifiers(&self) -> &[Iexp] {
        self.identifier.as_deref().unwrap_or(&[])
    }
}

/// A variable reference that is not a constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VarExp {
    /// `v5`, `vy2`, `f`: one or more bank letters and an optional index.
    Indexed { bank: String, index: Option<i32> },
    /// `$name$`
    Macro(String),
}

/// Integer expression: a constant or a variable reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Iexp {
    Constant(i32),
    Var(VarExp),
}

impl Iexp {
    pub fn as_constant(&self) -> Option<i32> {
        match self {
            Iexp::Constant(n) => Some(*n),
            Iexp::Var(_) => None,
        }
    }
}

/// A single parameter of a normal body option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BodyItem {
    /// `v1+v2`
    Concat(VarExp, VarExp),
    /// `5^text^`
    Curried(Iexp, String),
    /// `^text^`
    Str(String),
    /// `>=5`
    SemiCompare(String, Iexp),
    /// `@name@`
    MacroDef(String),
    /// `?v1` - a write-back target.
    Varp(VarExp),
    Iexp(Iexp),
    /// An empty slot between separators.
    Nothing,
}

impl BodyItem {
    /// Human readable name of the construct, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            BodyItem::Concat(..) => "String concatenation",
            BodyItem::Curried(..) => "Curried string",
            BodyItem::Str(_) => "String constant",
            BodyItem::SemiCompare(..) => "Semi comparison",
            BodyItem::MacroDef(_) => "Macro definition",
            BodyItem::Varp(_) => "Varp expression",
            BodyItem::Iexp(_) => "i-expression",
            BodyItem::Nothing => "'Nothing'",
        }
    }
}

/// One option of a command body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BodyOption {
    /// VR bitwise mutation: `&`, `|` or `X` followed by an operand.
    Logic { op: char, rhs: Iexp },
    /// VR arithmetic mutation: `+`, `-`, `*`, `:` or `%` followed by an operand.
    Arithmetic { op: char, rhs: Iexp },
    /// Upper-case option code followed by `/`-separated parameters.
    Normal { code: char, params: Vec<BodyItem> },
}

/// A condition atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CondAtom {
    /// Flag index; negative values test the flag for being unset.
    Flag(i32),
    Compare { lhs: Iexp, op: String, rhs: Iexp },
}

/// One connector and the atom it introduces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CondLink {
    pub connector: char,
    pub atom: CondAtom,
}

/// A condition chain such as `&1/2|v3>5`, stored left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub links: Vec<CondLink>,
}
