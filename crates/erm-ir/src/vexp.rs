//! VERM S-expression types.

use crate::{LineCommand, VOptionList};
use serde::Serialize;

/// A VERM literal value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Char(char),
    Int(i64),
    Double(f64),
    Str(String),
}

/// A node of a VERM expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VOption {
    Nil,
    Symbol(String),
    Literal(Literal),
    /// An ERM command embedded as a sub-expression.
    Command(Box<LineCommand>),
    Node(VNode),
}

impl VOption {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            VOption::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&VNode> {
        match self {
            VOption::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// Prefix modifiers of the VERM syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Modifier {
    /// `'`
    Quote,
    /// `` ` ``
    Backquote,
    /// `,`
    Comma,
    /// `,!`
    CommaSplice,
    /// `#'`
    FunctionRef,
}

impl Modifier {
    /// Symbol that heads the wrapping node built for this modifier.
    pub fn symbol(self) -> &'static str {
        match self {
            Modifier::Quote => "quote",
            Modifier::Backquote => "backquote",
            Modifier::Comma => "comma",
            Modifier::CommaSplice => "comma-unlist",
            Modifier::FunctionRef => "get-func",
        }
    }

    /// Source spelling.
    pub fn token(self) -> &'static str {
        match self {
            Modifier::Quote => "'",
            Modifier::Backquote => "`",
            Modifier::Comma => ",",
            Modifier::CommaSplice => ",!",
            Modifier::FunctionRef => "#'",
        }
    }
}

/// A bracketed VERM form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VNode {
    pub children: VOptionList,
}

impl VNode {
    pub fn new(children: impl Into<VOptionList>) -> Self {
        Self {
            children: children.into(),
        }
    }

    /// Builds `[first rest...]`.
    pub fn cons(first: VOption, rest: Vec<VOption>) -> Self {
        let mut children = Vec::with_capacity(rest.len() + 1);
        children.push(first);
        children.extend(rest);
        VNode::new(children)
    }

    /// Wraps `inner` in `[<modifier-symbol> inner]`.
    pub fn wrap(modifier: Modifier, inner: VOption) -> Self {
        let mut node = VNode::default();
        node.children.car().set(VOption::Symbol(modifier.symbol().to_string()));
        node.children.cdr().set(inner);
        node
    }

    /// Applies modifiers written before a form, outermost first:
    /// `` '`x `` becomes `[quote [backquote x]]`.
    pub fn with_modifiers(modifiers: &[Modifier], target: VOption) -> VOption {
        modifiers
            .iter()
            .rev()
            .fold(target, |inner, m| VOption::Node(VNode::wrap(*m, inner)))
    }
}
