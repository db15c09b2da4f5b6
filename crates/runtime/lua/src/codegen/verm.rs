//! VERM form lowering.
//!
//! Forms become nested Lua tables that the VERM runtime evaluates:
//! `[f a 1]` is `{'f', 'a', 1}`. Symbols become strings, nil and `[]` become
//! `{}`. A form must be headed by a symbol or another form.

use super::{lua_long_string, lua_quote, LowerError};
use erm_ir::{Literal, VNode, VOption};

/// Lower a top-level form.
pub(crate) fn lower_form(node: &VNode, max_depth: usize) -> Result<String, LowerError> {
    lower_node(node, 0, max_depth)
}

fn lower_node(node: &VNode, depth: usize, max_depth: usize) -> Result<String, LowerError> {
    if depth >= max_depth {
        return Err(LowerError::semantic(format!(
            "expression nested deeper than {} levels",
            max_depth
        )));
    }
    let Some(head) = node.children.first() else {
        return Ok("{}".to_string());
    };
    match head {
        VOption::Symbol(_) | VOption::Node(_) => {}
        VOption::Nil => return Err(LowerError::semantic("cannot apply nil")),
        VOption::Literal(_) => return Err(LowerError::semantic("cannot apply a literal")),
        VOption::Command(_) => return Err(embedded_command()),
    }

    let items = node
        .children
        .iter()
        .map(|child| lower_option(child, depth, max_depth))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{{{}}}", items.join(", ")))
}

fn lower_option(option: &VOption, depth: usize, max_depth: usize) -> Result<String, LowerError> {
    match option {
        VOption::Nil => Ok("{}".to_string()),
        VOption::Symbol(name) => Ok(lua_quote(name)),
        VOption::Literal(literal) => Ok(lower_literal(literal)),
        VOption::Command(_) => Err(embedded_command()),
        VOption::Node(node) => lower_node(node, depth + 1, max_depth),
    }
}

fn lower_literal(literal: &Literal) -> String {
    match literal {
        Literal::Char(c) => lua_quote(&c.to_string()),
        Literal::Int(n) => n.to_string(),
        // Handle special float values
        Literal::Double(d) if d.is_nan() => "(0/0)".to_string(),
        Literal::Double(d) if d.is_infinite() && *d > 0.0 => "(1/0)".to_string(),
        Literal::Double(d) if d.is_infinite() => "(-1/0)".to_string(),
        Literal::Double(d) => d.to_string(),
        Literal::Str(text) => lua_long_string(text),
    }
}

fn embedded_command() -> LowerError {
    LowerError::semantic("Using ERM options in VERM expression is not (yet) allowed")
}
