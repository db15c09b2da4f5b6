//! Condition chain lowering.
//!
//! Connectors are applied strictly left to right. `/` continues the current
//! connector, and switching between `&` and `|` parenthesizes everything
//! lowered so far: `&1/2/3|4` becomes `(F['1'] and F['2'] and F['3']) or F['4']`.

use super::{LowerError, Scope};
use erm_ir::{CondAtom, Condition};

fn lua_connector(connector: char) -> Option<&'static str> {
    match connector {
        '&' => Some("and"),
        '|' => Some("or"),
        _ => None,
    }
}

fn lua_comparison(op: &str) -> Result<&'static str, LowerError> {
    match op {
        "<" => Ok("<"),
        ">" => Ok(">"),
        "=" | "==" => Ok("=="),
        ">=" | "=>" => Ok(">="),
        "<=" | "=<" => Ok("<="),
        "<>" | "><" => Ok("~="),
        _ => Err(LowerError::semantic(format!(
            "unknown comparison sign '{}'",
            op
        ))),
    }
}

fn lower_atom(atom: &CondAtom, scope: &Scope) -> Result<String, LowerError> {
    match atom {
        CondAtom::Flag(flag) if *flag < 0 => Ok(format!("not F['{}']", flag.unsigned_abs())),
        CondAtom::Flag(flag) => Ok(format!("F['{}']", flag)),
        CondAtom::Compare { lhs, op, rhs } => Ok(format!(
            "({} {} {})",
            scope.iexp(lhs),
            lua_comparison(op)?,
            scope.iexp(rhs)
        )),
    }
}

pub(crate) fn lower_condition(cond: &Condition, scope: &Scope) -> Result<String, LowerError> {
    let mut links = cond.links.iter();
    let first = links
        .next()
        .ok_or_else(|| LowerError::semantic("empty condition"))?;
    let mut current = lua_connector(first.connector)
        .ok_or_else(|| LowerError::semantic("Wrong condition connection"))?;
    let mut expr = lower_atom(&first.atom, scope)?;

    for link in links {
        let atom = lower_atom(&link.atom, scope)?;
        match link.connector {
            '/' => expr = format!("{} {} {}", expr, current, atom),
            connector => {
                let op = lua_connector(connector)
                    .ok_or_else(|| LowerError::semantic("Wrong condition connection"))?;
                if op == current {
                    expr = format!("{} {} {}", expr, op, atom);
                } else {
                    expr = format!("({}) {} {}", expr, op, atom);
                    current = op;
                }
            }
        }
    }
    Ok(expr)
}
