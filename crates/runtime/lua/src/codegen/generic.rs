//! Receivers without bespoke lowering.
//!
//! `!!HE1:B1/?v2;` becomes
//!
//! ```lua
//! do
//!   local HE = ERM.HE(1)
//!   _, v['2'] = HE:B(x, 1, nil)
//! end
//! ```

use super::{is_lua_keyword, lua_long_string, lua_quote, to_lua_name, Emitter, LowerError, Scope};
use erm_ir::{BodyItem, BodyOption, LineCommand};

fn lower_option(
    local: &str,
    code: char,
    params: &[BodyItem],
    scope: &Scope,
) -> Result<String, LowerError> {
    let mut inputs = vec!["x".to_string()];
    let mut outputs = Vec::new();
    for param in params {
        match param {
            BodyItem::Iexp(value) => {
                inputs.push(scope.iexp(value));
                outputs.push("_".to_string());
            }
            BodyItem::Str(text) => {
                inputs.push(lua_long_string(text));
                outputs.push("_".to_string());
            }
            BodyItem::Varp(dest) => {
                inputs.push("nil".to_string());
                outputs.push(scope.var(dest));
            }
            other => {
                return Err(LowerError::semantic(format!(
                    "{} not allowed in this receiver",
                    other.describe()
                )));
            }
        }
    }

    let call = format!("{}:{}({})", local, code, inputs.join(", "));
    if outputs.iter().any(|o| o != "_") {
        Ok(format!("{} = {}", outputs.join(", "), call))
    } else {
        Ok(call)
    }
}

pub(crate) fn lower_generic(
    cmd: &LineCommand,
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    if !scope.config.accepts_receiver(&cmd.name) {
        return Err(LowerError::semantic(format!(
            "unknown receiver '{}'",
            cmd.name
        )));
    }

    let local = to_lua_name(&cmd.name);
    let constructor = if is_lua_keyword(&cmd.name) {
        format!("ERM[{}]", lua_quote(&cmd.name))
    } else {
        format!("ERM.{}", cmd.name)
    };
    let args: Vec<String> = cmd.identifiers().iter().map(|id| scope.iexp(id)).collect();

    let mut calls = Vec::new();
    for option in cmd.body.iter().flatten() {
        match option {
            BodyOption::Normal { code, params } => {
                calls.push(lower_option(&local, *code, params, scope)?);
            }
            BodyOption::Logic { op, .. } | BodyOption::Arithmetic { op, .. } => {
                return Err(LowerError::semantic(format!(
                    "operator '{}' not allowed in {}",
                    op, cmd.name
                )));
            }
        }
    }

    out.open("do");
    out.line(format!("local {} = {}({})", local, constructor, args.join(", ")));
    for call in calls {
        out.line(call);
    }
    out.close("end");
    Ok(())
}
