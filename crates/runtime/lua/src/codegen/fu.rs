//! FU receiver: function calls and early return.

use super::{lua_long_string, Emitter, LowerError, Scope};
use erm_ir::{BodyItem, BodyOption, Iexp, LineCommand};

/// Parameter table handed to a called function.
pub(crate) const PARAMS: &str = "newx";

/// Fill a fresh `newx` from `params` by 1-based position, call
/// `FU<function>` and copy outputs back.
pub(crate) fn emit_call(
    function: i32,
    params: &[BodyItem],
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    out.line(format!("local {} = {{}}", PARAMS));
    call_with_params(function, params, scope, out)
}

/// Same as [`emit_call`] for a `newx` already in scope.
pub(crate) fn call_with_params(
    function: i32,
    params: &[BodyItem],
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    let mut outputs = Vec::new();
    for (position, param) in (1..).zip(params) {
        let slot = format!("{}['{}']", PARAMS, position);
        match param {
            BodyItem::Iexp(value) => out.line(format!("{} = {}", slot, scope.iexp(value))),
            BodyItem::Str(text) => out.line(format!("{} = {}", slot, lua_long_string(text))),
            BodyItem::Varp(dest) => outputs.push(format!("{} = {}", scope.var(dest), slot)),
            BodyItem::Nothing => {}
            other => {
                return Err(LowerError::semantic(format!(
                    "{} not allowed in function parameters",
                    other.describe()
                )));
            }
        }
    }
    out.line(format!("FU{}({})", function, PARAMS));
    for line in outputs {
        out.line(line);
    }
    Ok(())
}

pub(crate) fn lower_fu(
    cmd: &LineCommand,
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    for option in cmd.body.iter().flatten() {
        match option {
            BodyOption::Normal { code: 'E', .. } => out.line("do return end"),
            BodyOption::Normal { code: 'P', params } => {
                let function = match cmd.identifiers() {
                    [Iexp::Constant(n)] => *n,
                    [_] => {
                        return Err(LowerError::semantic(
                            "FU:P requires a constant function index",
                        ));
                    }
                    ids => {
                        return Err(LowerError::semantic(format!(
                            "FU:P requires exactly one identifier, got {}",
                            ids.len()
                        )));
                    }
                };
                out.open("do");
                emit_call(function, params, scope, out)?;
                out.close("end");
            }
            BodyOption::Normal { code, .. } => {
                return Err(LowerError::semantic(format!("unknown FU option '{}'", code)));
            }
            BodyOption::Logic { op, .. } | BodyOption::Arithmetic { op, .. } => {
                return Err(LowerError::semantic(format!(
                    "operator '{}' not allowed in FU",
                    op
                )));
            }
        }
    }
    Ok(())
}
