//! VR receiver: variable assignment and mutation.

use super::variables::indexed;
use super::{lua_long_string, Emitter, LowerError, Scope};
use erm_ir::{BodyItem, BodyOption, Iexp, LineCommand, VarExp};

pub(crate) fn lower_vr(
    cmd: &LineCommand,
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    let target = match cmd.identifiers() {
        [id] => id,
        ids => {
            return Err(LowerError::semantic(format!(
                "VR requires exactly one identifier, got {}",
                ids.len()
            )));
        }
    };
    let var = scope.target(target);

    for option in cmd.body.iter().flatten() {
        match option {
            BodyOption::Logic { op, rhs } => {
                let func = match op {
                    '&' => "bit.band",
                    '|' => "bit.bor",
                    'X' => "bit.bxor",
                    _ => return Err(LowerError::semantic(format!("unknown VR operator '{}'", op))),
                };
                out.line(format!("{} = {}({}, {})", var, func, var, scope.iexp(rhs)));
            }
            BodyOption::Arithmetic { op, rhs } => {
                let lua_op = match op {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    ':' => "/",
                    '%' => "%",
                    _ => return Err(LowerError::semantic(format!("unknown VR operator '{}'", op))),
                };
                out.line(format!("{} = {} {} {}", var, var, lua_op, scope.iexp(rhs)));
            }
            BodyOption::Normal { code, params } => match code {
                'C' => lower_copy(target, params, scope, out)?,
                'H' => lower_has(&var, params, out)?,
                'S' => lower_set(&var, params, scope, out)?,
                'M' | 'R' | 'T' | 'U' | 'V' => {
                    return Err(LowerError::Unsupported(format!("VR:{}", code)));
                }
                _ => return Err(LowerError::semantic(format!("unknown VR option '{}'", code))),
            },
        }
    }
    Ok(())
}

/// `VRv5:C1/?v2` writes and reads consecutive slots starting at the target.
fn lower_copy(
    target: &Iexp,
    params: &[BodyItem],
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    let (bank, start) = match target {
        Iexp::Var(VarExp::Indexed {
            bank,
            index: Some(index),
        }) if bank.chars().count() == 1 && *index > 0 => (bank.as_str(), *index),
        _ => return Err(LowerError::semantic("VR:C requires an indexed variable")),
    };

    for (offset, param) in (0i32..).zip(params) {
        let index = start
            .checked_add(offset)
            .ok_or_else(|| LowerError::semantic("VR:C index out of range"))?;
        let slot = indexed(bank, index);
        match param {
            BodyItem::Iexp(value) => out.line(format!("{} = {}", slot, scope.iexp(value))),
            BodyItem::Str(text) => out.line(format!("{} = {}", slot, lua_long_string(text))),
            BodyItem::Varp(dest) => out.line(format!("{} = {}", scope.var(dest), slot)),
            BodyItem::Nothing => {}
            other => {
                return Err(LowerError::semantic(format!(
                    "{} not allowed in VR:C",
                    other.describe()
                )));
            }
        }
    }
    Ok(())
}

fn lower_has(var: &str, params: &[BodyItem], out: &mut Emitter) -> Result<(), LowerError> {
    let [param] = params else {
        return Err(LowerError::semantic("VR:H requires flag index"));
    };
    match param {
        BodyItem::Iexp(Iexp::Constant(flag)) if *flag > 0 => {
            out.line(format!("ERM.VR({}):H('{}')", var, flag));
            Ok(())
        }
        _ => Err(LowerError::semantic("VR:H accept only flag index")),
    }
}

fn lower_set(
    var: &str,
    params: &[BodyItem],
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    let [param] = params else {
        return Err(LowerError::semantic(format!(
            "VR:S requires exactly one parameter, got {}",
            params.len()
        )));
    };
    let value = match param {
        BodyItem::Iexp(value) => scope.iexp(value),
        BodyItem::Str(text) => lua_long_string(text),
        other => {
            return Err(LowerError::semantic(format!(
                "{} not allowed in VR:S",
                other.describe()
            )));
        }
    };
    out.line(format!("{} = {}", var, value));
    Ok(())
}
