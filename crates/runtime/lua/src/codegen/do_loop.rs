//! DO receiver: counted loop calling a function per iteration.
//!
//! `!!DO<fn>/<start>/<stop>/<step>:P...;` runs `FU<fn>` for each counter value
//! in `[start, stop)`. Every iteration shares one parameter table: the
//! caller's `x` inside a function, a fresh table elsewhere. The counter is
//! written to slot 16 before the call and read back after it, so the called
//! function can move the loop forward.

use super::fu::{call_with_params, PARAMS};
use super::{Emitter, LowerError, Scope};
use erm_ir::{BodyOption, Iexp, LineCommand};

const COUNTER: &str = "__iter";
const STOP: &str = "__stop";
const STEP: &str = "__step";
const COUNTER_SLOT: u32 = 16;

pub(crate) fn lower_do(
    cmd: &LineCommand,
    scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    let [function, start, stop, step] = cmd.identifiers() else {
        return Err(LowerError::semantic(format!(
            "DO requires 4 identifiers, got {}",
            cmd.identifiers().len()
        )));
    };
    let Iexp::Constant(function) = function else {
        return Err(LowerError::semantic("DO requires a constant function index"));
    };

    let mut params = &[][..];
    for option in cmd.body.iter().flatten() {
        match option {
            BodyOption::Normal { code: 'P', params: p } => params = p.as_slice(),
            BodyOption::Normal { code, .. } => {
                return Err(LowerError::semantic(format!("unknown DO option '{}'", code)));
            }
            BodyOption::Logic { op, .. } | BodyOption::Arithmetic { op, .. } => {
                return Err(LowerError::semantic(format!(
                    "operator '{}' not allowed in DO",
                    op
                )));
            }
        }
    }

    let slot = format!("{}['{}']", PARAMS, COUNTER_SLOT);
    out.open("do");
    out.line(format!("local {} = x or {{}}", PARAMS));
    out.line(format!(
        "local {}, {}, {} = {}, {} - 1, {}",
        COUNTER,
        STOP,
        STEP,
        scope.iexp(start),
        scope.iexp(stop),
        scope.iexp(step)
    ));
    // same bounds test as a numeric `for`
    out.open(format!(
        "while ({step} > 0 and {iter} <= {stop}) or ({step} <= 0 and {iter} >= {stop}) do",
        step = STEP,
        iter = COUNTER,
        stop = STOP
    ));
    out.line(format!("{} = {}", slot, COUNTER));
    call_with_params(*function, params, scope, out)?;
    out.line(format!("{} = {} + {}", COUNTER, slot, STEP));
    out.close("end");
    out.close("end");
    Ok(())
}
