//! MC receiver: macro definitions.

use super::{lua_quote, Emitter, LowerError, Scope};
use erm_ir::{BodyItem, BodyOption, Iexp, LineCommand, VarExp};

/// A macro name and the variable it aliases; `None` binds the name to a
/// fresh `v` slot keyed by the name itself.
pub(crate) struct Binding {
    pub name: String,
    pub var: Option<VarExp>,
}

impl Binding {
    /// Bank and key passed to `ERM:addMacro`.
    fn slot(&self) -> (String, String) {
        match &self.var {
            Some(VarExp::Indexed {
                bank,
                index: Some(index),
            }) => (bank.clone(), index.to_string()),
            Some(VarExp::Indexed { bank, index: None }) => ("Q".to_string(), bank.clone()),
            _ => ("v".to_string(), self.name.clone()),
        }
    }
}

fn bound_var(cmd: &LineCommand) -> Result<Option<VarExp>, LowerError> {
    match cmd.identifiers() {
        [] => Ok(None),
        [Iexp::Constant(n)] => Ok(Some(VarExp::Indexed {
            bank: "v".to_string(),
            index: Some(*n),
        })),
        [Iexp::Var(var @ VarExp::Indexed { bank, .. })] if bank.chars().count() == 1 => {
            Ok(Some(var.clone()))
        }
        [Iexp::Var(_)] => Err(LowerError::semantic(
            "MC requires a single-bank variable or a constant",
        )),
        ids => Err(LowerError::semantic(format!(
            "MC accepts at most one identifier, got {}",
            ids.len()
        ))),
    }
}

/// Macro bindings declared by an `MC` command.
pub(crate) fn bindings(cmd: &LineCommand) -> Result<Vec<Binding>, LowerError> {
    let var = bound_var(cmd)?;
    let mut bindings = Vec::new();
    for option in cmd.body.iter().flatten() {
        match option {
            BodyOption::Normal { code: 'S', params } => match params.as_slice() {
                [BodyItem::MacroDef(name)] => bindings.push(Binding {
                    name: name.clone(),
                    var: var.clone(),
                }),
                [other] => {
                    return Err(LowerError::semantic(format!(
                        "{} not allowed in MC:S",
                        other.describe()
                    )));
                }
                _ => return Err(LowerError::semantic("MC:S requires exactly one macro name")),
            },
            BodyOption::Normal { code, .. } => {
                return Err(LowerError::semantic(format!("unknown MC option '{}'", code)));
            }
            BodyOption::Logic { op, .. } | BodyOption::Arithmetic { op, .. } => {
                return Err(LowerError::semantic(format!(
                    "operator '{}' not allowed in MC",
                    op
                )));
            }
        }
    }
    Ok(bindings)
}

pub(crate) fn lower_mc(
    cmd: &LineCommand,
    _scope: &Scope,
    out: &mut Emitter,
) -> Result<(), LowerError> {
    for binding in bindings(cmd)? {
        let (bank, key) = binding.slot();
        out.line(format!(
            "ERM:addMacro({}, {}, {})",
            lua_quote(&binding.name),
            lua_quote(&bank),
            lua_quote(&key)
        ));
    }
    Ok(())
}
