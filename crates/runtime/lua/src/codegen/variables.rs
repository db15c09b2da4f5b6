//! Variable and macro lowering.
//!
//! Banks are Lua tables indexed by strings: `v5` is `v['5']`. Banks written
//! together index through each other from the right, so `vy5` is
//! `v[tostring(y['5'])]`. A bank letter with no index is a quick variable,
//! stored in `Q`.

use super::{lua_quote, mc};
use erm_core::{CompilerConfig, ScriptIndex};
use erm_ir::{Iexp, Line, LinePointer, VarExp};

/// Lowering context for one line.
pub(crate) struct Scope<'a> {
    pub macros: &'a MacroTable,
    pub config: &'a CompilerConfig,
    pub at: LinePointer,
}

impl Scope<'_> {
    pub(crate) fn var(&self, var: &VarExp) -> String {
        lower_var(var, self.macros, self.at)
    }

    pub(crate) fn iexp(&self, iexp: &Iexp) -> String {
        match iexp {
            Iexp::Constant(n) => n.to_string(),
            Iexp::Var(var) => self.var(var),
        }
    }

    /// A VR-style target: a bare constant `N` addresses `v['N']`.
    pub(crate) fn target(&self, iexp: &Iexp) -> String {
        match iexp {
            Iexp::Constant(n) => indexed("v", *n),
            Iexp::Var(var) => self.var(var),
        }
    }
}

pub(crate) fn indexed(bank: &str, index: i32) -> String {
    format!("{}['{}']", bank, index)
}

fn lower_var(var: &VarExp, macros: &MacroTable, at: LinePointer) -> String {
    match var {
        VarExp::Macro(name) => macros
            .resolve(name, at)
            .map(str::to_string)
            .unwrap_or_else(|| format!("M[{}]", lua_quote(name))),
        VarExp::Indexed { bank, index } => {
            let mut letters = bank.chars().rev();
            let Some(last) = letters.next() else {
                return "nil".to_string();
            };
            let mut expr = match index {
                Some(index) => format!("{}['{}']", last, index),
                None => format!("Q['{}']", last),
            };
            for letter in letters {
                expr = format!("{}[tostring({})]", letter, expr);
            }
            expr
        }
    }
}

struct MacroBinding {
    at: LinePointer,
    name: String,
    target: String,
}

/// Macro names bound by `MC` lines, in source order.
#[derive(Default)]
pub(crate) struct MacroTable {
    bindings: Vec<MacroBinding>,
}

impl MacroTable {
    /// Scan every `MC` line of the script. Lines that do not bind cleanly are
    /// skipped here and reported when they are lowered.
    pub(crate) fn collect(index: &ScriptIndex) -> Self {
        let mut table = MacroTable::default();
        for ptr in index.pointers() {
            let Some(Line::Command(cmd)) = index.line(ptr) else {
                continue;
            };
            if cmd.name != "MC" {
                continue;
            }
            if let Ok(bindings) = mc::bindings(cmd) {
                for binding in bindings {
                    let target = binding.target(&table, ptr);
                    table.bindings.push(MacroBinding {
                        at: ptr,
                        name: binding.name,
                        target,
                    });
                }
            }
        }
        table
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Expression bound to `name` by the latest `MC` line before `at`.
    pub(crate) fn resolve(&self, name: &str, at: LinePointer) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.at < at && binding.name == name)
            .map(|binding| binding.target.as_str())
    }
}

impl mc::Binding {
    fn target(&self, table: &MacroTable, at: LinePointer) -> String {
        match &self.var {
            Some(var) => lower_var(var, table, at),
            None => format!("v[{}]", lua_quote(&self.name)),
        }
    }
}
