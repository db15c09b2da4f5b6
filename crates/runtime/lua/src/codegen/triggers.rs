//! Chunk layout: preamble, entry point, functions and trigger registrations.

use super::{
    lower_condition, lua_quote, lua_string_literal, CompileError, Generator, LowerError, Scope,
};
use erm_core::{TriggerDecl, TriggerKind};
use erm_ir::Iexp;
use erm_syntax::Dialect;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Shorthands bound from the runtime module.
const BANKS: &[&str] = &["v", "z", "F", "M", "Q"];

impl Generator<'_> {
    pub(super) fn preamble(&mut self) {
        self.out.line(format!(
            "local ERM = require({})",
            lua_string_literal(&self.config.erm_module)
        ));
        if self.dialect == Dialect::Verm {
            self.out.line(format!(
                "local VERM = require({})",
                lua_string_literal(&self.config.verm_module)
            ));
        }
        for bank in BANKS {
            self.out.line(format!("local {} = ERM.{}", bank, bank));
        }
    }

    pub(super) fn entry_point(&mut self) -> Result<(), CompileError> {
        let lines: Vec<_> = self.index.entry_instructions().collect();
        debug!(instructions = lines.len(), "lowering entry point");
        self.out.open("local function instructions()");
        self.lower_lines(lines)?;
        self.out.close("end");
        Ok(())
    }

    /// Emit every `FU` declaration as a global function, ordered by index.
    pub(super) fn functions(&mut self) -> Result<(), CompileError> {
        let index = self.index;
        let Some(occurrences) = index.triggers().get(&TriggerKind::Function) else {
            return Ok(());
        };

        let mut functions = BTreeMap::new();
        for ptr in occurrences {
            let decl = index.trigger_decl(*ptr)?;
            let number = match decl.identifiers.as_slice() {
                [Iexp::Constant(n)] => *n,
                _ => {
                    return Err(CompileError::Semantic {
                        line: ptr.real_line(),
                        reason: "function declaration requires one constant index".into(),
                    });
                }
            };
            if functions.insert(number, decl).is_some() {
                return Err(CompileError::Semantic {
                    line: ptr.real_line(),
                    reason: format!("function index duplicated: {}", number),
                });
            }
        }

        debug!(functions = functions.len(), "lowering functions");
        for (number, decl) in functions {
            let name = format!("FU{}", number);
            self.out.open(format!("{} = function(x)", name));
            self.trigger_body(&name, &decl)?;
            self.out.close("end");
        }
        Ok(())
    }

    pub(super) fn named_triggers(&mut self) -> Result<(), CompileError> {
        let index = self.index;
        for (kind, occurrences) in index.triggers() {
            let TriggerKind::Named(name) = kind else {
                continue;
            };
            debug!(trigger = %name, count = occurrences.len(), "lowering triggers");
            for ptr in occurrences {
                let decl = index.trigger_decl(*ptr)?;
                let scope = Scope {
                    macros: &self.macros,
                    config: self.config,
                    at: *ptr,
                };
                let ids: Vec<String> = decl.identifiers.iter().map(|id| scope.iexp(id)).collect();

                self.out.open("ERM:addTrigger({");
                self.out.line(format!("name = {},", lua_quote(name)));
                if !ids.is_empty() {
                    self.out.line(format!("id = {{{}}},", ids.join(", ")));
                }
                self.out.open("fn = function ()");
                self.trigger_body(name, &decl)?;
                self.out.close("end,");
                self.out.close("})");
            }
        }
        Ok(())
    }

    pub(super) fn post_triggers(&mut self) {
        let index = self.index;
        for (kind, occurrences) in index.post_triggers() {
            for ptr in occurrences {
                warn!(
                    trigger = kind.name(),
                    line = ptr.real_line(),
                    "post-trigger code generation is not supported, skipping"
                );
                self.out.line(format!(
                    "-- post-trigger {} (line {}) not generated",
                    kind.name(),
                    ptr.real_line()
                ));
            }
        }
    }

    /// `y` locals, the condition guard and the lowered body lines.
    fn trigger_body(&mut self, name: &str, decl: &TriggerDecl) -> Result<(), CompileError> {
        self.out.line(format!("local y = ERM.getY({})", lua_quote(name)));
        if let Some(condition) = &decl.condition {
            let scope = Scope {
                macros: &self.macros,
                config: self.config,
                at: decl.pointer,
            };
            let condition = lower_condition(condition, &scope)
                .map_err(|e: LowerError| e.at(decl.pointer))?;
            self.out.line(format!("if not ({}) then return end", condition));
        }
        let body = self.index.body(decl.pointer);
        self.lower_lines(body)
    }
}
