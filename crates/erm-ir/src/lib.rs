//! Syntax tree types for ERM and VERM scripts.
//!
//! This crate defines the representation shared between the syntax frontend
//! (preprocessor and parser), the script index and the Lua code generator.
//!
//! # Line model
//!
//! A script is a sequence of logical lines. Each line is one of:
//! - a comment (`!` followed by anything that is not a command marker)
//! - an ERM command: trigger (`!?`), post-trigger (`!$`), instruction (`!#`)
//!   or receiver (`!!`)
//! - a VERM S-expression (`![...]`)
//!
//! Example:
//! ```text
//! !?FU1;
//! !!VRv2:S5;
//! ![print ^hello^]
//! ```

mod line;
mod pointer;
mod tree;
mod vexp;

pub use line::{
    BodyItem, BodyOption, CommandKind, CondAtom, CondLink, Condition, Iexp, Line, LineCommand,
    VarExp,
};
pub use pointer::LinePointer;
pub use tree::{CursorState, TreeCursor, TreeError, VOptionList};
pub use vexp::{Literal, Modifier, VNode, VOption};

#[cfg(test)]
mod tests;
