//! Line parser for ERM commands and VERM S-expressions.
//!
//! Every logical line is parsed independently, so an error never affects lines
//! parsed before it.

use crate::{Dialect, Preprocessed, SyntaxError};
use erm_ir::{
    BodyItem, BodyOption, CommandKind, CondAtom, CondLink, Condition, Iexp, Line, LineCommand,
    Literal, Modifier, VNode, VOption, VarExp,
};
use serde::Serialize;
use tracing::debug;

/// Default nesting ceiling for VERM forms.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A parsed line with the source line it started on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedLine {
    pub line: Line,
    pub real_line: usize,
}

/// Parse all logical lines of a preprocessed script.
pub fn parse(script: &Preprocessed, max_depth: usize) -> Result<Vec<ParsedLine>, SyntaxError> {
    let mut parsed = Vec::with_capacity(script.lines.len());
    for source in &script.lines {
        let mut parser = LineParser::new(&source.text, source.line, script.dialect, max_depth);
        parsed.push(ParsedLine {
            line: parser.parse_line()?,
            real_line: source.line,
        });
    }
    debug!(lines = parsed.len(), "parsed script");
    Ok(parsed)
}

struct LineParser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    dialect: Dialect,
    max_depth: usize,
}

fn is_bank_letter(c: char) -> bool {
    c.is_ascii_lowercase() && c != 'u'
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || "+-*/<>=?_".contains(c)
}

fn is_symbol_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || "+-*/<>=?!_.".contains(c)
}

impl LineParser {
    fn new(text: &str, line: usize, dialect: Dialect, max_depth: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line,
            dialect,
            max_depth,
        }
    }

    fn error<T>(&self, reason: impl Into<String>) -> Result<T, SyntaxError> {
        Err(SyntaxError::Parse {
            line: self.line,
            reason: reason.into(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SyntaxError> {
        self.skip_blanks();
        if self.eat(expected) {
            Ok(())
        } else {
            match self.peek() {
                Some(c) => self.error(format!("expected '{}', found '{}'", expected, c)),
                None => self.error(format!("expected '{}' at end of line", expected)),
            }
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn parse_line(&mut self) -> Result<Line, SyntaxError> {
        if !self.eat('!') {
            return self.error("command lines must start with '!'");
        }
        let kind = match self.peek() {
            Some('?') => CommandKind::Trigger,
            Some('$') => CommandKind::PostTrigger,
            Some('#') => CommandKind::Instruction,
            Some('!') => CommandKind::Receiver,
            Some('[') => return self.parse_verm_line(),
            _ => return Ok(Line::Comment(self.rest().trim().to_string())),
        };
        self.pos += 1;
        let command = self.parse_command(kind)?;
        self.expect_end()?;
        Ok(Line::Command(command))
    }

    fn expect_end(&mut self) -> Result<(), SyntaxError> {
        self.skip_blanks();
        match self.peek() {
            None => Ok(()),
            Some(_) => self.error(format!("unexpected trailing input '{}'", self.rest())),
        }
    }

    // ---------------------------------------------------------------------
    // ERM commands
    // ---------------------------------------------------------------------

    fn parse_command(&mut self, kind: CommandKind) -> Result<LineCommand, SyntaxError> {
        let name = self.parse_name()?;
        let identifier = self.parse_identifier()?;
        let condition = self.parse_condition()?;

        self.skip_blanks();
        let body = match kind {
            CommandKind::Trigger | CommandKind::PostTrigger => {
                self.expect(';')?;
                None
            }
            CommandKind::Instruction => {
                if self.peek() != Some(':') {
                    return self.error(format!("instruction {} requires a body", name));
                }
                Some(self.parse_body(&name)?)
            }
            CommandKind::Receiver => match self.peek() {
                Some(':') => Some(self.parse_body(&name)?),
                Some(';') => {
                    self.pos += 1;
                    None
                }
                _ => None,
            },
        };

        Ok(LineCommand {
            kind,
            name,
            identifier,
            condition,
            body,
        })
    }

    fn parse_name(&mut self) -> Result<String, SyntaxError> {
        match (self.peek(), self.peek_at(1)) {
            (Some(a), Some(b)) if a.is_ascii_alphabetic() && b.is_ascii_alphanumeric() => {
                self.pos += 2;
                Ok([a, b].iter().collect())
            }
            _ => self.error(format!("invalid receiver name in '{}'", self.rest())),
        }
    }

    fn starts_iexp(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '$' || is_bank_letter(c) => true,
            Some('-' | '+') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn parse_identifier(&mut self) -> Result<Option<Vec<Iexp>>, SyntaxError> {
        self.skip_blanks();
        if !self.starts_iexp() {
            return Ok(None);
        }
        let mut items = vec![self.parse_iexp()?];
        while self.peek() == Some('/') {
            self.pos += 1;
            if !self.starts_iexp() {
                // the slash belongs to a condition chain
                self.pos -= 1;
                break;
            }
            items.push(self.parse_iexp()?);
        }
        Ok(Some(items))
    }

    fn parse_int(&mut self) -> Result<i32, SyntaxError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .or_else(|_| self.error(format!("invalid integer '{}'", text)))
    }

    fn parse_iexp(&mut self) -> Result<Iexp, SyntaxError> {
        self.skip_blanks();
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => {
                Ok(Iexp::Constant(self.parse_int()?))
            }
            Some(c) if c == '$' || is_bank_letter(c) => Ok(Iexp::Var(self.parse_var()?)),
            Some(c) => self.error(format!("expected integer expression, found '{}'", c)),
            None => self.error("expected integer expression at end of line"),
        }
    }

    fn parse_var(&mut self) -> Result<VarExp, SyntaxError> {
        if self.eat('$') {
            let name = self.take_until('$', "macro name")?;
            if name.is_empty() {
                return self.error("empty macro name");
            }
            return Ok(VarExp::Macro(name));
        }
        let start = self.pos;
        while self.peek().is_some_and(is_bank_letter) {
            self.pos += 1;
        }
        if start == self.pos {
            return self.error(format!("expected variable in '{}'", self.rest()));
        }
        let bank: String = self.chars[start..self.pos].iter().collect();
        let has_index = match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('-') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        let index = if has_index {
            Some(self.parse_int()?)
        } else {
            None
        };
        Ok(VarExp::Indexed { bank, index })
    }

    /// Consumes up to and including `terminator`, returning the text before it.
    fn take_until(&mut self, terminator: char, what: &str) -> Result<String, SyntaxError> {
        let start = self.pos;
        while let Some(c) = self.bump() {
            if c == terminator {
                return Ok(self.chars[start..self.pos - 1].iter().collect());
            }
        }
        self.error(format!("unterminated {}", what))
    }

    fn parse_condition(&mut self) -> Result<Option<Condition>, SyntaxError> {
        let mut links = Vec::new();
        loop {
            self.skip_blanks();
            let connector = match self.peek() {
                Some(c @ ('&' | '|' | 'X' | '/')) => c,
                _ => break,
            };
            self.pos += 1;
            links.push(CondLink {
                connector,
                atom: self.parse_cond_atom()?,
            });
        }
        Ok(if links.is_empty() {
            None
        } else {
            Some(Condition { links })
        })
    }

    fn parse_cond_atom(&mut self) -> Result<CondAtom, SyntaxError> {
        let lhs = self.parse_iexp()?;
        self.skip_blanks();
        let start = self.pos;
        while matches!(self.peek(), Some('<' | '=' | '>')) {
            self.pos += 1;
        }
        if start == self.pos {
            return match lhs {
                Iexp::Constant(flag) => Ok(CondAtom::Flag(flag)),
                Iexp::Var(_) => self.error("variable in condition requires a comparison"),
            };
        }
        let op: String = self.chars[start..self.pos].iter().collect();
        let rhs = self.parse_iexp()?;
        Ok(CondAtom::Compare { lhs, op, rhs })
    }

    fn parse_body(&mut self, receiver: &str) -> Result<Vec<BodyOption>, SyntaxError> {
        self.expect(':')?;
        let is_vr = receiver == "VR";
        let mut options = Vec::new();
        loop {
            self.skip_blanks();
            match self.peek() {
                None => return self.error("missing ';' at end of body"),
                Some(';') => {
                    self.pos += 1;
                    return Ok(options);
                }
                Some(op @ ('&' | '|' | 'X')) if is_vr => {
                    self.pos += 1;
                    options.push(BodyOption::Logic {
                        op,
                        rhs: self.parse_iexp()?,
                    });
                }
                Some(op @ ('+' | '-' | '*' | ':' | '%')) if is_vr => {
                    self.pos += 1;
                    options.push(BodyOption::Arithmetic {
                        op,
                        rhs: self.parse_iexp()?,
                    });
                }
                Some(code) if code.is_ascii_uppercase() => {
                    self.pos += 1;
                    let params = self.parse_params()?;
                    options.push(BodyOption::Normal { code, params });
                }
                Some(c) => return self.error(format!("unexpected '{}' in body", c)),
            }
        }
    }

    fn at_option_end(&self) -> bool {
        match self.peek() {
            None | Some(';') => true,
            Some(c) => c.is_ascii_uppercase(),
        }
    }

    fn parse_params(&mut self) -> Result<Vec<BodyItem>, SyntaxError> {
        self.skip_blanks();
        if self.at_option_end() {
            return Ok(Vec::new());
        }
        let mut params = vec![self.parse_body_item()?];
        while self.peek() == Some('/') {
            self.pos += 1;
            params.push(self.parse_body_item()?);
        }
        Ok(params)
    }

    fn parse_string(&mut self) -> Result<String, SyntaxError> {
        self.expect('^')?;
        self.take_until('^', "string literal")
    }

    fn parse_body_item(&mut self) -> Result<BodyItem, SyntaxError> {
        self.skip_blanks();
        match self.peek() {
            None | Some('/' | ';') => Ok(BodyItem::Nothing),
            Some(c) if c.is_ascii_uppercase() => Ok(BodyItem::Nothing),
            Some('^') => Ok(BodyItem::Str(self.parse_string()?)),
            Some('@') => {
                self.pos += 1;
                Ok(BodyItem::MacroDef(self.take_until('@', "macro definition")?))
            }
            Some('?') => {
                self.pos += 1;
                Ok(BodyItem::Varp(self.parse_var()?))
            }
            Some('<' | '=' | '>') => {
                let start = self.pos;
                while matches!(self.peek(), Some('<' | '=' | '>')) {
                    self.pos += 1;
                }
                let op: String = self.chars[start..self.pos].iter().collect();
                Ok(BodyItem::SemiCompare(op, self.parse_iexp()?))
            }
            Some(_) => {
                let iexp = self.parse_iexp()?;
                if self.peek() == Some('^') {
                    return Ok(BodyItem::Curried(iexp, self.parse_string()?));
                }
                let concat_follows = self.peek() == Some('+')
                    && self.peek_at(1).is_some_and(|c| c == '$' || is_bank_letter(c));
                match iexp {
                    Iexp::Var(lhs) if concat_follows => {
                        self.pos += 1;
                        Ok(BodyItem::Concat(lhs, self.parse_var()?))
                    }
                    iexp => Ok(BodyItem::Iexp(iexp)),
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // VERM forms
    // ---------------------------------------------------------------------

    fn parse_verm_line(&mut self) -> Result<Line, SyntaxError> {
        if self.dialect != Dialect::Verm {
            return self.error("S-expression lines require the VERM dialect header");
        }
        let node = self.parse_vnode(1)?;
        self.expect_end()?;
        Ok(Line::SExpression(node))
    }

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, SyntaxError> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match (self.peek(), self.peek_at(1)) {
                (Some('`'), _) => Modifier::Backquote,
                (Some(','), Some('!')) => Modifier::CommaSplice,
                (Some(','), _) => Modifier::Comma,
                (Some('\''), _) => Modifier::Quote,
                (Some('#'), Some('\'')) => Modifier::FunctionRef,
                (Some('#'), _) => return self.error("unknown modifier '#'"),
                _ => return Ok(modifiers),
            };
            self.pos += modifier.token().chars().count();
            modifiers.push(modifier);
        }
    }

    /// Parses `[...]` at the current position.
    fn parse_vnode(&mut self, depth: usize) -> Result<VNode, SyntaxError> {
        if depth > self.max_depth {
            return self.error(format!(
                "expression nested deeper than {} levels",
                self.max_depth
            ));
        }
        self.expect('[')?;
        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return self.error("unbalanced brackets: missing ']'"),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => children.push(self.parse_voption(depth)?),
            }
        }
        Ok(VNode::new(children))
    }

    fn parse_voption(&mut self, depth: usize) -> Result<VOption, SyntaxError> {
        let modifiers = self.parse_modifiers()?;
        let c = match self.peek() {
            Some(c) => c,
            None => return self.error("dangling modifier at end of line"),
        };

        if c == '[' {
            let node = self.parse_vnode(depth + 1)?;
            return Ok(VNode::with_modifiers(&modifiers, VOption::Node(node)));
        }

        if is_symbol_start(c) && !self.starts_number() {
            let start = self.pos;
            while self.peek().is_some_and(is_symbol_continue) {
                self.pos += 1;
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            let target = if text == "nil" && modifiers.is_empty() {
                VOption::Nil
            } else {
                VOption::Symbol(text)
            };
            return Ok(VNode::with_modifiers(&modifiers, target));
        }

        if !modifiers.is_empty() {
            return self.error("modifiers must precede a symbol or a form");
        }

        match c {
            '^' => Ok(VOption::Literal(Literal::Str(self.parse_string()?))),
            '!' if self.peek_at(2) == Some('!') && self.peek_at(1).is_some() => {
                let value = self.peek_at(1).unwrap_or_default();
                self.pos += 3;
                Ok(VOption::Literal(Literal::Char(value)))
            }
            '!' => {
                self.pos += 1;
                let kind = match self.bump() {
                    Some('?') => CommandKind::Trigger,
                    Some('$') => CommandKind::PostTrigger,
                    Some('#') => CommandKind::Instruction,
                    Some('!') => CommandKind::Receiver,
                    _ => return self.error("expected embedded ERM command after '!'"),
                };
                Ok(VOption::Command(Box::new(self.parse_command(kind)?)))
            }
            _ if self.starts_number() => self.parse_number(),
            _ => self.error(format!("unexpected '{}' in expression", c)),
        }
    }

    fn starts_number(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('-' | '+') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn parse_number(&mut self) -> Result<VOption, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let is_double =
            self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if is_double {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let literal = if is_double {
            text.parse().map(Literal::Double).ok()
        } else {
            text.parse().map(Literal::Int).ok()
        };
        match literal {
            Some(literal) => Ok(VOption::Literal(literal)),
            None => self.error(format!("invalid number '{}'", text)),
        }
    }
}
