//! Tests for the ERM preprocessor and parser.

use super::*;
use erm_ir::{
    BodyItem, BodyOption, CommandKind, CondAtom, Iexp, Line, LineCommand, Literal, VNode, VOption,
    VarExp,
};

fn parse_erm(source: &str) -> Vec<ParsedLine> {
    let (_, lines) = parse_source(source, DEFAULT_MAX_DEPTH).expect("parse failed");
    lines
}

fn parse_one(source: &str) -> Line {
    let mut lines = parse_erm(source);
    assert_eq!(lines.len(), 1, "source: {}", source);
    lines.remove(0).line
}

fn command(source: &str) -> LineCommand {
    match parse_one(source) {
        Line::Command(cmd) => cmd,
        other => panic!("expected command, got {:?}", other),
    }
}

fn var(bank: &str, index: i32) -> VarExp {
    VarExp::Indexed {
        bank: bank.into(),
        index: Some(index),
    }
}

fn sym(s: &str) -> VOption {
    VOption::Symbol(s.into())
}

// =============================================================================
// Preprocessor
// =============================================================================

#[test]
fn test_dialect_header() {
    assert_eq!(preprocess("ZVSE\n!!VR1:S1;").unwrap().dialect, Dialect::Erm);
    assert_eq!(preprocess("VERM\n![a]").unwrap().dialect, Dialect::Verm);
    let headerless = preprocess("!!VR1:S1;").unwrap();
    assert_eq!(headerless.dialect, Dialect::Erm);
    assert_eq!(headerless.lines.len(), 1);
}

#[test]
fn test_comments_stripped_and_lines_kept() {
    let pre = preprocess("ZVSE\nplain comment\n!?FU1; trailing text\n\n!!VR1:S2; more").unwrap();
    assert_eq!(
        pre.lines,
        vec![
            SourceLine {
                text: "!?FU1;".into(),
                line: 3
            },
            SourceLine {
                text: "!!VR1:S2;".into(),
                line: 5
            },
        ]
    );
}

#[test]
fn test_string_continues_across_lines() {
    let pre = preprocess("ZVSE\n!!IF:M^first\nsecond;still^;\n!!VR1:S1;").unwrap();
    assert_eq!(pre.lines.len(), 2);
    assert_eq!(pre.lines[0].text, "!!IF:M^first\nsecond;still^;");
    assert_eq!(pre.lines[0].line, 2);
    assert_eq!(pre.lines[1].line, 4);
}

#[test]
fn test_verm_form_spans_lines() {
    let pre = preprocess("VERM\n![foo\n  [bar ; not a comment\n  ]] tail").unwrap();
    assert_eq!(pre.lines.len(), 1);
    assert_eq!(pre.lines[0].text, "![foo\n  [bar ; not a comment\n  ]]");
    assert_eq!(pre.lines[0].line, 2);
}

#[test]
fn test_unterminated_string_reports_start_line() {
    let err = preprocess("ZVSE\n!!VR1:S1;\n!!IF:M^never closed\nmore text").unwrap_err();
    assert!(matches!(err, SyntaxError::Preprocess { line: 3, .. }), "{:?}", err);
}

#[test]
fn test_unclosed_bracket() {
    let err = preprocess("VERM\n![foo [bar]").unwrap_err();
    assert!(matches!(err, SyntaxError::Preprocess { line: 2, .. }));
    assert!(err.to_string().contains("unclosed"));
}

#[test]
fn test_text_after_balanced_form_is_comment() {
    let pre = preprocess("VERM\n![a]] trailing [").unwrap();
    assert_eq!(pre.lines[0].text, "![a]");
}

// =============================================================================
// ERM commands
// =============================================================================

#[test]
fn test_trigger() {
    let cmd = command("!?TR1;");
    assert_eq!(cmd.kind, CommandKind::Trigger);
    assert_eq!(cmd.name, "TR");
    assert_eq!(cmd.identifier, Some(vec![Iexp::Constant(1)]));
    assert_eq!(cmd.body, None);
}

#[test]
fn test_post_trigger_and_instruction() {
    assert_eq!(command("!$OB2/3;").kind, CommandKind::PostTrigger);
    let cmd = command("!#VRv1:S5;");
    assert_eq!(cmd.kind, CommandKind::Instruction);
    assert_eq!(cmd.identifier, Some(vec![Iexp::Var(var("v", 1))]));
}

#[test]
fn test_instruction_requires_body() {
    let err = parse_source("!#VRv1;", DEFAULT_MAX_DEPTH).unwrap_err();
    assert!(err.to_string().contains("requires a body"));
}

#[test]
fn test_receiver_without_body() {
    let cmd = command("!!UN1/2;");
    assert_eq!(cmd.kind, CommandKind::Receiver);
    assert_eq!(cmd.identifier.as_ref().map(Vec::len), Some(2));
    assert_eq!(cmd.body, None);
    assert_eq!(command("!!UN").identifier, None);
}

#[test]
fn test_variable_forms() {
    let cmd = command("!!XX$count$/vy5/f/y-1/-3:A;");
    assert_eq!(
        cmd.identifier,
        Some(vec![
            Iexp::Var(VarExp::Macro("count".into())),
            Iexp::Var(var("vy", 5)),
            Iexp::Var(VarExp::Indexed {
                bank: "f".into(),
                index: None
            }),
            Iexp::Var(var("y", -1)),
            Iexp::Constant(-3),
        ])
    );
}

#[test]
fn test_condition_chain() {
    let cmd = command("!!VR1&1/v2>=3|-4:S0;");
    let cond = cmd.condition.expect("condition");
    let connectors: Vec<char> = cond.links.iter().map(|l| l.connector).collect();
    assert_eq!(connectors, vec!['&', '/', '|']);
    assert_eq!(cond.links[0].atom, CondAtom::Flag(1));
    assert_eq!(
        cond.links[1].atom,
        CondAtom::Compare {
            lhs: Iexp::Var(var("v", 2)),
            op: ">=".into(),
            rhs: Iexp::Constant(3)
        }
    );
    assert_eq!(cond.links[2].atom, CondAtom::Flag(-4));
}

#[test]
fn test_condition_variable_needs_comparison() {
    let err = parse_source("!!VR1&v2:S0;", DEFAULT_MAX_DEPTH).unwrap_err();
    assert!(matches!(err, SyntaxError::Parse { line: 1, .. }));
}

#[test]
fn test_body_items() {
    let cmd = command("!!HE1:A^text^/?v2/@name@/v3+z4/5^curried^/>=7//$m$;");
    let body = cmd.body.expect("body");
    assert_eq!(body.len(), 1);
    let BodyOption::Normal { code, params } = &body[0] else {
        panic!("expected normal option");
    };
    assert_eq!(*code, 'A');
    assert_eq!(
        params,
        &vec![
            BodyItem::Str("text".into()),
            BodyItem::Varp(var("v", 2)),
            BodyItem::MacroDef("name".into()),
            BodyItem::Concat(var("v", 3), var("z", 4)),
            BodyItem::Curried(Iexp::Constant(5), "curried".into()),
            BodyItem::SemiCompare(">=".into(), Iexp::Constant(7)),
            BodyItem::Nothing,
            BodyItem::Iexp(Iexp::Var(VarExp::Macro("m".into()))),
        ]
    );
}

#[test]
fn test_multiple_options_and_empty_params() {
    let body = command("!!HE1:B1/2C?v1E;").body.expect("body");
    assert_eq!(body.len(), 3);
    assert_eq!(
        body[2],
        BodyOption::Normal {
            code: 'E',
            params: vec![]
        }
    );
}

#[test]
fn test_vr_logic_and_arithmetic() {
    let body = command("!!VRv1:+5*v2:3%2&1|4X8-1;").body.expect("body");
    let ops: Vec<char> = body
        .iter()
        .map(|opt| match opt {
            BodyOption::Arithmetic { op, .. } | BodyOption::Logic { op, .. } => *op,
            BodyOption::Normal { code, .. } => *code,
        })
        .collect();
    assert_eq!(ops, vec!['+', '*', ':', '%', '&', '|', 'X', '-']);
    assert!(matches!(body[4], BodyOption::Logic { op: '&', .. }));
}

#[test]
fn test_logic_symbols_only_in_vr() {
    // outside VR, 'X' is an ordinary option code
    let body = command("!!HE1:X5;").body.expect("body");
    assert!(matches!(body[0], BodyOption::Normal { code: 'X', .. }));
    assert!(parse_source("!!HE1:+5;", DEFAULT_MAX_DEPTH).is_err());
}

#[test]
fn test_comment_line() {
    assert_eq!(parse_one("!** a note"), Line::Comment("** a note".into()));
}

#[test]
fn test_invalid_name() {
    let err = parse_source("!!1X:S;", DEFAULT_MAX_DEPTH).unwrap_err();
    assert!(err.to_string().contains("invalid receiver name"));
}

#[test]
fn test_error_does_not_affect_earlier_lines() {
    let pre = preprocess("!!VR1:S1;\n!!VR1:Q^x;\n").unwrap_err();
    // the open string is caught by the preprocessor with its start line
    assert_eq!(pre.line(), 2);

    let err = parse_source("!!VR1:S1;\n!!VR1:S1\n", DEFAULT_MAX_DEPTH).unwrap_err();
    assert_eq!(err.line(), 2);
}

// =============================================================================
// VERM forms
// =============================================================================

fn verm(source: &str) -> VNode {
    match parse_one(&format!("VERM\n{}", source)) {
        Line::SExpression(node) => node,
        other => panic!("expected S-expression, got {:?}", other),
    }
}

#[test]
fn test_verm_requires_header() {
    let err = parse_source("![a b]", DEFAULT_MAX_DEPTH).unwrap_err();
    assert!(err.to_string().contains("VERM"));
}

#[test]
fn test_verm_literals() {
    let node = verm("![f 1 -2 3.5 ^str^ !c! nil]");
    assert_eq!(
        node.children.as_slice(),
        &[
            sym("f"),
            VOption::Literal(Literal::Int(1)),
            VOption::Literal(Literal::Int(-2)),
            VOption::Literal(Literal::Double(3.5)),
            VOption::Literal(Literal::Str("str".into())),
            VOption::Literal(Literal::Char('c')),
            VOption::Nil,
        ]
    );
}

#[test]
fn test_verm_nested_and_modifiers() {
    let node = verm("![let 'x `[a ,b ,!c] #'f]");
    let wrapped = |head: &str, inner: VOption| VOption::Node(VNode::new(vec![sym(head), inner]));
    let quasi = VNode::new(vec![
        sym("a"),
        wrapped("comma", sym("b")),
        wrapped("comma-unlist", sym("c")),
    ]);
    assert_eq!(
        node.children.as_slice(),
        &[
            sym("let"),
            wrapped("quote", sym("x")),
            wrapped("backquote", VOption::Node(quasi)),
            wrapped("get-func", sym("f")),
        ]
    );
}

#[test]
fn test_verm_unknown_modifier() {
    let err = parse_source("VERM\n![a #b]", DEFAULT_MAX_DEPTH).unwrap_err();
    assert!(err.to_string().contains("unknown modifier"));
}

#[test]
fn test_verm_embedded_command() {
    let node = verm("![do !!VRv1:S2;]");
    match node.children.get(1) {
        Some(VOption::Command(cmd)) => {
            assert_eq!(cmd.name, "VR");
            assert_eq!(cmd.kind, CommandKind::Receiver);
        }
        other => panic!("expected embedded command, got {:?}", other),
    }
}

#[test]
fn test_verm_depth_ceiling() {
    let deep = format!("VERM\n!{}{}", "[".repeat(10), "]".repeat(10));
    assert!(parse_source(&deep, 16).is_ok());
    let err = parse_source(&deep, 4).unwrap_err();
    assert!(err.to_string().contains("nested deeper"));
}

#[test]
fn test_verm_and_erm_lines_mix() {
    let lines = parse_erm("VERM\n!?FU1;\n![trigger TM 2]\n!!VR1:S1;");
    assert_eq!(lines.len(), 3);
    assert!(matches!(lines[1].line, Line::SExpression(_)));
    assert_eq!(lines[1].real_line, 3);
}
