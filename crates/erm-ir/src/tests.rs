//! Tests for erm-ir.

use super::*;

fn sym(s: &str) -> VOption {
    VOption::Symbol(s.to_string())
}

fn int(n: i64) -> VOption {
    VOption::Literal(Literal::Int(n))
}

#[test]
fn test_car_of_empty_list_appends() {
    let mut list = VOptionList::new();
    assert_eq!(list.car().item(), Err(TreeError::Empty));
    list.car().set(sym("a"));
    assert_eq!(list.as_slice(), &[sym("a")]);
}

#[test]
fn test_car_replaces_first() {
    let mut list = VOptionList::from(vec![sym("a"), int(1)]);
    list.car().set(sym("b"));
    assert_eq!(list.as_slice(), &[sym("b"), int(1)]);
}

#[test]
fn test_cdr_set_truncates_tail() {
    let mut list = VOptionList::from(vec![sym("f"), int(1), int(2), int(3)]);
    list.cdr().set(int(9));
    assert_eq!(list.as_slice(), &[sym("f"), int(9)]);
}

#[test]
fn test_nested_cdr_mutates_same_storage() {
    let mut list = VOptionList::from(vec![sym("f"), int(1), int(2), int(3)]);
    list.cdr().cdr().set_list(vec![int(7), int(8)]).unwrap();
    assert_eq!(list.as_slice(), &[sym("f"), int(1), int(7), int(8)]);

    // car of a cdr view addresses the second element in place
    list.cdr().car().set(sym("x"));
    assert_eq!(list.get(1), Some(&sym("x")));
}

#[test]
fn test_cursor_views() {
    let mut list = VOptionList::from(vec![sym("f"), int(1), int(2)]);
    let rest = list.cdr();
    assert_eq!(rest.state(), CursorState::Rest);
    assert_eq!(rest.len(), 2);
    assert_eq!(rest.get(1), Some(&int(2)));
    assert_eq!(rest.item(), Err(TreeError::NotAnItem));
    assert_eq!(rest.to_list().as_slice(), &[int(1), int(2)]);

    assert_eq!(list.car().set_list(vec![]), Err(TreeError::NotAList));
    assert_eq!(list.cdr().cdr().cdr().len(), 0);
}

#[test]
fn test_item_mut_through_car() {
    let mut list = VOptionList::from(vec![int(1)]);
    if let Ok(VOption::Literal(Literal::Int(n))) = list.car().item_mut() {
        *n = 5;
    }
    assert_eq!(list.first(), Some(&int(5)));
    assert!(list.rest().is_empty());
}

#[test]
fn test_modifier_wrapping() {
    let quoted = VNode::with_modifiers(&[Modifier::Quote], sym("x"));
    assert_eq!(
        quoted,
        VOption::Node(VNode::new(vec![sym("quote"), sym("x")]))
    );

    let nested = VNode::with_modifiers(&[Modifier::Quote, Modifier::Backquote], sym("x"));
    let inner = VOption::Node(VNode::new(vec![sym("backquote"), sym("x")]));
    assert_eq!(nested, VOption::Node(VNode::new(vec![sym("quote"), inner])));

    assert_eq!(VNode::with_modifiers(&[], sym("x")), sym("x"));
}

#[test]
fn test_modifier_symbols() {
    assert_eq!(Modifier::CommaSplice.symbol(), "comma-unlist");
    assert_eq!(Modifier::FunctionRef.symbol(), "get-func");
    assert_eq!(Modifier::FunctionRef.token(), "#'");
}

#[test]
fn test_cons() {
    let node = VNode::cons(sym("f"), vec![int(1), int(2)]);
    assert_eq!(node.children.first(), Some(&sym("f")));
    assert_eq!(node.children.rest(), &[int(1), int(2)]);
}

#[test]
fn test_line_pointer_ordering() {
    let a = LinePointer::new(3, 0, 2);
    let b = LinePointer::new(3, 1, 7);
    let past_end = LinePointer::new(3, 3, 0);
    assert!(a < b);
    assert!(a.is_valid() && b.is_valid());
    assert!(!past_end.is_valid());
    // source line number is metadata only
    assert_eq!(LinePointer::new(3, 1, 99), b);
    assert_eq!(b.real_line(), 7);
}

#[test]
fn test_body_item_descriptions() {
    assert_eq!(
        BodyItem::Varp(VarExp::Macro("m".into())).describe(),
        "Varp expression"
    );
    assert_eq!(BodyItem::Nothing.describe(), "'Nothing'");
}

#[test]
fn test_command_identifiers() {
    let cmd = LineCommand {
        kind: CommandKind::Trigger,
        name: "FU".into(),
        identifier: Some(vec![Iexp::Constant(3)]),
        condition: None,
        body: None,
    };
    assert_eq!(cmd.identifiers()[0].as_constant(), Some(3));
    assert!(cmd.kind.is_trigger());
    assert!(!CommandKind::Receiver.is_trigger());
}

#[test]
fn test_serialize_line() {
    let line = Line::SExpression(VNode::new(vec![sym("print"), int(1)]));
    let json = serde_json::to_value(&line).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"SExpression": {"children": [{"Symbol": "print"}, {"Literal": {"Int": 1}}]}})
    );
}
