//! Tests for the script index and configuration.

use super::*;
use erm_ir::{Iexp, Line, LinePointer};
use erm_syntax::{parse_source, DEFAULT_MAX_DEPTH};
use std::collections::HashSet;

fn index(source: &str) -> ScriptIndex {
    let (_, lines) = parse_source(source, DEFAULT_MAX_DEPTH).expect("parse failed");
    ScriptIndex::build(lines)
}

fn real_lines(ptrs: &[LinePointer]) -> Vec<usize> {
    ptrs.iter().map(LinePointer::real_line).collect()
}

const MIXED: &str = "ZVSE
!#VRv1:S0;
!?FU2;
!!VRv1:+1;
!?TR1/2;
!** comment inside a body
!!IF:M^hi^;
!?FU1;
!$OB3;
!!VRv2:S1;
!?TR5;";

#[test]
fn test_buckets_and_order() {
    let idx = index(MIXED);
    let kinds: Vec<&TriggerKind> = idx.triggers().keys().collect();
    assert_eq!(
        kinds,
        vec![&TriggerKind::Function, &TriggerKind::Named("TR".into())]
    );
    assert_eq!(real_lines(&idx.triggers()[&TriggerKind::Function]), vec![3, 8]);
    assert_eq!(
        real_lines(&idx.triggers()[&TriggerKind::Named("TR".into())]),
        vec![5, 11]
    );
    assert_eq!(
        real_lines(&idx.post_triggers()[&TriggerKind::Named("OB".into())]),
        vec![9]
    );
    assert_eq!(real_lines(idx.instructions()), vec![2, 4, 7, 10]);
}

#[test]
fn test_classification_partitions_lines() {
    let idx = index(MIXED);
    let mut seen = HashSet::new();
    let declarations = idx
        .triggers()
        .values()
        .chain(idx.post_triggers().values())
        .flatten();
    for ptr in declarations.chain(idx.instructions()) {
        assert!(seen.insert(*ptr), "line {} classified twice", ptr.real_line());
    }
    for ptr in idx.pointers() {
        let is_comment = idx.line(ptr).is_some_and(Line::is_comment);
        assert_eq!(seen.contains(&ptr), !is_comment, "line {}", ptr.real_line());
    }
}

#[test]
fn test_bodies_stop_at_next_declaration() {
    let idx = index(MIXED);
    let tr = idx.triggers()[&TriggerKind::Named("TR".into())][0];
    assert_eq!(real_lines(&idx.body(tr)), vec![6, 7]);

    let fu1 = idx.triggers()[&TriggerKind::Function][1];
    assert!(idx.body(fu1).is_empty());

    let last = idx.triggers()[&TriggerKind::Named("TR".into())][1];
    assert!(idx.body(last).is_empty());
}

#[test]
fn test_entry_instructions_exclude_bodies() {
    let idx = index(MIXED);
    let entry: Vec<usize> = idx.entry_instructions().map(|p| p.real_line()).collect();
    assert_eq!(entry, vec![2]);
}

#[test]
fn test_trigger_decl_from_command() {
    let idx = index("!?TR1/2&3;");
    let ptr = idx.triggers()[&TriggerKind::Named("TR".into())][0];
    let decl = idx.trigger_decl(ptr).unwrap();
    assert_eq!(decl.name, "TR");
    assert_eq!(decl.identifiers, vec![Iexp::Constant(1), Iexp::Constant(2)]);
    assert!(decl.condition.is_some());
}

#[test]
fn test_verm_trigger_forms() {
    let idx = index("VERM\n![trigger TM 2 7]\n![print 1]\n![postTrigger TM]\n![]");
    let ptr = idx.triggers()[&TriggerKind::Named("TM".into())][0];
    let decl = idx.trigger_decl(ptr).unwrap();
    assert_eq!(decl.identifiers, vec![Iexp::Constant(2), Iexp::Constant(7)]);
    assert_eq!(idx.post_triggers().len(), 1);
    // an empty form is never a trigger
    assert_eq!(real_lines(idx.instructions()), vec![3, 5]);
}

#[test]
fn test_verm_trigger_without_name_is_instruction() {
    let idx = index("VERM\n![trigger 5]\n![trigger]\n![postTrigger 3]\n![print 1]");
    assert!(idx.triggers().is_empty());
    assert!(idx.post_triggers().is_empty());
    assert_eq!(real_lines(idx.instructions()), vec![2, 3, 4, 5]);
    let entry: Vec<usize> = idx.entry_instructions().map(|p| p.real_line()).collect();
    assert_eq!(entry, vec![2, 3, 4, 5]);
}

#[test]
fn test_verm_trigger_bad_identifier() {
    let idx = index("VERM\n![trigger TM x]");
    let ptr = idx.triggers()[&TriggerKind::Named("TM".into())][0];
    let err = idx.trigger_decl(ptr).unwrap_err();
    assert!(err.to_string().contains("integer literals"));
}

#[test]
fn test_trigger_decl_rejects_instruction() {
    let idx = index("!!VR1:S1;");
    let ptr = idx.instructions()[0];
    assert!(matches!(
        idx.trigger_decl(ptr),
        Err(IndexError::Classification { .. })
    ));
}

#[test]
fn test_pointer_navigation() {
    let idx = index("!!VR1:S1;\n!!VR2:S2;");
    let first = idx.first().unwrap();
    let second = idx.next(first).unwrap();
    assert_eq!(second.real_line(), 2);
    assert!(idx.next(second).is_none());
    // pointers from another script do not resolve
    assert!(idx.line(LinePointer::new(5, 0, 1)).is_none());
}

#[test]
fn test_summary_serializes() {
    let idx = index(MIXED);
    let summary = idx.summary();
    assert_eq!(summary.lines, 10);
    assert_eq!(summary.triggers[0].kind, "FU");
    assert_eq!(summary.post_triggers[0].lines, vec![9]);
}

#[test]
fn test_config_defaults_and_toml() {
    let config = CompilerConfig::default();
    assert_eq!(config.erm_module, "core:erm");
    assert!(!config.strict_receivers);
    assert!(config.accepts_receiver("ZZ"));

    let config = CompilerConfig::from_toml_str(
        "strict_receivers = true\nknown_receivers = [\"IF\"]\nmax_nesting_depth = 8",
    )
    .unwrap();
    assert_eq!(config.max_nesting_depth, 8);
    assert_eq!(config.verm_module, "core:verm");
    assert!(config.accepts_receiver("IF"));
    assert!(!config.accepts_receiver("OW"));

    assert!(CompilerConfig::from_toml_str("max_nesting_depth = \"deep\"").is_err());
    assert!(matches!(
        CompilerConfig::load("/nonexistent/ermc.toml"),
        Err(ConfigError::Io { .. })
    ));
}
