use super::*;
use crate::compiler_frontend::analysis::test_support::parse;

fn found(source: &str) -> Vec<(String, CandidateKind)> {
    let ast = parse(source);
    find_components(&ast, &HookPredicate::default())
        .into_iter()
        .map(|candidate| (candidate.name, candidate.kind))
        .collect()
}

#[test]
fn component_names_start_with_a_capital() {
    assert!(is_component_name("App"));
    assert!(is_component_name("_Private"));
    assert!(!is_component_name("app"));
    assert!(!is_component_name("_"));
    assert!(!is_component_name("__Double"));
    assert!(!is_component_name(""));
}

#[test]
fn every_top_level_function_form_is_found() {
    let source = "
function A() { return <a />; }
const B = () => <b />;
const C = function () { return null; };
export function D() { return <d />; }
export default function E() { return <e />; }
export const F = () => null;
";

    let names: Vec<String> = found(source).into_iter().map(|(name, _)| name).collect();

    assert_eq!(names, vec!["A", "B", "C", "D", "E", "F"]);
}

#[test]
fn every_return_has_to_render() {
    let source = "
function Good(props) {
    if (props.empty) {
        return null;
    }
    const body = <p />;
    return props.wide ? <Wide /> : body;
}
function Bad(props) {
    if (props.empty) {
        return 0;
    }
    return <p />;
}
function Bare() {
    return;
}
";

    assert_eq!(found(source), vec![(String::from("Good"), CandidateKind::Component)]);
}

#[test]
fn hooks_need_a_return_but_not_jsx() {
    let source = "
function useDouble(value) { return value * 2; }
function useNothing() { track(); }
function user() { return 1; }
";

    assert_eq!(found(source), vec![(String::from("useDouble"), CandidateKind::Hook)]);
}

#[test]
fn returns_of_nested_functions_do_not_count() {
    let source = "
function List(props) {
    const render = () => 42;
    return <ul>{props.items.map(render)}</ul>;
}
";

    assert_eq!(found(source), vec![(String::from("List"), CandidateKind::Component)]);
}

#[test]
fn nested_functions_are_not_candidates() {
    let source = "
function outer() {
    function Inner() { return <p />; }
    return Inner;
}
";

    assert!(found(source).is_empty());
}

#[test]
fn candidates_point_at_their_top_level_statement() {
    let ast = parse("const x = 1;\nexport const App = () => <p />;\n");
    let candidates = find_components(&ast, &HookPredicate::default());

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].statement, ast.body[1]);
}

#[test]
fn custom_hook_prefixes_are_respected() {
    let ast = parse("function $useStore() { return store; }\nfunction useStore() { return store; }");
    let hooks = HookPredicate::new(vec![String::from("$use")]);

    let names: Vec<String> = find_components(&ast, &hooks)
        .into_iter()
        .map(|candidate| candidate.name)
        .collect();

    assert_eq!(names, vec!["$useStore"]);
}
