use super::*;
use crate::compiler_frontend::analysis::test_support::{body_of, parse_function};
use crate::compiler_frontend::codegen::js::print_statement;

fn hoisted(source: &str) -> (usize, Vec<String>) {
    let (mut ast, function, _) = parse_function(source, "A");
    let block = body_of(&ast, function);
    let count = hoist_block_jsx(&mut ast, block);
    let printed = ast
        .block_statements(block)
        .iter()
        .map(|statement| print_statement(&ast, *statement))
        .collect();
    (count, printed)
}

#[test]
fn children_are_hoisted_before_their_parent() {
    let (count, printed) = hoisted("function A(user) { return <div title={format(user)}><Avatar user={user} /></div>; }");

    assert_eq!(count, 3);
    assert_eq!(
        printed,
        vec![
            "const _unwrappedJsxExp = format(user);",
            "const _unwrappedJsxEl = <Avatar user={user} />;",
            "const _unwrappedJsxEl2 = <div title={_unwrappedJsxExp}>{_unwrappedJsxEl}</div>;",
            "return _unwrappedJsxEl2;",
        ]
    );
}

#[test]
fn declarations_keep_their_own_element() {
    let (count, printed) = hoisted("function A(items) { const list = <ul>{items.map(render)}</ul>; return list; }");

    assert_eq!(count, 1);
    assert_eq!(
        printed,
        vec![
            "const _unwrappedJsxExp = items.map(render);",
            "const list = <ul>{_unwrappedJsxExp}</ul>;",
            "return list;",
        ]
    );
}

#[test]
fn trivial_containers_and_text_stay_inline() {
    let (count, printed) = hoisted("function A(name) { return <p>Hello {name} {\"!\"}</p>; }");

    assert_eq!(count, 1);
    assert_eq!(
        printed,
        vec!["const _unwrappedJsxEl = <p>Hello {name} {\"!\"}</p>;", "return _unwrappedJsxEl;"]
    );
}

#[test]
fn conditional_branches_are_hoisted_whole() {
    let (count, printed) = hoisted("function A(open) { return <div>{open ? <Panel /> : null}</div>; }");

    assert_eq!(count, 2);
    assert_eq!(printed[0], "const _unwrappedJsxExp = open ? <Panel /> : null;");
}

#[test]
fn statements_that_may_not_run_everything_are_left_alone() {
    let (count, printed) = hoisted("function A(a) { if (a) { show(<b />); } log(<i />); return null; }");

    assert_eq!(count, 0);
    assert_eq!(printed.len(), 3);
}

#[test]
fn fragments_hoist_their_children() {
    let (count, printed) = hoisted("function A(a) { return <><Left /><Right value={a} /></>; }");

    assert_eq!(count, 3);
    assert_eq!(printed[0], "const _unwrappedJsxEl = <Left />;");
    assert_eq!(printed[1], "const _unwrappedJsxEl2 = <Right value={a} />;");
    assert_eq!(printed[2], "const _unwrappedJsxEl3 = <>{_unwrappedJsxEl}{_unwrappedJsxEl2}</>;");
}
