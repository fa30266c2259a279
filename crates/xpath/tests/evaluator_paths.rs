mod common;

use common::{Node, context, sample, select};
use rstest::{fixture, rstest};
use treepath_xpath::simple_node::{attr, doc, elem, text};
use treepath_xpath::{
    DynamicContextBuilder, Error, EvaluationError, Value, Variable, XPathEngine, XdmNode, compile,
    evaluate,
};

#[fixture]
fn root() -> Node {
    sample()
}

#[test]
fn first_item_id_in_a_simple_tree() {
    let document = doc()
        .child(
            elem("root")
                .child(elem("item").attr(attr("id", "1")).child(text("first")))
                .child(elem("item").attr(attr("id", "2")).child(text("second"))),
        )
        .build();
    let ctx = DynamicContextBuilder::new().with_context_node(document.clone()).build();
    let ids = compile("//item[position()=1]/@id").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(ids.len(), 1);
    let id = ids.first().unwrap();
    assert_eq!(id.value().as_deref(), Some("1"));
    assert_eq!(id.parent().unwrap().children()[0].value().as_deref(), Some("first"));
}

#[test]
fn arithmetic_without_a_context_node() {
    let ctx = DynamicContextBuilder::<Node>::new().build();
    assert_eq!(evaluate("2 + 3 * 4", &ctx).unwrap(), Some(Value::Number(14.0)));
    assert_eq!(evaluate("(2 + 3) * 4", &ctx).unwrap(), Some(Value::Number(20.0)));
    assert_eq!(evaluate("10 - 4 - 3", &ctx).unwrap(), Some(Value::Number(3.0)));
    assert_eq!(evaluate("2 * -3", &ctx).unwrap(), Some(Value::Number(-6.0)));
}

#[test]
fn paths_without_a_context_node_fail() {
    let ctx = DynamicContextBuilder::<Node>::new().build();
    for expr in ["/list", "item", "//item", "."] {
        let err = evaluate(expr, &ctx).unwrap_err();
        assert_eq!(err, Error::Evaluation(EvaluationError::NoContextItem), "{expr}");
    }
}

#[rstest]
#[case("//item[@kind]", vec![4])]
#[case("//item[not(@kind)]", vec![8])]
#[case("/list/*[@id = 'c']", vec![13])]
#[case("/list/*[2]", vec![8])]
#[case("/list/*[position() > 1][1]", vec![8])]
#[case("/list/*[last() - 1]", vec![13])]
#[case("/list/*[position() = last()]", vec![18])]
#[case("/list/*[1.5]", vec![])]
#[case("/list/*['']", vec![])]
#[case("/list/*['x']", vec![4, 8, 13, 18])]
#[case("//*[sub]", vec![13])]
#[case("//*[. = 'two']", vec![8])]
#[case("//*[text() = 'one' or text() = 'two']", vec![4, 8])]
#[case("//*[count(@*) = 2]", vec![1, 4])]
#[case("/list/item[2]/preceding-sibling::item[1]/@id", vec![5])]
fn predicates(root: Node, #[case] expr: &str, #[case] expected: Vec<usize>) {
    assert_eq!(select(&root, expr), expected, "{expr}");
}

#[rstest]
#[case("//item | //extra", vec![4, 8, 18])]
#[case("//extra | //item", vec![4, 8, 18])]
#[case("//item | //item/@id | /list", vec![1, 4, 5, 8, 9])]
#[case("(//item | //extra)[last()]", vec![18])]
#[case("(/list/* | /list)/@id", vec![5, 9, 14])]
#[case("(//item)[2]/text()", vec![10])]
#[case("/list/extra/../item", vec![4, 8])]
#[case("/list/item/./@id", vec![5, 9])]
#[case("/list//sub", vec![16])]
#[case("(/list)//text()[. = '4']", vec![17])]
fn unions_and_filter_paths(root: Node, #[case] expr: &str, #[case] expected: Vec<usize>) {
    assert_eq!(select(&root, expr), expected, "{expr}");
}

#[rstest]
fn relative_paths_start_at_the_context_node(root: Node) {
    let list = common::node(&root, 1);
    let engine = XPathEngine::new().unwrap();
    let q = engine.compile("item/@id").unwrap();
    let ctx = context(&list);
    let ids: Vec<usize> = q.evaluate_nodes(&ctx).unwrap().iter().map(Node::idx).collect();
    assert_eq!(ids, vec![5, 9]);
    assert_eq!(engine.compile("name(..)").unwrap().evaluate_string(&ctx).unwrap(), "");
    assert_eq!(engine.compile("name(/*)").unwrap().evaluate_string(&ctx).unwrap(), "list");
}

#[rstest]
fn several_context_nodes_are_all_steps_origins(root: Node) {
    let items = [common::node(&root, 4), common::node(&root, 13)];
    let ctx = DynamicContextBuilder::new().with_context_nodes(items).build();
    let found = compile("@id").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(found.iter().map(Node::idx).collect::<Vec<_>>(), vec![5, 14]);
}

#[rstest]
fn node_set_variables_feed_paths(root: Node) {
    let items = vec![common::node(&root, 8), common::node(&root, 4)];
    let ctx = DynamicContextBuilder::new()
        .with_context_node(root.clone())
        .with_variable("items", items)
        .with_variable("wanted", "b")
        .build();
    let engine = XPathEngine::new().unwrap();
    let ids = engine.compile("$items/@id").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(ids.iter().map(Node::idx).collect::<Vec<_>>(), vec![5, 9]);
    let hit = engine.compile("$items[@id = $wanted]").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(hit.iter().map(Node::idx).collect::<Vec<_>>(), vec![8]);
    let texts = engine.compile("count($items//text())").unwrap();
    assert_eq!(texts.evaluate_number(&ctx).unwrap(), 2.0);
}

#[rstest]
fn thunks_see_the_current_focus(root: Node) {
    let ctx = DynamicContextBuilder::new()
        .with_context_node(root.clone())
        .with_variable(
            "here",
            Variable::<Node>::thunk(|ctx| match ctx.dot() {
                Some(n) => Variable::Node(n.clone()),
                None => Variable::Nodes(Vec::new()),
            }),
        )
        .build();
    let found = compile("/list/*[$here/@id = 'b']").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(found.iter().map(Node::idx).collect::<Vec<_>>(), vec![8]);
}

#[rstest]
fn builtin_focus_variables(root: Node) {
    let ctx = DynamicContextBuilder::new()
        .with_context_node(root.clone())
        .with_variable("position", 99)
        .build();
    let found = compile("/list/*[$position = $last]").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(found.iter().map(Node::idx).collect::<Vec<_>>(), vec![18]);
    let dots = compile("/list/item[$dot/@id = 'a']").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(dots.iter().map(Node::idx).collect::<Vec<_>>(), vec![4]);
}

#[rstest]
fn undefined_variables_are_reported(root: Node) {
    let err = evaluate("$missing + 1", &context(&root)).unwrap_err();
    assert_eq!(err, Error::Evaluation(EvaluationError::UndefinedVariable("missing".into())));
}

#[rstest]
fn thunks_must_resolve_to_a_value(root: Node) {
    let nested = Variable::<Node>::thunk(|_| Variable::thunk(|_| Variable::Boolean(true)));
    let ctx = DynamicContextBuilder::new()
        .with_context_node(root.clone())
        .with_variable("loop", nested)
        .build();
    let err = evaluate("$loop", &ctx).unwrap_err();
    assert_eq!(err, Error::Evaluation(EvaluationError::UnresolvableVariableType("loop".into())));
}

#[rstest]
#[case("1 | 2")]
#[case("'a'/b")]
#[case("(1)[1]")]
fn node_set_operands_are_required(root: Node, #[case] expr: &str) {
    let err = evaluate(expr, &context(&root)).unwrap_err();
    assert!(
        matches!(err, Error::Evaluation(EvaluationError::NotANodeSet { .. }) | Error::Dispatch(_)),
        "{expr}: {err}"
    );
}

#[rstest]
fn short_circuit_skips_the_right_operand(root: Node) {
    let ctx = context(&root);
    assert_eq!(evaluate("true() or $missing", &ctx).unwrap(), Some(Value::Boolean(true)));
    assert_eq!(evaluate("false() and $missing", &ctx).unwrap(), Some(Value::Boolean(false)));
    assert!(evaluate("false() or $missing", &ctx).is_err());
}
