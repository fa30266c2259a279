mod common;

use common::{Node, context, sample};
use rstest::{fixture, rstest};
use treepath_xpath::simple_node::{SimpleNode, attr, doc, elem, text};
use treepath_xpath::{
    CompiledXPath, DynamicContextBuilder, Error, EvaluationError, Value, ValueType, XPathEngine,
    XdmNode,
};

#[fixture]
fn root() -> Node {
    sample()
}

fn same_tree<N: XdmNode + 'static>(a: &CompiledXPath<N>, b: &CompiledXPath<N>) -> bool {
    std::ptr::eq(a.ast(), b.ast())
}

#[test]
fn repeated_compiles_hit_the_cache() {
    let engine = XPathEngine::<Node>::new().unwrap();
    assert_eq!(engine.cached(), 0);
    let first = engine.compile("//item/@id").unwrap();
    let again = engine.compile("//item/@id").unwrap();
    assert_eq!(engine.cached(), 1);
    assert!(same_tree(&first, &again));
    assert_eq!(again.source(), "//item/@id");
    assert_eq!(again.ast().to_string(), "/descendant-or-self::node()/child::item/attribute::id");
}

#[test]
fn zero_capacity_disables_caching() {
    let engine = XPathEngine::<Node>::builder().with_cache_capacity(0).build().unwrap();
    let a = engine.compile("1 + 1").unwrap();
    let b = engine.compile("1 + 1").unwrap();
    assert_eq!(engine.cached(), 0);
    assert!(!same_tree(&a, &b));
    assert_eq!(a.ast(), b.ast());
}

#[test]
fn least_recently_used_expressions_are_evicted() {
    let engine = XPathEngine::<Node>::builder().with_cache_capacity(2).build().unwrap();
    let a = engine.compile("'a'").unwrap();
    let b = engine.compile("'b'").unwrap();
    engine.compile("'a'").unwrap();
    engine.compile("'c'").unwrap();
    assert_eq!(engine.cached(), 2);
    assert!(same_tree(&a, &engine.compile("'a'").unwrap()));
    assert!(!same_tree(&b, &engine.compile("'b'").unwrap()));
}

#[test]
fn failed_compiles_are_not_cached() {
    let engine = XPathEngine::<Node>::new().unwrap();
    assert!(matches!(engine.compile("1 +"), Err(Error::Parse(_))));
    assert!(matches!(engine.compile("1 +"), Err(Error::Parse(_))));
    assert_eq!(engine.cached(), 0);
}

#[rstest]
fn compiled_expressions_evaluate_many_times(root: Node) {
    let engine = XPathEngine::new().unwrap();
    let count = engine.compile("count(*)").unwrap();
    assert_eq!(count.evaluate_number(&context(&root)).unwrap(), 1.0);
    assert_eq!(count.evaluate_number(&context(&common::node(&root, 1))).unwrap(), 4.0);
    assert_eq!(count.evaluate_number(&context(&common::node(&root, 7))).unwrap(), 0.0);
}

#[rstest]
fn typed_helpers_convert_results(root: Node) {
    let engine = XPathEngine::new().unwrap();
    let ctx = context(&root);
    assert_eq!(engine.compile("//item").unwrap().evaluate_string(&ctx).unwrap(), "one");
    assert_eq!(engine.compile("//sub").unwrap().evaluate_number(&ctx).unwrap(), 4.0);
    assert!(engine.compile("//missing").unwrap().evaluate_number(&ctx).unwrap().is_nan());
    assert!(engine.compile("//comment()").unwrap().evaluate_boolean(&ctx).unwrap());
    assert!(!engine.compile("''").unwrap().evaluate_boolean(&ctx).unwrap());
    assert_eq!(engine.compile("12 div 5").unwrap().evaluate_string(&ctx).unwrap(), "2.4");
    assert_eq!(
        engine.compile("count(//item)").unwrap().evaluate_nodes(&ctx).unwrap_err(),
        Error::Evaluation(EvaluationError::NotANodeSet { found: ValueType::Number })
    );
}

#[rstest]
fn raw_results_keep_their_type(root: Node) {
    let engine = XPathEngine::new().unwrap();
    let ctx = context(&root);
    let value = engine.evaluate("//item", &ctx).unwrap().unwrap();
    assert_eq!(value.value_type(), ValueType::NodeSet);
    assert_eq!(engine.evaluate("'x'", &ctx).unwrap(), Some(Value::String("x".into())));
    assert_eq!(engine.evaluate("not(1)", &ctx).unwrap(), Some(Value::Boolean(false)));
}

#[test]
fn engines_are_shared_between_threads() {
    let document = doc()
        .child(
            elem("inventory")
                .child(elem("part").attr(attr("sku", "p-1")).child(text("bolt")))
                .child(elem("part").attr(attr("sku", "p-2")).child(text("nut")))
                .child(elem("part").attr(attr("sku", "p-3")).child(text("washer"))),
        )
        .build();
    let engine = XPathEngine::<SimpleNode>::new().unwrap();
    let ctx = DynamicContextBuilder::new().with_context_node(document.clone()).build();

    std::thread::scope(|scope| {
        let workers: Vec<_> = (1..=3)
            .map(|i| {
                let (engine, ctx) = (&engine, &ctx);
                scope.spawn(move || {
                    let expr = format!("string(//part[{i}])");
                    engine.compile(&expr).unwrap().evaluate_string(ctx).unwrap()
                })
            })
            .collect();
        let names: Vec<String> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        assert_eq!(names, vec!["bolt", "nut", "washer"]);
    });
    assert_eq!(engine.cached(), 3);

    let skus = engine.compile("//part/@sku").unwrap().evaluate_nodes(&ctx).unwrap();
    let skus: Vec<String> = skus.iter().filter_map(XdmNode::value).collect();
    assert_eq!(skus, vec!["p-1", "p-2", "p-3"]);
}
