mod common;

use common::{sample, select};
use core::ops::ControlFlow;
use rstest::{fixture, rstest};
use treepath_xpath::{Axis, AxisGuide, DynamicContextBuilder, Error, EvaluationError, XPathEngine};

#[fixture]
fn root() -> common::Node {
    sample()
}

#[rstest]
#[case("/list/item", vec![4, 8])]
#[case("/list/*", vec![4, 8, 13, 18])]
#[case("/list/node()", vec![4, 8, 12, 13, 18])]
#[case("/list/self::list", vec![1])]
#[case("/list/self::item", vec![])]
#[case("/", vec![0])]
#[case("//item", vec![4, 8])]
#[case("//text()", vec![7, 10, 15, 17, 20])]
#[case("//comment()", vec![11])]
#[case("//processing-instruction()", vec![12])]
#[case("//processing-instruction('proc')", vec![12])]
#[case("//processing-instruction('other')", vec![])]
#[case("/list/@*", vec![2, 3])]
#[case("//@id", vec![5, 9, 14])]
#[case("/list/item/@id/..", vec![4, 8])]
#[case("//sub/..", vec![13])]
#[case("//sub/ancestor::*", vec![1, 13])]
#[case("//sub/ancestor-or-self::node()", vec![0, 1, 13, 16])]
#[case("/list/item[1]/following-sibling::*", vec![8, 13, 18])]
#[case("/list/extra/preceding-sibling::node()", vec![4, 8, 12, 13])]
#[case("/list/item[2]/following::node()", vec![12, 13, 15, 16, 17, 18, 20])]
#[case("//sub/preceding::*", vec![4, 8])]
#[case("//@id/following-sibling::node()", vec![])]
#[case("/descendant::item", vec![4, 8])]
#[case("/list/namespace::*", vec![])]
fn axis_steps_select_in_document_order(
    root: common::Node,
    #[case] expr: &str,
    #[case] expected: Vec<usize>,
) {
    assert_eq!(select(&root, expr), expected, "{expr}");
}

#[rstest]
#[case("/list/extra/preceding-sibling::*[1]", vec![13])]
#[case("//sub/ancestor-or-self::*[2]", vec![13])]
#[case("//sub/ancestor::*[last()]", vec![1])]
#[case("/list/item[2]/preceding::node()[1]", vec![7])]
#[case("/list/*[1]", vec![4])]
#[case("/list/*[last()]", vec![18])]
fn reverse_axes_count_positions_from_the_origin(
    root: common::Node,
    #[case] expr: &str,
    #[case] expected: Vec<usize>,
) {
    assert_eq!(select(&root, expr), expected, "{expr}");
}

#[rstest]
fn descendant_shorthand_applies_predicates_per_parent(root: common::Node) {
    assert_eq!(select(&root, "//text()[1]"), vec![7, 10, 15, 17, 20]);
    assert_eq!(select(&root, "/descendant::text()[1]"), vec![7]);
    assert_eq!(select(&root, "(//text())[2]"), vec![10]);
}

#[rstest]
fn prefixed_name_tests(root: common::Node) {
    assert_eq!(select(&root, "/list/p:item"), vec![13]);
    assert_eq!(select(&root, "/list/p:*"), vec![13]);

    let ctx = DynamicContextBuilder::new()
        .with_context_node(root.clone())
        .with_namespace("q", "urn:p")
        .build();
    let engine = XPathEngine::new().unwrap();
    let found = engine.compile("/list/q:item").unwrap().evaluate_nodes(&ctx).unwrap();
    assert_eq!(found.iter().map(common::Node::idx).collect::<Vec<_>>(), vec![13]);
    let none = engine.compile("/list/q:extra").unwrap().evaluate_nodes(&ctx).unwrap();
    assert!(none.is_empty());
}

#[rstest]
fn guides_stop_when_the_visitor_breaks(root: common::Node) {
    let mut seen = 0;
    let flow = Axis::Descendant.guide(&root, &mut |_| {
        seen += 1;
        if seen == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
    });
    assert!(flow.is_break());
    assert_eq!(seen, 3);
    assert_eq!(Axis::Descendant.count(&root), 13);
    assert_eq!(Axis::Child.collect(&root).len(), 1);
}

#[rstest]
fn reverse_axes_visit_nearest_first(root: common::Node) {
    let origin = common::node(&root, 13);
    for axis in Axis::ALL {
        let visited: Vec<usize> = axis.collect(&origin).iter().map(common::Node::idx).collect();
        let ordered = if axis.is_reverse() {
            visited.windows(2).all(|w| w[0] > w[1])
        } else {
            visited.windows(2).all(|w| w[0] < w[1])
        };
        assert!(ordered, "{axis}: {visited:?}");
    }
    assert_eq!(select(&root, "//sub/ancestor::*[1]"), vec![13]);
    assert_eq!(select(&root, "//sub/preceding::*[1]"), vec![8]);
    assert_eq!(select(&root, "/list/extra/preceding-sibling::node()[2]"), vec![12]);
    assert_eq!(select(&root, "//sub/ancestor-or-self::*[last()]"), vec![1]);
}

#[rstest]
fn unknown_axis_is_an_evaluation_error(root: common::Node) {
    let err = treepath_xpath::evaluate("sideways::item", &common::context(&root)).unwrap_err();
    assert_eq!(err, Error::Evaluation(EvaluationError::UnknownAxis("sideways".into())));
}

#[rstest]
#[case("//node('x')")]
#[case("//text(1)")]
#[case("//comment('c')")]
#[case("//processing-instruction(1)")]
#[case("//processing-instruction('a', 'b')")]
fn malformed_node_type_tests_are_rejected(root: common::Node, #[case] expr: &str) {
    let err = treepath_xpath::evaluate(expr, &common::context(&root)).unwrap_err();
    let invalid = matches!(err, Error::Evaluation(EvaluationError::InvalidNodeTypeTest(_)));
    assert!(invalid, "{expr}: {err}");
}
