mod common;

use common::{Node, context, sample};
use rstest::rstest;
use treepath_xpath::ValueType::{Any, Boolean, NodeSet as NS, Number, String as Str};
use treepath_xpath::{
    DefinitionError, DispatchError, Error, EvaluationContext, FunctionLibrary, NodeSet, Value,
    ValueType, XPathEngine,
};

type Outcome = Result<Value<Node>, Error>;
type Implementation =
    dyn Fn(&mut EvaluationContext<'_, Node>, &[Value<Node>]) -> Outcome + Send + Sync;

fn tagged(tag: &'static str) -> Box<Implementation> {
    Box::new(move |_, _| Ok(Value::String(tag.to_string())))
}

fn overloads() -> FunctionLibrary<Node> {
    let mut lib = FunctionLibrary::new();
    lib.define("f", Str, &[Number], tagged("number"))
        .unwrap()
        .define("f", Str, &[Any], tagged("any"))
        .unwrap()
        .define("g", Str, &[Any, Number], tagged("any-number"))
        .unwrap()
        .define("g", Str, &[Number, Any], tagged("number-any"))
        .unwrap()
        .define("g", Str, &[Any, Any], tagged("any-any"))
        .unwrap();
    lib
}

#[rstest]
#[case("f", vec![Number], "number")]
#[case("f", vec![Str], "any")]
#[case("f", vec![NS], "any")]
#[case("g", vec![Number, Number], "any-number")]
#[case("g", vec![Number, Str], "number-any")]
#[case("g", vec![Str, Boolean], "any-any")]
fn exact_types_win_then_lowest_wildcard_mask(
    #[case] name: &str,
    #[case] types: Vec<ValueType>,
    #[case] expected: &str,
) {
    let lib = overloads();
    let root = sample();
    let input = context(&root);
    let mut ctx = EvaluationContext::new(&input, &lib);
    let args: Vec<Value<Node>> = types
        .iter()
        .map(|t| match t {
            Number => Value::Number(1.0),
            Str => Value::String("s".into()),
            Boolean => Value::Boolean(true),
            _ => Value::NodeSet(NodeSet::new()),
        })
        .collect();
    assert_eq!(ctx.call(name, &args).unwrap(), Value::String(expected.into()));
    assert_eq!(lib.resolve(name, &types).unwrap().name(), name);
}

#[test]
fn arity_and_unknown_names_are_dispatch_errors() {
    let lib = overloads();
    let no_overload =
        DispatchError::NoMatchingOverload { name: "f".into(), arg_types: vec![Number, Number] };
    assert_eq!(lib.resolve("f", &[Number, Number]).err(), Some(Error::Dispatch(no_overload)));
    let unknown = DispatchError::UnknownFunction("h".into());
    assert_eq!(lib.resolve("h", &[]).err(), Some(Error::Dispatch(unknown)));
}

#[test]
fn unwrap_bypasses_dispatch() {
    let lib = overloads();
    assert_eq!(lib.unwrap("f", &[Any]).unwrap().params(), &[Any]);
    assert!(lib.unwrap("f", &[Str]).is_err());
    assert_eq!(lib.resolve("f", &[Str]).unwrap().params(), &[Any]);
}

#[rstest]
#[case("substring", vec![Any, Any], vec![Value::String("abc".into())])]
#[case("not", vec![Any], vec![])]
#[case("count", vec![NS], vec![Value::Number(1.0)])]
#[case("equals", vec![Number, Number], vec![Value::Number(1.0); 3])]
fn invoking_with_unfit_arguments_is_a_dispatch_error(
    #[case] name: &str,
    #[case] params: Vec<ValueType>,
    #[case] args: Vec<Value<Node>>,
) {
    let lib = FunctionLibrary::<Node>::core().unwrap();
    let root = sample();
    let input = context(&root);
    let mut ctx = EvaluationContext::new(&input, &lib);
    let arg_types: Vec<ValueType> = args.iter().map(Value::value_type).collect();
    let expected = DispatchError::NoMatchingOverload { name: name.into(), arg_types };

    let signature = lib.unwrap(name, &params).unwrap();
    assert!(!signature.accepts(&args));
    assert_eq!(signature.invoke(&mut ctx, &args).err(), Some(Error::Dispatch(expected.clone())));
    let exact = lib.call_exact(&mut ctx, name, &params, &args).err();
    assert_eq!(exact, Some(Error::Dispatch(expected)));
}

#[test]
fn bare_functions_accept_any_arguments() {
    let mut lib = overloads();
    lib.define_bare("v", Str, tagged("bare")).unwrap();
    let signature = lib.unwrap("v", &[]).unwrap();
    assert!(signature.is_bare());
    assert!(signature.accepts(&[Value::Number(1.0), Value::Boolean(false)]));
    assert!(!lib.unwrap("f", &[Any]).unwrap().is_bare());
}

#[test]
fn definition_errors() {
    let mut lib = overloads();
    let dup = lib.define("f", Str, &[Number], tagged("again")).err();
    let duplicate =
        DefinitionError::DuplicateSignature { name: "f".into(), signature: vec![Number] };
    assert_eq!(dup, Some(Error::Definition(duplicate)));
    assert_eq!(
        lib.define_bare("f", Str, tagged("bare")).err(),
        Some(Error::Definition(DefinitionError::AlreadyDefined("f".into())))
    );
    lib.define_bare("v", Str, tagged("bare")).unwrap();
    assert_eq!(
        lib.define("v", Str, &[], tagged("typed")).err(),
        Some(Error::Definition(DefinitionError::AlreadyDefined("v".into())))
    );
    assert_eq!(lib.resolve("v", &[Number, Str, NS]).unwrap().params(), &[] as &[ValueType]);
}

#[test]
fn core_library_is_complete() {
    let lib = FunctionLibrary::<Node>::core().unwrap();
    for name in [
        "last", "position", "count", "id", "local-name", "namespace-uri", "name", "string",
        "concat", "starts-with", "contains", "substring-before", "substring-after", "substring",
        "string-length", "normalize-space", "translate", "boolean", "not", "true", "false", "lang",
        "number", "sum", "floor", "ceiling", "round", "union", "equals", "not-equals", "less-than",
        "greater-than", "less-than-or-equal", "greater-than-or-equal", "add", "subtract",
        "multiply", "divide", "modulus", "negate",
    ] {
        assert!(lib.contains(name), "{name}");
    }
    assert_eq!(lib.names().count(), 40);
}

#[test]
fn engines_evaluate_with_their_own_library() {
    let mut lib = FunctionLibrary::<Node>::core().unwrap();
    lib.define("add", Str, &[Str, Str], |_, a| {
        let (l, r) = (a[0].as_str().unwrap_or_default(), a[1].as_str().unwrap_or_default());
        Ok(Value::String(format!("{l}{r}")))
    })
    .unwrap()
    .define("shout", Str, &[Any], |ctx, a| {
        let s = ctx.call("string", a)?;
        Ok(Value::String(s.as_str().unwrap_or_default().to_uppercase()))
    })
    .unwrap();

    let custom = XPathEngine::builder().with_functions(lib).build().unwrap();
    let core = XPathEngine::<Node>::new().unwrap();
    let root = sample();
    let ctx = context(&root);

    assert_eq!(custom.evaluate("'a' + 'b'", &ctx).unwrap(), Some(Value::String("ab".into())));
    assert_eq!(custom.evaluate("1 + '2'", &ctx).unwrap(), Some(Value::Number(3.0)));
    let shouted = custom.evaluate("shout(//item[2])", &ctx).unwrap();
    assert_eq!(shouted, Some(Value::String("TWO".into())));
    let sum = core.evaluate("'a' + 'b'", &ctx).unwrap();
    assert!(sum.is_some_and(|v| v.as_number().is_some_and(f64::is_nan)));
    let unknown = core.evaluate("shout('x')", &ctx);
    assert!(matches!(unknown, Err(Error::Dispatch(DispatchError::UnknownFunction(_)))));
}
