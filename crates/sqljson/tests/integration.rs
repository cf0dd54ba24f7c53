//! Black-box integration tests for sqljson
//!
//! These tests exercise the full bind → evaluate → resolve pipeline.

use std::sync::Arc;
use std::thread;

use serde_json::{Value as JsonValue, json};
use sqljson::ir::{ArithmeticOp, ComparisonOp, Method, Subscript};
use sqljson::{
    EvalError, ExistsBehavior, Item, JsonPath, JsonQueryOptions, JsonValueOptions,
    ParameterBindings, PathMode, PathNode, QueryBehavior, SessionContext, SqlJsonError,
    SqlJsonFunction, SqlType, SqlValue, ValueBehavior, WrapperBehavior, evaluate, json_exists,
    json_query, json_value,
};

fn doc(value: JsonValue) -> Item {
    Item::from(value)
}

fn eval_json(path: &JsonPath, input: JsonValue) -> Vec<JsonValue> {
    path.evaluate(&doc(input), &ParameterBindings::new())
        .unwrap()
        .iter()
        .map(Item::to_json)
        .collect()
}

fn store() -> JsonValue {
    json!({
        "store": {
            "book": [
                {"title": "Sayings", "price": 8.95, "tags": ["old"]},
                {"title": "Sword", "price": 12.99},
                {"title": "Moby", "price": 8.99, "isbn": "0-553"},
                {"title": "Rings", "price": 22.99, "isbn": "0-395"}
            ],
            "bicycle": {"color": "red", "price": 19.95}
        }
    })
}

// ============ JSON_EXISTS ============

#[test]
fn exists_index_in_bounds() {
    let path = JsonPath::lax(PathNode::context().member("a").index(2)).unwrap();
    let result = json_exists(
        &doc(json!({"a": [1, 2, 3]})),
        &path,
        vec![],
        ExistsBehavior::False,
    );
    assert_eq!(result, Ok(Some(true)));
}

#[test]
fn exists_strict_out_of_bounds() {
    let path = JsonPath::strict(PathNode::context().member("a").index(5)).unwrap();
    let input = doc(json!({"a": [1, 2, 3]}));

    assert_eq!(
        json_exists(&input, &path, vec![], ExistsBehavior::False),
        Ok(Some(false))
    );
    assert!(matches!(
        json_exists(&input, &path, vec![], ExistsBehavior::Error),
        Err(SqlJsonError::Eval(EvalError::Structural(_)))
    ));

    // lax mode drops the out-of-bounds subscript instead
    let lax = JsonPath::lax(PathNode::context().member("a").index(5)).unwrap();
    assert_eq!(
        json_exists(&input, &lax, vec![], ExistsBehavior::Error),
        Ok(Some(false))
    );
}

#[test]
fn exists_with_passing_parameters() {
    let path = JsonPath::lax(
        PathNode::context().member("store").member("book").filter(
            PathNode::current()
                .member("price")
                .compare(ComparisonOp::GreaterThan, PathNode::variable("limit")),
        ),
    )
    .unwrap();
    let input = doc(store());
    let run = |limit: f64| {
        json_exists(
            &input,
            &path,
            vec![("limit".to_string(), Item::float(limit))],
            ExistsBehavior::Error,
        )
    };
    assert_eq!(run(20.0), Ok(Some(true)));
    assert_eq!(run(100.0), Ok(Some(false)));

    // an unbound variable is an error, not null
    assert!(matches!(
        json_exists(&input, &path, vec![], ExistsBehavior::Error),
        Err(SqlJsonError::Eval(EvalError::ParameterBinding(_)))
    ));
    assert_eq!(
        json_exists(&input, &path, vec![], ExistsBehavior::Unknown),
        Ok(None)
    );
}

// ============ JSON_VALUE ============

#[test]
fn value_two_items_maps_to_null() {
    let path = JsonPath::lax(PathNode::context().wildcard_member()).unwrap();
    let input = doc(json!({"a": 1, "b": 2}));
    let session = SessionContext::default();

    assert_eq!(
        json_value(&input, &path, vec![], &JsonValueOptions::default(), &session),
        Ok(None)
    );
    let raise = JsonValueOptions {
        on_error: ValueBehavior::Error,
        ..Default::default()
    };
    let err = json_value(&input, &path, vec![], &raise, &session).unwrap_err();
    assert!(matches!(err, SqlJsonError::Eval(EvalError::Structural(_))));
    assert!(err.to_string().contains("singleton item required"));
}

#[test]
fn value_returning_types() {
    let input = doc(store());
    let session = SessionContext::default();
    let price = JsonPath::lax(
        PathNode::context()
            .member("store")
            .member("bicycle")
            .member("price"),
    )
    .unwrap();

    let run = |returning| {
        let options = JsonValueOptions {
            returning: Some(returning),
            on_error: ValueBehavior::Error,
            ..Default::default()
        };
        json_value(&input, &price, vec![], &options, &session)
    };
    assert_eq!(run(SqlType::Double), Ok(Some(SqlValue::Double(19.95))));
    assert_eq!(
        run(SqlType::Varchar(None)),
        Ok(Some(SqlValue::Varchar("19.95".to_string())))
    );
    assert!(matches!(
        run(SqlType::Integer),
        Err(SqlJsonError::Coercion(_))
    ));
}

#[test]
fn value_on_empty_error_is_not_caught() {
    let path = JsonPath::lax(PathNode::context().member("missing")).unwrap();
    let options = JsonValueOptions {
        on_empty: ValueBehavior::Error,
        on_error: ValueBehavior::Default(SqlValue::BigInt(0)),
        ..Default::default()
    };
    let err = json_value(
        &doc(json!({})),
        &path,
        vec![],
        &options,
        &SessionContext::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SqlJsonError::EmptyResult {
            function: SqlJsonFunction::Value
        }
    );
    assert_eq!(err.to_string(), "JSON_VALUE path returned no items");
}

#[test]
fn value_of_datetime_method() {
    let path = JsonPath::lax(
        PathNode::context()
            .member("when")
            .method(Method::Datetime(None)),
    )
    .unwrap();
    let options = JsonValueOptions {
        returning: Some(SqlType::Date),
        ..Default::default()
    };
    let result = json_value(
        &doc(json!({"when": "2024-02-29T10:00:00"})),
        &path,
        vec![],
        &options,
        &SessionContext::default(),
    )
    .unwrap();
    assert_eq!(
        result.map(|value| value.to_string()),
        Some("2024-02-29".to_string())
    );
}

// ============ JSON_QUERY ============

#[test]
fn query_with_wrappers() {
    let titles = JsonPath::lax(
        PathNode::context()
            .member("store")
            .member("book")
            .filter(PathNode::current().member("isbn").exists())
            .member("title"),
    )
    .unwrap();
    let input = doc(store());
    let run = |wrapper| {
        let options = JsonQueryOptions {
            wrapper,
            ..Default::default()
        };
        json_query(&input, &titles, vec![], &options)
    };
    assert_eq!(
        run(WrapperBehavior::Unconditional),
        Ok(Some(json!(["Moby", "Rings"])))
    );
    assert_eq!(
        run(WrapperBehavior::Conditional),
        Ok(Some(json!(["Moby", "Rings"])))
    );
    // two items without a wrapper: ON ERROR NULL
    assert_eq!(run(WrapperBehavior::Without), Ok(None));
}

#[test]
fn query_empty_object_on_empty() {
    let path = JsonPath::strict(PathNode::context().member("a").elements()).unwrap();
    let options = JsonQueryOptions {
        on_empty: QueryBehavior::EmptyObject,
        ..Default::default()
    };
    assert_eq!(
        json_query(&doc(json!({"a": []})), &path, vec![], &options),
        Ok(Some(json!({})))
    );
}

#[test]
fn query_keyvalue_output() {
    let path = JsonPath::lax(
        PathNode::context()
            .member("bicycle")
            .method(Method::KeyValue),
    )
    .unwrap();
    let options = JsonQueryOptions {
        wrapper: WrapperBehavior::Unconditional,
        ..Default::default()
    };
    let input = doc(json!({"bicycle": {"color": "red", "gears": 3}}));
    assert_eq!(
        json_query(&input, &path, vec![], &options),
        Ok(Some(json!([
            {"key": "color", "value": "red", "id": 0},
            {"key": "gears", "value": 3, "id": 0}
        ])))
    );
}

// ============ Sentinel short-circuit ============

#[test]
fn sentinel_in_input_or_parameters() {
    // the path would fail on an unbound variable if it were ever evaluated
    let path = JsonPath::strict(PathNode::variable("never")).unwrap();
    let poisoned = Item::Array(vec![Item::int(1), Item::InputError]);

    let err = json_exists(&poisoned, &path, vec![], ExistsBehavior::Error).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed input argument to JSON_EXISTS function"
    );
    assert_eq!(
        json_exists(&poisoned, &path, vec![], ExistsBehavior::True),
        Ok(Some(true))
    );

    let params = vec![("p".to_string(), Item::InputError)];
    let options = JsonValueOptions {
        on_error: ValueBehavior::Error,
        ..Default::default()
    };
    let err = json_value(
        &Item::Null,
        &path,
        params,
        &options,
        &SessionContext::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed JSON path parameter to JSON_VALUE function"
    );
}

// ============ Path evaluation ============

#[test]
fn lax_and_strict_member_access() {
    let path = |mode| {
        JsonPath::new(mode, PathNode::context().member("store").member("book").member("title"))
            .unwrap()
    };
    assert_eq!(
        eval_json(&path(PathMode::Lax), store()),
        vec![json!("Sayings"), json!("Sword"), json!("Moby"), json!("Rings")]
    );
    let strict = path(PathMode::Strict).evaluate(&doc(store()), &ParameterBindings::new());
    assert!(matches!(strict, Err(EvalError::Structural(_))));
}

#[test]
fn subscripts_with_last_arithmetic() {
    let path = JsonPath::strict(
        PathNode::context()
            .member("store")
            .member("book")
            .subscripts(vec![
                Subscript::Index(PathNode::last()),
                Subscript::Range {
                    from: PathNode::literal(0),
                    to: PathNode::last().arith(ArithmeticOp::Subtract, PathNode::literal(2)),
                },
            ])
            .member("title"),
    )
    .unwrap();
    assert_eq!(
        eval_json(&path, store()),
        vec![json!("Rings"), json!("Sayings"), json!("Sword")]
    );
}

#[test]
fn filter_with_arithmetic_and_methods() {
    let path = JsonPath::lax(
        PathNode::context()
            .member("store")
            .member("book")
            .filter(
                PathNode::current()
                    .member("price")
                    .method(Method::Floor)
                    .compare(ComparisonOp::Equal, PathNode::literal(8))
                    .and(
                        PathNode::current()
                            .member("title")
                            .starts_with(PathNode::literal("M")),
                    ),
            )
            .member("price")
            .arith(ArithmeticOp::Multiply, PathNode::literal(2)),
    )
    .unwrap();
    assert_eq!(eval_json(&path, store()), vec![json!(17.98)]);
}

#[test]
fn methods_on_sequences() {
    let types = JsonPath::lax(PathNode::context().wildcard_member().method(Method::Type)).unwrap();
    assert_eq!(
        eval_json(&types, json!({"a": 1, "b": "x", "c": [1], "d": null})),
        vec![json!("number"), json!("string"), json!("array"), json!("null")]
    );

    let sizes = JsonPath::lax(PathNode::context().wildcard_member().method(Method::Size)).unwrap();
    assert_eq!(
        eval_json(&sizes, json!({"a": [1, 2, 3], "b": "x"})),
        vec![json!(3), json!(1)]
    );
}

#[test]
fn descendants_collect_all_depths() {
    let path = JsonPath::lax(PathNode::context().descendant("price")).unwrap();
    assert_eq!(
        eval_json(&path, store()),
        vec![
            json!(8.95),
            json!(12.99),
            json!(8.99),
            json!(22.99),
            json!(19.95)
        ]
    );
}

#[test]
fn datetime_comparison_in_filter() {
    let path = JsonPath::lax(
        PathNode::context()
            .member("events")
            .filter(
                PathNode::current()
                    .member("at")
                    .method(Method::Datetime(None))
                    .compare(
                        ComparisonOp::GreaterThanOrEqual,
                        PathNode::literal("2024-03-01").method(Method::Datetime(None)),
                    ),
            )
            .member("name"),
    )
    .unwrap();
    let input = json!({"events": [
        {"name": "a", "at": "2024-02-01"},
        {"name": "b", "at": "2024-03-01"},
        {"name": "c", "at": "not a date"},
        {"name": "d", "at": "2024-04-15"}
    ]});
    assert_eq!(eval_json(&path, input), vec![json!("b"), json!("d")]);
}

#[test]
fn predicate_as_root_yields_boolean_or_null() {
    let path = PathNode::context()
        .member("a")
        .compare(ComparisonOp::Equal, PathNode::literal(1));
    let run = |input| {
        evaluate(&path, &doc(input), &ParameterBindings::new(), PathMode::Lax)
            .unwrap()
            .into_items()
    };
    assert_eq!(run(json!({"a": 1})), vec![Item::Boolean(true)]);
    assert_eq!(run(json!({"a": 2})), vec![Item::Boolean(false)]);
    assert_eq!(run(json!({"a": null})), vec![Item::Null]);
}

// ============ IR loading and sharing ============

#[test]
fn ir_deserialized_from_json() {
    let ir = json!({
        "kind": {"filter": {
            "target": {"kind": {"member_accessor": {
                "target": {"kind": "context_variable"},
                "name": "items"
            }}},
            "predicate": {"kind": {"comparison": {
                "op": "less_than",
                "left": {"kind": "current_item"},
                "right": {"kind": {"named_value_variable": "max"}}
            }}}
        }}
    });
    let root: PathNode = serde_json::from_value(ir).unwrap();
    let path = JsonPath::lax(root).unwrap();
    assert_eq!(path.to_string(), "lax $.items ? (@ < $max)");

    let bindings = ParameterBindings::new().with_parameter("max", Item::int(3));
    let out = path
        .evaluate(&doc(json!({"items": [1, 5, 2, 3]})), &bindings)
        .unwrap();
    assert_eq!(out.into_items(), vec![Item::int(1), Item::int(2)]);
}

#[test]
fn shared_path_across_threads() {
    let path = Arc::new(
        JsonPath::lax(
            PathNode::context()
                .member("n")
                .arith(ArithmeticOp::Multiply, PathNode::literal(10)),
        )
        .unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let path = Arc::clone(&path);
            thread::spawn(move || {
                let input = Item::from(json!({"n": i}));
                json_value(
                    &input,
                    &path,
                    vec![],
                    &JsonValueOptions {
                        returning: Some(SqlType::BigInt),
                        ..Default::default()
                    },
                    &SessionContext::default(),
                )
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(
        results,
        (0..4)
            .map(|i| Ok(Some(SqlValue::BigInt(i * 10))))
            .collect::<Vec<_>>()
    );
}
