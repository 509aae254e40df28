use jsonclad::DomainError;
use jsonclad::compiler::{LeafCompiler, LeafContext, SqlFragment, StandardCompiler};
use jsonclad::config::OperatorSet;
use jsonclad::domain::Leaf;
use jsonclad::model::{FieldKind, Model, Registry};
use jsonclad::operator::ComparisonOperator;
use serde_json::{Value, json};

fn setup() -> Registry {
    let mut registry = Registry::new();
    registry.keep(
        Model::new("res.partner")
            .unwrap()
            .with_field("name", FieldKind::Char)
            .unwrap()
            .with_field("age", FieldKind::Integer)
            .unwrap()
            .with_field("active", FieldKind::Boolean)
            .unwrap(),
    );
    registry
}

fn compile(leaf: Leaf) -> jsonclad::Result<SqlFragment> {
    compile_with(&OperatorSet::default(), leaf)
}

fn compile_with(operators: &OperatorSet, leaf: Leaf) -> jsonclad::Result<SqlFragment> {
    let registry = setup();
    let model = registry.get("res.partner").unwrap();
    let context = LeafContext::resolve(&leaf, &model, &registry, operators)?;
    StandardCompiler.compile(&leaf, &context)
}

#[test]
fn plain_comparisons() {
    for (op, expected) in [("=", "="), ("<", "<"), (">=", ">="), ("=?", "=")] {
        let (sql, params) = compile(Leaf::new("age", op, 30)).unwrap();
        assert_eq!(sql, format!("(\"res_partner\".\"age\" {expected} %s)"));
        assert_eq!(params, vec![json!(30)]);
    }
}

#[test]
fn inequality_keeps_nulls() {
    for op in ["!=", "<>"] {
        let (sql, params) = compile(Leaf::new("age", op, 30)).unwrap();
        assert_eq!(
            sql,
            format!("((\"res_partner\".\"age\" {op} %s) OR \"res_partner\".\"age\" IS NULL)")
        );
        assert_eq!(params, vec![json!(30)]);
    }
}

#[test]
fn null_comparisons() {
    let (sql, params) = compile(Leaf::new("name", "=", Value::Null)).unwrap();
    assert_eq!(sql, "\"res_partner\".\"name\" IS NULL");
    assert!(params.is_empty());
    let (sql, _) = compile(Leaf::new("name", "!=", false)).unwrap();
    assert_eq!(sql, "\"res_partner\".\"name\" IS NOT NULL");
    let (sql, params) = compile(Leaf::new("name", "=?", false)).unwrap();
    assert_eq!(sql, "TRUE");
    assert!(params.is_empty());
}

#[test]
fn boolean_false() {
    let (sql, params) = compile(Leaf::new("active", "=", false)).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"active\" IS NULL or \"res_partner\".\"active\" = false)");
    assert!(params.is_empty());
    let (sql, _) = compile(Leaf::new("active", "!=", false)).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"active\" IS NOT NULL and \"res_partner\".\"active\" != false)");
    let (sql, params) = compile(Leaf::new("active", "=", 1)).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"active\" = %s)");
    assert_eq!(params, vec![json!(1)]);
}

#[test]
fn in_lists() {
    let (sql, params) = compile(Leaf::new("age", "in", json!([1, 2, 3]))).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"age\" in (%s,%s,%s))");
    assert_eq!(params, vec![json!(1), json!(2), json!(3)]);

    let (sql, params) = compile(Leaf::new("age", "in", json!([1, false]))).unwrap();
    assert_eq!(sql, "((\"res_partner\".\"age\" in (%s)) OR \"res_partner\".\"age\" IS NULL)");
    assert_eq!(params, vec![json!(1)]);

    let (sql, _) = compile(Leaf::new("age", "not in", json!([1]))).unwrap();
    assert_eq!(sql, "((\"res_partner\".\"age\" not in (%s)) OR \"res_partner\".\"age\" IS NULL)");

    let (sql, _) = compile(Leaf::new("age", "not in", json!([1, null]))).unwrap();
    assert_eq!(sql, "((\"res_partner\".\"age\" not in (%s)) AND \"res_partner\".\"age\" IS NOT NULL)");

    // a scalar is a list of one
    let (sql, params) = compile(Leaf::new("age", "in", 4)).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"age\" in (%s))");
    assert_eq!(params, vec![json!(4)]);
}

#[test]
fn empty_in_lists() {
    assert_eq!(compile(Leaf::new("age", "in", json!([]))).unwrap().0, "FALSE");
    assert_eq!(compile(Leaf::new("age", "not in", json!([]))).unwrap().0, "TRUE");
    assert_eq!(compile(Leaf::new("age", "in", json!([false]))).unwrap().0, "\"res_partner\".\"age\" IS NULL");
}

#[test]
fn like_patterns() {
    let (sql, params) = compile(Leaf::new("name", "ilike", "ali")).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"name\"::text ilike %s)");
    assert_eq!(params, vec![json!("%ali%")]);

    let (sql, params) = compile(Leaf::new("name", "=like", "A_i%")).unwrap();
    assert_eq!(sql, "(\"res_partner\".\"name\"::text like %s)");
    assert_eq!(params, vec![json!("A_i%")]);

    let (sql, params) = compile(Leaf::new("name", "not like", "bob")).unwrap();
    assert_eq!(sql, "((\"res_partner\".\"name\"::text not like %s) OR \"res_partner\".\"name\" IS NULL)");
    assert_eq!(params, vec![json!("%bob%")]);

    // an empty pattern matches everything, NULL included
    let (sql, params) = compile(Leaf::new("name", "like", "")).unwrap();
    assert_eq!(sql, "((\"res_partner\".\"name\"::text like %s) OR \"res_partner\".\"name\" IS NULL)");
    assert_eq!(params, vec![json!("%%")]);
}

#[test]
fn unknown_operator() {
    let err = compile(Leaf::new("name", "child_of", 1)).unwrap_err();
    assert!(matches!(err, DomainError::MalformedLeaf { .. }), "{err}");
}

#[test]
fn disabled_operator() {
    let mut operators = OperatorSet::default();
    operators.comparators.remove(&ComparisonOperator::ILike);
    let err = compile_with(&operators, Leaf::new("name", "ilike", "x")).unwrap_err();
    assert!(err.to_string().contains("unknown operator"), "{err}");
}

#[test]
fn unknown_column() {
    let err = compile(Leaf::new("email", "=", "a@b")).unwrap_err();
    match err {
        DomainError::UnknownField { model, field } => {
            assert_eq!(model, "res.partner");
            assert_eq!(field, "email");
        }
        other => panic!("unexpected error {other}"),
    }
}
