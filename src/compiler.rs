//! Leaf compilation: turning one domain leaf into a SQL fragment.
//!
//! A [`LeafCompiler`] receives the leaf together with a [`LeafContext`] that
//! has already resolved the leaf's field path against the model registry:
//! which table alias and column the leaf talks about, and which joins are
//! needed to reach it. The [`StandardCompiler`] handles the plain comparison
//! operators; [`crate::json::JsonCompiler`] layers JSON path support on top
//! of any other compiler.

use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use crate::config::OperatorSet;
use crate::domain::Leaf;
use crate::error::{DomainError, Result};
use crate::model::{Field, ID_FIELD, Model, Registry};
use crate::operator::ComparisonOperator;

/// A WHERE fragment with `%s` placeholders and the parameters they bind, in
/// placeholder order.
pub type SqlFragment = (String, Vec<Value>);

pub trait LeafCompiler {
    fn compile(&self, leaf: &Leaf, context: &LeafContext<'_>) -> Result<SqlFragment>;
}

impl<C: LeafCompiler + ?Sized> LeafCompiler for Box<C> {
    fn compile(&self, leaf: &Leaf, context: &LeafContext<'_>) -> Result<SqlFragment> {
        (**self).compile(leaf, context)
    }
}

pub fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

pub fn malformed(leaf: &Leaf, message: impl Into<String>) -> DomainError {
    DomainError::MalformedLeaf {
        leaf: leaf.to_string(),
        message: message.into(),
    }
}

/// An implicit join reached through a many2one segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    table: String,
    alias: String,
    condition: String,
}

impl Join {
    fn new(source_alias: &str, link: &str, comodel: &Model) -> Self {
        let alias = format!("{source_alias}__{link}");
        let condition = format!(
            "{}.{}={}.{}",
            quote(source_alias),
            quote(link),
            quote(&alias),
            quote(ID_FIELD)
        );
        Self {
            table: comodel.table().to_string(),
            alias,
            condition,
        }
    }
    pub fn alias(&self) -> &str {
        &self.alias
    }
    /// `"res_partner" as "sale_order__partner_id"`
    pub fn table_reference(&self) -> String {
        format!("{} as {}", quote(&self.table), quote(&self.alias))
    }
    pub fn condition(&self) -> &str {
        &self.condition
    }
}

/// Everything a compiler needs to know about the leaf it is compiling.
#[derive(Debug, Clone)]
pub struct LeafContext<'a> {
    model: Arc<Model>,
    alias: String,
    column: String,
    joins: Vec<Join>,
    operators: &'a OperatorSet,
}

impl<'a> LeafContext<'a> {
    /// Walks the leaf's field path from `root`. Every segment but the last
    /// must be a many2one, and the last must exist on the model reached.
    pub fn resolve(leaf: &Leaf, root: &Arc<Model>, registry: &Registry, operators: &'a OperatorSet) -> Result<Self> {
        let path = leaf.path();
        let (column, links) = match path.split_last() {
            Some((column, links)) => (*column, links),
            None => return Err(malformed(leaf, "empty field path")),
        };
        let mut model = Arc::clone(root);
        let mut alias = root.table().to_string();
        let mut joins = Vec::new();
        for link in links {
            let comodel = model
                .field(link)
                .and_then(Field::comodel)
                .ok_or_else(|| DomainError::UnknownField {
                    model: model.name().to_string(),
                    field: link.to_string(),
                })?;
            let comodel = registry.get(comodel)?;
            let join = Join::new(&alias, link, &comodel);
            alias = join.alias.clone();
            joins.push(join);
            model = comodel;
        }
        if !model.has_field(column) {
            return Err(DomainError::UnknownField {
                model: model.name().to_string(),
                field: column.to_string(),
            });
        }
        Ok(Self {
            model,
            alias,
            column: column.to_string(),
            joins,
            operators,
        })
    }
    /// The model owning the compared column.
    pub fn model(&self) -> &Model {
        &self.model
    }
    /// The alias of the table holding the compared column.
    pub fn generate_alias(&self) -> &str {
        &self.alias
    }
    pub fn column(&self) -> &str {
        &self.column
    }
    pub fn field(&self) -> Option<&Field> {
        self.model.field(&self.column)
    }
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }
    pub fn operators(&self) -> &OperatorSet {
        self.operators
    }
    /// `"alias"."column"`
    pub fn column_reference(&self) -> String {
        format!("{}.{}", quote(&self.alias), quote(&self.column))
    }
}

fn is_false_or_null(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// The comparison rules of the host query engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCompiler;

impl StandardCompiler {
    fn in_to_sql(&self, operator: ComparisonOperator, column: &str, right: &Value) -> SqlFragment {
        let items = match right {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        let params: Vec<Value> = items.iter().filter(|item| !is_false_or_null(item)).cloned().collect();
        let check_nulls = params.len() < items.len();
        if params.is_empty() {
            return match (operator, check_nulls) {
                (ComparisonOperator::In, true) => (format!("{column} IS NULL"), params),
                (ComparisonOperator::In, false) => (String::from("FALSE"), params),
                (_, true) => (format!("{column} IS NOT NULL"), params),
                (_, false) => (String::from("TRUE"), params),
            };
        }
        let placeholders = vec!["%s"; params.len()].join(",");
        let query = format!("({column} {} ({placeholders}))", operator.symbol());
        // NULL is neither in nor not in any list
        let query = match (operator, check_nulls) {
            (ComparisonOperator::In, true) | (ComparisonOperator::NotIn, false) => {
                format!("({query} OR {column} IS NULL)")
            }
            (ComparisonOperator::NotIn, true) => format!("({query} AND {column} IS NOT NULL)"),
            _ => query,
        };
        (query, params)
    }

    fn like_to_sql(&self, operator: ComparisonOperator, column: &str, right: &Value) -> SqlFragment {
        let pattern = match right {
            Value::String(text) => text.clone(),
            Value::Null | Value::Bool(false) => String::new(),
            other => other.to_string(),
        };
        let matches_null = operator.is_negative() || (operator.needs_wildcard() && pattern.is_empty());
        let pattern = if operator.needs_wildcard() { format!("%{pattern}%") } else { pattern };
        let query = format!("({column}::text {} %s)", operator.sql());
        let query = if matches_null { format!("({query} OR {column} IS NULL)") } else { query };
        (query, vec![Value::String(pattern)])
    }
}

impl LeafCompiler for StandardCompiler {
    fn compile(&self, leaf: &Leaf, context: &LeafContext<'_>) -> Result<SqlFragment> {
        let operator = context
            .operators()
            .comparator(leaf.operator())
            .ok_or_else(|| malformed(leaf, format!("unknown operator '{}'", leaf.operator())))?;
        let column = context.column_reference();
        let right = leaf.value();
        let boolean = context.field().is_some_and(Field::is_boolean);
        let fragment = match operator {
            ComparisonOperator::In | ComparisonOperator::NotIn => self.in_to_sql(operator, &column, right),
            op if op.is_like() => self.like_to_sql(op, &column, right),
            ComparisonOperator::EqOrTrue if is_false_or_null(right) => (String::from("TRUE"), vec![]),
            ComparisonOperator::Eq if boolean && *right == Value::Bool(false) => {
                (format!("({column} IS NULL or {column} = false)"), vec![])
            }
            ComparisonOperator::NotEq | ComparisonOperator::Diamond if boolean && *right == Value::Bool(false) => {
                (format!("({column} IS NOT NULL and {column} != false)"), vec![])
            }
            ComparisonOperator::Eq if is_false_or_null(right) => {
                (format!("{column} IS NULL"), vec![])
            }
            ComparisonOperator::NotEq | ComparisonOperator::Diamond if is_false_or_null(right) => {
                (format!("{column} IS NOT NULL"), vec![])
            }
            // NULL differs from every value
            op @ (ComparisonOperator::NotEq | ComparisonOperator::Diamond) => (
                format!("(({column} {} %s) OR {column} IS NULL)", op.sql()),
                vec![right.clone()],
            ),
            op => (format!("({column} {} %s)", op.sql()), vec![right.clone()]),
        };
        trace!(leaf = %leaf, sql = %fragment.0, "standard leaf compiled");
        Ok(fragment)
    }
}
