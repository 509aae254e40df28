//! JSON-addressed leaves.
//!
//! A leaf whose operator is the JSON sentinel (`json` by default) carries a
//! token list instead of a plain value:
//!
//! ```text
//! ("data", "json", ["->", "owner", "->>", "age", "::INT", ">", 18])
//! ```
//!
//! Path operators and keys walk into the column, an optional cast coerces the
//! extracted value, the first comparison operator ends the path and the last
//! element is the comparand. The leaf above compiles to
//!
//! ```text
//! (("t"."data"->%s->>%s)::INT > %s)    params: ["owner", "age", 18]
//! ```

use serde_json::Value;
use tracing::{trace, warn};

use crate::compiler::{LeafCompiler, LeafContext, SqlFragment, StandardCompiler, malformed};
use crate::domain::Leaf;
use crate::error::Result;
use crate::operator::{Cast, ComparisonOperator, Token, classify};

/// Compiles JSON leaves and hands every other leaf to `S`.
#[derive(Debug, Clone, Default)]
pub struct JsonCompiler<S = StandardCompiler> {
    standard: S,
}

impl<S: LeafCompiler> JsonCompiler<S> {
    pub fn new(standard: S) -> Self {
        Self { standard }
    }
    pub fn standard(&self) -> &S {
        &self.standard
    }

    fn compile_json(&self, leaf: &Leaf, context: &LeafContext<'_>) -> Result<SqlFragment> {
        let tokens = match leaf.value() {
            Value::Array(tokens) if !tokens.is_empty() => tokens,
            _ => return Err(malformed(leaf, "the value of a json leaf must be a non-empty list")),
        };
        let mut path = String::new();
        let mut params = Vec::new();
        let mut cast: Option<Cast> = None;
        let mut comparator: Option<(usize, ComparisonOperator)> = None;
        for (position, token) in tokens.iter().enumerate() {
            match classify(token, context.operators()).map_err(|message| malformed(leaf, message))? {
                Token::PathOp(op) => path.push_str(op.symbol()),
                Token::Cast(found) => cast = Some(found),
                Token::Comparator(op) => {
                    comparator = Some((position, op));
                    break;
                }
                Token::Literal(key) => {
                    path.push_str("%s");
                    params.push(key.clone());
                }
            }
        }
        let (position, comparator) =
            comparator.ok_or_else(|| malformed(leaf, "no comparison operator in the json path"))?;
        if position + 1 == tokens.len() {
            return Err(malformed(leaf, format!("nothing to compare with after '{comparator}'")));
        }
        // the comparand is always the last element, whatever lies between
        params.push(tokens[tokens.len() - 1].clone());

        if !context.field().is_some_and(|field| field.is_json()) {
            warn!(leaf = %leaf, column = context.column(), "json leaf on a column that is not json");
        }
        let query = format!(
            "(({}{}){} {} %s)",
            context.column_reference(),
            path,
            cast.map(|cast| cast.symbol()).unwrap_or(""),
            comparator.sql()
        );
        trace!(leaf = %leaf, sql = %query, params = params.len(), "json leaf compiled");
        Ok((query, params))
    }
}

impl<S: LeafCompiler> LeafCompiler for JsonCompiler<S> {
    fn compile(&self, leaf: &Leaf, context: &LeafContext<'_>) -> Result<SqlFragment> {
        if context.operators().is_json(leaf.operator()) {
            self.compile_json(leaf, context)
        } else {
            self.standard.compile(leaf, context)
        }
    }
}
