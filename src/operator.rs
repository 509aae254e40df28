//! Enumerated operator vocabularies and the JSON token classifier.
//!
//! Every token that may appear inside the value of a JSON leaf is one of a
//! fixed, enumerated set. Tokens are matched against the sets configured in an
//! [`OperatorSet`] so that a typo like `::INTEGER` is rejected instead of being
//! bound as a path key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::OperatorSet;

/// Comparison operators a leaf may use, either as the operator of a standard
/// leaf or as the trailing comparator inside a JSON leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Diamond,
    LessOrEq,
    Less,
    Greater,
    GreaterOrEq,
    EqOrTrue,
    EqLike,
    EqILike,
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 16] = [
        Self::Eq,
        Self::NotEq,
        Self::Diamond,
        Self::LessOrEq,
        Self::Less,
        Self::Greater,
        Self::GreaterOrEq,
        Self::EqOrTrue,
        Self::EqLike,
        Self::EqILike,
        Self::Like,
        Self::NotLike,
        Self::ILike,
        Self::NotILike,
        Self::In,
        Self::NotIn,
    ];
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Diamond => "<>",
            Self::LessOrEq => "<=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::GreaterOrEq => ">=",
            Self::EqOrTrue => "=?",
            Self::EqLike => "=like",
            Self::EqILike => "=ilike",
            Self::Like => "like",
            Self::NotLike => "not like",
            Self::ILike => "ilike",
            Self::NotILike => "not ilike",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
    /// The like family: `like`, `ilike`, their negations and the `=` variants.
    pub fn is_like(&self) -> bool {
        matches!(
            self,
            Self::EqLike | Self::EqILike | Self::Like | Self::NotLike | Self::ILike | Self::NotILike
        )
    }
    /// Like operators whose pattern is wrapped in `%` wildcards.
    pub fn needs_wildcard(&self) -> bool {
        matches!(self, Self::Like | Self::NotLike | Self::ILike | Self::NotILike)
    }
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::NotEq | Self::Diamond | Self::NotLike | Self::NotILike | Self::NotIn)
    }
    /// The operator as it is written in SQL (`=like` is plain `like` there).
    pub fn sql(&self) -> &'static str {
        match self {
            Self::EqLike => "like",
            Self::EqILike => "ilike",
            Self::EqOrTrue => "=",
            other => other.symbol(),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
impl TryFrom<String> for ComparisonOperator {
    type Error = String;
    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        Self::from_symbol(&symbol).ok_or_else(|| format!("unknown comparison operator '{symbol}'"))
    }
}
impl From<ComparisonOperator> for String {
    fn from(op: ComparisonOperator) -> String {
        op.symbol().to_string()
    }
}

/// JSON path operators: `->>` extracts as text, `->` extracts as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathOperator {
    Text,
    Json,
}

impl PathOperator {
    pub const ALL: [PathOperator; 2] = [Self::Text, Self::Json];
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Text => "->>",
            Self::Json => "->",
        }
    }
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for PathOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
impl TryFrom<String> for PathOperator {
    type Error = String;
    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        Self::from_symbol(&symbol).ok_or_else(|| format!("unknown path operator '{symbol}'"))
    }
}
impl From<PathOperator> for String {
    fn from(op: PathOperator) -> String {
        op.symbol().to_string()
    }
}

/// SQL type casts applied to a JSON extraction before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cast {
    Int,
    Date,
}

impl Cast {
    pub const ALL: [Cast; 2] = [Self::Int, Self::Date];
    pub const PREFIX: &'static str = "::";
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Int => "::INT",
            Self::Date => "::DATE",
        }
    }
    /// Case-insensitive: `::int` and `::INT` are the same cast.
    pub fn from_token(token: &str) -> Option<Self> {
        let upper = token.to_uppercase();
        Self::ALL.into_iter().find(|cast| cast.symbol() == upper)
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
impl TryFrom<String> for Cast {
    type Error = String;
    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::from_token(&token).ok_or_else(|| format!("unknown cast '{token}'"))
    }
}
impl From<Cast> for String {
    fn from(cast: Cast) -> String {
        cast.symbol().to_string()
    }
}

/// One classified element of a JSON leaf value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    PathOp(PathOperator),
    Cast(Cast),
    Comparator(ComparisonOperator),
    Literal(&'a Value),
}

/// Classifies a JSON leaf token against the configured vocabularies.
///
/// Strings naming a path operator, cast or comparator that the operator set
/// does not enable are rejected, as are `::` prefixed strings that name no
/// cast at all. Strings and numbers otherwise are literals (object keys and
/// array indices); any other JSON value cannot address a path.
pub fn classify<'a>(token: &'a Value, operators: &OperatorSet) -> Result<Token<'a>, String> {
    let text = match token {
        Value::String(text) => text,
        Value::Number(_) => return Ok(Token::Literal(token)),
        other => return Err(format!("{other} cannot be used as a JSON path key")),
    };
    if let Some(op) = PathOperator::from_symbol(text) {
        return if operators.path_operators.contains(&op) {
            Ok(Token::PathOp(op))
        } else {
            Err(format!("path operator '{op}' is not enabled"))
        };
    }
    // a literal that happens to read "::INT" is taken as the cast
    if let Some(cast) = Cast::from_token(text) {
        return if operators.casts.contains(&cast) {
            Ok(Token::Cast(cast))
        } else {
            Err(format!("cast '{cast}' is not enabled"))
        };
    }
    if let Some(op) = ComparisonOperator::from_symbol(text) {
        return if operators.comparators.contains(&op) {
            Ok(Token::Comparator(op))
        } else {
            Err(format!("comparison operator '{op}' is not enabled"))
        };
    }
    if text.starts_with(Cast::PREFIX) {
        return Err(format!("unknown cast '{text}'"));
    }
    Ok(Token::Literal(token))
}
