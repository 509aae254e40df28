//! Domains: boolean filter expressions in prefix (Polish) notation.
//!
//! A domain is a flat list of terms. `&` and `|` take the two expressions
//! that follow them, `!` takes one, and a leaf `(field_path, operator, value)`
//! stands on its own. Terms written next to each other without an operator
//! are implicitly combined with `&`, so
//!
//! ```text
//! [("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]
//! ```
//!
//! reads as `a = 1 AND (b = 2 OR c = 3)`. Domains can be built in code or
//! parsed from JSON text where combinators are strings and leaves are
//! three-element arrays.

use serde_json::Value;
use std::fmt;

use crate::error::{DomainError, Result};

pub const AND_OPERATOR: &str = "&";
pub const OR_OPERATOR: &str = "|";
pub const NOT_OPERATOR: &str = "!";

/// An atomic comparison `(field_path, operator, value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    field_path: String,
    operator: String,
    value: Value,
}

impl Leaf {
    pub fn new<F: Into<String>, O: Into<String>, V: Into<Value>>(field_path: F, operator: O, value: V) -> Self {
        Self {
            field_path: field_path.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
    pub fn field_path(&self) -> &str {
        &self.field_path
    }
    pub fn operator(&self) -> &str {
        &self.operator
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
    /// The dot separated segments of the field path.
    pub fn path(&self) -> Vec<&str> {
        self.field_path.split('.').collect()
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            Value::from(self.field_path.as_str()),
            Value::from(self.operator.as_str()),
            self.value
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    And,
    Or,
    Not,
    Leaf(Leaf),
}

impl Term {
    pub fn leaf<F: Into<String>, O: Into<String>, V: Into<Value>>(field_path: F, operator: O, value: V) -> Self {
        Self::Leaf(Leaf::new(field_path, operator, value))
    }
    /// Number of expressions the term consumes.
    pub fn arity(&self) -> usize {
        match self {
            Self::And | Self::Or => 2,
            Self::Not => 1,
            Self::Leaf(_) => 0,
        }
    }
    /// The combinator symbol, or the field path of a leaf.
    pub fn first_element(&self) -> &str {
        match self {
            Self::And => AND_OPERATOR,
            Self::Or => OR_OPERATOR,
            Self::Not => NOT_OPERATOR,
            Self::Leaf(leaf) => leaf.field_path(),
        }
    }
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(symbol) => match symbol.as_str() {
                AND_OPERATOR => Ok(Self::And),
                OR_OPERATOR => Ok(Self::Or),
                NOT_OPERATOR => Ok(Self::Not),
                other => Err(DomainError::MalformedDomain(format!("unknown combinator '{other}'"))),
            },
            Value::Array(items) if items.len() == 3 => match (&items[0], &items[1]) {
                (Value::String(field_path), Value::String(operator)) => {
                    Ok(Self::leaf(field_path.as_str(), operator.as_str(), items[2].clone()))
                }
                _ => Err(DomainError::MalformedDomain(format!(
                    "leaf {value} must start with a field path and an operator"
                ))),
            },
            other => Err(DomainError::MalformedDomain(format!("{other} is neither a combinator nor a leaf"))),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{leaf}"),
            other => write!(f, "{}", Value::from(other.first_element())),
        }
    }
}

impl From<Leaf> for Term {
    fn from(leaf: Leaf) -> Self {
        Self::Leaf(leaf)
    }
}

/// A boolean expression tree built from a normalized domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'d> {
    And(Box<Node<'d>>, Box<Node<'d>>),
    Or(Box<Node<'d>>, Box<Node<'d>>),
    Not(Box<Node<'d>>),
    Leaf(&'d Leaf),
}

impl<'d> Node<'d> {
    /// Leaves in domain order.
    pub fn leaves(&self) -> Vec<&'d Leaf> {
        let mut leaves = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::And(left, right) | Node::Or(left, right) => {
                    pending.push(right);
                    pending.push(left);
                }
                Node::Not(operand) => pending.push(operand),
                Node::Leaf(leaf) => leaves.push(*leaf),
            }
        }
        leaves
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    terms: Vec<Term>,
}

impl Domain {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| DomainError::MalformedDomain(e.to_string()))?;
        Self::from_value(&value)
    }
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.iter().map(Term::from_value).collect(),
            other => Err(DomainError::MalformedDomain(format!("{other} is not a list of terms"))),
        }
    }
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
    pub fn len(&self) -> usize {
        self.terms.len()
    }
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
    pub fn prepend(&mut self, term: Term) {
        self.terms.insert(0, term);
    }
    /// True when some term's first element is `field`. Combinator terms
    /// never match a field name.
    pub fn constrains(&self, field: &str) -> bool {
        self.terms.iter().any(|term| term.first_element() == field)
    }
    /// Makes implicit conjunctions explicit: `[A, B, C]` becomes
    /// `[&, &, A, B, C]`. An empty domain stays empty.
    pub fn normalize(&self) -> Result<Domain> {
        if self.terms.is_empty() {
            return Ok(Domain::default());
        }
        let mut result = Vec::with_capacity(self.terms.len());
        let mut prefix = 0;
        let mut expected: usize = 1;
        for term in &self.terms {
            if expected == 0 {
                prefix += 1;
                expected = 1;
            }
            // every term fills one expected slot and opens one per operand
            expected = expected - 1 + term.arity();
            result.push(term.clone());
        }
        if expected != 0 {
            return Err(DomainError::MalformedDomain(format!(
                "{expected} operand(s) missing in {self}"
            )));
        }
        let mut terms = vec![Term::And; prefix];
        terms.extend(result);
        Ok(Domain { terms })
    }
    /// Normalizes the domain and builds its expression tree.
    pub fn tree(&self) -> Result<Node<'_>> {
        let normalized = self.normalize()?;
        // normalization only prepends `&`, so the normalized terms are
        // `prefix` ands followed by our own terms
        let prefix = normalized.len() - self.len();
        let mut stack: Vec<Node<'_>> = Vec::new();
        for term in self.terms.iter().rev() {
            let node = match term {
                Term::Leaf(leaf) => Node::Leaf(leaf),
                Term::Not => Node::Not(Box::new(self.pop(&mut stack)?)),
                Term::And | Term::Or => {
                    let left = Box::new(self.pop(&mut stack)?);
                    let right = Box::new(self.pop(&mut stack)?);
                    if *term == Term::And { Node::And(left, right) } else { Node::Or(left, right) }
                }
            };
            stack.push(node);
        }
        for _ in 0..prefix {
            let left = Box::new(self.pop(&mut stack)?);
            let right = Box::new(self.pop(&mut stack)?);
            stack.push(Node::And(left, right));
        }
        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(DomainError::MalformedDomain(format!("{self} is not a single expression"))),
        }
    }
    fn pop<'d>(&self, stack: &mut Vec<Node<'d>>) -> Result<Node<'d>> {
        stack
            .pop()
            .ok_or_else(|| DomainError::MalformedDomain(format!("operand missing in {self}")))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let terms: Vec<String> = self.terms.iter().map(|term| term.to_string()).collect();
        write!(f, "[{}]", terms.join(", "))
    }
}

impl From<Vec<Term>> for Domain {
    fn from(terms: Vec<Term>) -> Self {
        Self::new(terms)
    }
}

impl FromIterator<Term> for Domain {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Domain {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;
    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}
