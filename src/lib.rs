//! Jsonclad – translating filter domains with JSON path leaves into SQL.
//!
//! A *domain* is a boolean filter written in prefix notation: a list of
//! combinators (`&`, `|`, `!`) and *leaves* `(field_path, operator, value)`.
//! Jsonclad turns a domain into a WHERE clause with `%s` placeholders and the
//! positionally aligned parameters, ready for a host to splice into its own
//! `select`.
//!
//! Besides the usual comparison operators a leaf may use the `json` operator,
//! in which case its value is a token list addressing a path inside a JSON
//! column:
//!
//! ```text
//! ("data", "json", ["->>", "age", "::INT", ">", 18])
//!     => (("test_json"."data"->>%s)::INT > %s)    params: ["age", 18]
//! ```
//!
//! ## Modules
//! * [`domain`] – Terms, leaves and domains, normalization and expression trees.
//! * [`operator`] – The enumerated comparison operators, path operators and
//!   casts, and the classifier for JSON leaf tokens.
//! * [`model`] – Model metadata: tables, fields, many2one relations.
//! * [`compiler`] – The [`compiler::LeafCompiler`] seam and the standard
//!   comparison rules.
//! * [`json`] – The JSON-aware leaf compiler.
//! * [`translator`] – [`translator::Translator`], from domain to [`query::Query`].
//! * [`persist`] – JSON column encoding and a SQLite backed record store.
//! * [`config`] – [`config::Settings`], read from a file and the environment.
//!
//! ## Quick Start
//! ```
//! use jsonclad::config::Settings;
//! use jsonclad::domain::{Domain, Term};
//! use jsonclad::model::{FieldKind, Model, Registry};
//! use jsonclad::translator::Translator;
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.keep(Model::new("test.json").unwrap().with_field("data", FieldKind::Json).unwrap());
//! let translator = Translator::new(&registry, Settings::default());
//! let domain = Domain::new(vec![Term::leaf("data", "json", json!(["->>", "age", "::INT", ">", 18]))]);
//! let query = translator.compute("test.json", &domain, true).unwrap();
//! assert_eq!(query.where_clause(), ["((\"test_json\".\"data\"->>%s)::INT > %s)"]);
//! assert_eq!(query.params(), [json!("age"), json!(18)]);
//! ```
//!
//! ## Errors
//! Translation either yields a complete query or fails with a
//! [`DomainError`]: `MalformedLeaf` for JSON leaves that cannot be read,
//! `UnknownField` for paths the model does not declare, `MalformedDomain`
//! for combinators missing operands.

pub mod compiler;
pub mod config;
pub mod domain;
pub mod error;
pub mod json;
pub mod model;
pub mod operator;
pub mod persist;
pub mod query;
pub mod translator;

pub use error::{DomainError, Result};
