//! Translator settings.
//!
//! The recognized operator vocabulary is an explicit value handed to the
//! [`crate::translator::Translator`] at construction, never process-wide
//! state. Settings can be read from a file and overridden through
//! `JSONCLAD_*` environment variables:
//!
//! ```toml
//! json_operator = "json"
//! active_field = "active"
//! comparators = ["=", "!=", "<", ">", "in"]
//! casts = ["::INT"]
//! path_operators = ["->>", "->"]
//! ```

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{DomainError, Result};
use crate::model::is_identifier;
use crate::operator::{Cast, ComparisonOperator, PathOperator};

pub const ENVIRONMENT_PREFIX: &str = "JSONCLAD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSet {
    /// The leaf operator marking a leaf as JSON-addressed.
    pub json_operator: String,
    pub comparators: BTreeSet<ComparisonOperator>,
    pub casts: BTreeSet<Cast>,
    pub path_operators: BTreeSet<PathOperator>,
}

impl Default for OperatorSet {
    fn default() -> Self {
        Self {
            json_operator: String::from("json"),
            comparators: ComparisonOperator::ALL.into_iter().collect(),
            casts: Cast::ALL.into_iter().collect(),
            path_operators: PathOperator::ALL.into_iter().collect(),
        }
    }
}

impl OperatorSet {
    pub fn is_json(&self, operator: &str) -> bool {
        operator == self.json_operator
    }
    /// Resolves a leaf operator to an enabled comparison operator.
    pub fn comparator(&self, operator: &str) -> Option<ComparisonOperator> {
        ComparisonOperator::from_symbol(operator).filter(|op| self.comparators.contains(op))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the field driving the default "active records only" filter.
    pub active_field: String,
    #[serde(flatten)]
    pub operators: OperatorSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_field: String::from("active"),
            operators: OperatorSet::default(),
        }
    }
}

impl Settings {
    /// Reads settings from an optional file followed by the environment.
    /// A missing file is not an error, the defaults apply.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENVIRONMENT_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("comparators")
                .with_list_parse_key("casts")
                .with_list_parse_key("path_operators"),
        );
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.active_field) {
            return Err(DomainError::Config(format!(
                "active_field '{}' is not an identifier",
                self.active_field
            )));
        }
        let json_operator = &self.operators.json_operator;
        if json_operator.is_empty() {
            return Err(DomainError::Config("json_operator must not be empty".into()));
        }
        if ComparisonOperator::from_symbol(json_operator).is_some() {
            return Err(DomainError::Config(format!(
                "json_operator '{json_operator}' collides with a comparison operator"
            )));
        }
        if self.operators.comparators.is_empty() {
            return Err(DomainError::Config("at least one comparator is required".into()));
        }
        Ok(())
    }
}
