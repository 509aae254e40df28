//! Model metadata: the part of a host ORM registry the translator consults.
//!
//! A [`Model`] names its table and declares its fields. Relational fields
//! ([`FieldKind::Many2one`]) point at another model in the same
//! [`Registry`] and let domains walk dotted paths such as `partner_id.name`.

use lazy_static::lazy_static;
use regex::Regex;
use seahash::SeaHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use crate::error::{DomainError, Result};

pub type ModelHasher = BuildHasherDefault<SeaHasher>;

pub const ID_FIELD: &str = "id";

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// True when `name` can be used unescaped as a SQL table or column name.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

fn check_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DomainError::InvalidIdentifier(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    Char,
    Text,
    Date,
    Datetime,
    /// A column of native JSON type (`jsonb`).
    Json,
    Many2one { comodel: String },
}

impl FieldKind {
    /// Column type used by the SQLite backed store.
    pub fn column_type(&self) -> &'static str {
        match self {
            Self::Boolean | Self::Integer | Self::Many2one { .. } => "integer",
            Self::Float => "real",
            Self::Char | Self::Text | Self::Date | Self::Datetime | Self::Json => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
}

impl Field {
    pub fn new(name: &str, kind: FieldKind) -> Result<Self> {
        check_identifier(name)?;
        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
    pub fn is_json(&self) -> bool {
        self.kind == FieldKind::Json
    }
    pub fn is_boolean(&self) -> bool {
        self.kind == FieldKind::Boolean
    }
    pub fn comodel(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Many2one { comodel } => Some(comodel),
            _ => None,
        }
    }
}

/// The context flags a caller attaches to a model when searching it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelContext {
    /// `None` behaves as `Some(true)`.
    pub active_test: Option<bool>,
}

impl ModelContext {
    pub fn active_test(&self) -> bool {
        self.active_test.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: String,
    table: String,
    fields: BTreeMap<String, Field>,
    context: ModelContext,
}

impl Model {
    /// Declares a model whose table is its name with dots turned into
    /// underscores (`test.json` lives in `test_json`). Every model has an
    /// integer `id` field.
    pub fn new(name: &str) -> Result<Self> {
        let mut model = Self {
            name: name.to_string(),
            table: String::new(),
            fields: BTreeMap::new(),
            context: ModelContext::default(),
        };
        model = model.with_table(&name.replace('.', "_"))?;
        model.with_field(ID_FIELD, FieldKind::Integer)
    }
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        check_identifier(table)?;
        self.table = table.to_string();
        Ok(self)
    }
    pub fn with_field(mut self, name: &str, kind: FieldKind) -> Result<Self> {
        let field = Field::new(name, kind)?;
        self.fields.insert(field.name.clone(), field);
        Ok(self)
    }
    pub fn with_context(mut self, context: ModelContext) -> Self {
        self.context = context;
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn context(&self) -> &ModelContext {
        &self.context
    }
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }
}

/// Owns the declared models and hands out shared references to them.
#[derive(Debug, Default)]
pub struct Registry {
    kept: HashMap<String, Arc<Model>, ModelHasher>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Keeps the model, returning the kept instance and whether a model by
    /// that name was already known (in which case the new one replaces it).
    pub fn keep(&mut self, model: Model) -> (Arc<Model>, bool) {
        let kept = Arc::new(model);
        let previously_known = self
            .kept
            .insert(kept.name.clone(), Arc::clone(&kept))
            .is_some();
        (kept, previously_known)
    }
    pub fn get(&self, name: &str) -> Result<Arc<Model>> {
        self.kept
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::UnknownModel(name.to_string()))
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
