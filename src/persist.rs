// used for persistence
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Statement, params, params_from_iter};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::compiler::quote;
use crate::error::{DomainError, Result};
use crate::model::{FieldKind, ID_FIELD, Model};
use crate::query::Query;

pub type Record = Map<String, Value>;

/// Empty values are stored as NULL rather than as JSON text.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Serializes a value to its canonical JSON text, or `None` (SQL NULL) when
/// the value is empty.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Option<String>> {
    let value = serde_json::to_value(value)?;
    if is_empty(&value) {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(&value)?))
}

/// Reads back what [`encode`] stored; NULL comes back as `Value::Null`.
pub fn decode(text: Option<&str>) -> Result<Value> {
    match text {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(Value::Null),
    }
}

/// Binds a JSON literal as a SQLite value.
pub fn to_sql_value(value: &Value) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => SqlValue::Integer(i),
            (None, Some(f)) => SqlValue::Real(f),
            _ => return Err(DomainError::Serialization(format!("{n} does not fit a SQL number"))),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(serde_json::to_string(other)?),
    })
}

// ------------- Persistence -------------
/// Stores records of one model in SQLite, JSON fields as canonical text.
pub struct JsonStore<'db> {
    pub db: &'db Connection,
    model: Arc<Model>,
    columns: Vec<(String, FieldKind)>,
    add_record: Statement<'db>,
}
impl<'db> JsonStore<'db> {
    pub fn new(connection: &'db Connection, model: Arc<Model>) -> Result<JsonStore<'db>> {
        let columns: Vec<(String, FieldKind)> = model
            .fields()
            .filter(|field| field.name() != ID_FIELD)
            .map(|field| (field.name().to_string(), field.kind().clone()))
            .collect();
        let mut definitions = vec![format!("{} integer not null primary key", quote(ID_FIELD))];
        for (name, kind) in &columns {
            definitions.push(format!("{} {} null", quote(name), kind.column_type()));
        }
        connection.execute_batch(&format!(
            "create table if not exists {} ({});",
            quote(model.table()),
            definitions.join(", ")
        ))?;
        let names: Vec<String> = columns.iter().map(|(name, _)| quote(name)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert = if columns.is_empty() {
            format!("insert into {} default values", quote(model.table()))
        } else {
            format!(
                "insert into {} ({}) values ({})",
                quote(model.table()),
                names.join(", "),
                placeholders
            )
        };
        let add_record = connection.prepare(&insert)?;
        info!(model = model.name(), table = model.table(), columns = columns.len(), "json store ready");
        Ok(JsonStore {
            db: connection,
            model,
            columns,
            add_record,
        })
    }
    pub fn model(&self) -> &Model {
        &self.model
    }
    /// Writes one record and returns its id. Fields missing from the record
    /// are stored as NULL; nothing is written if any value fails to encode.
    pub fn insert(&mut self, record: &Record) -> Result<i64> {
        if let Some(unknown) = record.keys().find(|key| !self.model.has_field(key) || *key == ID_FIELD) {
            return Err(DomainError::UnknownField {
                model: self.model.name().to_string(),
                field: unknown.clone(),
            });
        }
        let mut values = Vec::with_capacity(self.columns.len());
        for (name, kind) in &self.columns {
            let value = record.get(name).unwrap_or(&Value::Null);
            let bound = match kind {
                FieldKind::Json => encode(value)?.map_or(SqlValue::Null, SqlValue::Text),
                _ => to_sql_value(value)?,
            };
            values.push(bound);
        }
        self.add_record.execute(params_from_iter(values))?;
        Ok(self.db.last_insert_rowid())
    }
    /// Reads a JSON column back; `Value::Null` when it holds NULL.
    pub fn read_json(&self, id: i64, column: &str) -> Result<Value> {
        let text = self.read_text(id, column)?;
        decode(text.as_deref())
    }
    /// The raw stored text of a column, `None` for NULL.
    pub fn read_text(&self, id: i64, column: &str) -> Result<Option<String>> {
        if !self.model.has_field(column) {
            return Err(DomainError::UnknownField {
                model: self.model.name().to_string(),
                field: column.to_string(),
            });
        }
        let sql = format!(
            "select {} from {} where {} = ?",
            quote(column),
            quote(self.model.table()),
            quote(ID_FIELD)
        );
        let text = self
            .db
            .query_row(&sql, params![id], |row| row.get::<_, Option<String>>(0))
            .optional()?;
        text.ok_or_else(|| DomainError::Persistence(format!("no record {id} in {}", self.model.table())))
    }
    /// Runs a translated query and returns the matching ids in id order.
    /// Only SQL that SQLite understands can run here: path operators work,
    /// casts like `::INT` do not.
    pub fn search(&self, query: &Query) -> Result<Vec<i64>> {
        let id_column = format!("{}.{}", quote(self.model.table()), quote(ID_FIELD));
        let (sql, params) = query.select(&[id_column.as_str()]);
        let sql = format!("{} order by {}", sql.replace("%s", "?"), id_column);
        let values = params.iter().map(to_sql_value).collect::<Result<Vec<_>>>()?;
        let mut statement = self.db.prepare(&sql)?;
        let ids = statement
            .query_map(params_from_iter(values), |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}
