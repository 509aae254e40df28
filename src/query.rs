//! The query descriptor a translation produces, and its SQL assembly.

use serde_json::Value;

/// The outcome of translating a domain: the tables to select from, the
/// WHERE fragments to AND together, and the positional parameters bound to
/// the fragments' `%s` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    tables: Vec<String>,
    where_clause: Vec<String>,
    params: Vec<Value>,
}

impl Query {
    pub fn new(tables: Vec<String>, where_clause: Vec<String>, params: Vec<Value>) -> Self {
        Self {
            tables,
            where_clause,
            params,
        }
    }
    /// Adds a quoted table reference unless it is already present, returning
    /// whether it was previously known.
    pub fn keep_table(&mut self, table: String) -> bool {
        let previously_known = self.tables.contains(&table);
        if !previously_known {
            self.tables.push(table);
        }
        previously_known
    }
    pub fn tables(&self) -> &[String] {
        &self.tables
    }
    pub fn where_clause(&self) -> &[String] {
        &self.where_clause
    }
    pub fn params(&self) -> &[Value] {
        &self.params
    }
    pub fn into_parts(self) -> (Vec<String>, Vec<String>, Vec<Value>) {
        (self.tables, self.where_clause, self.params)
    }
    /// `(from_clause, where_clause, params)` ready to splice into a statement.
    pub fn get_sql(&self) -> (String, String, Vec<Value>) {
        (
            self.tables.join(","),
            self.where_clause.join(" AND "),
            self.params.clone(),
        )
    }
    /// A complete `select` over the query's tables.
    pub fn select(&self, columns: &[&str]) -> (String, Vec<Value>) {
        let (from_clause, where_clause, params) = self.get_sql();
        let mut sql = format!("select {} from {}", columns.join(", "), from_clause);
        if !where_clause.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&where_clause);
        }
        (sql, params)
    }
}
