//! Domain to query translation.
//!
//! [`Translator::compute`] takes a model name and a domain and produces the
//! [`Query`] a host would splice into its `select`. It applies the default
//! "active records only" filter, resolves every leaf against the registry,
//! compiles each leaf with the configured [`LeafCompiler`] and combines the
//! fragments along the domain's boolean structure.

use std::sync::Arc;
use tracing::debug;

use crate::compiler::{LeafCompiler, LeafContext, SqlFragment, quote};
use crate::config::Settings;
use crate::domain::{Domain, Node, Term};
use crate::error::Result;
use crate::json::JsonCompiler;
use crate::model::{Model, Registry};
use crate::query::Query;

pub struct Translator<'r, C = JsonCompiler> {
    registry: &'r Registry,
    settings: Settings,
    compiler: C,
}

impl<'r> Translator<'r> {
    /// A translator compiling JSON leaves and delegating the rest to the
    /// standard compiler.
    pub fn new(registry: &'r Registry, settings: Settings) -> Self {
        Self::with_compiler(registry, settings, JsonCompiler::default())
    }
}

impl<'r, C: LeafCompiler> Translator<'r, C> {
    pub fn with_compiler(registry: &'r Registry, settings: Settings, compiler: C) -> Self {
        Self {
            registry,
            settings,
            compiler,
        }
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Prepends `(active, =, 1)` when the model has the active field, both
    /// `active_test` and the model context ask for it, and no term of the
    /// domain already starts with the active field. Applying it twice is
    /// the same as applying it once.
    pub fn apply_active_filter(&self, model: &Model, mut domain: Domain, active_test: bool) -> Domain {
        let active = self.settings.active_field.as_str();
        if model.has_field(active)
            && active_test
            && model.context().active_test()
            && !domain.constrains(active)
        {
            debug!(model = model.name(), "filtering out inactive records");
            domain.prepend(Term::leaf(active, "=", 1));
        }
        domain
    }

    pub fn compute(&self, model: &str, domain: &Domain, active_test: bool) -> Result<Query> {
        let model = self.registry.get(model)?;
        self.compute_for(&model, domain, active_test)
    }

    pub fn compute_for(&self, model: &Arc<Model>, domain: &Domain, active_test: bool) -> Result<Query> {
        let domain = self.apply_active_filter(model, domain.clone(), active_test);
        let mut query = Query::default();
        query.keep_table(quote(model.table()));
        if domain.is_empty() {
            return Ok(query);
        }
        let tree = domain.tree()?;
        let mut joins = Vec::new();
        let (expression, params) = self.render(&tree, model, &mut query, &mut joins)?;
        let expression = if joins.is_empty() {
            expression
        } else {
            format!("({}) AND {}", joins.join(" AND "), expression)
        };
        let (tables, _, _) = query.into_parts();
        Ok(Query::new(tables, vec![expression], params))
    }

    fn render(&self, node: &Node<'_>, model: &Arc<Model>, query: &mut Query, joins: &mut Vec<String>) -> Result<SqlFragment> {
        match node {
            Node::Leaf(leaf) => {
                let context = LeafContext::resolve(leaf, model, self.registry, &self.settings.operators)?;
                for join in context.joins() {
                    if !query.keep_table(join.table_reference()) {
                        debug!(alias = join.alias(), "joining");
                        joins.push(join.condition().to_string());
                    }
                }
                self.compiler.compile(leaf, &context)
            }
            Node::Not(operand) => {
                let (operand, params) = self.render(operand, model, query, joins)?;
                Ok((format!("(NOT ({operand}))"), params))
            }
            Node::And(left, right) | Node::Or(left, right) => {
                let combinator = if matches!(node, Node::And(..)) { "AND" } else { "OR" };
                let (left, mut params) = self.render(left, model, query, joins)?;
                let (right, right_params) = self.render(right, model, query, joins)?;
                params.extend(right_params);
                Ok((format!("({left} {combinator} {right})"), params))
            }
        }
    }
}
