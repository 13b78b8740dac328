//! Public model facade.

use crate::config::ModelConfig;
use crate::graph::DependencyGraph;
use crate::outcome::OperationResult;
use crate::runner::LifecycleRunner;
use chrono::Utc;
use formwork_schema::{Definitions, OptionsHandle, Schema, SchemaError, SchemaOptions, Summary};
use formwork_types::{
    ErrorAccumulator, ErrorMessage, OperationError, Record, Value, VALIDATION_FAILED,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Validates `definitions` and returns a handle to build models from.
pub fn define_schema(
    definitions: Definitions,
    options: SchemaOptions,
) -> Result<SchemaHandle, SchemaError> {
    let schema = Schema::new(definitions, options)?;
    let graph = DependencyGraph::new(&schema);
    debug!(
        properties = schema.len(),
        dependents = graph.order().len(),
        "schema defined"
    );
    Ok(SchemaHandle {
        schema: Arc::new(schema),
        graph: Arc::new(graph),
        config: ModelConfig::default(),
    })
}

/// A validated schema plus its dependency graph.
#[derive(Debug, Clone)]
pub struct SchemaHandle {
    schema: Arc<Schema>,
    graph: Arc<DependencyGraph>,
    config: ModelConfig,
}

impl SchemaHandle {
    /// Replaces the model configuration.
    #[must_use]
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_model(&self) -> Model {
        Model {
            schema: Arc::clone(&self.schema),
            graph: Arc::clone(&self.graph),
            config: self.config.clone(),
        }
    }
}

/// Options for [`Model::clone_entity`].
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Properties to put back to their default (or recompute, for dependents).
    pub reset: Vec<String>,
}

impl CloneOptions {
    pub fn reset<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reset: properties.into_iter().map(Into::into).collect(),
        }
    }
}

/// Creates, updates, clones and deletes entities of one schema.
///
/// Cheap to clone; every operation builds its own context.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<Schema>,
    graph: Arc<DependencyGraph>,
    config: ModelConfig,
}

impl Model {
    /// Creates an entity from `input`.
    pub async fn create(&self, input: Record) -> OperationResult {
        self.create_with_options(input, Record::new()).await
    }

    /// Creates an entity, seeding the options bag with `options`.
    pub async fn create_with_options(&self, input: Record, options: Record) -> OperationResult {
        let mut runner = LifecycleRunner::new(&self.schema, &self.graph, &self.config);
        runner.create(input, options).await
    }

    /// Applies `changes` to `current`. `extra_options` seeds the options bag.
    pub async fn update(
        &self,
        current: Record,
        changes: Record,
        extra_options: Option<Record>,
    ) -> OperationResult {
        let mut runner = LifecycleRunner::new(&self.schema, &self.graph, &self.config);
        runner
            .update(current, changes, extra_options.unwrap_or_default())
            .await
    }

    /// Copies the persisted values of `current`.
    ///
    /// Properties named in `options.reset` go back to their default, or are
    /// recomputed when dependent; their dependents are recomputed too.
    /// Generated constants and timestamps are produced afresh.
    pub async fn clone_entity(
        &self,
        current: &Record,
        options: CloneOptions,
    ) -> Result<Record, OperationError> {
        let mut values = Record::new();
        for property in self.schema.persisted() {
            let name = property.name();
            let reset = options.reset.iter().any(|r| r == name);
            let value = match property.constant() {
                Some(constant) if constant.is_generated() => constant.produce(),
                Some(constant) => current.get(name).cloned().unwrap_or_else(|| constant.produce()),
                None if reset => property.default_value(),
                None => current
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| property.default_value()),
            };
            values.insert(name.to_string(), value);
        }

        let resets: Vec<&str> = options
            .reset
            .iter()
            .map(String::as_str)
            .filter(|name| self.schema.property(name).is_some())
            .collect();
        let downstream = self.graph.resolution_order(resets.iter().copied());
        let to_recompute: Vec<&String> = self
            .graph
            .order()
            .iter()
            .filter(|name| resets.contains(&name.as_str()) || downstream.contains(*name))
            .collect();

        let options_bag = OptionsHandle::default();
        let mut errors = ErrorAccumulator::new();
        for name in to_recompute {
            let Some(resolver) = self.schema.property(name).and_then(|p| p.resolver()) else {
                continue;
            };
            let summary = Summary::new(
                values.clone(),
                Some(current.clone()),
                false,
                options_bag.clone(),
            );
            match resolver.call(summary).await {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(error) => {
                    warn!(property = %name, %error, "resolver failed while cloning");
                    errors.add_reason(name.as_str(), VALIDATION_FAILED);
                }
            }
        }
        if errors.is_loaded() {
            return Err(errors.into_error(ErrorMessage::ValidationError));
        }

        if let Some(keys) = self.schema.timestamps() {
            let now = Value::String(Utc::now().to_rfc3339());
            values.insert(keys.created_at.clone(), now.clone());
            values.insert(keys.updated_at.clone(), now);
        }
        Ok(values)
    }

    /// Runs the `onDelete` hooks of persisted properties.
    ///
    /// Hooks see only persisted values, never virtuals or aliases. Hook
    /// errors are logged and skipped.
    pub async fn delete(&self, current: &Record) {
        let context: Record = self
            .schema
            .persisted()
            .filter_map(|p| {
                current
                    .get(p.name())
                    .map(|value| (p.name().to_string(), value.clone()))
            })
            .collect();
        let summary = Summary::new(context, None, false, OptionsHandle::default());

        for property in self.schema.persisted() {
            for hook in &property.hooks().on_delete {
                if let Err(error) = hook.call(summary.clone()).await {
                    warn!(property = property.name(), %error, "onDelete hook failed");
                }
            }
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}
