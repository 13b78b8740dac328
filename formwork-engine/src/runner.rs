//! Lifecycle state machine behind create and update.
//!
//! ```text
//! Idle → CollectingInput → Validating → ResolvingSideEffects
//!      → RunningListeners → PostValidating → Succeeded | Failed
//! ```
//!
//! The runner owns its [`OperationContext`] and [`ErrorAccumulator`]; the
//! schema and graph are borrowed read-only. Errors accumulate instead of
//! aborting, except for the resolution depth guard which is fatal.

use crate::config::ModelConfig;
use crate::context::OperationContext;
use crate::graph::DependencyGraph;
use crate::outcome::{OperationResult, Success, SuccessHandler};
use crate::post_validation::run_post_validation;
use chrono::Utc;
use formwork_schema::{CompiledProperty, Listener, ListenerResult, Required, Sanitizer, Schema};
use formwork_types::{
    ErrorAccumulator, ErrorMessage, FieldError, OperationError, Record, ValidationResult, Value,
    VALIDATION_FAILED,
};
use futures::future::{join_all, BoxFuture, FutureExt};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Where a runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    CollectingInput,
    Validating,
    ResolvingSideEffects,
    RunningListeners,
    PostValidating,
    Succeeded,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CollectingInput => "collecting-input",
            Self::Validating => "validating",
            Self::ResolvingSideEffects => "resolving-side-effects",
            Self::RunningListeners => "running-listeners",
            Self::PostValidating => "post-validating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One input value after key mapping.
struct Input {
    name: String,
    key: String,
    value: Value,
}

/// Drives a single create or update.
pub struct LifecycleRunner<'a> {
    schema: &'a Schema,
    graph: &'a DependencyGraph,
    config: &'a ModelConfig,
    state: LifecycleState,
    ctx: OperationContext,
    errors: ErrorAccumulator,
    /// Properties set by listener partial updates.
    touched: Vec<String>,
    /// Properties whose `onChange` already ran for their latest change.
    notified: HashSet<String>,
    fatal: Option<OperationError>,
}

impl<'a> LifecycleRunner<'a> {
    pub fn new(schema: &'a Schema, graph: &'a DependencyGraph, config: &'a ModelConfig) -> Self {
        Self {
            schema,
            graph,
            config,
            state: LifecycleState::Idle,
            ctx: OperationContext::for_create(Record::new(), Record::new()),
            errors: ErrorAccumulator::new(),
            touched: Vec::new(),
            notified: HashSet::new(),
            fatal: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Creates an entity from `input`. `options` seeds the options bag.
    pub async fn create(&mut self, input: Record, options: Record) -> OperationResult {
        self.transition(LifecycleState::CollectingInput);
        let initial = self.initial_values(None);
        self.ctx = OperationContext::for_create(initial, options);

        let inputs = self.collect_input(&input);
        self.run(inputs).await
    }

    /// Applies `changes` to `current`.
    pub async fn update(
        &mut self,
        current: Record,
        changes: Record,
        options: Record,
    ) -> OperationResult {
        self.transition(LifecycleState::CollectingInput);
        let initial = self.initial_values(Some(&current));
        self.ctx = OperationContext::for_update(initial, current, options);

        let inputs = self.collect_input(&changes);
        if inputs.is_empty() {
            return self.nothing_to_update();
        }
        self.run(inputs).await
    }

    async fn run(&mut self, inputs: Vec<Input>) -> OperationResult {
        self.transition(LifecycleState::Validating);
        for input in &inputs {
            self.ctx.mark_provided(&input.name, &input.key);
        }
        let accepted = self.validate_inputs(inputs).await;
        self.check_required();
        if self.errors.is_loaded() {
            return self.fail().await;
        }

        self.transition(LifecycleState::ResolvingSideEffects);
        self.resolve_dependents(&accepted).await;
        self.fire_side_effects(&accepted).await;

        self.transition(LifecycleState::RunningListeners);
        self.run_lifecycle_listeners().await;

        if self.fatal.is_none() && !self.errors.is_loaded() {
            self.transition(LifecycleState::PostValidating);
            let touched = self.touched_set();
            run_post_validation(
                self.schema.post_validators(),
                &self.ctx,
                &touched,
                &mut self.errors,
            )
            .await;
        }

        if self.fatal.is_some() || self.errors.is_loaded() {
            return self.fail().await;
        }
        self.succeed()
    }

    // ── CollectingInput ──────────────────────────────────────────

    /// Persisted values an operation starts from.
    fn initial_values(&self, current: Option<&Record>) -> Record {
        let mut values = Record::new();
        for property in self.schema.persisted() {
            let name = property.name();
            let existing = current.and_then(|c| c.get(name)).cloned();
            let value = match (property.constant(), existing) {
                (_, Some(value)) => value,
                (Some(constant), None) => constant.produce(),
                (None, None) => property.default_value(),
            };
            values.insert(name.to_string(), value);
        }
        values
    }

    /// Maps input keys to input properties. The last of a virtual's name
    /// and its alias wins.
    fn map_input(&self, input: &Record) -> IndexMap<String, (String, Value)> {
        let mut mapped = IndexMap::new();
        for (key, value) in input {
            let Some(property) = self.schema.resolve_input_key(key) else {
                continue;
            };
            if !property.is_input() {
                continue;
            }
            mapped.insert(property.name().to_string(), (key.clone(), value.clone()));
        }
        mapped
    }

    fn collect_input(&self, input: &Record) -> Vec<Input> {
        let mapped = self.map_input(input);
        let draft: Record = mapped
            .iter()
            .map(|(name, (_, value))| (name.clone(), value.clone()))
            .collect();
        let summary = self.ctx.draft_summary(&draft);

        mapped
            .into_iter()
            .filter_map(|(name, (key, value))| {
                let property = self.schema.property(&name)?;
                let eligible = if self.ctx.is_update() {
                    self.may_update(property, &value, &summary)
                } else {
                    property.should_init().is_none_or(|gate| gate.allows(&summary))
                };
                if !eligible {
                    debug!(property = %name, "input not eligible");
                }
                eligible.then_some(Input { name, key, value })
            })
            .collect()
    }

    fn may_update(
        &self,
        property: &CompiledProperty,
        value: &Value,
        summary: &formwork_schema::Summary,
    ) -> bool {
        if property
            .should_update()
            .is_some_and(|gate| !gate.allows(summary))
        {
            return false;
        }
        if !property.is_persisted() {
            return true;
        }
        let current = self.ctx.value(property.name()).unwrap_or(&Value::Null);
        if current == value {
            return false;
        }
        property.readonly().is_none() || *current == property.default_value()
    }

    // ── Validating ───────────────────────────────────────────────

    /// Validates inputs concurrently and writes the accepted values.
    /// Returns the names of accepted properties.
    async fn validate_inputs(&mut self, inputs: Vec<Input>) -> Vec<String> {
        let schema = self.schema;
        let draft: Record = inputs
            .iter()
            .map(|input| (input.name.clone(), input.value.clone()))
            .collect();
        let summary = self.ctx.draft_summary(&draft);

        let checks = inputs.iter().map(|input| {
            let validator = schema.property(&input.name).and_then(|p| p.validator()).cloned();
            let value = input.value.clone();
            let summary = summary.clone();
            async move {
                match validator {
                    Some(validator) => validator.call(value, summary).await,
                    None => Ok(ValidationResult::valid()),
                }
            }
        });
        let results = join_all(checks).await;

        let mut accepted = Vec::new();
        for (input, result) in inputs.into_iter().zip(results) {
            let Some(property) = schema.property(&input.name) else {
                continue;
            };
            let value = match result {
                Ok(result) if result.valid => result.accepted_value(input.value),
                Ok(result) => {
                    self.errors.set(input.key, result.into_field_error());
                    continue;
                }
                Err(error) => {
                    debug!(property = %input.name, %error, "validator errored");
                    self.errors
                        .set(input.key, FieldError::with_reasons([VALIDATION_FAILED]));
                    continue;
                }
            };
            let value = match property.sanitizer() {
                Some(sanitizer) => self.sanitize(sanitizer, &input.name, value).await,
                None => value,
            };

            if property.is_persisted() {
                if self.ctx.is_update() && self.ctx.value(&input.name) == Some(&value) {
                    continue;
                }
                self.ctx.write(&input.name, value);
            } else {
                self.ctx.set(&input.name, value);
            }
            accepted.push(input.name);
        }
        accepted
    }

    async fn sanitize(&self, sanitizer: &Sanitizer, name: &str, value: Value) -> Value {
        match sanitizer.call(value.clone(), self.ctx.summary()).await {
            Ok(sanitized) => sanitized,
            Err(error) => {
                warn!(property = name, %error, "sanitizer failed, keeping validated value");
                value
            }
        }
    }

    fn check_required(&mut self) {
        let summary = self.ctx.summary();
        for property in self.schema.properties() {
            let Some(required) = property.required() else {
                continue;
            };
            let name = property.name();
            if self.ctx.was_provided(name) {
                continue;
            }
            let missing = match (self.ctx.is_update(), required) {
                (false, _) => true,
                (true, Required::Static(_)) => false,
                (true, Required::When(_)) => {
                    !property.is_persisted()
                        || self.ctx.value(name) == Some(&property.default_value())
                }
            };
            if !missing {
                continue;
            }

            let check = required.check(&summary);
            if check.required {
                let reason = check
                    .reason
                    .unwrap_or_else(|| format!("'{name}' is required"));
                let key = self.ctx.external_key(name).to_string();
                self.errors.add_reason(key, reason);
            }
        }
    }

    // ── ResolvingSideEffects ─────────────────────────────────────

    /// Recomputes the dependents of `triggers` in graph order. Returns the
    /// dependents whose value changed.
    async fn resolve_dependents(&mut self, triggers: &[String]) -> Vec<String> {
        let schema = self.schema;
        let mut changed = Vec::new();

        for name in self.graph.resolution_order(triggers.iter().map(String::as_str)) {
            let Some(property) = schema.property(&name) else {
                continue;
            };
            let Some(resolver) = property.resolver() else {
                continue;
            };
            if self.ctx.is_update()
                && property.readonly().is_some()
                && self
                    .ctx
                    .previous_value(&name)
                    .is_some_and(|previous| *previous != property.default_value())
            {
                continue;
            }

            match resolver.call(self.ctx.summary()).await {
                Ok(value) => {
                    if self.ctx.value(&name) != Some(&value) {
                        self.ctx.write(&name, value);
                        changed.push(name);
                    }
                }
                Err(error) => {
                    warn!(property = %name, %error, "resolver failed");
                    self.errors.add_reason(name, VALIDATION_FAILED);
                }
            }
        }
        changed
    }

    async fn fire_side_effects(&mut self, accepted: &[String]) {
        let schema = self.schema;
        for name in accepted {
            let Some(property) = schema.property(name) else {
                continue;
            };
            if property.is_side_effect() {
                self.run_chain(&property.hooks().on_change, name, 0).await;
            }
        }
    }

    // ── RunningListeners ─────────────────────────────────────────

    /// `onCreate`/`onUpdate` then `onChange` per target. `onChange` is skipped
    /// for properties a partial update already notified.
    async fn run_lifecycle_listeners(&mut self) {
        let schema = self.schema;
        let is_update = self.ctx.is_update();
        let changed = self.ctx.changed().to_vec();
        let targets: Vec<&CompiledProperty> = schema
            .persisted()
            .filter(|p| !is_update || changed.iter().any(|name| name == p.name()))
            .collect();

        for property in targets {
            let hooks = property.hooks();
            let lifecycle = if is_update {
                &hooks.on_update
            } else {
                &hooks.on_create
            };
            self.run_chain(lifecycle, property.name(), 0).await;
            if !self.notified.contains(property.name()) {
                self.run_chain(&hooks.on_change, property.name(), 0).await;
            }
        }
    }

    /// Runs listeners in order, folding partial updates back in.
    async fn run_chain(&mut self, listeners: &[Listener], owner: &str, depth: usize) {
        for listener in listeners {
            if self.fatal.is_some() {
                return;
            }
            match listener.call(self.ctx.summary()).await {
                Ok(ListenerResult::NoOp) => {}
                Ok(ListenerResult::PartialUpdate(partial)) => {
                    self.apply_partial(partial, owner, depth + 1).await;
                }
                Err(error) => {
                    warn!(property = owner, %error, "listener failed");
                    let key = self.ctx.external_key(owner).to_string();
                    self.errors.add_reason(key, VALIDATION_FAILED);
                }
            }
        }
    }

    /// Treats `partial` as freshly provided input, one level deeper.
    fn apply_partial<'b>(
        &'b mut self,
        partial: Record,
        owner: &'b str,
        depth: usize,
    ) -> BoxFuture<'b, ()> {
        async move {
            let limit = self.config.max_resolution_depth;
            if depth > limit {
                warn!(property = owner, depth, "resolution depth exceeded");
                let mut errors = ErrorAccumulator::new();
                errors.add_reason(owner, format!("maximum resolution depth of {limit} exceeded"));
                self.fatal = Some(errors.into_error(ErrorMessage::CyclicResolution));
                return;
            }

            let schema = self.schema;
            let inputs: Vec<Input> = self
                .map_input(&partial)
                .into_iter()
                .filter(|(name, (_, value))| {
                    schema
                        .property(name)
                        .is_some_and(|p| !p.is_persisted() || self.ctx.value(name) != Some(value))
                })
                .map(|(name, (key, value))| Input { name, key, value })
                .collect();
            if inputs.is_empty() {
                return;
            }

            let accepted = self.validate_inputs(inputs).await;
            self.touched.extend(accepted.iter().cloned());
            let recomputed = self.resolve_dependents(&accepted).await;

            for name in accepted.iter().chain(&recomputed) {
                if self.fatal.is_some() {
                    return;
                }
                if let Some(property) = schema.property(name) {
                    self.notified.insert(name.clone());
                    self.run_chain(&property.hooks().on_change, name, depth).await;
                }
            }
        }
        .boxed()
    }

    // ── Terminal ─────────────────────────────────────────────────

    /// Inputs the caller provided plus everything changed since.
    fn touched_set(&self) -> HashSet<String> {
        self.ctx
            .provided()
            .iter()
            .chain(self.ctx.changed())
            .chain(&self.touched)
            .cloned()
            .collect()
    }

    async fn fail(&mut self) -> OperationResult {
        self.transition(LifecycleState::Failed);
        if let Some(error) = self.fatal.take() {
            return Err(error);
        }

        let schema = self.schema;
        let summary = self.ctx.summary();
        for property in schema.properties() {
            let name = property.name();
            let failed =
                self.errors.contains(name) || self.errors.contains(self.ctx.external_key(name));
            if !failed {
                continue;
            }
            for hook in &property.hooks().on_failure {
                if let Err(error) = hook.call(summary.clone()).await {
                    warn!(property = name, %error, "onFailure hook failed");
                }
            }
        }

        let errors = std::mem::take(&mut self.errors);
        Err(errors.into_error(ErrorMessage::ValidationError))
    }

    fn succeed(&mut self) -> OperationResult {
        let is_update = self.ctx.is_update();
        let mut data = Record::new();
        for property in self.schema.persisted() {
            let name = property.name();
            if is_update && !self.ctx.has_changed(name) {
                continue;
            }
            let value = self.ctx.value(name).cloned().unwrap_or(Value::Null);
            data.insert(name.to_string(), value);
        }
        if is_update && data.is_empty() {
            return self.nothing_to_update();
        }

        if let Some(keys) = self.schema.timestamps() {
            let now = Value::String(Utc::now().to_rfc3339());
            if !is_update {
                data.insert(keys.created_at.clone(), now.clone());
            }
            data.insert(keys.updated_at.clone(), now);
        }

        let hooks: Vec<(String, Listener)> = self
            .schema
            .properties()
            .filter(|p| {
                let name = p.name();
                let relevant = if is_update {
                    self.ctx.has_changed(name)
                } else {
                    p.is_persisted()
                };
                relevant || self.ctx.was_provided(name)
            })
            .flat_map(|p| {
                p.hooks()
                    .on_success
                    .iter()
                    .map(move |hook| (p.name().to_string(), hook.clone()))
            })
            .collect();

        self.transition(LifecycleState::Succeeded);
        Ok(Success {
            data,
            handle_success: SuccessHandler::new(hooks, self.ctx.summary()),
        })
    }

    fn nothing_to_update(&mut self) -> OperationResult {
        debug!("update produced no change");
        self.transition(LifecycleState::Failed);
        Err(OperationError::nothing_to_update())
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(from = %self.state, to = %next, "lifecycle transition");
        self.state = next;
    }
}
