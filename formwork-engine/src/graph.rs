//! Trigger → dependent association, built once per schema.

use formwork_schema::Schema;
use std::collections::{HashMap, HashSet};

/// Which dependents must be recomputed when a property changes, and in
/// which order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Trigger → direct dependents, in declaration order.
    dependents: HashMap<String, Vec<String>>,
    /// Every dependent, topologically sorted with declaration order as the
    /// tie-break.
    order: Vec<String>,
}

impl DependencyGraph {
    /// Builds the graph. Definitions are assumed acyclic; any dependent left
    /// over by a cycle is appended in declaration order.
    pub fn new(schema: &Schema) -> Self {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut pending: Vec<(&str, &[String])> = Vec::new();

        for property in schema.properties().filter(|p| p.is_dependent()) {
            for trigger in property.depends_on() {
                dependents
                    .entry(trigger.clone())
                    .or_default()
                    .push(property.name().to_string());
            }
            pending.push((property.name(), property.depends_on()));
        }

        let dependent_names: HashSet<&str> = pending.iter().map(|(name, _)| *name).collect();
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending.iter().position(|(_, triggers)| {
                triggers.iter().all(|t| {
                    !dependent_names.contains(t.as_str()) || emitted.contains(t.as_str())
                })
            });
            let (name, _) = pending.remove(ready.unwrap_or(0));
            emitted.insert(name);
            order.push(name.to_string());
        }

        Self { dependents, order }
    }

    /// Dependents that list `trigger` directly.
    pub fn direct_dependents(&self, trigger: &str) -> &[String] {
        self.dependents.get(trigger).map_or(&[], Vec::as_slice)
    }

    /// Every dependent in evaluation order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Transitive dependents of `triggers`, each once, in evaluation order.
    pub fn resolution_order<'a, I>(&self, triggers: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut reached: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = triggers.into_iter().collect();
        while let Some(trigger) = stack.pop() {
            for dependent in self.direct_dependents(trigger) {
                if reached.insert(dependent.as_str()) {
                    stack.push(dependent.as_str());
                }
            }
        }
        self.order
            .iter()
            .filter(|name| reached.contains(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
