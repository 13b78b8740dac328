//! Read-only snapshot handed to every callback.

use formwork_types::{Record, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutable options bag shared by every callback of one operation.
///
/// Post-validators write to it with [`Summary::update_options`]; later
/// post-validators and the success handler read the accumulated state.
#[derive(Debug, Clone, Default)]
pub struct OptionsHandle(Arc<Mutex<Record>>);

impl OptionsHandle {
    /// Creates a bag seeded with `initial`.
    pub fn new(initial: Record) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    /// Returns a copy of the current options.
    pub fn snapshot(&self) -> Record {
        self.lock().clone()
    }

    /// Shallow-merges `partial` into the bag.
    pub fn update(&self, partial: Record) {
        self.lock().extend(partial);
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Copy of the in-flight operation state at the moment a callback runs.
///
/// `context` holds every known property (real, dependent, virtual, side
/// effect) resolved so far. Virtuals and side effects only appear when the
/// caller supplied them. On update `previous` is the entity as it was before
/// the operation started.
#[derive(Debug, Clone)]
pub struct Summary {
    context: Record,
    previous: Option<Record>,
    is_update: bool,
    options: OptionsHandle,
}

impl Summary {
    /// Builds a summary from its parts.
    pub fn new(
        context: Record,
        previous: Option<Record>,
        is_update: bool,
        options: OptionsHandle,
    ) -> Self {
        Self {
            context,
            previous,
            is_update,
            options,
        }
    }

    /// A creation summary with an empty options bag.
    pub fn for_create(context: Record) -> Self {
        Self::new(context, None, false, OptionsHandle::default())
    }

    /// The resolved values of the operation.
    pub fn context(&self) -> &Record {
        &self.context
    }

    /// Looks up one resolved value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// The entity before this update. `None` on create.
    pub fn previous(&self) -> Option<&Record> {
        self.previous.as_ref()
    }

    /// Looks up one value of the entity before this update.
    pub fn previous_value(&self, key: &str) -> Option<&Value> {
        self.previous.as_ref().and_then(|p| p.get(key))
    }

    /// True while running an update.
    pub fn is_update(&self) -> bool {
        self.is_update
    }

    /// Current state of the shared options bag.
    pub fn get_options(&self) -> Record {
        self.options.snapshot()
    }

    /// Merges `partial` into the shared options bag.
    pub fn update_options(&self, partial: Record) {
        self.options.update(partial);
    }

    /// The underlying options handle.
    pub fn options_handle(&self) -> &OptionsHandle {
        &self.options
    }
}
