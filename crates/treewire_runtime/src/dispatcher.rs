//! Input Dispatcher
//!
//! An insertion-ordered registry of named handlers. Each dispatched event is
//! offered to the handlers in registration order; the first enabled handler
//! whose filter and predicate accept it fires. A handler that is not
//! pass-through consumes the event and stops iteration, a pass-through handler
//! lets later handlers fire as well.

use indexmap::IndexMap;
use tracing::{debug, trace};
use wildmatch::WildMatch;

use treewire_types::{EventFilter, EventKind, EventVariant, InputEvent};

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when changing the handler registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Handler already registered: {0}")]
    DuplicateName(String),

    #[error("Handler not registered: {0}")]
    NotFound(String),

    #[error("Handler '{name}' cannot match on a {kind} template")]
    UnsupportedTemplate { name: String, kind: EventKind },
}

/// Result type for registry operations
pub type DispatchResult<T> = Result<T, DispatchError>;

// ─────────────────────────────────────────────────────────────────────────────
// Handler Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A named unit of input handling
pub trait InputHandler: Send + Sync {
    /// Unique name within a dispatcher
    fn name(&self) -> &str;

    /// Whether later handlers still see the event after this one fired
    fn pass_through(&self) -> bool;

    fn is_disabled(&self) -> bool;

    fn set_disabled(&mut self, disabled: bool);

    /// Run the handler if it accepts `event`.
    ///
    /// Returns true if the action ran, false if the handler is disabled, the
    /// event is of another kind, or the predicate rejected it.
    fn handle(&self, event: &InputEvent) -> bool;
}

type Predicate = Box<dyn Fn(&InputEvent) -> bool + Send + Sync>;
type Action = Box<dyn Fn(&InputEvent) + Send + Sync>;

/// Closure-backed handler with an event filter
pub struct HandlerEntry {
    name: String,
    filter: EventFilter,
    predicate: Predicate,
    action: Action,
    pass_through: bool,
    disabled: bool,
}

impl HandlerEntry {
    /// Create a handler over whole events
    pub fn new<P, A>(name: impl Into<String>, filter: EventFilter, predicate: P, action: A) -> Self
    where
        P: Fn(&InputEvent) -> bool + Send + Sync + 'static,
        A: Fn(&InputEvent) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            filter,
            predicate: Box::new(predicate),
            action: Box::new(action),
            pass_through: false,
            disabled: false,
        }
    }

    /// Create a handler over one payload type, e.g. `KeyEvent`.
    ///
    /// The filter is the payload's kind and the predicate and action receive
    /// the payload directly.
    pub fn typed<T, P, A>(name: impl Into<String>, predicate: P, action: A) -> Self
    where
        T: EventVariant,
        P: Fn(&T) -> bool + Send + Sync + 'static,
        A: Fn(&T) + Send + Sync + 'static,
    {
        Self::new(
            name,
            T::FILTER,
            move |event| T::from_event(event).is_some_and(&predicate),
            move |event| {
                if let Some(payload) = T::from_event(event) {
                    action(payload);
                }
            },
        )
    }

    /// Let later handlers see events this handler fired on
    pub fn with_pass_through(mut self, pass_through: bool) -> Self {
        self.pass_through = pass_through;
        self
    }

    /// Start disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn filter(&self) -> EventFilter {
        self.filter
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("pass_through", &self.pass_through)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl InputHandler for HandlerEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn pass_through(&self) -> bool {
        self.pass_through
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn handle(&self, event: &InputEvent) -> bool {
        if self.disabled || !self.filter.matches(event) || !(self.predicate)(event) {
            return false;
        }
        (self.action)(event);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Sink
// ─────────────────────────────────────────────────────────────────────────────

/// The event source's side of the "consumed" handshake
pub trait InputSink {
    /// Stop the event from propagating any further in the host
    fn set_input_as_handled(&mut self);
}

/// What happened to a dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A non-pass-through handler fired and stopped propagation
    Consumed { by: String },
    /// No handler consumed the event (pass-through handlers may have fired)
    Unhandled,
}

impl DispatchOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, DispatchOutcome::Consumed { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered registry of named input handlers
#[derive(Default)]
pub struct InputDispatcher {
    handlers: IndexMap<String, Box<dyn InputHandler>>,
    disabled: bool,
}

impl std::fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl InputDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler after all registered ones
    pub fn register<H>(&mut self, handler: H) -> DispatchResult<()>
    where
        H: InputHandler + 'static,
    {
        self.register_boxed(Box::new(handler))
    }

    pub fn register_boxed(&mut self, handler: Box<dyn InputHandler>) -> DispatchResult<()> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(DispatchError::DuplicateName(name));
        }
        debug!(handler = %name, position = self.handlers.len(), "Registered input handler");
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Register a handler over one payload type
    pub fn add_handler<T, P, A>(
        &mut self,
        name: impl Into<String>,
        predicate: P,
        action: A,
        pass_through: bool,
    ) -> DispatchResult<()>
    where
        T: EventVariant,
        P: Fn(&T) -> bool + Send + Sync + 'static,
        A: Fn(&T) + Send + Sync + 'static,
    {
        self.register(
            HandlerEntry::typed::<T, _, _>(name, predicate, action).with_pass_through(pass_through),
        )
    }

    /// Register a handler that fires on events matching `template`.
    ///
    /// Events match when they identify the same input as the template; with
    /// `match_pressed` the pressed state must also agree, with
    /// `match_modifiers` the modifiers must be identical. Mouse motion has no
    /// identity to match and is rejected.
    pub fn add_binding<A>(
        &mut self,
        name: impl Into<String>,
        template: InputEvent,
        match_pressed: bool,
        match_modifiers: bool,
        action: A,
        pass_through: bool,
    ) -> DispatchResult<()>
    where
        A: Fn(&InputEvent) + Send + Sync + 'static,
    {
        let name = name.into();
        if template.kind() == EventKind::MouseMotion {
            return Err(DispatchError::UnsupportedTemplate {
                name,
                kind: EventKind::MouseMotion,
            });
        }

        let filter = EventFilter::Kind(template.kind());
        let predicate = move |event: &InputEvent| {
            (!match_pressed || event.is_pressed() == template.is_pressed())
                && event.is_match(&template, match_modifiers)
        };
        self.register(
            HandlerEntry::new(name, filter, predicate, action).with_pass_through(pass_through),
        )
    }

    /// Remove a handler, keeping the order of the rest
    pub fn unregister(&mut self, name: &str) -> DispatchResult<Box<dyn InputHandler>> {
        let handler = self
            .handlers
            .shift_remove(name)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;
        debug!(handler = %name, "Unregistered input handler");
        Ok(handler)
    }

    /// Enable or disable a handler without removing it
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> DispatchResult<()> {
        let handler = self
            .handlers
            .get_mut(name)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;
        handler.set_disabled(!enabled);
        trace!(handler = %name, enabled, "Toggled input handler");
        Ok(())
    }

    /// Enable or disable every handler whose name matches a wildcard pattern.
    ///
    /// Returns how many handlers matched.
    pub fn set_enabled_matching(&mut self, pattern: &str, enabled: bool) -> usize {
        let matcher = WildMatch::new(pattern);
        let mut count = 0;
        for (name, handler) in self.handlers.iter_mut() {
            if matcher.matches(name) {
                handler.set_disabled(!enabled);
                count += 1;
            }
        }
        debug!(pattern, enabled, count, "Toggled input handlers by pattern");
        count
    }

    /// Check whether a handler is registered and enabled
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.handlers.get(name).map(|h| !h.is_disabled())
    }

    /// Disable the whole dispatcher; `dispatch` becomes a no-op
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Offer `event` to the handlers in registration order
    pub fn dispatch(&self, event: &InputEvent) -> DispatchOutcome {
        if self.disabled {
            return DispatchOutcome::Unhandled;
        }

        for (name, handler) in &self.handlers {
            if handler.handle(event) {
                trace!(handler = %name, kind = %event.kind(), "Input handled");
                if !handler.pass_through() {
                    return DispatchOutcome::Consumed { by: name.clone() };
                }
            }
        }
        DispatchOutcome::Unhandled
    }

    /// Dispatch and report consumption back to the event source
    pub fn dispatch_to<S>(&self, event: &InputEvent, sink: &mut S) -> DispatchOutcome
    where
        S: InputSink + ?Sized,
    {
        let outcome = self.dispatch(event);
        if outcome.is_consumed() {
            sink.set_input_as_handled();
        }
        outcome
    }

    /// Check if a handler is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Handler names in dispatch order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
