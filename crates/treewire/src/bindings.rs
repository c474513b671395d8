//! Input Bindings
//!
//! Builds an input dispatcher from a scene's binding declarations and replays
//! recorded events through it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use treewire_runtime::{DispatchOutcome, DispatchResult, InputDispatcher, InputSink};
use treewire_types::InputEvent;

use crate::scene::BindingConfig;

/// Shared record of which bindings fired, in firing order
#[derive(Debug, Clone, Default)]
pub struct BindingLog {
    fired: Arc<Mutex<Vec<String>>>,
}

impl BindingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.fired.lock().push(name.to_string());
    }

    /// Drain the names recorded so far
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.fired.lock())
    }

    pub fn len(&self) -> usize {
        self.fired.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.lock().is_empty()
    }
}

/// Register every binding in declaration order, each recording into `log`
pub fn build_dispatcher(
    bindings: &[BindingConfig],
    log: &BindingLog,
) -> DispatchResult<InputDispatcher> {
    let mut dispatcher = InputDispatcher::new();

    for binding in bindings {
        let log = log.clone();
        let name = binding.name.clone();
        dispatcher.add_binding(
            binding.name.clone(),
            binding.event.clone(),
            binding.match_pressed,
            binding.match_modifiers,
            move |_: &InputEvent| log.record(&name),
            binding.pass,
        )?;
        if binding.disabled {
            dispatcher.set_enabled(&binding.name, false)?;
        }
        debug!(binding = %binding.name, kind = %binding.event.kind(), "Registered binding");
    }

    Ok(dispatcher)
}

/// Disable every binding matching one of `patterns`
pub fn disable_matching(dispatcher: &mut InputDispatcher, patterns: &[String]) -> usize {
    patterns
        .iter()
        .map(|pattern| {
            let count = dispatcher.set_enabled_matching(pattern, false);
            if count == 0 {
                warn!("Pattern '{}' matched no bindings", pattern);
            }
            count
        })
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay
// ─────────────────────────────────────────────────────────────────────────────

/// Sink recording whether the dispatcher consumed an event
#[derive(Debug, Default)]
struct ReplaySink {
    handled: bool,
}

impl InputSink for ReplaySink {
    fn set_input_as_handled(&mut self) {
        self.handled = true;
    }
}

/// Outcome of one replayed event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStep {
    pub event: InputEvent,
    /// Bindings that fired, in order
    pub fired: Vec<String>,
    /// Binding that consumed the event, if any
    pub consumed_by: Option<String>,
}

impl ReplayStep {
    pub fn is_consumed(&self) -> bool {
        self.consumed_by.is_some()
    }
}

/// Feed `events` through `dispatcher` one by one
pub fn replay(
    dispatcher: &InputDispatcher,
    log: &BindingLog,
    events: &[InputEvent],
) -> Vec<ReplayStep> {
    log.take();

    events
        .iter()
        .map(|event| {
            let mut sink = ReplaySink::default();
            let outcome = dispatcher.dispatch_to(event, &mut sink);
            let consumed_by = match outcome {
                DispatchOutcome::Consumed { by } => Some(by),
                DispatchOutcome::Unhandled => None,
            };
            debug_assert_eq!(sink.handled, consumed_by.is_some());

            ReplayStep {
                event: event.clone(),
                fired: log.take(),
                consumed_by,
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use treewire_runtime::DispatchError;
    use treewire_types::{
        Key, KeyEvent, Modifiers, MouseButton, MouseButtonEvent, MouseMotionEvent,
    };

    use super::*;

    fn binding(name: &str, event: impl Into<InputEvent>) -> BindingConfig {
        BindingConfig {
            name: name.to_string(),
            event: event.into(),
            match_pressed: true,
            match_modifiers: false,
            pass: false,
            disabled: false,
        }
    }

    #[test]
    fn test_replay_jump_and_log() {
        let bindings = vec![
            BindingConfig {
                pass: true,
                ..binding("log", KeyEvent::pressed(Key::Space))
            },
            binding("jump", KeyEvent::pressed(Key::Space)),
            binding("after", KeyEvent::pressed(Key::Space)),
        ];
        let log = BindingLog::new();
        let dispatcher = build_dispatcher(&bindings, &log).unwrap();

        let steps = replay(
            &dispatcher,
            &log,
            &[
                KeyEvent::pressed(Key::Space).into(),
                KeyEvent::released(Key::Space).into(),
            ],
        );

        assert_eq!(steps[0].fired, ["log", "jump"]);
        assert_eq!(steps[0].consumed_by.as_deref(), Some("jump"));
        assert!(steps[1].fired.is_empty());
        assert!(!steps[1].is_consumed());
    }

    #[test]
    fn test_match_modifiers() {
        let bindings = vec![BindingConfig {
            match_modifiers: true,
            ..binding(
                "save",
                KeyEvent::pressed(Key::char('s')).with_modifiers(Modifiers::CTRL),
            )
        }];
        let log = BindingLog::new();
        let dispatcher = build_dispatcher(&bindings, &log).unwrap();

        let steps = replay(
            &dispatcher,
            &log,
            &[
                KeyEvent::pressed(Key::char('s')).into(),
                KeyEvent::pressed(Key::char('s'))
                    .with_modifiers(Modifiers::CTRL)
                    .into(),
            ],
        );

        assert!(!steps[0].is_consumed());
        assert_eq!(steps[1].consumed_by.as_deref(), Some("save"));
    }

    #[test]
    fn test_disabled_binding_and_patterns() {
        let bindings = vec![
            BindingConfig {
                disabled: true,
                ..binding("ui_click", MouseButtonEvent::pressed(MouseButton::Left))
            },
            binding("ui_cancel", KeyEvent::pressed(Key::Escape)),
            binding("game_click", MouseButtonEvent::pressed(MouseButton::Left)),
        ];
        let log = BindingLog::new();
        let mut dispatcher = build_dispatcher(&bindings, &log).unwrap();
        assert_eq!(dispatcher.is_enabled("ui_click"), Some(false));

        let click: InputEvent = MouseButtonEvent::pressed(MouseButton::Left).into();
        let steps = replay(&dispatcher, &log, std::slice::from_ref(&click));
        assert_eq!(steps[0].consumed_by.as_deref(), Some("game_click"));

        let patterns = ["game_*".to_string(), "none*".to_string()];
        let disabled = disable_matching(&mut dispatcher, &patterns);
        assert_eq!(disabled, 1);

        let steps = replay(&dispatcher, &log, &[click]);
        assert!(steps[0].fired.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_duplicate_binding_name() {
        let bindings = vec![
            binding("jump", KeyEvent::pressed(Key::Space)),
            binding("jump", KeyEvent::pressed(Key::Up)),
        ];
        let err = build_dispatcher(&bindings, &BindingLog::new()).unwrap_err();
        assert_eq!(err, DispatchError::DuplicateName("jump".to_string()));
    }

    #[test]
    fn test_mouse_motion_binding_rejected() {
        let bindings = vec![binding("look", MouseMotionEvent::default())];
        let err = build_dispatcher(&bindings, &BindingLog::new()).unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedTemplate { name, .. } if name == "look"));
    }
}
