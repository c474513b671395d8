//! Input Events
//!
//! Discrete input events as delivered by a host once per frame or callback.
//! The dispatcher only needs `kind()` for filtering; the matching helpers
//! (`is_match`, `is_key_pressed`, ...) exist for handler predicates.
//!
//! Events are serialized internally tagged by `kind`:
//!
//! ```toml
//! kind = "key"
//! key = "C"
//! modifiers = "CTRL"
//! pressed = true
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Joypad axis magnitude at which a motion counts as pressed
pub const AXIS_PRESS_THRESHOLD: f32 = 0.5;

// ─────────────────────────────────────────────────────────────────────────────
// Modifiers
// ─────────────────────────────────────────────────────────────────────────────

bitflags! {
    /// Keyboard modifiers held while an event was produced
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keys and Buttons
// ─────────────────────────────────────────────────────────────────────────────

/// A keyboard key, written by name in configuration (`"Space"`, `"C"`, `"F5"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key `F1`..`F12`
    F(u8),
    /// Printable character, stored upper-case
    Char(char),
}

/// Error returned when a key name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown key name: {0}")]
pub struct KeyParseError(pub String);

impl Key {
    /// Key for a typed character. Whitespace maps to its named key.
    pub fn char(c: char) -> Self {
        match c {
            ' ' => Key::Space,
            '\t' => Key::Tab,
            '\n' | '\r' => Key::Enter,
            _ => Key::Char(c.to_ascii_uppercase()),
        }
    }
}

impl FromStr for Key {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "Space" => Key::Space,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            "Tab" => Key::Tab,
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "Up" => Key::Up,
            "Down" => Key::Down,
            "Left" => Key::Left,
            "Right" => Key::Right,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.as_str()) {
                    (Some(c), "") => Key::Char(c.to_ascii_uppercase()),
                    (Some('F'), digits) if !digits.is_empty() => match digits.parse::<u8>() {
                        Ok(n @ 1..=12) => Key::F(n),
                        _ => return Err(KeyParseError(s.to_string())),
                    },
                    _ => return Err(KeyParseError(s.to_string())),
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::F(n) => write!(f, "F{}", n),
            Key::Char(c) => write!(f, "{}", c),
            other => write!(f, "{:?}", other),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Mouse buttons, including the wheel "buttons"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    WheelUp,
    WheelDown,
}

/// Screen position in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub pressed: bool,
    /// Repeat event generated while the key is held
    #[serde(default)]
    pub echo: bool,
}

impl KeyEvent {
    pub fn pressed(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            pressed: true,
            echo: false,
        }
    }

    pub fn released(key: Key) -> Self {
        Self {
            pressed: false,
            ..Self::pressed(key)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseButtonEvent {
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub pressed: bool,
    #[serde(default)]
    pub double_click: bool,
    #[serde(default)]
    pub position: Position,
}

impl MouseButtonEvent {
    pub fn pressed(button: MouseButton) -> Self {
        Self {
            button,
            modifiers: Modifiers::empty(),
            pressed: true,
            double_click: false,
            position: Position::default(),
        }
    }

    pub fn released(button: MouseButton) -> Self {
        Self {
            pressed: false,
            ..Self::pressed(button)
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseMotionEvent {
    #[serde(default)]
    pub position: Position,
    /// Movement since the previous motion event
    #[serde(default)]
    pub relative: Position,
    #[serde(default)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoypadButtonEvent {
    #[serde(default)]
    pub device: i32,
    pub button: u8,
    #[serde(default)]
    pub pressed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoypadMotionEvent {
    #[serde(default)]
    pub device: i32,
    pub axis: u8,
    /// Axis value in `-1.0..=1.0`
    pub value: f32,
}

/// A named, host-mapped action (e.g. `"ui_accept"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub action: String,
    #[serde(default)]
    pub pressed: bool,
    #[serde(default = "default_strength")]
    pub strength: f32,
}

fn default_strength() -> f32 {
    1.0
}

impl ActionEvent {
    pub fn pressed(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            pressed: true,
            strength: 1.0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Event
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminant of an `InputEvent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Key,
    MouseButton,
    MouseMotion,
    JoypadButton,
    JoypadMotion,
    Action,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Key => "key",
            EventKind::MouseButton => "mouse_button",
            EventKind::MouseMotion => "mouse_motion",
            EventKind::JoypadButton => "joypad_button",
            EventKind::JoypadMotion => "joypad_motion",
            EventKind::Action => "action",
        };
        f.write_str(name)
    }
}

/// A single discrete input event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Key(KeyEvent),
    MouseButton(MouseButtonEvent),
    MouseMotion(MouseMotionEvent),
    JoypadButton(JoypadButtonEvent),
    JoypadMotion(JoypadMotionEvent),
    Action(ActionEvent),
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Key(_) => EventKind::Key,
            InputEvent::MouseButton(_) => EventKind::MouseButton,
            InputEvent::MouseMotion(_) => EventKind::MouseMotion,
            InputEvent::JoypadButton(_) => EventKind::JoypadButton,
            InputEvent::JoypadMotion(_) => EventKind::JoypadMotion,
            InputEvent::Action(_) => EventKind::Action,
        }
    }

    /// Whether the event represents a pressed state. Mouse motion is never pressed.
    pub fn is_pressed(&self) -> bool {
        match self {
            InputEvent::Key(e) => e.pressed,
            InputEvent::MouseButton(e) => e.pressed,
            InputEvent::MouseMotion(_) => false,
            InputEvent::JoypadButton(e) => e.pressed,
            InputEvent::JoypadMotion(e) => e.value.abs() >= AXIS_PRESS_THRESHOLD,
            InputEvent::Action(e) => e.pressed,
        }
    }

    /// Modifiers carried by keyboard and mouse events
    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            InputEvent::Key(e) => Some(e.modifiers),
            InputEvent::MouseButton(e) => Some(e.modifiers),
            InputEvent::MouseMotion(e) => Some(e.modifiers),
            _ => None,
        }
    }

    /// Check whether this event triggers the same input as `template`.
    ///
    /// Events match when they are of the same kind and identify the same key,
    /// button, joypad axis direction or action. Pressed state is ignored;
    /// modifiers are compared only when `match_modifiers` is set. Mouse motion
    /// carries no identity and never matches.
    pub fn is_match(&self, template: &InputEvent, match_modifiers: bool) -> bool {
        let same_input = match (self, template) {
            (InputEvent::Key(a), InputEvent::Key(b)) => a.key == b.key,
            (InputEvent::MouseButton(a), InputEvent::MouseButton(b)) => a.button == b.button,
            (InputEvent::JoypadButton(a), InputEvent::JoypadButton(b)) => a.button == b.button,
            (InputEvent::JoypadMotion(a), InputEvent::JoypadMotion(b)) => {
                a.axis == b.axis && (a.value < 0.0) == (b.value < 0.0)
            }
            (InputEvent::Action(a), InputEvent::Action(b)) => a.action == b.action,
            _ => false,
        };

        same_input && (!match_modifiers || self.modifiers() == template.modifiers())
    }

    /// `key` pressed with exactly `modifiers` held
    pub fn is_key_pressed(&self, key: Key, modifiers: Modifiers) -> bool {
        matches!(self, InputEvent::Key(e) if e.key == key && e.modifiers == modifiers && e.pressed)
    }

    /// `key` released with exactly `modifiers` held
    pub fn is_key_released(&self, key: Key, modifiers: Modifiers) -> bool {
        matches!(self, InputEvent::Key(e) if e.key == key && e.modifiers == modifiers && !e.pressed)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        matches!(self, InputEvent::MouseButton(e) if e.button == button && e.pressed)
    }

    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        matches!(self, InputEvent::MouseButton(e) if e.button == button && !e.pressed)
    }

    pub fn is_left_clicked(&self) -> bool {
        self.is_mouse_pressed(MouseButton::Left)
    }
}

macro_rules! impl_from_payload {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for InputEvent {
                fn from(event: $payload) -> Self {
                    InputEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_payload! {
    KeyEvent => Key,
    MouseButtonEvent => MouseButton,
    MouseMotionEvent => MouseMotion,
    JoypadButtonEvent => JoypadButton,
    JoypadMotionEvent => JoypadMotion,
    ActionEvent => Action,
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Filters
// ─────────────────────────────────────────────────────────────────────────────

/// Which events a handler is willing to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    Any,
    Kind(EventKind),
}

impl EventFilter {
    pub fn matches(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Kind(kind) => event.kind() == *kind,
        }
    }
}

/// A payload type that can be borrowed out of an `InputEvent`.
///
/// Typed handlers use this to filter on the payload's kind and hand the
/// payload itself to their predicate and action.
pub trait EventVariant: 'static {
    const FILTER: EventFilter;

    fn from_event(event: &InputEvent) -> Option<&Self>;
}

impl EventVariant for InputEvent {
    const FILTER: EventFilter = EventFilter::Any;

    fn from_event(event: &InputEvent) -> Option<&Self> {
        Some(event)
    }
}

macro_rules! impl_event_variant {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl EventVariant for $payload {
                const FILTER: EventFilter = EventFilter::Kind(EventKind::$variant);

                fn from_event(event: &InputEvent) -> Option<&Self> {
                    match event {
                        InputEvent::$variant(e) => Some(e),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_event_variant! {
    KeyEvent => Key,
    MouseButtonEvent => MouseButton,
    MouseMotionEvent => MouseMotion,
    JoypadButtonEvent => JoypadButton,
    JoypadMotionEvent => JoypadMotion,
    ActionEvent => Action,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!("Space".parse::<Key>().unwrap(), Key::Space);
        assert_eq!("c".parse::<Key>().unwrap(), Key::Char('C'));
        assert_eq!("F5".parse::<Key>().unwrap(), Key::F(5));
        assert_eq!("F".parse::<Key>().unwrap(), Key::Char('F'));
        assert!("F13".parse::<Key>().is_err());
        assert!("Hyper".parse::<Key>().is_err());

        assert_eq!(Key::PageUp.to_string(), "PageUp");
        assert_eq!(Key::F(12).to_string(), "F12");
        assert_eq!(Key::char('x').to_string(), "X");
    }

    #[test]
    fn test_key_display_parses_back() {
        assert_eq!(Key::char(' '), Key::Space);
        assert_eq!(Key::char('\t'), Key::Tab);
        assert_eq!(Key::char('\n'), Key::Enter);

        let keys = [
            Key::char(' '),
            Key::char('%'),
            Key::Char(' '),
            Key::Char('\u{7}'),
            Key::F(3),
        ];
        for key in keys {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), key);

            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(serde_json::from_str::<Key>(&json).unwrap(), key);
        }
    }

    #[test]
    fn test_key_pressed_requires_exact_modifiers() {
        let copy: InputEvent = KeyEvent::pressed(Key::char('c'))
            .with_modifiers(Modifiers::CTRL)
            .into();

        assert!(copy.is_key_pressed(Key::char('c'), Modifiers::CTRL));
        assert!(!copy.is_key_pressed(Key::char('c'), Modifiers::empty()));
        assert!(!copy.is_key_released(Key::char('c'), Modifiers::CTRL));
    }

    #[test]
    fn test_mouse_helpers() {
        let click: InputEvent = MouseButtonEvent::pressed(MouseButton::Left).into();
        let release: InputEvent = MouseButtonEvent::released(MouseButton::Right).into();

        assert!(click.is_left_clicked());
        assert!(click.is_mouse_pressed(MouseButton::Left));
        assert!(release.is_mouse_released(MouseButton::Right));
        assert!(!release.is_left_clicked());
    }

    #[test]
    fn test_is_match() {
        let template: InputEvent = KeyEvent::pressed(Key::Space).into();
        let released: InputEvent = KeyEvent::released(Key::Space).into();
        let shifted: InputEvent = KeyEvent::pressed(Key::Space)
            .with_modifiers(Modifiers::SHIFT)
            .into();
        let other: InputEvent = KeyEvent::pressed(Key::Enter).into();

        // Pressed state is not part of identity
        assert!(released.is_match(&template, false));
        assert!(shifted.is_match(&template, false));
        assert!(!shifted.is_match(&template, true));
        assert!(!other.is_match(&template, false));

        let left = InputEvent::JoypadMotion(JoypadMotionEvent { device: 0, axis: 0, value: -0.8 });
        let right = InputEvent::JoypadMotion(JoypadMotionEvent { device: 0, axis: 0, value: 0.8 });
        assert!(!left.is_match(&right, false));
        assert!(left.is_pressed());

        let motion = InputEvent::MouseMotion(MouseMotionEvent {
            position: Position::new(1.0, 2.0),
            relative: Position::default(),
            modifiers: Modifiers::empty(),
        });
        assert!(!motion.is_match(&motion, false));
    }

    #[test]
    fn test_event_variant_borrow() {
        let event: InputEvent = ActionEvent::pressed("ui_accept").into();

        assert!(KeyEvent::from_event(&event).is_none());
        assert_eq!(ActionEvent::from_event(&event).unwrap().action, "ui_accept");
        assert!(ActionEvent::FILTER.matches(&event));
        assert!(!KeyEvent::FILTER.matches(&event));
        assert!(InputEvent::FILTER.matches(&event));
    }

    #[test]
    fn test_event_from_toml() {
        let event: InputEvent = toml::from_str(
            r#"
            kind = "key"
            key = "C"
            modifiers = "CTRL"
            pressed = true
            "#,
        )
        .unwrap();

        assert!(event.is_key_pressed(Key::char('c'), Modifiers::CTRL));

        let action: InputEvent = toml::from_str(
            r#"
            kind = "action"
            action = "jump"
            "#,
        )
        .unwrap();
        match action {
            InputEvent::Action(a) => assert_eq!(a.strength, 1.0),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_json_round_trip_uses_kind_tag() {
        let event: InputEvent = MouseButtonEvent::pressed(MouseButton::Middle).into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "mouse_button");
        assert_eq!(json["button"], "Middle");
    }
}
