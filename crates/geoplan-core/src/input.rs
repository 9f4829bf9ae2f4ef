//! Pointer and keyboard input as delivered by the embedding UI.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Control,
    Escape,
    Delete,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
}

impl Key {
    /// Unit direction of an arrow key, screen y down.
    pub fn arrow_direction(self) -> Option<Vec2> {
        match self {
            Key::ArrowLeft => Some(Vec2::new(-1.0, 0.0)),
            Key::ArrowRight => Some(Vec2::new(1.0, 0.0)),
            Key::ArrowUp => Some(Vec2::new(0.0, -1.0)),
            Key::ArrowDown => Some(Vec2::new(0.0, 1.0)),
            _ => None,
        }
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Pointer and modifier state between events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    pub modifiers: Modifiers,
    /// Screen position where the current left-button drag started.
    pub drag_start: Option<Point>,
    last_click: Option<(Instant, Point)>,
    double_click: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Process a pointer event received now.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        self.handle_pointer_event_at(event, Instant::now());
    }

    /// Process a pointer event received at `now`.
    pub fn handle_pointer_event_at(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                if button != MouseButton::Left {
                    return;
                }
                self.double_click = match self.last_click {
                    Some((time, last)) => {
                        now.saturating_duration_since(time) < DOUBLE_CLICK_TIME
                            && (position - last).hypot() < DOUBLE_CLICK_DISTANCE
                    }
                    None => false,
                };
                // A triple click is not a second double click.
                self.last_click = if self.double_click { None } else { Some((now, position)) };
                self.drag_start = Some(position);
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                if button == MouseButton::Left {
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { position } | PointerEvent::Scroll { position, .. } => {
                self.pointer_position = position;
            }
        }
    }

    /// Track Ctrl from key events.
    pub fn handle_key(&mut self, key: Key, pressed: bool) {
        if key == Key::Control {
            self.modifiers.ctrl = pressed;
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Whether the last left press completed a double click.
    pub fn is_double_click(&self) -> bool {
        self.double_click
    }

    /// Drag delta from the press position, if dragging.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_drag_tracking() {
        let mut input = InputState::new();
        input.handle_pointer_event(down(100.0, 100.0));
        assert!(input.is_dragging());

        input.handle_pointer_event(PointerEvent::Move {
            position: Point::new(150.0, 120.0),
        });
        let delta = input.drag_delta().unwrap();
        assert!((delta.x - 50.0).abs() < f64::EPSILON);
        assert!((delta.y - 20.0).abs() < f64::EPSILON);

        input.handle_pointer_event(PointerEvent::Up {
            position: Point::new(150.0, 120.0),
            button: MouseButton::Left,
        });
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        let start = Instant::now();
        input.handle_pointer_event_at(down(100.0, 100.0), start);
        assert!(!input.is_double_click());
        input.handle_pointer_event_at(down(101.0, 100.0), start + Duration::from_millis(200));
        assert!(input.is_double_click());
        // Third click starts over.
        input.handle_pointer_event_at(down(101.0, 100.0), start + Duration::from_millis(300));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_double_click_too_slow_or_far() {
        let mut input = InputState::new();
        let start = Instant::now();
        input.handle_pointer_event_at(down(100.0, 100.0), start);
        input.handle_pointer_event_at(down(100.0, 100.0), start + Duration::from_millis(800));
        assert!(!input.is_double_click());
        input.handle_pointer_event_at(down(200.0, 200.0), start + Duration::from_millis(900));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_ctrl_tracking() {
        let mut input = InputState::new();
        input.handle_key(Key::Control, true);
        assert!(input.modifiers.ctrl);
        input.handle_key(Key::Char('a'), true);
        assert!(input.modifiers.ctrl);
        input.handle_key(Key::Control, false);
        assert_eq!(input.modifiers, Modifiers::NONE);
    }

    #[test]
    fn test_arrow_direction() {
        assert_eq!(Key::ArrowUp.arrow_direction(), Some(Vec2::new(0.0, -1.0)));
        assert_eq!(Key::Delete.arrow_direction(), None);
    }
}
