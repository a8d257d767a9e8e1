use std::collections::HashSet;

use viewer::{Control, InputSource, Size};
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{Key, NamedKey};

/// Collects winit events between ticks and exposes them as edges.
///
/// A press stays visible until [`InputState::end_tick`] runs, so a press that
/// lands between two ticks is seen by exactly one update.
#[derive(Debug, Default)]
pub struct InputState {
    pressed: HashSet<Control>,
    cursor: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        if let Some(control) = control_for_key(&event.logical_key) {
            self.press(control);
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left && state == ElementState::Pressed {
            self.press(Control::PrimaryClick);
        }
    }

    /// Records the pointer, mapping window pixels through the letterbox
    /// `viewport` (x, y, width, height) onto the logical screen.
    pub fn handle_cursor(&mut self, x: f64, y: f64, viewport: (f64, f64, f64, f64), logical: Size) {
        let (left, top, width, height) = viewport;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.cursor = (
            (x - left) * f64::from(logical.width) / width,
            (y - top) * f64::from(logical.height) / height,
        );
    }

    pub fn press(&mut self, control: Control) {
        self.pressed.insert(control);
    }

    /// Forgets the edges consumed by the tick that just ran.
    pub fn end_tick(&mut self) {
        self.pressed.clear();
    }
}

impl InputSource for InputState {
    fn just_pressed(&self, control: Control) -> bool {
        self.pressed.contains(&control)
    }

    fn cursor_position(&self) -> (f64, f64) {
        self.cursor
    }
}

fn control_for_key(key: &Key) -> Option<Control> {
    match key {
        Key::Named(NamedKey::Space) => Some(Control::Space),
        Key::Named(NamedKey::ArrowUp) => Some(Control::Up),
        Key::Named(NamedKey::ArrowDown) => Some(Control::Down),
        Key::Character(value) if value.as_str() == " " => Some(Control::Space),
        Key::Character(value) if value.eq_ignore_ascii_case("q") => Some(Control::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_named_keys() {
        assert_eq!(control_for_key(&Key::Named(NamedKey::Space)), Some(Control::Space));
        assert_eq!(control_for_key(&Key::Named(NamedKey::ArrowUp)), Some(Control::Up));
        assert_eq!(control_for_key(&Key::Named(NamedKey::ArrowDown)), Some(Control::Down));
        assert_eq!(control_for_key(&Key::Named(NamedKey::Enter)), None);
    }

    #[test]
    fn maps_quit_key_in_either_case() {
        assert_eq!(control_for_key(&Key::Character("q".into())), Some(Control::Quit));
        assert_eq!(control_for_key(&Key::Character("Q".into())), Some(Control::Quit));
        assert_eq!(control_for_key(&Key::Character("w".into())), None);
    }

    #[test]
    fn left_press_is_primary_click() {
        let mut input = InputState::new();
        input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.just_pressed(Control::PrimaryClick));
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.just_pressed(Control::PrimaryClick));
    }

    #[test]
    fn edges_last_until_end_of_tick() {
        let mut input = InputState::new();
        input.press(Control::Up);
        assert!(input.just_pressed(Control::Up));
        assert!(input.just_pressed(Control::Up));
        input.end_tick();
        assert!(!input.just_pressed(Control::Up));
    }

    #[test]
    fn cursor_maps_through_letterbox() {
        let mut input = InputState::new();
        let logical = Size::new(100, 100);
        input.handle_cursor(150.0, 100.0, (50.0, 0.0, 200.0, 200.0), logical);
        assert_eq!(input.cursor_position(), (50.0, 50.0));

        input.handle_cursor(40.0, 0.0, (50.0, 0.0, 200.0, 200.0), logical);
        assert_eq!(input.cursor_position(), (-5.0, 0.0));
    }

    #[test]
    fn degenerate_viewport_keeps_last_cursor() {
        let mut input = InputState::new();
        input.handle_cursor(10.0, 10.0, (0.0, 0.0, 100.0, 100.0), Size::new(100, 100));
        input.handle_cursor(99.0, 99.0, (0.0, 0.0, 0.0, 0.0), Size::new(100, 100));
        assert_eq!(input.cursor_position(), (10.0, 10.0));
    }
}
