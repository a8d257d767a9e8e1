use crate::game::GameState;

/// Discrete controls the viewer reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    PrimaryClick,
    Space,
    Up,
    Down,
    Quit,
}

/// Per-tick view of the host's input devices.
pub trait InputSource {
    /// True only on the tick the control went down.
    fn just_pressed(&self, control: Control) -> bool;

    /// Pointer position in logical screen pixels.
    fn cursor_position(&self) -> (f64, f64);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Toggled,
    SliderUp,
    SliderDown,
    Quit,
}

/// Maps input edges onto state transitions, at most one per tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputController;

impl InputController {
    pub fn new() -> Self {
        Self
    }

    pub fn poll(&self, input: &dyn InputSource, state: &mut GameState) -> Option<InputAction> {
        if input.just_pressed(Control::PrimaryClick) || input.just_pressed(Control::Space) {
            state.toggle_flag();
            Some(InputAction::Toggled)
        } else if input.just_pressed(Control::Up) {
            state.slider_up();
            Some(InputAction::SliderUp)
        } else if input.just_pressed(Control::Down) {
            state.slider_down();
            Some(InputAction::SliderDown)
        } else if input.just_pressed(Control::Quit) {
            Some(InputAction::Quit)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Input source that reports a fixed set of pressed controls.
    #[derive(Default)]
    pub(crate) struct Pressed {
        pub controls: Vec<Control>,
        pub cursor: (f64, f64),
    }

    impl Pressed {
        pub fn of(controls: &[Control]) -> Self {
            Self {
                controls: controls.to_vec(),
                cursor: (0.0, 0.0),
            }
        }
    }

    impl InputSource for Pressed {
        fn just_pressed(&self, control: Control) -> bool {
            self.controls.contains(&control)
        }

        fn cursor_position(&self) -> (f64, f64) {
            self.cursor
        }
    }

    fn press(controls: &[Control], state: &mut GameState) -> Option<InputAction> {
        InputController::new().poll(&Pressed::of(controls), state)
    }

    #[test]
    fn nothing_pressed_is_a_no_op() {
        let mut state = GameState::default();
        assert_eq!(press(&[], &mut state), None);
        assert_eq!(state.flag(), 0);
        assert_eq!(state.slider(), 0.0);
    }

    #[test]
    fn click_and_space_both_toggle() {
        let mut state = GameState::default();
        assert_eq!(press(&[Control::PrimaryClick], &mut state), Some(InputAction::Toggled));
        assert_eq!(state.flag(), 1);
        assert_eq!(press(&[Control::Space], &mut state), Some(InputAction::Toggled));
        assert_eq!(state.flag(), 0);
        // Both on the same tick still count once.
        press(&[Control::PrimaryClick, Control::Space], &mut state);
        assert_eq!(state.flag(), 1);
    }

    #[test]
    fn slider_saturates_at_both_ends() {
        let mut state = GameState::default();
        for _ in 0..9 {
            press(&[Control::Up], &mut state);
        }
        assert_eq!(state.slider(), 0.9);
        press(&[Control::Up], &mut state);
        assert_eq!(state.slider(), 1.0);
        press(&[Control::Up], &mut state);
        assert_eq!(state.slider(), 1.0);

        for _ in 0..9 {
            press(&[Control::Down], &mut state);
        }
        assert_eq!(state.slider(), 0.1);
        press(&[Control::Down], &mut state);
        assert_eq!(state.slider(), 0.0);
        press(&[Control::Down], &mut state);
        assert_eq!(state.slider(), 0.0);
    }

    #[test]
    fn higher_priority_control_wins_a_tie() {
        let mut state = GameState::default();
        let action = press(&[Control::Quit, Control::Down, Control::Up, Control::Space], &mut state);
        assert_eq!(action, Some(InputAction::Toggled));
        assert_eq!(state.slider(), 0.0);

        let action = press(&[Control::Quit, Control::Down, Control::Up], &mut state);
        assert_eq!(action, Some(InputAction::SliderUp));

        let action = press(&[Control::Quit, Control::Down], &mut state);
        assert_eq!(action, Some(InputAction::SliderDown));

        assert_eq!(press(&[Control::Quit], &mut state), Some(InputAction::Quit));
    }
}
