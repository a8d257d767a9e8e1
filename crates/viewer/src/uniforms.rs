use std::fmt;
use std::sync::Arc;

use crate::config::{Size, UniformNames};
use crate::game::GameState;

/// Number of live uniforms the viewer drives.
pub const UNIFORM_COUNT: usize = 5;

/// Fixed slot of each live uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uniform {
    Flag = 0,
    Ticks = 1,
    Time = 2,
    Mouse = 3,
    Slider = 4,
}

impl Uniform {
    pub const ALL: [Uniform; UNIFORM_COUNT] = [
        Uniform::Flag,
        Uniform::Ticks,
        Uniform::Time,
        Uniform::Mouse,
        Uniform::Slider,
    ];

    pub fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Int(value) => write!(f, "{value}"),
            UniformValue::Float(value) => write!(f, "{value:.3}"),
            UniformValue::Vec2([x, y]) => write!(f, "[{x}, {y}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UniformEntry {
    pub name: Arc<str>,
    pub value: UniformValue,
}

/// Anything the binder can take draw bounds from.
pub trait ImageSize {
    fn size(&self) -> Size;
}

/// Everything a single shader draw needs besides the assets themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformFrame {
    entries: [Option<UniformEntry>; UNIFORM_COUNT],
    image_slots: usize,
    bounds: Size,
    translation: (i32, i32),
}

impl UniformFrame {
    pub fn get(&self, uniform: Uniform) -> Option<&UniformValue> {
        self.entries[uniform.slot()].as_ref().map(|entry| &entry.value)
    }

    /// Looks a value up by its configured shader name.
    pub fn by_name(&self, name: &str) -> Option<&UniformValue> {
        self.iter()
            .find(|(_, entry)| &*entry.name == name)
            .map(|(_, entry)| &entry.value)
    }

    /// Bound entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Uniform, &UniformEntry)> {
        Uniform::ALL
            .into_iter()
            .zip(self.entries.iter())
            .filter_map(|(uniform, entry)| entry.as_ref().map(|entry| (uniform, entry)))
    }

    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn image_slots(&self) -> usize {
        self.image_slots
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn translation(&self) -> (i32, i32) {
        self.translation
    }

    /// Compact `name=value` listing for the interaction log line.
    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }
}

pub struct Summary<'a>(&'a UniformFrame);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for uniform in [Uniform::Flag, Uniform::Slider, Uniform::Time, Uniform::Mouse] {
            if let Some(entry) = &self.0.entries[uniform.slot()] {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{}={}", entry.name, entry.value)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Turns game state into uniform values. Built once per [`crate::Game`].
#[derive(Clone, Debug)]
pub struct UniformBinder {
    names: [Option<Arc<str>>; UNIFORM_COUNT],
    ticks_per_second: u32,
    default_bounds: Size,
    translation: (i32, i32),
}

impl UniformBinder {
    pub fn new(
        names: &UniformNames,
        ticks_per_second: u32,
        default_bounds: Size,
        translation: (i32, i32),
    ) -> Self {
        let names = Uniform::ALL.map(|uniform| {
            let name = names.get(uniform);
            (!name.is_empty()).then(|| Arc::<str>::from(name))
        });
        Self {
            names,
            ticks_per_second: ticks_per_second.max(1),
            default_bounds,
            translation,
        }
    }

    pub fn name(&self, uniform: Uniform) -> Option<&str> {
        self.names[uniform.slot()].as_deref()
    }

    pub fn elapsed_seconds(&self, ticks: u64) -> f32 {
        (ticks as f64 / f64::from(self.ticks_per_second)) as f32
    }

    pub fn generate_frame<I: ImageSize>(&self, state: &GameState, images: &[Arc<I>]) -> UniformFrame {
        let (cursor_x, cursor_y) = state.cursor();
        let entries = Uniform::ALL.map(|uniform| {
            let name = self.names[uniform.slot()].clone()?;
            let value = match uniform {
                Uniform::Flag => UniformValue::Int(state.flag()),
                Uniform::Ticks => {
                    UniformValue::Int(i32::try_from(state.ticks()).unwrap_or(i32::MAX))
                }
                Uniform::Time => UniformValue::Float(self.elapsed_seconds(state.ticks())),
                Uniform::Mouse => UniformValue::Vec2([cursor_x as f32, cursor_y as f32]),
                Uniform::Slider => UniformValue::Float(state.slider()),
            };
            Some(UniformEntry { name, value })
        });

        let bounds = images
            .first()
            .map(|image| image.size())
            .unwrap_or(self.default_bounds);

        UniformFrame {
            entries,
            image_slots: images.len(),
            bounds,
            translation: self.translation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Size);

    impl ImageSize for Fixed {
        fn size(&self) -> Size {
            self.0
        }
    }

    fn binder(names: &UniformNames) -> UniformBinder {
        UniformBinder::new(names, 60, Size::new(256, 256), (10, -4))
    }

    #[test]
    fn time_is_ticks_over_rate() {
        let mut state = GameState::default();
        for _ in 0..120 {
            state.tick();
        }
        let frame = binder(&UniformNames::default()).generate_frame::<Fixed>(&state, &[]);
        assert_eq!(frame.get(Uniform::Time), Some(&UniformValue::Float(2.0)));
        assert_eq!(frame.get(Uniform::Ticks), Some(&UniformValue::Int(120)));
    }

    #[test]
    fn empty_names_are_left_out() {
        let names = UniformNames {
            ticks: String::new(),
            mouse: String::new(),
            ..UniformNames::default()
        };
        let frame = binder(&names).generate_frame::<Fixed>(&GameState::default(), &[]);
        assert_eq!(frame.len(), 3);
        assert!(frame.get(Uniform::Ticks).is_none());
        assert!(frame.get(Uniform::Mouse).is_none());
        assert_eq!(frame.by_name("Flag"), Some(&UniformValue::Int(0)));
    }

    #[test]
    fn renamed_uniforms_resolve_by_their_new_name() {
        let names = UniformNames {
            time: "uTime".into(),
            ..UniformNames::default()
        };
        let frame = binder(&names).generate_frame::<Fixed>(&GameState::default(), &[]);
        assert!(frame.by_name("Time").is_none());
        assert_eq!(frame.by_name("uTime"), Some(&UniformValue::Float(0.0)));
    }

    #[test]
    fn bounds_follow_first_image() {
        let images = vec![
            Arc::new(Fixed(Size::new(512, 300))),
            Arc::new(Fixed(Size::new(64, 64))),
        ];
        let frame = binder(&UniformNames::default()).generate_frame(&GameState::default(), &images);
        assert_eq!(frame.bounds(), Size::new(512, 300));
        assert_eq!(frame.image_slots(), 2);
        assert_eq!(frame.translation(), (10, -4));
    }

    #[test]
    fn bounds_fall_back_to_geometry() {
        let frame = binder(&UniformNames::default()).generate_frame::<Fixed>(&GameState::default(), &[]);
        assert_eq!(frame.bounds(), Size::new(256, 256));
        assert_eq!(frame.image_slots(), 0);
        assert_eq!(frame.translation(), (10, -4));
    }

    #[test]
    fn summary_lists_interaction_values() {
        let mut state = GameState::default();
        state.toggle_flag();
        state.set_cursor(3.0, 4.0);
        let frame = binder(&UniformNames::default()).generate_frame::<Fixed>(&state, &[]);
        assert_eq!(
            frame.summary().to_string(),
            "Flag=1 Slider=0.000 Time=0.000 Mouse=[3, 4]"
        );
    }
}
