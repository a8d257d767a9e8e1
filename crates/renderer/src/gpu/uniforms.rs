use bytemuck::{Pod, Zeroable};
use viewer::{Size, Uniform, UniformFrame, UniformValue};

/// CPU mirror of the `ViewerParams` block declared in the shader prelude.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct ViewerUniforms {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    pub slider: f32,
    pub flag: i32,
    pub ticks: i32,
    pub screen: [f32; 2],
}

impl ViewerUniforms {
    /// Builds the block for one shader draw. Unbound uniforms stay zero.
    pub fn from_frame(frame: &UniformFrame, screen: Size) -> Self {
        let bounds = frame.bounds();
        let (x, y) = frame.translation();
        let mut uniforms = Self {
            origin: [x as f32, y as f32],
            size: [bounds.width as f32, bounds.height as f32],
            screen: [screen.width as f32, screen.height as f32],
            ..Self::default()
        };
        for (uniform, entry) in frame.iter() {
            match (uniform, entry.value) {
                (Uniform::Flag, UniformValue::Int(value)) => uniforms.flag = value,
                (Uniform::Ticks, UniformValue::Int(value)) => uniforms.ticks = value,
                (Uniform::Time, UniformValue::Float(value)) => uniforms.time = value,
                (Uniform::Slider, UniformValue::Float(value)) => uniforms.slider = value,
                (Uniform::Mouse, UniformValue::Vec2(value)) => uniforms.mouse = value,
                (uniform, value) => {
                    tracing::trace!(?uniform, ?value, "uniform value does not fit its slot");
                }
            }
        }
        uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use viewer::{GameState, ImageSize, UniformBinder, UniformNames};

    struct Image;

    impl ImageSize for Image {
        fn size(&self) -> Size {
            Size::new(64, 32)
        }
    }

    #[test]
    fn matches_std140_block_size() {
        assert_eq!(std::mem::size_of::<ViewerUniforms>(), 48);
        assert_eq!(std::mem::offset_of!(ViewerUniforms, time), 24);
        assert_eq!(std::mem::offset_of!(ViewerUniforms, screen), 40);
    }

    #[test]
    fn copies_frame_values() {
        let mut state = GameState::default();
        state.toggle_flag();
        state.slider_up();
        state.set_cursor(5.0, 6.0);
        for _ in 0..30 {
            state.tick();
        }
        let binder = UniformBinder::new(&UniformNames::default(), 60, Size::new(256, 256), (4, 8));
        let frame = binder.generate_frame(&state, &[Arc::new(Image)]);

        let uniforms = ViewerUniforms::from_frame(&frame, Size::new(256, 256));
        assert_eq!(uniforms.origin, [4.0, 8.0]);
        assert_eq!(uniforms.size, [64.0, 32.0]);
        assert_eq!(uniforms.mouse, [5.0, 6.0]);
        assert_eq!(uniforms.flag, 1);
        assert_eq!(uniforms.ticks, 30);
        assert_eq!(uniforms.time, 0.5);
        assert_eq!(uniforms.slider, 0.1);
        assert_eq!(uniforms.screen, [256.0, 256.0]);
    }

    #[test]
    fn disabled_names_leave_zeroes() {
        let names = UniformNames {
            time: String::new(),
            ..UniformNames::default()
        };
        let mut state = GameState::default();
        state.tick();
        let binder = UniformBinder::new(&names, 1, Size::new(10, 10), (0, 0));
        let frame = binder.generate_frame::<Image>(&state, &[]);
        let uniforms = ViewerUniforms::from_frame(&frame, Size::new(10, 10));
        assert_eq!(uniforms.time, 0.0);
        assert_eq!(uniforms.ticks, 1);
        assert_eq!(uniforms.size, [10.0, 10.0]);
    }
}
