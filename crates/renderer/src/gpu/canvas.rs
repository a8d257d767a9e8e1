use std::sync::Arc;

use viewer::{Canvas, RectShader, Size, UniformFrame};

use crate::types::{Bitmap, ShaderProgram};

/// One draw call recorded during `Game::draw`.
#[derive(Clone, Debug)]
pub(crate) enum DrawCommand {
    Image(Arc<Bitmap>),
    RectShader {
        shader: Arc<ShaderProgram>,
        uniforms: UniformFrame,
        images: Vec<Arc<Bitmap>>,
    },
}

/// Records the draw calls of a frame so the GPU can replay them in one
/// command encoder.
#[derive(Debug, Default)]
pub struct FrameCanvas {
    commands: Vec<DrawCommand>,
}

impl FrameCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for FrameCanvas {
    type Image = Bitmap;
    type Shader = ShaderProgram;

    fn draw_image(&mut self, image: &Arc<Bitmap>) {
        self.commands.push(DrawCommand::Image(Arc::clone(image)));
    }

    fn draw_rect_shader(&mut self, draw: RectShader<'_, Bitmap, ShaderProgram>) {
        self.commands.push(DrawCommand::RectShader {
            shader: draw.shader,
            uniforms: draw.uniforms.clone(),
            images: draw.images.to_vec(),
        });
    }
}

/// Pixel rectangle with a non-negative origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Part of the translated shader rectangle that lies on the screen, if any.
pub(crate) fn shader_scissor(bounds: Size, translation: (i32, i32), screen: Size) -> Option<Rect> {
    let left = i64::from(translation.0).max(0);
    let top = i64::from(translation.1).max(0);
    let right = (i64::from(translation.0) + i64::from(bounds.width)).min(i64::from(screen.width));
    let bottom = (i64::from(translation.1) + i64::from(bounds.height)).min(i64::from(screen.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Largest aspect-preserving placement of `screen` centred inside `window`.
pub(crate) fn letterbox(screen: Size, window: Size) -> Rect {
    let screen_w = f64::from(screen.width.max(1));
    let screen_h = f64::from(screen.height.max(1));
    let window_w = f64::from(window.width.max(1));
    let window_h = f64::from(window.height.max(1));

    let scale = (window_w / screen_w).min(window_h / screen_h);
    let width = ((screen_w * scale).round() as u32).clamp(1, window.width.max(1));
    let height = ((screen_h * scale).round() as u32).clamp(1, window.height.max(1));
    Rect {
        x: (window.width.max(1) - width) / 2,
        y: (window.height.max(1) - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scissor_inside_screen() {
        let rect = shader_scissor(Size::new(100, 50), (10, 20), Size::new(256, 256));
        assert_eq!(
            rect,
            Some(Rect {
                x: 10,
                y: 20,
                width: 100,
                height: 50
            })
        );
    }

    #[test]
    fn scissor_clips_negative_translation() {
        let rect = shader_scissor(Size::new(100, 100), (-30, -10), Size::new(50, 200));
        assert_eq!(
            rect,
            Some(Rect {
                x: 0,
                y: 0,
                width: 50,
                height: 90
            })
        );
    }

    #[test]
    fn scissor_off_screen_is_empty() {
        assert_eq!(shader_scissor(Size::new(10, 10), (300, 0), Size::new(256, 256)), None);
        assert_eq!(shader_scissor(Size::new(10, 10), (0, -10), Size::new(256, 256)), None);
    }

    #[test]
    fn letterbox_same_aspect_fills_window() {
        let rect = letterbox(Size::new(256, 256), Size::new(512, 512));
        assert_eq!(
            rect,
            Rect {
                x: 0,
                y: 0,
                width: 512,
                height: 512
            }
        );
    }

    #[test]
    fn letterbox_wide_window_adds_side_bars() {
        let rect = letterbox(Size::new(100, 100), Size::new(300, 200));
        assert_eq!(
            rect,
            Rect {
                x: 50,
                y: 0,
                width: 200,
                height: 200
            }
        );
    }

    #[test]
    fn letterbox_tall_window_adds_top_bars() {
        let rect = letterbox(Size::new(512, 300), Size::new(512, 600));
        assert_eq!(
            rect,
            Rect {
                x: 0,
                y: 150,
                width: 512,
                height: 300
            }
        );
    }

    #[test]
    fn records_draws_in_order() {
        use viewer::{GameState, UniformBinder, UniformNames};

        let bitmap = Arc::new(Bitmap::from_straight(image::RgbaImage::new(4, 4)));
        let shader = Arc::new(ShaderProgram::new("void main() {}".into()));
        let binder = UniformBinder::new(&UniformNames::default(), 60, Size::new(4, 4), (0, 0));
        let images = vec![Arc::clone(&bitmap)];
        let frame = binder.generate_frame(&GameState::default(), &images);

        let mut canvas = FrameCanvas::new();
        canvas.draw_image(&bitmap);
        canvas.draw_rect_shader(RectShader {
            shader,
            uniforms: &frame,
            images: &images,
        });

        let commands = canvas.into_commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], DrawCommand::Image(image) if Arc::ptr_eq(image, &bitmap)));
        match &commands[1] {
            DrawCommand::RectShader { images, uniforms, .. } => {
                assert_eq!(images.len(), 1);
                assert_eq!(uniforms.bounds(), Size::new(4, 4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
