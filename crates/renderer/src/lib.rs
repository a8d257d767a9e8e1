//! wgpu/winit host for the shader previewer.
//!
//! The crate supplies everything `viewer` leaves to its host:
//!
//! ```text
//!   file bytes ──▶ decode_bitmap / ShaderCompiler ──▶ Codecs ──▶ viewer::Game
//!                                                                  │
//!   winit events ──▶ InputState ──▶ TickClock ──▶ Game::update ────┤
//!                                                                  ▼
//!   surface ◀── present pass ◀── offscreen screen ◀── FrameCanvas (Game::draw)
//! ```
//!
//! Shaders are GLSL fragment bodies defining
//! `vec4 Fragment(vec4 dstPos, vec2 srcPos)`. They are validated with naga
//! on load, so a broken edit is reported as a reload error and the last good
//! program keeps rendering.

mod codec;
mod compile;
mod gpu;
mod input;
mod runtime;
mod types;
mod window;

use std::sync::Arc;

use viewer::{Codecs, UniformNames};

pub use codec::decode_bitmap;
pub use compile::ShaderCompiler;
pub use gpu::FrameCanvas;
pub use input::InputState;
pub use runtime::{TickClock, MAX_CATCH_UP_TICKS};
pub use types::{Bitmap, ShaderProgram, IMAGE_SLOTS};
pub use window::{run, WindowOptions};

/// Decoders for `viewer::Game::init`, with shaders wrapped for `names`.
pub fn codecs(names: &UniformNames) -> Codecs<Bitmap, ShaderProgram> {
    let compiler = ShaderCompiler::new(names);
    Codecs {
        image: Arc::new(decode_bitmap),
        shader: Arc::new(move |bytes: &[u8]| compiler.compile(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codecs_decode_both_asset_kinds() {
        let codecs = codecs(&UniformNames::default());

        let source = "vec4 Fragment(vec4 dstPos, vec2 srcPos) { return vec4(Time); }";
        let shader = (codecs.shader)(source.as_bytes()).expect("valid shader");
        assert!(shader.source().contains("Fragment"));
        assert!((codecs.shader)("not glsl".as_bytes()).is_err());
        assert!((codecs.image)("not an image".as_bytes()).is_err());
    }
}
