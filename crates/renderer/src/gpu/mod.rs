//! GPU side of the previewer.
//!
//! - `canvas` records the draw calls issued by the game for one frame.
//! - `context` owns the wgpu instance, device and window surface.
//! - `textures` uploads bitmaps and builds the offscreen logical screen.
//! - `pipeline` builds the shader and blit pipelines.
//! - `uniforms` mirrors the `ViewerParams` block of the shader prelude.
//! - `state` replays a recorded frame and presents it letterboxed.

mod canvas;
mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub use canvas::FrameCanvas;
pub(crate) use state::GpuState;
