//! Core of the shader previewer.
//!
//! The crate owns everything that does not touch a window or the GPU: the
//! validated configuration, the hot-reloaded assets, the interactive state and
//! the per-frame uniform set. Hosts plug in through three seams:
//!
//! * [`Codecs`] turn file bytes into host image and shader values,
//! * [`InputSource`] reports per-tick input edges and the cursor,
//! * [`Canvas`] receives the draw calls issued by [`Game::draw`].

pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod log;
pub mod uniforms;

pub use config::{parse_pair, Size, UniformNames, ViewerConfig, MAX_IMAGES};
pub use error::{AssetRole, InitError};
pub use game::{Canvas, Codecs, Flow, Game, GameState, Phase, RectShader};
pub use input::{Control, InputAction, InputController, InputSource};
pub use log::LogSink;
pub use uniforms::{ImageSize, Uniform, UniformBinder, UniformFrame, UniformValue};

pub use liveasset::{AssetError, DecodeError, DecodeFn};
