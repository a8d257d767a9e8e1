use std::path::PathBuf;
use std::time::Duration;

use crate::error::InitError;
use crate::uniforms::Uniform;

/// Foreground image slots the shader can sample from.
pub const MAX_IMAGES: usize = 4;
pub const DEFAULT_TICKS_PER_SECOND: u32 = 60;
pub const DEFAULT_GEOMETRY: &str = "256x256";
pub const DEFAULT_POSITION: &str = "0x0";
pub const DEFAULT_POLL_INTERVAL: Duration = liveasset::DEFAULT_POLL_INTERVAL;

/// Names the shader uses for each of the live uniforms.
///
/// An empty name disables the uniform entirely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformNames {
    pub flag: String,
    pub ticks: String,
    pub time: String,
    pub mouse: String,
    pub slider: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            flag: "Flag".to_string(),
            ticks: "Ticks".to_string(),
            time: "Time".to_string(),
            mouse: "Mouse".to_string(),
            slider: "Slider".to_string(),
        }
    }
}

impl UniformNames {
    pub fn get(&self, uniform: Uniform) -> &str {
        match uniform {
            Uniform::Flag => &self.flag,
            Uniform::Ticks => &self.ticks,
            Uniform::Time => &self.time,
            Uniform::Mouse => &self.mouse,
            Uniform::Slider => &self.slider,
        }
    }
}

/// Finalized viewer settings. Immutable once handed to [`crate::Game::init`].
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub images: Vec<PathBuf>,
    pub shader: PathBuf,
    pub background: Option<PathBuf>,
    /// Requested logical screen size, `WIDTHxHEIGHT`.
    pub geometry: String,
    /// Shader translation, `XxY`.
    pub position: String,
    pub ticks_per_second: u32,
    pub uniforms: UniformNames,
    pub debug: bool,
    pub poll_interval: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            shader: PathBuf::new(),
            background: None,
            geometry: DEFAULT_GEOMETRY.to_string(),
            position: DEFAULT_POSITION.to_string(),
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            uniforms: UniformNames::default(),
            debug: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Pixel extent of the logical screen or of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Config after its textual fields have been checked and parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validated {
    pub geometry: Size,
    pub position: (i32, i32),
}

impl ViewerConfig {
    /// Checks every invariant that does not need the filesystem.
    pub fn validate(&self) -> Result<Validated, InitError> {
        if self.images.len() > MAX_IMAGES {
            return Err(InitError::TooManyImages {
                count: self.images.len(),
            });
        }
        if self.shader.as_os_str().is_empty() {
            return Err(InitError::MissingShader);
        }
        if self.ticks_per_second == 0 {
            return Err(InitError::TicksPerSecond);
        }
        let geometry = parse_geometry(&self.geometry).ok_or_else(|| InitError::Geometry {
            value: self.geometry.clone(),
        })?;
        let position = parse_pair::<i32>(&self.position).ok_or_else(|| InitError::Position {
            value: self.position.clone(),
        })?;
        Ok(Validated { geometry, position })
    }
}

/// Parses `AxB` where both halves are integers of type `T`.
pub fn parse_pair<T: std::str::FromStr>(value: &str) -> Option<(T, T)> {
    let (left, right) = value.split_once('x')?;
    Some((left.parse().ok()?, right.parse().ok()?))
}

fn parse_geometry(value: &str) -> Option<Size> {
    let (width, height) = parse_pair::<u32>(value)?;
    (width > 0 && height > 0).then_some(Size::new(width, height))
}
