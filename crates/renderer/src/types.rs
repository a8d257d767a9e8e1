use image::RgbaImage;
use viewer::{ImageSize, Size};

/// Number of foreground image slots exposed to user shaders.
pub const IMAGE_SLOTS: usize = viewer::MAX_IMAGES;

/// Decoded image with premultiplied-alpha RGBA8 pixels, top row first.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    /// Wraps straight-alpha pixels, premultiplying them in place.
    pub fn from_straight(mut pixels: RgbaImage) -> Self {
        for pixel in pixels.pixels_mut() {
            let alpha = u16::from(pixel[3]);
            if alpha == 255 {
                continue;
            }
            for channel in &mut pixel.0[..3] {
                *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
            }
        }
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

impl ImageSize for Bitmap {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

/// User fragment shader wrapped with the viewer prelude and checked by naga.
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    source: String,
}

impl ShaderProgram {
    pub(crate) fn new(source: String) -> Self {
        Self { source }
    }

    /// Complete GLSL fragment source handed to wgpu.
    pub fn source(&self) -> &str {
        &self.source
    }
}
