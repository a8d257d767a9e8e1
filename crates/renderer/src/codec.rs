use viewer::DecodeError;

use crate::types::Bitmap;

/// Decodes PNG, JPEG, BMP or GIF bytes into a premultiplied [`Bitmap`].
pub fn decode_bitmap(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    let image = image::load_from_memory(bytes)
        .map_err(|err| DecodeError::new(format!("unsupported or corrupt image: {err}")))?;
    Ok(Bitmap::from_straight(image.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};
    use viewer::{ImageSize, Size};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_png() {
        let bitmap = decode_bitmap(&png_bytes(3, 2)).unwrap();
        assert_eq!(bitmap.size(), Size::new(3, 2));
        assert_eq!(&bitmap.as_bytes()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_bitmap(b"definitely not an image").unwrap_err();
        assert!(err.message().contains("unsupported or corrupt image"));
    }

    #[test]
    fn rejects_truncated_png() {
        let bytes = png_bytes(16, 16);
        assert!(decode_bitmap(&bytes[..bytes.len() / 2]).is_err());
    }
}
