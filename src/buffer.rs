use crate::foundation::error::{FrameloomError, FrameloomResult};

/// A rendered image as RGBA8 pixels.
///
/// Pass outputs are **premultiplied alpha** by default. The `premultiplied`
/// flag makes this explicit at API boundaries; sinks that encode to straight
/// alpha call [`ImageRGBA::to_straight_alpha`] first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl ImageRGBA {
    /// Create an image filled with a single premultiplied RGBA8 color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> FrameloomResult<Self> {
        if width == 0 || height == 0 {
            return Err(FrameloomError::validation(
                "ImageRGBA dimensions must be non-zero",
            ));
        }
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Read one pixel. Returns `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert premultiplied pixels to straight alpha in place.
    ///
    /// No-op when the buffer is already straight alpha.
    pub fn to_straight_alpha(&mut self) {
        if !self.premultiplied {
            return;
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 || a == 255 {
                continue;
            }
            for c in px.iter_mut().take(3) {
                let unpremul = (u32::from(*c) * 255 + u32::from(a) / 2) / u32::from(a);
                *c = unpremul.min(255) as u8;
            }
        }
        self.premultiplied = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_rejects_zero_dimensions() {
        assert!(ImageRGBA::solid(0, 4, [0, 0, 0, 0]).is_err());
        assert!(ImageRGBA::solid(4, 0, [0, 0, 0, 0]).is_err());
    }

    #[test]
    fn pixel_reads_row_major() {
        let mut img = ImageRGBA::solid(2, 2, [1, 2, 3, 4]).unwrap();
        img.data[4..8].copy_from_slice(&[9, 9, 9, 9]);
        assert_eq!(img.pixel(1, 0), Some([9, 9, 9, 9]));
        assert_eq!(img.pixel(0, 1), Some([1, 2, 3, 4]));
        assert_eq!(img.pixel(2, 0), None);
    }

    #[test]
    fn straight_alpha_conversion_divides_out_alpha() {
        let mut img = ImageRGBA::solid(1, 1, [64, 64, 64, 128]).unwrap();
        img.to_straight_alpha();
        assert!(!img.premultiplied);
        let px = img.pixel(0, 0).unwrap();
        assert_eq!(px[3], 128);
        // 64 / (128/255) == 127.5, rounded
        assert!((126..=129).contains(&px[0]));
    }
}
