//! Store logo as a 1-bit raster, ready for `GS v 0`.

use image::imageops::FilterType;
use std::path::Path;

use crate::error::{PrintError, PrintResult};

/// Widest logo an 80 mm head can print.
pub const MAX_LOGO_WIDTH_DOTS: u32 = 576;

/// Tallest logo accepted. Keeps the header compact on paper.
const MAX_LOGO_HEIGHT_DOTS: u32 = 240;

/// Pixels darker than this are printed.
const LUMA_THRESHOLD: u8 = 160;

/// A rasterized logo.
///
/// Rows are packed MSB first, `width_bytes()` bytes per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    width_dots: u32,
    height_dots: u32,
    bits: Vec<u8>,
}

impl Logo {
    /// Decodes PNG/JPEG bytes and rasterizes them, scaling down to at most
    /// `max_width_dots` wide.
    pub fn from_image_bytes(bytes: &[u8], max_width_dots: u32) -> PrintResult<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| PrintError::ImageDecode(e.to_string()))?;
        let gray = decoded.to_luma8();
        let (src_w, src_h) = gray.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(PrintError::ImageDecode("image has no pixels".to_string()));
        }

        let max_width = max_width_dots.clamp(8, MAX_LOGO_WIDTH_DOTS);
        let mut target_w = src_w.min(max_width);
        let mut target_h = scale(src_h, target_w, src_w);
        if target_h > MAX_LOGO_HEIGHT_DOTS {
            target_h = MAX_LOGO_HEIGHT_DOTS;
            target_w = scale(src_w, target_h, src_h);
        }

        let resized = if target_w != src_w || target_h != src_h {
            image::imageops::resize(&gray, target_w, target_h, FilterType::Triangle)
        } else {
            gray
        };

        let (width, height) = resized.dimensions();
        let width_bytes = width.div_ceil(8);
        let mut bits = Vec::with_capacity((width_bytes * height) as usize);
        for y in 0..height {
            for xb in 0..width_bytes {
                let mut byte = 0u8;
                for bit in 0..8u32 {
                    let x = xb * 8 + bit;
                    if x < width && resized.get_pixel(x, y).0[0] < LUMA_THRESHOLD {
                        byte |= 0x80 >> bit;
                    }
                }
                bits.push(byte);
            }
        }

        Ok(Logo {
            width_dots: width,
            height_dots: height,
            bits,
        })
    }

    /// Reads and rasterizes a logo file.
    pub fn from_path(path: &Path, max_width_dots: u32) -> PrintResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| PrintError::ImageDecode(format!("{}: {}", path.display(), e)))?;
        Self::from_image_bytes(&bytes, max_width_dots)
    }

    pub fn width_dots(&self) -> u32 {
        self.width_dots
    }

    pub fn height_dots(&self) -> u32 {
        self.height_dots
    }

    pub fn width_bytes(&self) -> u32 {
        self.width_dots.div_ceil(8)
    }

    /// Packed raster rows.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }
}

fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    ((value as f64 * numerator as f64 / denominator as f64).round() as u32).max(1)
}
