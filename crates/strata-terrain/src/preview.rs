//! Preview images of rebuilt chunks: vertex colors and grayscale elevation.
//!
//! Used by the demo and for eyeballing parameter changes without a renderer.

use std::path::Path;

use crate::chunk::ChunkSamples;
use crate::error::TerrainError;

/// A 2D preview image stored as row-major RGBA pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data in row-major RGBA format. Length = `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl PreviewImage {
    /// Create a new black (all-zero) image with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Set a single pixel's RGBA value.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.pixels[idx..idx + 4].copy_from_slice(&rgba);
    }

    /// Get a pixel's RGBA value.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copy `other` into this image with its top-left corner at `(x, y)`.
    /// Pixels falling outside this image are dropped.
    pub fn blit(&mut self, other: &PreviewImage, x: u32, y: u32) {
        for oy in 0..other.height {
            for ox in 0..other.width {
                let (tx, ty) = (x + ox, y + oy);
                if tx < self.width && ty < self.height {
                    self.set_pixel(tx, ty, other.get_pixel(ox, oy));
                }
            }
        }
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ImageLoad`] if encoding or writing fails.
    pub fn save_png(&self, path: &Path) -> Result<(), TerrainError> {
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| {
                TerrainError::InvalidRaster(format!(
                    "pixel buffer does not match {}x{}",
                    self.width, self.height
                ))
            })?;
        buffer.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// One pixel per vertex, colored with the vertex color.
pub fn render_color_preview(samples: &ChunkSamples) -> PreviewImage {
    let side = samples.grid.row_len() as u32;
    let mut image = PreviewImage::new(side, side);
    for iy in 0..side {
        for ix in 0..side {
            let [r, g, b] = samples.vertex(ix, iy).color.to_rgb8();
            image.set_pixel(ix, iy, [r, g, b, 255]);
        }
    }
    image
}

/// One pixel per vertex, grayscale between the chunk's min (black) and max
/// (white) height. A flat chunk renders mid-gray.
pub fn render_height_preview(samples: &ChunkSamples) -> PreviewImage {
    let side = samples.grid.row_len() as u32;
    let min = samples.min_height();
    let range = samples.max_height() - min;
    let mut image = PreviewImage::new(side, side);
    for iy in 0..side {
        for ix in 0..side {
            let h = samples.vertex(ix, iy).height;
            let normalized = if range > 0.0 { (h - min) / range } else { 0.5 };
            let v = (normalized.clamp(0.0, 1.0) * 255.0).round() as u8;
            image.set_pixel(ix, iy, [v, v, v, 255]);
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::chunk::ChunkGrid;
    use crate::color::Rgb;

    fn samples(heights: Vec<f64>, colors: Vec<Rgb>) -> ChunkSamples {
        ChunkSamples {
            grid: ChunkGrid::new(DVec2::ZERO, 10.0, 1).unwrap(),
            heights,
            colors,
        }
    }

    #[test]
    fn test_set_get_pixel_roundtrip() {
        let mut image = PreviewImage::new(8, 8);
        image.set_pixel(2, 3, [10, 20, 30, 40]);
        assert_eq!(image.get_pixel(2, 3), [10, 20, 30, 40]);
        assert_eq!(image.pixels.len(), 8 * 8 * 4);
    }

    #[test]
    fn test_color_preview_uses_vertex_colors() {
        let s = samples(
            vec![0.0; 4],
            vec![
                Rgb::from_hex(0xff0000),
                Rgb::from_hex(0x00ff00),
                Rgb::from_hex(0x0000ff),
                Rgb::WHITE,
            ],
        );
        let image = render_color_preview(&s);
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0), [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(0, 1), [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_height_preview_normalizes() {
        let s = samples(vec![10.0, 20.0, 15.0, 10.0], vec![Rgb::default(); 4]);
        let image = render_height_preview(&s);
        assert_eq!(image.get_pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0), [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(0, 1), [128, 128, 128, 255]);
    }

    #[test]
    fn test_flat_height_preview_is_gray() {
        let s = samples(vec![3.0; 4], vec![Rgb::default(); 4]);
        let image = render_height_preview(&s);
        assert_eq!(image.get_pixel(1, 1), [128, 128, 128, 255]);
    }

    #[test]
    fn test_blit_clips() {
        let mut dst = PreviewImage::new(3, 3);
        let mut src = PreviewImage::new(2, 2);
        src.set_pixel(1, 1, [9, 9, 9, 9]);
        dst.blit(&src, 2, 2);
        assert_eq!(dst.get_pixel(2, 2), [0, 0, 0, 0]);
        dst.blit(&src, 1, 1);
        assert_eq!(dst.get_pixel(2, 2), [9, 9, 9, 9]);
    }

    #[test]
    fn test_save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.png");
        let mut image = PreviewImage::new(4, 4);
        image.set_pixel(0, 0, [1, 2, 3, 255]);
        image.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
