//! Raster heightmaps: bilinear sampling of an 8-bit image placed in the world.

use std::path::Path;

use glam::DVec2;
use tracing::debug;

use crate::error::TerrainError;
use crate::height_source::HeightSource;
use crate::value_noise::lerp;

/// Where a raster sits in the world and how tall its brightest pixel is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterPlacement {
    /// World coordinate of the raster's minimum corner.
    pub offset: DVec2,
    /// World size covered by the raster. Both components must be > 0.
    pub extent: DVec2,
    /// Height of a pixel with intensity 255.
    pub height: f64,
}

impl Default for RasterPlacement {
    fn default() -> Self {
        Self {
            offset: DVec2::new(-250.0, -250.0),
            extent: DVec2::new(500.0, 500.0),
            height: 128.0,
        }
    }
}

/// A height source backed by one channel of a decoded 8-bit image.
///
/// The world-to-image mapping flips the horizontal axis: world `x` at
/// `offset.x` reads the rightmost column. The vertical axis is not flipped.
/// Coordinates outside the placement replicate the edge pixels.
#[derive(Clone, Debug)]
pub struct RasterHeightSource {
    width: u32,
    height: u32,
    /// Bytes per pixel; only the first byte of each pixel is read.
    stride: usize,
    pixels: Vec<u8>,
    placement: RasterPlacement,
}

impl RasterHeightSource {
    /// Build from a one-byte-per-pixel grayscale buffer in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidRaster`] on zero dimensions, a buffer
    /// length other than `width * height`, or a non-positive extent.
    pub fn from_luma(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        placement: RasterPlacement,
    ) -> Result<Self, TerrainError> {
        Self::with_stride(width, height, 1, pixels, placement)
    }

    /// Build from a four-byte-per-pixel RGBA buffer; the red channel is read.
    ///
    /// # Errors
    ///
    /// Same as [`from_luma`](Self::from_luma), with an expected length of
    /// `width * height * 4`.
    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        placement: RasterPlacement,
    ) -> Result<Self, TerrainError> {
        Self::with_stride(width, height, 4, pixels, placement)
    }

    /// Build from any decoded image, reading its red (or gray) channel.
    pub fn from_image(
        image: &image::DynamicImage,
        placement: RasterPlacement,
    ) -> Result<Self, TerrainError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw(), placement)
    }

    /// Decode an image file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ImageLoad`] if the file cannot be read or
    /// decoded.
    pub fn open(path: &Path, placement: RasterPlacement) -> Result<Self, TerrainError> {
        let image = image::open(path)?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "decoded heightmap image"
        );
        Self::from_image(&image, placement)
    }

    fn with_stride(
        width: u32,
        height: u32,
        stride: usize,
        pixels: Vec<u8>,
        placement: RasterPlacement,
    ) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::InvalidRaster(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * stride;
        if pixels.len() != expected {
            return Err(TerrainError::InvalidRaster(format!(
                "expected {expected} bytes for {width}x{height} at {stride} bytes/pixel, got {}",
                pixels.len()
            )));
        }
        let extent = placement.extent;
        if !(extent.is_finite() && extent.x > 0.0 && extent.y > 0.0) {
            return Err(TerrainError::InvalidRaster(format!(
                "world extent must be finite and positive, got {extent}"
            )));
        }
        if !(placement.offset.is_finite() && placement.height.is_finite()) {
            return Err(TerrainError::InvalidRaster(
                "world offset and height must be finite".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            stride,
            pixels,
            placement,
        })
    }

    /// Intensity of pixel `(px, py)` normalized to `[0, 1]`. Indices are clamped.
    pub fn pixel(&self, px: u32, py: u32) -> f64 {
        let px = px.min(self.width - 1) as usize;
        let py = py.min(self.height - 1) as usize;
        let idx = (px + self.width as usize * py) * self.stride;
        self.pixels[idx] as f64 / 255.0
    }

    /// Map world `(x, y)` to continuous pixel coordinates.
    fn pixel_coords(&self, x: f64, y: f64) -> (f64, f64) {
        let p = &self.placement;
        let u = 1.0 - ((x - p.offset.x) / p.extent.x).clamp(0.0, 1.0);
        let v = ((y - p.offset.y) / p.extent.y).clamp(0.0, 1.0);
        (u * (self.width - 1) as f64, v * (self.height - 1) as f64)
    }

    /// Bilinearly filtered height at world `(x, y)`.
    pub fn get_height(&self, x: f64, y: f64) -> f64 {
        let (fx, fy) = self.pixel_coords(x, y);
        let max_x = self.width - 1;
        let max_y = self.height - 1;

        let x1 = (fx.floor() as u32).min(max_x);
        let y1 = (fy.floor() as u32).min(max_y);
        let x2 = (x1 + 1).min(max_x);
        let y2 = (y1 + 1).min(max_y);

        let xp = fx - x1 as f64;
        let yp = fy - y1 as f64;

        let p11 = self.pixel(x1, y1);
        let p21 = self.pixel(x2, y1);
        let p12 = self.pixel(x1, y2);
        let p22 = self.pixel(x2, y2);

        let px1 = lerp(xp, p11, p21);
        let px2 = lerp(xp, p12, p22);
        lerp(yp, px1, px2) * self.placement.height
    }

    /// World coordinate that maps exactly onto pixel `(px, py)`.
    pub fn pixel_world_position(&self, px: u32, py: u32) -> DVec2 {
        let p = &self.placement;
        let u = if self.width > 1 { px as f64 / (self.width - 1) as f64 } else { 0.0 };
        let v = if self.height > 1 { py as f64 / (self.height - 1) as f64 } else { 0.0 };
        DVec2::new(
            p.offset.x + (1.0 - u) * p.extent.x,
            p.offset.y + v * p.extent.y,
        )
    }

    /// Returns `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Return the raster's world placement.
    pub fn placement(&self) -> &RasterPlacement {
        &self.placement
    }
}

impl HeightSource for RasterHeightSource {
    fn height(&self, x: f64, y: f64) -> f64 {
        self.get_height(x, y)
    }
}
