//! Decoded RGBA8 images.

use std::path::Path;

use tracing::debug;

use crate::{ResourceError, ResourceResult};

/// Tightly packed RGBA8 pixels, row-major from the top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decodes any format the `image` crate supports and converts it to RGBA8.
    pub fn load(path: impl AsRef<Path>) -> ResourceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ResourceError::FileNotFound(path.to_path_buf()));
        }

        let rgba = image::open(path)?.into_rgba8();
        let (width, height) = rgba.dimensions();

        debug!("Loaded image {:?} ({}x{})", path, width, height);

        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// A `size` x `size` black and white checkerboard with square cells of
    /// `cell` pixels. Used when the configured texture is unavailable.
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let pixels = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .flat_map(|(x, y)| {
                let value = if (x / cell + y / cell) % 2 == 0 { 255 } else { 0 };
                [value, value, value, 255]
            })
            .collect();

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}
