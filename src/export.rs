//! Raster snapshots as palette images.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::config::PALETTE;
use crate::simulation::{Point, Raster};

/// Errors from reading or writing raster snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{width}x{height} raster does not fit an image")]
    TooLarge { width: usize, height: usize },
}

/// Paint a raster through the palette
pub fn to_rgba(raster: &Raster) -> Result<RgbaImage, SnapshotError> {
    let too_large = || SnapshotError::TooLarge {
        width: raster.width(),
        height: raster.height(),
    };
    let width = u32::try_from(raster.width()).map_err(|_| too_large())?;
    let height = u32::try_from(raster.height()).map_err(|_| too_large())?;

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let value = raster.get(Point::new(x as usize, y as usize));
        Rgba(PALETTE[usize::from(value)])
    }))
}

/// Read a raster back from an image, matching each pixel to the nearest
/// palette color
pub fn from_rgba(image: &RgbaImage) -> Raster {
    let cells = image.pixels().map(nearest_palette_index).collect();
    Raster::from_cells(image.width() as usize, image.height() as usize, cells)
}

/// Write the raster as a GIF
pub fn save_gif<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<(), SnapshotError> {
    let image = to_rgba(raster)?;
    image.save_with_format(path.as_ref(), ImageFormat::Gif)?;
    log::debug!(
        "Wrote {}x{} raster to {}",
        raster.width(),
        raster.height(),
        path.as_ref().display()
    );
    Ok(())
}

/// Load a raster from any supported image file
pub fn load_raster<P: AsRef<Path>>(path: P) -> Result<Raster, SnapshotError> {
    let image = image::open(path.as_ref())?.to_rgba8();
    let raster = from_rgba(&image);
    log::debug!(
        "Loaded {}x{} raster from {}",
        raster.width(),
        raster.height(),
        path.as_ref().display()
    );
    Ok(raster)
}

fn nearest_palette_index(pixel: &Rgba<u8>) -> u8 {
    let distance = |color: &[u8; 4]| -> u32 {
        (0..3)
            .map(|channel| {
                let delta = i32::from(pixel[channel]) - i32::from(color[channel]);
                (delta * delta) as u32
            })
            .sum()
    };
    // min_by_key keeps the first of equal minima, so ties go to the lower value
    PALETTE
        .iter()
        .enumerate()
        .min_by_key(|&(_, color)| distance(color))
        .map_or(0, |(index, _)| index as u8)
}
