use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Highest cell value: the last decay step before a wire returns to quiescent
pub const MAX_CHARGE: u8 = 7;

/// Number of palette entries, one per cell value
pub const PALETTE_SIZE: usize = MAX_CHARGE as usize + 1;

// ============================================
// Sandbox defaults
// ============================================

/// Simulation steps per second
pub const DEFAULT_SPEED: u32 = 15;

/// Screen pixels per grid cell
pub const DEFAULT_SCALE: u32 = 12;

/// Grid dimensions for a blank raster
pub const DEFAULT_WIDTH: u32 = 64;
pub const DEFAULT_HEIGHT: u32 = 64;

/// Where the F key writes the current raster
pub const DEFAULT_EXPORT_PATH: &str = "circuit.gif";

// ============================================
// Palette
// ============================================

/// sRGBA color for each cell value.
/// 0 = background, 1 = quiescent conductor, 2 = pulse peak, 3..=7 = decay ramp.
pub const PALETTE: [[u8; 4]; PALETTE_SIZE] = [
    [0x00, 0x00, 0x00, 0xFF],
    [0x88, 0x00, 0x00, 0xFF],
    [0xFF, 0x00, 0x00, 0xFF],
    [0xFF, 0x22, 0x00, 0xFF],
    [0xFF, 0x44, 0x00, 0xFF],
    [0xFF, 0x66, 0x00, 0xFF],
    [0xFF, 0x88, 0x00, 0xFF],
    [0xFF, 0xAA, 0x00, 0xFF],
];

/// Cursor overlay, blended over the cell under the cursor
pub const CURSOR_COLOR: [u8; 4] = [0x80, 0x80, 0x80, 0x80];

/// Command line for the sandbox
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wired-logic",
    version,
    about = "Pixel-art digital logic sandbox",
    long_about = None,
)]
pub struct Config {
    /// Simulation steps per second
    #[arg(
        long,
        default_value_t = DEFAULT_SPEED,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub speed: u32,

    /// Screen pixels per grid cell
    #[arg(
        long,
        default_value_t = DEFAULT_SCALE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub scale: u32,

    /// Grid width in cells (ignored with --load)
    #[arg(
        long,
        default_value_t = DEFAULT_WIDTH,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub width: u32,

    /// Grid height in cells (ignored with --load)
    #[arg(
        long,
        default_value_t = DEFAULT_HEIGHT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub height: u32,

    /// Start from this image instead of a blank raster
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// GIF file written by the export key
    #[arg(long, default_value = DEFAULT_EXPORT_PATH)]
    pub export: PathBuf,
}

impl Config {
    /// Time between two simulation steps
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.speed))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            scale: DEFAULT_SCALE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            load: None,
            export: PathBuf::from(DEFAULT_EXPORT_PATH),
        }
    }
}
