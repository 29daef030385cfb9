use wgpu::{Buffer, BufferUsages, Device, Queue};
use wired_logic::config::{CURSOR_COLOR, PALETTE, PALETTE_SIZE};
use wired_logic::simulation::{Point, Raster};

/// Marks "no cursor" in `RenderParams`
const NO_CURSOR: u32 = u32::MAX;

/// Storage buffer of cell values plus the uniform the render shader reads
pub struct CellBuffers {
    /// One u32 per cell, row-major
    pub cells_buffer: Buffer,
    /// Uniform buffer for render parameters
    pub params_buffer: Buffer,
    /// Staging copy of the raster widened to u32
    staging: Vec<u32>,
    /// Grid dimensions
    pub width: u32,
    pub height: u32,
}

/// Render parameters passed to the fragment shader (160 bytes, aligned to 16)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderParams {
    // Grid info (16 bytes)
    pub grid_width: u32,
    pub grid_height: u32,
    pub cursor_x: u32, // NO_CURSOR when hidden
    pub cursor_y: u32,

    // Cursor tint, alpha is the blend factor (16 bytes)
    pub cursor_color: [f32; 4],

    // One color per cell value (128 bytes)
    pub palette: [[f32; 4]; PALETTE_SIZE],
}

impl RenderParams {
    /// Build the uniform for a grid, converting the sRGB palette to linear
    /// when the surface will re-encode it
    pub fn new(width: u32, height: u32, cursor: Option<Point>, linear: bool) -> Self {
        let (cursor_x, cursor_y) = cursor
            .map_or((NO_CURSOR, NO_CURSOR), |p| (p.x as u32, p.y as u32));
        let mut palette = [[0.0; 4]; PALETTE_SIZE];
        for (slot, color) in palette.iter_mut().zip(PALETTE.iter()) {
            *slot = to_float_color(*color, linear);
        }
        Self {
            grid_width: width,
            grid_height: height,
            cursor_x,
            cursor_y,
            cursor_color: to_float_color(CURSOR_COLOR, linear),
            palette,
        }
    }
}

impl CellBuffers {
    /// Allocate buffers for a raster and upload its cells
    pub fn new(device: &Device, queue: &Queue, raster: &Raster) -> Self {
        let width = raster.width() as u32;
        let height = raster.height() as u32;
        let cell_count = raster.cells().len().max(1);

        let cells_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cells-buffer"),
            size: (cell_count * std::mem::size_of::<u32>()) as u64,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("render-params-buffer"),
            size: std::mem::size_of::<RenderParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut buffers = Self {
            cells_buffer,
            params_buffer,
            staging: Vec::with_capacity(cell_count),
            width,
            height,
        };
        buffers.upload_cells(queue, raster);
        buffers
    }

    /// Copy the raster to the GPU
    pub fn upload_cells(&mut self, queue: &Queue, raster: &Raster) {
        assert_eq!(
            (raster.width() as u32, raster.height() as u32),
            (self.width, self.height),
            "Raster size changed"
        );
        self.staging.clear();
        self.staging.extend(raster.cells().iter().map(|&cell| u32::from(cell)));
        if !self.staging.is_empty() {
            queue.write_buffer(&self.cells_buffer, 0, bytemuck::cast_slice(&self.staging));
        }
    }

    /// Update the cursor position and palette encoding
    pub fn update_params(&self, queue: &Queue, cursor: Option<Point>, linear: bool) {
        let params = RenderParams::new(self.width, self.height, cursor, linear);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }
}

fn to_float_color(color: [u8; 4], linear: bool) -> [f32; 4] {
    let channel = |value: u8| {
        let encoded = f32::from(value) / 255.0;
        if linear {
            srgb_to_linear(encoded)
        } else {
            encoded
        }
    };
    [
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        f32::from(color[3]) / 255.0,
    ]
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_size() {
        // Must match the WGSL struct: 2 x vec4<u32|f32> + 8 palette vec4s
        assert_eq!(std::mem::size_of::<RenderParams>(), 160);
        assert_eq!(std::mem::size_of::<RenderParams>() % 16, 0);
    }

    #[test]
    fn test_hidden_cursor() {
        let params = RenderParams::new(8, 8, None, false);
        assert_eq!(params.cursor_x, NO_CURSOR);
        assert_eq!(params.cursor_y, NO_CURSOR);

        let params = RenderParams::new(8, 8, Some(Point::new(3, 5)), false);
        assert_eq!((params.cursor_x, params.cursor_y), (3, 5));
    }

    #[test]
    fn test_palette_encoding() {
        let encoded = RenderParams::new(1, 1, None, false);
        let linear = RenderParams::new(1, 1, None, true);
        // Black and full red are fixed points of the transfer function
        assert_eq!(encoded.palette[0], [0.0, 0.0, 0.0, 1.0]);
        assert!((linear.palette[2][0] - 1.0).abs() < 1e-6);
        assert_eq!(linear.palette[2][1], 0.0);
        // Mid tones get darker in linear space
        assert!(linear.palette[1][0] < encoded.palette[1][0]);
        assert_eq!(linear.palette[1][3], 1.0);
    }
}
