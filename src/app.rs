use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use wired_logic::config::Config;
use wired_logic::export;
use wired_logic::simulation::{Point, Raster, Simulation};

use crate::gpu::{CellBuffers, GpuContext, RenderPipeline};

/// Editable raster and the simulation built from it.
///
/// Every edit rebuilds the simulation from scratch; charges already painted
/// on the raster carry over into the rebuilt circuit.
pub struct Sandbox {
    raster: Raster,
    simulation: Simulation,
    cursor: Point,
    paused: bool,
}

impl Sandbox {
    pub fn new(raster: Raster) -> Self {
        let simulation = Simulation::new(&raster);
        let cursor = Point::new(raster.width() / 2, raster.height() / 2);
        let mut sandbox = Self {
            raster,
            simulation,
            cursor,
            paused: false,
        };
        sandbox.simulation.draw(&mut sandbox.raster);
        sandbox
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Step once and repaint the wires that changed
    pub fn advance(&mut self) {
        let next = self.simulation.step();
        next.draw_changes(&self.simulation, &mut self.raster);
        self.simulation = next;
    }

    /// Step unless paused
    pub fn tick(&mut self) {
        if !self.paused {
            self.advance();
        }
    }

    /// Flip the cell under the cursor and rebuild
    pub fn toggle_cursor(&mut self) {
        if self.raster.contains(self.cursor) {
            self.raster.toggle(self.cursor);
            self.reload();
        }
    }

    /// Returns whether the cursor landed on a different cell
    pub fn set_cursor(&mut self, point: Point) -> bool {
        if !self.raster.contains(point) || point == self.cursor {
            return false;
        }
        self.cursor = point;
        true
    }

    /// Move the cursor by one step, stopping at the raster edge
    pub fn move_cursor(&mut self, dx: isize, dy: isize) -> bool {
        let x = self
            .cursor
            .x
            .saturating_add_signed(dx)
            .min(self.raster.width().saturating_sub(1));
        let y = self
            .cursor
            .y
            .saturating_add_signed(dy)
            .min(self.raster.height().saturating_sub(1));
        self.set_cursor(Point::new(x, y))
    }

    /// Pausing and resuming both power the circuit down and rebuild it
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.raster.power_down();
        self.reload();
        self.paused
    }

    fn reload(&mut self) {
        self.simulation = Simulation::new(&self.raster);
        self.simulation.draw(&mut self.raster);
        log::debug!(
            "Rebuilt circuit: {} wires, {} adjacencies",
            self.simulation.circuit().len(),
            self.simulation.circuit().adjacency_count()
        );
    }
}

/// Grid cell under a window position, if any
fn cell_at(
    position: PhysicalPosition<f64>,
    size: PhysicalSize<u32>,
    raster: &Raster,
) -> Option<Point> {
    if size.width == 0 || size.height == 0 || position.x < 0.0 || position.y < 0.0 {
        return None;
    }
    let x = position.x / f64::from(size.width) * raster.width() as f64;
    let y = position.y / f64::from(size.height) * raster.height() as f64;
    let point = Point::new(x as usize, y as usize);
    raster.contains(point).then_some(point)
}

/// Window size for a raster at `scale` screen pixels per cell, saturating
/// instead of overflowing for huge grids
fn window_size(raster: &Raster, scale: u32) -> LogicalSize<u32> {
    let side = |cells: usize| u32::try_from(cells).unwrap_or(u32::MAX).saturating_mul(scale);
    LogicalSize::new(side(raster.width()), side(raster.height()))
}

/// Application state
pub struct App {
    config: Config,
    sandbox: Sandbox,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    cell_buffers: Option<CellBuffers>,
    render_pipeline: Option<RenderPipeline>,
    bind_group: Option<wgpu::BindGroup>,
    /// Left mouse button held: entering a new cell toggles it
    drawing: bool,
    last_step: Instant,
    step_interval: Duration,
    fps_counter: FpsCounter,
}

impl App {
    pub fn new(config: Config, raster: Raster) -> Self {
        let step_interval = config.step_interval();
        Self {
            config,
            sandbox: Sandbox::new(raster),
            window: None,
            gpu: None,
            cell_buffers: None,
            render_pipeline: None,
            bind_group: None,
            drawing: false,
            last_step: Instant::now(),
            step_interval,
            fps_counter: FpsCounter::new(),
        }
    }

    fn render(&mut self) {
        if self.last_step.elapsed() >= self.step_interval {
            self.sandbox.tick();
            self.last_step = Instant::now();
        }

        let (Some(gpu), Some(buffers), Some(render), Some(bind_group)) = (
            self.gpu.as_ref(),
            self.cell_buffers.as_mut(),
            self.render_pipeline.as_ref(),
            self.bind_group.as_ref(),
        ) else {
            return;
        };

        buffers.upload_cells(&gpu.queue, self.sandbox.raster());
        buffers.update_params(&gpu.queue, Some(self.sandbox.cursor()), gpu.is_srgb());

        // Get surface texture
        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        render.draw(&mut encoder, &view, bind_group);
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(fps) = self.fps_counter.tick() {
            if let Some(window) = &self.window {
                let simulation = self.sandbox.simulation();
                let state = if self.sandbox.is_paused() { " [paused]" } else { "" };
                window.set_title(&format!(
                    "Wired Logic - {:.0} FPS - {} wires - generation {}{}",
                    fps,
                    simulation.circuit().len(),
                    simulation.generation(),
                    state
                ));
            }
        }
    }

    fn handle_key(&mut self, key_code: KeyCode, repeat: bool) {
        match key_code {
            // Draw / erase the cell under the cursor
            KeyCode::Space if !repeat => self.sandbox.toggle_cursor(),

            // Pause or resume; both reset every pulse
            KeyCode::KeyP if !repeat => {
                let paused = self.sandbox.toggle_pause();
                log::info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }

            // Single step while paused
            KeyCode::KeyN if !repeat => {
                if self.sandbox.is_paused() {
                    self.sandbox.advance();
                    log::info!("Stepped to generation {}", self.sandbox.simulation().generation());
                }
            }

            // Export the raster
            KeyCode::KeyF if !repeat => {
                let path = &self.config.export;
                match export::save_gif(self.sandbox.raster(), path) {
                    Ok(()) => log::info!("Saved raster to {}", path.display()),
                    Err(e) => log::error!("Failed to save {}: {}", path.display(), e),
                }
            }

            // Move the cursor (WASD)
            KeyCode::KeyW | KeyCode::ArrowUp => self.move_cursor(0, -1),
            KeyCode::KeyS | KeyCode::ArrowDown => self.move_cursor(0, 1),
            KeyCode::KeyA | KeyCode::ArrowLeft => self.move_cursor(-1, 0),
            KeyCode::KeyD | KeyCode::ArrowRight => self.move_cursor(1, 0),

            _ => {}
        }
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        if self.sandbox.move_cursor(dx, dy) && self.drawing {
            self.sandbox.toggle_cursor();
        }
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let Some(window) = &self.window else {
            return;
        };
        let Some(cell) = cell_at(position, window.inner_size(), self.sandbox.raster()) else {
            return;
        };
        if self.sandbox.set_cursor(cell) && self.drawing {
            self.sandbox.toggle_cursor();
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed if !self.drawing => {
                self.sandbox.toggle_cursor();
                self.drawing = true;
            }
            ElementState::Pressed => {}
            ElementState::Released => self.drawing = false,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let raster = self.sandbox.raster();
        log::info!("Initializing Wired Logic sandbox...");
        log::info!("Grid size: {}x{}", raster.width(), raster.height());

        let window_attrs = Window::default_attributes()
            .with_title("Wired Logic - Initializing...")
            .with_inner_size(window_size(raster, self.config.scale));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()));

        log::info!("Creating cell buffers...");
        let cell_buffers = CellBuffers::new(&gpu.device, &gpu.queue, raster);

        log::info!("Creating render pipeline...");
        let render_pipeline = RenderPipeline::new(&gpu.device, gpu.format());
        let bind_group = render_pipeline.create_bind_group(
            &gpu.device,
            &cell_buffers.cells_buffer,
            &cell_buffers.params_buffer,
        );

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Mouse: Move cursor, click or drag to draw/erase");
        log::info!("  WASD/Arrows: Move cursor");
        log::info!("  Space: Draw/erase cell under cursor");
        log::info!("  P: Pause/resume (resets all pulses)");
        log::info!("  N: Single step while paused");
        log::info!("  F: Save raster to {}", self.config.export.display());
        log::info!("  Escape: Quit");

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.cell_buffers = Some(cell_buffers);
        self.render_pipeline = Some(render_pipeline);
        self.bind_group = Some(bind_group);
        self.last_step = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code, event.repeat);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor_moved(position),
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(state, button)
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    gpu.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                // Request another frame immediately
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox_with(rows: &[&[u8]]) -> Sandbox {
        Sandbox::new(Raster::from_rows(rows))
    }

    #[test]
    fn test_cursor_starts_centered() {
        let sandbox = Sandbox::new(Raster::new(8, 6));
        assert_eq!(sandbox.cursor(), Point::new(4, 3));
        assert!(!sandbox.is_paused());
    }

    #[test]
    fn test_toggle_rebuilds_circuit() {
        let mut sandbox = sandbox_with(&[&[1, 0, 1]]);
        assert_eq!(sandbox.simulation().circuit().len(), 2);

        sandbox.set_cursor(Point::new(1, 0));
        sandbox.toggle_cursor();
        assert_eq!(sandbox.simulation().circuit().len(), 1);
        assert_eq!(sandbox.simulation().generation(), 0);

        sandbox.toggle_cursor();
        assert_eq!(sandbox.simulation().circuit().len(), 2);
    }

    #[test]
    fn test_edit_keeps_painted_charge() {
        let mut sandbox = sandbox_with(&[&[2, 0, 0], &[0, 1, 0]]);
        sandbox.advance();
        assert_eq!(sandbox.raster().cells(), &[3, 0, 0, 0, 2, 0]);

        // Extending the pulsing wire merges it with its highest charge
        sandbox.set_cursor(Point::new(2, 1));
        sandbox.toggle_cursor();
        assert_eq!(sandbox.raster().cells(), &[3, 0, 0, 0, 2, 2]);
    }

    #[test]
    fn test_pause_powers_down_and_stops_ticks() {
        let mut sandbox = sandbox_with(&[&[2, 0], &[0, 1]]);
        assert!(sandbox.toggle_pause());
        assert_eq!(sandbox.raster().cells(), &[1, 0, 0, 1]);

        sandbox.tick();
        assert_eq!(sandbox.simulation().generation(), 0);

        sandbox.advance();
        assert_eq!(sandbox.simulation().generation(), 1);

        assert!(!sandbox.toggle_pause());
        sandbox.tick();
        assert_eq!(sandbox.simulation().generation(), 1);
    }

    #[test]
    fn test_move_cursor_clamps_to_raster() {
        let mut sandbox = Sandbox::new(Raster::new(3, 3));
        assert!(sandbox.move_cursor(-1, -1));
        assert_eq!(sandbox.cursor(), Point::new(0, 0));
        assert!(!sandbox.move_cursor(-1, 0));
        assert!(sandbox.move_cursor(5, 5));
        assert_eq!(sandbox.cursor(), Point::new(2, 2));
    }

    #[test]
    fn test_set_cursor_outside_raster_is_ignored() {
        let mut sandbox = Sandbox::new(Raster::new(3, 3));
        assert!(!sandbox.set_cursor(Point::new(3, 0)));
        assert_eq!(sandbox.cursor(), Point::new(1, 1));
    }

    #[test]
    fn test_window_size_scales_grid() {
        let size = window_size(&Raster::new(64, 32), 12);
        assert_eq!((size.width, size.height), (768, 384));
    }

    #[test]
    fn test_window_size_saturates() {
        let size = window_size(&Raster::new(70_000, 2), 70_000);
        assert_eq!((size.width, size.height), (u32::MAX, 140_000));
    }

    #[test]
    fn test_cell_at_scales_window_to_grid() {
        let raster = Raster::new(64, 32);
        let size = PhysicalSize::new(640, 320);
        assert_eq!(
            cell_at(PhysicalPosition::new(15.0, 25.0), size, &raster),
            Some(Point::new(1, 2))
        );
        assert_eq!(
            cell_at(PhysicalPosition::new(639.9, 319.9), size, &raster),
            Some(Point::new(63, 31))
        );
        assert_eq!(cell_at(PhysicalPosition::new(-1.0, 5.0), size, &raster), None);
        assert_eq!(cell_at(PhysicalPosition::new(640.0, 5.0), size, &raster), None);
        assert_eq!(
            cell_at(PhysicalPosition::new(1.0, 1.0), PhysicalSize::new(0, 0), &raster),
            None
        );
    }
}
