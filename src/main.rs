mod app;
mod gpu;

use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use wired_logic::config::Config;
use wired_logic::export;
use wired_logic::simulation::Raster;

use crate::app::App;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    let raster = match &config.load {
        Some(path) => match export::load_raster(path) {
            Ok(raster) => {
                log::info!("Loaded {} ({}x{})", path.display(), raster.width(), raster.height());
                raster
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Raster::new(config.width as usize, config.height as usize),
    };

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, raster);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
    log::info!("All done!");
}
