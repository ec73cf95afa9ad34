pub mod config;
pub mod controller;
pub mod mapping;
pub mod ui;

use crate::config::Config;
use crate::controller::event_collector::{CollectorError, EventCollector};
use crate::mapping::validate_button_table;
use crate::ui::media::{MediaError, MediaSet};
use crate::ui::overlay::{OverlayError, OverlayFont};
use crate::ui::presenter::Presenter;
use crate::ui::ControllerTestUI;
use color_eyre::Result;
use eframe::egui::{self, Color32};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Fatal startup failures, each with its process exit code.
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("Unable to load media: {0}")]
    Media(#[from] MediaError),

    #[error("Unable to open font: {0}")]
    Font(#[from] OverlayError),

    #[error("Controller error: {0}")]
    Controller(#[from] CollectorError),

    #[error("Window could not be initialized: {0}")]
    Window(#[from] eframe::Error),
}

impl AppError {
    fn exit_code(&self) -> u8 {
        match self {
            AppError::Controller(_) => 2,
            _ => 1,
        }
    }
}

fn main() -> ExitCode {
    let (config, source) = match Config::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            // no subscriber yet
            println!("{e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = setup(&config) {
        println!("Startup failed: {e}");
        return ExitCode::from(1);
    }

    match &source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    match run(config) {
        Ok(()) => {
            info!("Exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn setup(config: &Config) -> Result<()> {
    color_eyre::install()?;
    setup_logging(config.log_level.to_level()?);
    Ok(())
}

fn setup_logging(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn run(config: Config) -> std::result::Result<(), AppError> {
    debug!("Configuration: {:?}", config);

    info!("Loading font and button images");
    let font = OverlayFont::open(&config.assets.font, config.assets.font_size)?;
    let media = MediaSet::decode(&config.assets.images)?;
    validate_button_table(media.len())?;

    info!("Opening controllers");
    let collector = EventCollector::create(&config.assets.mapping_db)?.initialize();
    if collector.mapping_count() == 0 {
        warn!("Mapping database is empty, only built-in mappings are available");
    }

    let (r, g, b) = config.text.color;
    let text_color = Color32::from_rgb(r, g, b);
    let presenter = Presenter::new(config.layout);
    let repaint_interval = Duration::from_millis(config.window.repaint_interval_ms);

    info!("Starting window");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title(config.window.title.clone())
        .with_inner_size([config.window.width, config.window.height])
        .with_resizable(false);

    eframe::run_native(
        &config.window.title,
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(ControllerTestUI::new(
                cc,
                collector,
                media,
                font,
                text_color,
                presenter,
                repaint_interval,
            )))
        }),
    )?;

    // the app, its textures and the gilrs context are dropped by now
    info!("Window closed, textures and gamepad context released");
    Ok(())
}
