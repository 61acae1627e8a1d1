use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use emotion_monitor::app::{MonitorApp, WINDOW_TITLE};
use emotion_monitor::dispatch::http::HttpTransport;
use emotion_monitor::dispatch::{DispatchThrottler, MoodTransport};
use emotion_monitor::emotion::model_fer::FerEmotionModel;
use emotion_monitor::error::StartupError;
use emotion_monitor::face_detection::haar_cascade::HaarCascadeLocator;
use emotion_monitor::frame_loop::{FrameLoop, LogDisplay};
use emotion_monitor::overlay::OverlayRenderer;
use emotion_monitor::pipeline::PipelineContext;
use emotion_monitor::webcam::Webcam;
use emotion_monitor::{Args, MonitorConfig};

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("emotion_monitor=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Args::parse().into_config().context("invalid configuration")?;

    run(config).context("emotion monitor failed to start")?;

    info!("Goodbye!");
    Ok(())
}

/// Loads everything fatal first (models before the camera), then hands the
/// loop to the window or the headless runner.
fn run(config: MonitorConfig) -> Result<(), StartupError> {
    let locator = HaarCascadeLocator::load(&config.cascade_path, config.detector)?;
    let classifier = FerEmotionModel::load(&config.model_path)?;

    let transport = HttpTransport::new(&config.dispatch.server_url, config.dispatch.timeout)?;
    info!("Sending data to {}", transport.endpoint());
    let transport: Box<dyn MoodTransport> = Box::new(transport);
    let throttler = DispatchThrottler::new(
        transport,
        config.dispatch.patient_id.clone(),
        config.dispatch.interval,
    );

    let overlay = OverlayRenderer::load(config.font_path.as_deref());

    let pipeline = PipelineContext::new(
        Box::new(locator),
        Box::new(classifier),
        throttler,
        overlay,
        config.policy,
        config.dispatch.patient_id.clone(),
    );

    let webcam = Webcam::open(&config.camera)?;
    let mut frame_loop = FrameLoop::new(Box::new(webcam), pipeline);

    if config.headless {
        info!("Running headless until the camera stream ends.");
        frame_loop.run(&mut LogDisplay::new(100));
        return Ok(());
    }

    info!("Camera initialized. Press 'q' to quit.");
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |cc| Box::new(MonitorApp::new(cc, frame_loop))),
    )
    .map_err(|e| StartupError::Display(e.to_string()))
}
