use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use emotion_bridge::classifier::{ClassifierConfig, OnnxEmotionClassifier};
use emotion_bridge::config::Config;
use emotion_bridge::engine::run_engine;
use emotion_bridge::frame::frame_queue;
use emotion_bridge::server::{run_server, ServerConfig};
use emotion_bridge::state::SharedState;

/// Headless bridge turning camera frames into a stable emotion signal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the emotion ONNX model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// WebSocket server port
    #[arg(short, long, default_value = "8765")]
    port: u16,

    /// Frames averaged into the resting-face baseline
    #[arg(long, default_value = "20")]
    calibration_frames: usize,

    /// Confidence below which a frame resolves to neutral (0.0 - 1.0)
    #[arg(long, default_value = "0.4")]
    threshold: f32,

    /// Sustained evidence (ms) required before the output label changes
    #[arg(long, default_value = "500")]
    hold_ms: u64,

    /// Number of threads for classifier inference
    #[arg(long, default_value = "1")]
    threads: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Assemble config from defaults + CLI overrides
    let mut config = Config::default();
    config.port = args.port;
    config.calibration_frames = args.calibration_frames;
    config.confidence_threshold = args.threshold;
    config.commit_hold_ms = args.hold_ms;
    config.classifier_threads = args.threads;
    config.model_path = args.model.clone();

    let model_path = config.get_model_path()?;

    let session_id = Uuid::new_v4();
    info!("Emotion bridge starting (session {})", session_id);
    info!("Model: {:?}", model_path);
    info!("Port: {}", config.port);

    if !model_path.exists() {
        error!("Model file not found: {:?}", model_path);
        eprintln!("\nModel file not found: {:?}", model_path);
        eprintln!("\nPlace an emotion classification ONNX model at the expected location,");
        eprintln!("or specify a custom path with: --model /path/to/emotion.onnx");
        return Ok(());
    }

    // Build the classifier; warmup happens on the engine thread so a broken
    // model surfaces through the session status
    let classifier = OnnxEmotionClassifier::new(ClassifierConfig {
        model_path,
        n_threads: config.classifier_threads,
        ..Default::default()
    })?;

    // Shared snapshot + intake queue
    let state = SharedState::new();
    let (frames, frame_rx) = frame_queue();
    let stop_flag = Arc::new(AtomicBool::new(false));
    let started = Instant::now();

    // Spawn the engine thread
    let engine_config = config.engine_config();
    let engine_state = state.clone();
    let engine_stop = stop_flag.clone();
    let engine_handle = std::thread::spawn(move || {
        run_engine(
            frame_rx,
            Box::new(classifier),
            engine_config,
            engine_state,
            engine_stop,
        );
    });

    // Run the transport until Ctrl+C
    let server_config = ServerConfig {
        port: config.port,
        publish_interval_ms: config.publish_interval_ms,
    };

    tokio::select! {
        result = run_server(server_config, state.clone(), frames.clone(), session_id, started) => {
            if let Err(e) = result {
                error!("Transport failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping...");
        }
    }

    // Stop the engine and wait for it
    stop_flag.store(true, Ordering::SeqCst);
    let _ = engine_handle.join();

    let snapshot = state.snapshot();
    println!("\n--- Session Summary ---");
    println!("Session: {}", session_id);
    println!("Final emotion: {}", snapshot.emotion.as_str());
    println!("Final inner state: {:.2}", snapshot.inner_state);

    if frames.dropped() > 0 {
        warn!("Frames dropped at intake: {}", frames.dropped());
    }

    info!("Session complete");
    Ok(())
}
