// src/main.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{info, warn};

use recall_node::answer::{AnswerClient, GeminiClient, Unconfigured};
use recall_node::api::{ApiState, start_api_server};
use recall_node::codecs::JpegCodec;
use recall_node::config::{self, Config};
use recall_node::core::lock::lock_mutex;
use recall_node::core::VisualMemory;
use recall_node::producers::PatternProvider;

const STATUS_INTERVAL: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // ------------------------------------------------------------
    // Config
    // ------------------------------------------------------------
    let cfg_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".into());
    let cfg: Config = if std::path::Path::new(&cfg_path).exists() {
        let cfg = config::load(&cfg_path)?;
        info!("[recall] loaded {}", cfg_path);
        cfg
    } else {
        warn!("[recall] {} not found, using defaults", cfg_path);
        Config::default()
    };

    // ------------------------------------------------------------
    // Graceful shutdown
    // ------------------------------------------------------------
    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || {
            info!("[recall] shutdown requested");
            r.store(false, Ordering::SeqCst);
        })?;
    }

    // ------------------------------------------------------------
    // Memory session
    // ------------------------------------------------------------
    let provider = Arc::new(PatternProvider::from_config(&cfg.camera));
    let codec = Box::new(JpegCodec::new(cfg.camera.jpeg_quality));
    let memory = Arc::new(Mutex::new(VisualMemory::new(
        &cfg.memory,
        provider,
        codec,
        cfg.camera.facing,
    )));

    let answer: Arc<dyn AnswerClient> = match GeminiClient::from_config(&cfg.answer) {
        Ok(client) => {
            info!("[recall] answering via {}", client.url());
            Arc::new(client)
        }
        Err(err) => {
            warn!("[recall] {}; questions will not be answered", err);
            Arc::new(Unconfigured {
                var: cfg.answer.api_key_env.clone(),
            })
        }
    };

    if cfg.api.enabled {
        let state = Arc::new(ApiState {
            memory: memory.clone(),
            answer,
        });
        let _api = start_api_server(&cfg.api.bind, state)?;
    }

    if let Err(err) = lock_mutex(&memory, "main::start").start() {
        warn!("[recall] could not start recording: {}", err);
    }

    // ------------------------------------------------------------
    // Main loop
    // ------------------------------------------------------------
    info!("[recall] running – Ctrl+C to stop");
    let mut last_status = Instant::now();

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(200));

        if last_status.elapsed() >= STATUS_INTERVAL {
            let status = lock_mutex(&memory, "main::status").status();
            info!(
                "[recall] state={:?} mode={} frames={}/{} usage={}% unavailable={}",
                status.state,
                status.mode,
                status.frames,
                status.capacity,
                status.usage_percent,
                status.scheduler.unavailable
            );
            last_status = Instant::now();
        }
    }

    // ------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------
    info!("[recall] shutting down…");
    lock_mutex(&memory, "main::teardown").teardown();
    info!("[recall] shutdown complete");

    Ok(())
}
