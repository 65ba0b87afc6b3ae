// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: live document scanner
//
// Entry point. Initialises logging, loads configuration, opens the video
// source and controller link, and runs the paced scanning loop until the
// source ends, the operator quits, or Ctrl-C arrives.

mod hud;
mod input;
mod meter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use image::RgbImage;
use scanwerk_capture::{
    AnyLink, ControllerLink, NotificationChannel, Scanner, link_from_config, open_with_fallback,
    prepare_frame,
};
use scanwerk_core::config::{CONFIG_ENV, ScannerConfig};
use scanwerk_core::error::Result;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use hud::{Hud, Overlay, PreviewHud, TracingHud};
use input::Command;
use meter::FrameRateMeter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Scanwerk starting");

    match run().await {
        Ok(saved) => {
            info!(saved, "Scanwerk finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Scanwerk stopped on a fatal error");
            ExitCode::FAILURE
        }
    }
}

/// Config file from the first argument, else from `SCANWERK_CONFIG`.
fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV))
        .map(PathBuf::from)
}

async fn run() -> Result<u64> {
    let config = ScannerConfig::load_or_default(config_path().as_deref())?;

    let mut source = open_with_fallback(
        &config.source.primary,
        config.source.fallback.as_deref(),
        config.source.looping,
    )?;

    let mut link = link_from_config(&config.controller)?;
    if !link.reconnect().await {
        warn!(link = %config.controller.link, "controller not reachable; scanning without it for now");
    } else if matches!(link, AnyLink::Serial(_)) {
        // Startup is the one place the settle period is waited out.
        tokio::time::sleep(config.controller.settle()).await;
    }

    let mut huds: Vec<Box<dyn Hud>> = vec![Box::new(TracingHud::new())];
    if config.capture.preview {
        huds.push(Box::new(PreviewHud::new(&config.capture.save_folder)?));
    }

    let mut scanner = Scanner::new(config, NotificationChannel::new(link))?;
    info!(
        folder = %scanner.store().folder().display(),
        dwell_seconds = scanner.config().capture.dwell_seconds,
        threshold = scanner.config().capture.quality_threshold,
        "scanner ready; press 'c' + Enter to capture manually, 'q' + Enter to quit"
    );

    let mut ticker = tokio::time::interval(scanner.config().source.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut commands = input::spawn_reader();
    let mut commands_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut meter = FrameRateMeter::new();
    let mut last_frame: Option<RgbImage> = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupt received");
                break;
            }
            command = commands.recv(), if commands_open => match command {
                Some(Command::Quit) => {
                    info!("quit requested");
                    break;
                }
                Some(Command::Capture) => match &last_frame {
                    Some(frame) => match scanner.capture_manual(frame).await {
                        Ok(Some(path)) => info!(path = %path.display(), "manual capture done"),
                        Ok(None) => info!("no document in view to capture"),
                        Err(err) => error!(error = %err, "manual capture failed"),
                    },
                    None => info!("no frame processed yet"),
                },
                None => commands_open = false,
            },
            _ = ticker.tick() => {
                if source.is_exhausted() {
                    info!(source = %source.describe(), "video source exhausted");
                    break;
                }
                let Some(raw) = source.next_frame() else {
                    debug!("empty frame skipped");
                    continue;
                };

                let frame = prepare_frame(raw, &scanner.config().source);
                let now = Instant::now();
                let report = scanner.process_frame(&frame, now).await;
                if let Some(reason) = &report.save_error {
                    warn!(%reason, "capture not saved; operator attention needed");
                }

                let overlay = Overlay::from_report(&report, meter.tick(now));
                for hud in &mut huds {
                    hud.render(&frame, &report.mask, &overlay, now);
                }
                last_frame = Some(frame);
            }
        }
    }

    scanner.shutdown().await;
    Ok(scanner.saved_count())
}
