//! # ASX Headless
//!
//! Boots an OS document without a window, drives a fixed number of
//! simulated frames, then prints the HUD and the frame summary.
//!
//! ```bash
//! # bundled demo, default config
//! asx-headless
//!
//! # custom config; the OS document comes from [boot].os_path
//! asx-headless asx.toml --frames 600 --route /space
//!
//! RUST_LOG=asx=debug asx-headless
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use asx::{demo, AsxConfig, AsxResult, AsxRuntime, FrameDriver, OsDocument};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Frames run when `--frames` is absent.
const DEFAULT_FRAMES: u64 = 300;

/// Simulated frame step (60 FPS).
const FRAME_STEP_MS: f64 = 1000.0 / 60.0;

struct Args {
    config: Option<PathBuf>,
    frames: u64,
    route: Option<String>,
    clicks: Vec<usize>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        frames: DEFAULT_FRAMES,
        route: None,
        clicks: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--frames" => {
                let value = it.next().ok_or("--frames needs a value")?;
                args.frames = value.parse().map_err(|_| format!("invalid frame count: {value}"))?;
            }
            "--route" => args.route = Some(it.next().ok_or("--route needs a value")?),
            "--click" => {
                let value = it.next().ok_or("--click needs a value")?;
                args.clicks.push(value.parse().map_err(|_| format!("invalid click index: {value}"))?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            path => args.config = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_document(config: &AsxConfig) -> AsxResult<OsDocument> {
    let path = &config.boot.os_path;
    if path.exists() {
        info!(path = %path.display(), "loading OS document");
        OsDocument::load(path)
    } else {
        warn!(path = %path.display(), "OS document not found, using the bundled demo");
        demo::document()
    }
}

fn run(args: &Args) -> AsxResult<()> {
    let config = match &args.config {
        Some(path) => AsxConfig::load(path)?,
        None => AsxConfig::default(),
    };
    init_tracing(&config.log.filter);

    let os = load_document(&config)?;
    let title = os.meta.title.clone().unwrap_or_else(|| "ASX".to_string());
    let mut runtime = AsxRuntime::new(config, os, demo::behaviours())?;

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    {title} - HEADLESS MODE");
    println!("═══════════════════════════════════════════════════════════════════");

    // A failed boot leaves the error view on screen; keep running.
    if let Err(err) = runtime.boot() {
        error!(error = %err, "boot failed");
    }
    if let Some(route) = &args.route {
        if let Err(err) = runtime.navigate(route) {
            error!(route = %route, error = %err, "navigation failed");
        }
    }
    for &index in &args.clicks {
        match runtime.hud().clickable().get(index).copied() {
            Some(node) => {
                let handled = runtime.click(node);
                info!(index, handled, "click dispatched");
            }
            None => warn!(index, "no clickable node at index"),
        }
    }

    let driver = FrameDriver::new();
    let frames = driver.run(&mut runtime, args.frames, 0.0, FRAME_STEP_MS);

    println!();
    println!("Page:      {}", runtime.current_page().unwrap_or("-"));
    println!("Frames:    {frames}");
    println!("Entities:  {}", runtime.world().entity_count());
    if let Some(output) = runtime.last_output() {
        println!("Instances: {}", output.instances.len());
    }
    println!();
    println!("{}", runtime.hud().to_html());
    println!();
    println!("{}", runtime.stats().summary());
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("asx-headless: {message}");
            eprintln!("usage: asx-headless [config.toml] [--frames N] [--route PATH] [--click INDEX]...");
            return ExitCode::from(2);
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("asx-headless: {err}");
            ExitCode::FAILURE
        }
    }
}
