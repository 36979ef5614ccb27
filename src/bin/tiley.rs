use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use clap::Parser;
use tiley::actor::broadcast::BroadcastReceiver;
use tiley::common::config::{Config, config_file};
use tiley::common::log;
use tiley::layout_engine::{LayoutEngine, LayoutEvent};
use tiley::sys::geometry::Rect;
use tiley::sys::headless::HeadlessHost;
use tracing::{debug, info};

/// Replays a recorded event stream against the layout engine and prints the
/// resulting trees and window frames.
#[derive(Parser)]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check the configuration (and the scenario, if given) and exit.
    #[arg(long)]
    validate: bool,

    /// RON file holding a list of layout events.
    #[arg(long, value_name = "PATH", required_unless_present = "validate")]
    scenario: Option<PathBuf>,

    /// Size of the output every workspace is bound to.
    #[arg(long, value_name = "WxH", default_value = "1920x1080", value_parser = parse_output)]
    output: Rect,

    /// Print broadcast events as JSON lines while replaying.
    #[arg(long)]
    events: bool,
}

fn parse_output(s: &str) -> Result<Rect, String> {
    let (w, h) = s.split_once('x').ok_or_else(|| format!("expected WxH, got `{s}`"))?;
    let width = w.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<i32>().map_err(|e| e.to_string())?;
    if width <= 0 || height <= 0 {
        return Err(format!("output must be positive, got {width}x{height}"));
    }
    Ok(Rect::new(0, 0, width, height))
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();

    if let Err(e) = run(opt) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(opt: Cli) -> anyhow::Result<()> {
    let config_path = opt.config.unwrap_or_else(config_file);
    let config = if config_path.exists() {
        Config::read(&config_path)?
    } else {
        debug!(path = %config_path.display(), "no config file, using defaults");
        Config::default()
    };

    let issues = config.validate();
    if opt.validate {
        if let Some(scenario) = &opt.scenario {
            let events = read_scenario(scenario)?;
            println!("Scenario parsed: {} event(s)", events.len());
        }
        if issues.is_empty() {
            println!("Config validation passed");
            return Ok(());
        }
        for issue in &issues {
            eprintln!("{issue}");
        }
        bail!("{} configuration issue(s)", issues.len());
    }
    if !issues.is_empty() {
        bail!("invalid configuration: {}", issues.join("; "));
    }

    let Some(scenario) = opt.scenario else {
        bail!("no scenario given");
    };
    let events = read_scenario(&scenario)?;

    let (broadcast_tx, mut broadcast_rx) = tiley::actor::channel();
    let mut engine = LayoutEngine::new(&config, Some(broadcast_tx));
    let mut host = HeadlessHost::with_output(opt.output);

    info!(events = events.len(), "replaying scenario");
    for event in events {
        match &event {
            LayoutEvent::WindowCreated(window) => host.map_window(*window),
            LayoutEvent::PointerMoved(point) => host.move_pointer(*point),
            _ => {}
        }
        let destroyed = match &event {
            LayoutEvent::WindowDestroyed(window) => Some(*window),
            _ => None,
        };
        let response = engine.handle_event(event, &mut host);
        debug!(?response);
        if let Some(window) = destroyed {
            host.destroy_window(window);
        }
        print_broadcasts(&mut broadcast_rx, opt.events)?;
    }

    print_state(&engine, &host);
    Ok(())
}

fn read_scenario(path: &Path) -> anyhow::Result<Vec<LayoutEvent>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_broadcasts(rx: &mut BroadcastReceiver, print: bool) -> anyhow::Result<()> {
    for event in tiley::actor::drain(rx) {
        if print {
            println!("{}", event.to_json()?);
        }
    }
    Ok(())
}

fn print_state(engine: &LayoutEngine, host: &HeadlessHost) {
    for workspace in 0..engine.workspace_count() {
        let Some(layout) = engine.layout(workspace) else {
            continue;
        };
        let windows = layout.windows();
        if windows.is_empty() && workspace != engine.current_workspace() {
            continue;
        }
        let name = engine.workspace_name(workspace).unwrap_or_default();
        let marker = if workspace == engine.current_workspace() { " *" } else { "" };
        println!("workspace {name}{marker}");
        if let Some(tree) = engine.draw_tree(workspace) {
            for line in tree.lines() {
                println!("  {line}");
            }
        }
        for window in windows {
            match host.frame(window) {
                Some(frame) => println!(
                    "  {window}: {}x{} at ({}, {})",
                    frame.width, frame.height, frame.x, frame.y
                ),
                None => println!("  {window}: no frame"),
            }
        }
    }
}
