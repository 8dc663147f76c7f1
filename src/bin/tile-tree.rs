use std::path::PathBuf;
use std::process;

use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use strum::VariantNames;
use tile_tree::common::config::{Config, config_file};
use tile_tree::common::log;
use tile_tree::layout_engine::{
    LayoutCommand, LayoutEngine, LayoutEvent, LayoutMode, MemoryHost, ScreenId, SplitMode,
};
use tile_tree::model::geometry::Rect;
use tile_tree::model::window::WindowId;
use tracing::info;

const SCREEN: ScreenId = ScreenId(0);

/// Lay out a list of windows on one screen and print the result.
#[derive(Parser)]
struct Cli {
    /// Config file to read instead of ~/.tile-tree/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the config file and exit.
    #[arg(long)]
    validate: bool,

    #[arg(long, default_value_t = 1920.0)]
    width: f64,

    #[arg(long, default_value_t = 1080.0)]
    height: f64,

    /// Layout mode to use instead of the configured one.
    #[arg(long, value_parser = variants(LayoutMode::VARIANTS).try_map(|s| s.parse::<LayoutMode>()))]
    mode: Option<LayoutMode>,

    /// Split mode to use instead of the configured one.
    #[arg(long, value_parser = variants(SplitMode::VARIANTS).try_map(|s| s.parse::<SplitMode>()))]
    split_mode: Option<SplitMode>,

    /// Rotate the finished layout by 90, 180 or 270 degrees.
    #[arg(long)]
    rotate: Option<u32>,

    /// Reserve an empty slot next to the last window.
    #[arg(long)]
    pseudo: bool,

    /// Print window frames as JSON instead of a tree.
    #[arg(long)]
    json: bool,

    /// Rebuild the layout from a shape saved with --save.
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Save the resulting layout shape to this file.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Window ids, in insertion order.
    windows: Vec<WindowId>,
}

fn variants(names: &'static [&'static str]) -> PossibleValuesParser {
    PossibleValuesParser::new(names.iter().copied())
}

fn main() -> anyhow::Result<()> {
    let opt: Cli = Parser::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let config = Config::read_or_default(&config_path)?;
    if opt.validate {
        let issues = config.validate();
        if issues.is_empty() {
            println!("{} is valid", config_path.display());
            return Ok(());
        }
        for issue in issues {
            eprintln!("{issue}");
        }
        process::exit(1);
    }

    let mut settings = config.settings.layout;
    if let Some(mode) = opt.mode {
        settings.mode = mode;
    }
    if let Some(split_mode) = opt.split_mode {
        settings.split_mode = split_mode;
    }

    let mut host = MemoryHost::new();
    host.add_screen(SCREEN, Rect::new(0.0, 0.0, opt.width, opt.height)).windows =
        opt.windows.clone();
    let mut engine = LayoutEngine::new(&settings);

    let restored = match &opt.restore {
        Some(path) => engine.restore(&mut host, path)?,
        None => 0,
    };
    if restored == 0 {
        let _ = engine.handle_event(&mut host, LayoutEvent::ScreenUpdated(SCREEN));
    }
    if let Some(degrees) = opt.rotate {
        let _ = engine.handle_command(&mut host, SCREEN, LayoutCommand::Rotate(degrees));
    }
    if opt.pseudo {
        let _ = engine.handle_command(&mut host, SCREEN, LayoutCommand::InsertPseudo);
    }

    let frames = engine.tree(SCREEN).map(|tree| tree.frames()).unwrap_or_default();
    if opt.json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
    } else {
        println!("{}", engine.draw_tree(SCREEN).trim_end());
        for (window, container) in &frames {
            let r = container.rect;
            println!(
                "window {window}: {:.0},{:.0} {:.0}x{:.0}",
                r.x, r.y, r.width, r.height
            );
        }
    }

    if let Some(path) = &opt.save {
        engine.save(path)?;
        info!(path = %path.display(), "saved layout shape");
    }
    Ok(())
}
