// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod app;
mod config;
mod icon_textures;
mod tiles;

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

use app::PinmapApp;
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drag icons onto the map and leave a comment on each")]
struct Cli {
    /// Directory containing the marker icon images (overrides the config file)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Enable debug logging for this application
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_module("pinmap_desktop", log::LevelFilter::Debug);
        builder.filter_module("pinmap_core", log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<(), eframe::Error> {
    let cli = Cli::parse();

    if cli.print_config_path {
        match AppConfig::get_config_path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => eprintln!("Could not determine config path: {e}"),
        }
        return Ok(());
    }

    init_logging(cli.verbose);
    log::info!("Starting Pinmap Desktop...");

    let mut config = AppConfig::load_or_default();
    if let Ok(path) = AppConfig::get_config_path() {
        log::info!("Using configuration from {}", path.display());
    }
    if let Some(assets) = cli.assets {
        config.asset_dir = assets;
    }
    log::info!("Loading marker icons from {}", config.asset_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_title("Pinmap Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "Pinmap Desktop",
        options,
        Box::new(move |_cc| Ok(Box::new(PinmapApp::new(&config)))),
    )
}
