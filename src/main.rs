//! Realty Search - Property Listing Search
//!
//! Filters locally stored CSV property listings by form criteria, with
//! optional free-text requirements parsed by Gemini.

mod config;
mod data;
mod gui;
mod search;
mod special;

use anyhow::Context;
use config::AppConfig;
use eframe::egui;
use gui::RealtyApp;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("loading configuration")?;
    log::info!("Data directory: {}", config.data_dir.display());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Realty Search"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Realty Search",
        options,
        Box::new(|cc| Ok(Box::new(RealtyApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
