mod cli;
mod config;
mod ui;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::app::{App, Commands};
use crate::config::Settings;
use crate::ui::log::LogWriter;
use crate::ui::tracker::BARS;

fn init_tracing(verbose: u8, debug_mode: bool) {
    let level = match (verbose, debug_mode) {
        (0, false) => "info",
        (0 | 1, _) => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(LogWriter::stderr(&BARS)),
        )
        .init();
}

fn print_settings(settings: &Settings) {
    let on = |b: bool| if b { "yes" } else { "no" };
    eprintln!("API key:            {}", settings.masked_key());
    eprintln!("Ledger:             {}", settings.ledger_path.display());
    eprintln!("Output:             {}", settings.output_dir.display());
    eprintln!("Size only:          {}", on(settings.only_size));
    eprintln!("Force recheck:      {}", on(settings.force_recheck));
    eprintln!("Favorites only:     {}", on(settings.favorites_only));
    eprintln!("First page only:    {}", on(settings.first_page_only));
    eprintln!("Include types:");
    eprintln!("    Checkpoints:    {}", on(settings.include_checkpoints));
    eprintln!("    LORAs:          {}", on(settings.include_lora));
    eprintln!("    Embeddings:     {}", on(settings.include_textual_inversion));
    eprintln!("    Hypernetworks:  {}", on(settings.include_hypernets));
    eprintln!("    Aesthetic:      {}", on(settings.include_aesthetic_grads));
    eprintln!("    ControlNet:     {}", on(settings.include_control_net));
    eprintln!("    Poses:          {}", on(settings.include_poses));
}

fn main() -> Result<()> {
    let app = App::parse();

    if let Some(path) = &app.config {
        ensure!(path.exists(), "config file {} does not exist", path.display());
    }
    let settings = Settings::load(app.config.as_deref(), &app.cmd.overrides()).context("invalid configuration")?;

    init_tracing(app.verbose, settings.debug_mode);
    if settings.debug_mode {
        print_settings(&settings);
    }

    match app.cmd {
        Commands::Archive(_) | Commands::Sizes(_) => cli::archive::run(&settings),
        Commands::Ledger(_) => cli::ledger::run(&settings),
    }
}
