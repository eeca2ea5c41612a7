use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use ms_audio::decode::SymphoniaReader;
use ms_core::config::EngineConfig;

pub mod analyze;
pub mod cli;
pub mod live;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger et valider la config
    let config = resolve_config(&cli.config)?;
    config.validate()?;

    // 4. Commande
    match cli.command {
        cli::Command::File { paths, json } => {
            let results = analyze::analyze_files(&paths, &SymphoniaReader, &config.analysis);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    print!("{}", analyze::render_text(result));
                }
            }
            if results.iter().all(|r| r.report.is_none()) {
                anyhow::bail!("Aucun fichier n'a pu être analysé");
            }
            Ok(())
        }
        cli::Command::Live {
            seconds,
            interval_ms,
        } => live::run_live(
            config,
            Duration::from_secs(seconds),
            Duration::from_millis(interval_ms.max(10)),
        ),
    }
}

/// Config file if present, defaults otherwise.
fn resolve_config(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        ms_core::config::load_config(path)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            path.display()
        );
        Ok(EngineConfig::default())
    }
}
