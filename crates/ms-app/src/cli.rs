use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// moodsense : extraction de caractéristiques audio et classification d'humeur.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyser un ou plusieurs fichiers audio (en parallèle).
    File {
        /// Fichiers à analyser (WAV, MP3, FLAC, OGG, AAC).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Sortie JSON sur stdout.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Capture micro en direct.
    Live {
        /// Durée de la capture, en secondes.
        #[arg(long, default_value_t = 10)]
        seconds: u64,

        /// Intervalle d'affichage, en millisecondes.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}
