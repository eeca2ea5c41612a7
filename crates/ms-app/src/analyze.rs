use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use ms_audio::batch::{BatchAnalyzer, BatchReport};
use ms_core::config::AnalysisConfig;
use ms_core::features::AudioFeatures;
use ms_core::traits::FileReader;

/// Résultat par fichier de la commande `file`.
#[derive(Debug, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub report: Option<BatchReport>,
    pub error: Option<String>,
}

/// Analyse chaque fichier sur le pool rayon, un `BatchAnalyzer` par fichier.
///
/// Results keep the order of `paths`.
pub fn analyze_files(
    paths: &[PathBuf],
    reader: &dyn FileReader,
    config: &AnalysisConfig,
) -> Vec<FileResult> {
    paths
        .par_iter()
        .map(|path| match analyze_one(path, reader, config) {
            Ok(report) => FileResult {
                path: path.clone(),
                report: Some(report),
                error: None,
            },
            Err(e) => {
                log::warn!("{} : {e:#}", path.display());
                FileResult {
                    path: path.clone(),
                    report: None,
                    error: Some(format!("{e:#}")),
                }
            }
        })
        .collect()
}

fn analyze_one(
    path: &Path,
    reader: &dyn FileReader,
    config: &AnalysisConfig,
) -> anyhow::Result<BatchReport> {
    let audio = reader.read(path)?;
    let mut analyzer = BatchAnalyzer::new(config, audio.format)?;
    Ok(analyzer.analyze_all(&audio.samples))
}

/// Rendu texte d'un résultat.
#[must_use]
pub fn render_text(result: &FileResult) -> String {
    let mut out = format!("{}\n", result.path.display());
    match (&result.report, &result.error) {
        (Some(report), _) => {
            out.push_str(&format!(
                "  {} Hz, {} canal(aux) : {} fenêtre(s), {} ignorée(s), {} trame(s) de reste\n",
                report.format.sample_rate,
                report.format.channels,
                report.windows,
                report.skipped,
                report.dropped_tail
            ));
            match (&report.average, &report.mood) {
                (Some(avg), Some(mood)) => {
                    out.push_str(&render_features(avg));
                    out.push_str(&format!("  humeur : {mood}\n"));
                }
                _ => out.push_str("  aucune fenêtre complète\n"),
            }
        }
        (None, Some(error)) => out.push_str(&format!("  erreur : {error}\n")),
        (None, None) => {}
    }
    out
}

/// Une ligne par caractéristique.
#[must_use]
pub fn render_features(f: &AudioFeatures) -> String {
    format!(
        "  tempo {:.1} BPM | énergie {:.2} | valence {:.2} | dansabilité {:.2}\n  \
         acoustique {:.2} | instrumental {:.2} | parole {:.2} | live {:.2}\n",
        f.tempo,
        f.energy,
        f.valence,
        f.danceability,
        f.acousticness,
        f.instrumentalness,
        f.speechiness,
        f.liveness
    )
}
