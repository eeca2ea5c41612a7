use serde::Serialize;

use ms_core::config::AnalysisConfig;
use ms_core::features::AudioFeatures;
use ms_core::frame::{AudioFormat, SampleWindow};
use ms_core::mood::{Mood, classify};

use crate::error::AudioError;
use crate::features::to_audio_features;
use crate::spectral::SpectralEngine;

/// Résultat de l'analyse d'un fichier complet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    /// Native format of the analyzed samples.
    pub format: AudioFormat,
    /// Windows analyzed successfully.
    pub windows: usize,
    /// Windows rejected by the engine (corrupt samples...).
    pub skipped: usize,
    /// Frames of the trailing partial window, not analyzed.
    pub dropped_tail: usize,
    /// Mean of the per-window features; `None` if no window succeeded.
    pub average: Option<AudioFeatures>,
    /// Mood of `average`.
    pub mood: Option<Mood>,
}

/// Analyseur offline : découpe un signal complet en fenêtres disjointes.
///
/// Runs the same per-window analysis as live capture, synchronously, with
/// its own engine. Long-running on big files: keep it off latency-sensitive
/// threads.
pub struct BatchAnalyzer {
    engine: SpectralEngine,
    format: AudioFormat,
}

impl BatchAnalyzer {
    /// Crée un analyseur pour des échantillons au format `format`.
    ///
    /// # Errors
    /// `InvalidFormat` if the format has no channel; configuration errors
    /// from [`SpectralEngine::new`].
    ///
    /// # Example
    /// ```
    /// use ms_audio::batch::BatchAnalyzer;
    /// use ms_core::config::AnalysisConfig;
    /// use ms_core::frame::AudioFormat;
    ///
    /// let config = AnalysisConfig { window_size: 1024, ..AnalysisConfig::default() };
    /// let mut analyzer = BatchAnalyzer::new(&config, AudioFormat::mono(44100)).unwrap();
    /// let report = analyzer.analyze_all(&vec![0.0; 2500]);
    /// assert_eq!(report.windows, 2);
    /// assert_eq!(report.dropped_tail, 452);
    /// ```
    pub fn new(config: &AnalysisConfig, format: AudioFormat) -> Result<Self, AudioError> {
        if format.channels == 0 {
            return Err(AudioError::InvalidFormat("aucun canal".to_string()));
        }
        Ok(Self {
            engine: SpectralEngine::new(config, format.sample_rate)?,
            format,
        })
    }

    /// Analyse l'intégralité d'un buffer entrelacé.
    ///
    /// Non-overlapping windows of `window_size` frames; the trailing partial
    /// window is dropped. Windows the engine rejects are excluded from the
    /// average.
    pub fn analyze_all(&mut self, samples: &[f32]) -> BatchReport {
        let channels = usize::from(self.format.channels);
        let stride = self.engine.window_size() * channels;
        self.engine.reset();

        let chunks = samples.chunks_exact(stride);
        let dropped_tail = chunks.remainder().len() / channels;

        let mut per_window = Vec::with_capacity(samples.len() / stride);
        let mut skipped = 0;
        for (index, chunk) in chunks.enumerate() {
            match self
                .engine
                .analyze_window(&SampleWindow::new(chunk, self.format))
            {
                Ok(spectral) => per_window.push(to_audio_features(&spectral)),
                Err(e) => {
                    log::debug!("Fenêtre {index} ignorée : {e}");
                    skipped += 1;
                }
            }
        }

        let average = AudioFeatures::mean(per_window.iter());
        BatchReport {
            format: self.format,
            windows: per_window.len(),
            skipped,
            dropped_tail,
            mood: average.as_ref().map(classify),
            average,
        }
    }
}
