use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration complète du moteur d'analyse.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use ms_core::config::EngineConfig;
/// let config = EngineConfig::default();
/// assert_eq!(config.analysis.window_size, 2048);
/// assert_eq!(config.pipeline.history_len, 10);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Per-window spectral analysis.
    pub analysis: AnalysisConfig,
    /// Buffer pool budget and eviction policy.
    pub pool: PoolConfig,
    /// Live session behaviour.
    pub pipeline: PipelineConfig,
}

/// Spectral analysis parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Frames per analysis window. Must be a power of two; never clamped.
    pub window_size: usize,
    /// Number of cepstral coefficients kept.
    pub mfcc_coefficients: usize,
    /// Number of triangular mel filters.
    pub mel_filters: usize,
    /// Lower edge of the mel filterbank, Hz. The upper edge is Nyquist.
    pub mel_min_hz: f32,
    /// Fraction of spectral energy that defines the rolloff frequency.
    pub rolloff_fraction: f32,
    /// Upper edge of the bass band, Hz.
    pub bass_cutoff_hz: f32,
    /// Lower edge of the treble band, Hz.
    pub treble_cutoff_hz: f32,
    /// Tempo clamp, lower bound.
    pub tempo_min_bpm: f32,
    /// Tempo clamp, upper bound.
    pub tempo_max_bpm: f32,
    /// Tempo reported when no autocorrelation peak is found.
    pub tempo_default_bpm: f32,
}

/// Buffer pool parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Hard budget for all pooled buffers, bytes.
    pub max_bytes: usize,
    /// Moderate pressure evicts buffers idle longer than this.
    pub moderate_idle_secs: u64,
    /// Moderate pressure stops evicting below this share of the budget.
    pub moderate_target_ratio: f32,
    /// High pressure evicts buffers idle longer than this.
    pub high_idle_secs: u64,
}

/// Live analysis session parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Number of recent feature sets kept for averaging.
    pub history_len: usize,
    /// Frames that may wait for the analysis thread before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            mfcc_coefficients: 13,
            mel_filters: 26,
            mel_min_hz: 20.0,
            rolloff_fraction: 0.85,
            bass_cutoff_hz: 250.0,
            treble_cutoff_hz: 4000.0,
            tempo_min_bpm: 40.0,
            tempo_max_bpm: 240.0,
            tempo_default_bpm: 120.0,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_bytes: 8 * 1024 * 1024,
            moderate_idle_secs: 30,
            moderate_target_ratio: 0.75,
            high_idle_secs: 5,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_len: 10,
            queue_capacity: 8,
        }
    }
}

impl PoolConfig {
    /// Idle threshold for moderate pressure.
    #[must_use]
    pub fn moderate_idle(&self) -> Duration {
        Duration::from_secs(self.moderate_idle_secs)
    }

    /// Idle threshold for high pressure.
    #[must_use]
    pub fn high_idle(&self) -> Duration {
        Duration::from_secs(self.high_idle_secs)
    }
}

impl EngineConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    ///
    /// `window_size` is left alone: an invalid size is a configuration
    /// error reported when the transform is built.
    pub fn clamp_all(&mut self) {
        let a = &mut self.analysis;
        a.mel_filters = a.mel_filters.clamp(4, 128);
        a.mfcc_coefficients = a.mfcc_coefficients.clamp(1, a.mel_filters);
        a.mel_min_hz = a.mel_min_hz.clamp(0.0, 1000.0);
        a.rolloff_fraction = a.rolloff_fraction.clamp(0.5, 0.99);
        a.bass_cutoff_hz = a.bass_cutoff_hz.clamp(20.0, 1000.0);
        a.treble_cutoff_hz = a.treble_cutoff_hz.clamp(a.bass_cutoff_hz, 20000.0);
        a.tempo_min_bpm = a.tempo_min_bpm.clamp(10.0, 200.0);
        a.tempo_max_bpm = a.tempo_max_bpm.clamp(a.tempo_min_bpm, 400.0);
        a.tempo_default_bpm = a.tempo_default_bpm.clamp(a.tempo_min_bpm, a.tempo_max_bpm);

        let p = &mut self.pool;
        p.moderate_target_ratio = p.moderate_target_ratio.clamp(0.0, 1.0);

        let s = &mut self.pipeline;
        s.history_len = s.history_len.max(1);
        s.queue_capacity = s.queue_capacity.clamp(1, 256);
    }

    /// Check the values `clamp_all` cannot repair.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the window size is not a power of two
    /// or the pool budget cannot hold a single window.
    ///
    /// # Example
    /// ```
    /// use ms_core::config::EngineConfig;
    /// let mut config = EngineConfig::default();
    /// assert!(config.validate().is_ok());
    /// config.analysis.window_size = 1000;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        let n = self.analysis.window_size;
        if n < 4 || !n.is_power_of_two() {
            return Err(CoreError::Config(format!(
                "window_size {n} n'est pas une puissance de deux >= 4"
            )));
        }
        let one_window = n * std::mem::size_of::<f32>();
        if self.pool.max_bytes < one_window {
            return Err(CoreError::Config(format!(
                "pool.max_bytes {} < une fenêtre mono ({one_window} octets)",
                self.pool.max_bytes
            )));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    analysis: Option<AnalysisSection>,
    pool: Option<PoolSection>,
    pipeline: Option<PipelineSection>,
}

/// Analysis section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct AnalysisSection {
    window_size: Option<usize>,
    mfcc_coefficients: Option<usize>,
    mel_filters: Option<usize>,
    mel_min_hz: Option<f32>,
    rolloff_fraction: Option<f32>,
    bass_cutoff_hz: Option<f32>,
    treble_cutoff_hz: Option<f32>,
    tempo_min_bpm: Option<f32>,
    tempo_max_bpm: Option<f32>,
    tempo_default_bpm: Option<f32>,
}

/// Pool section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct PoolSection {
    max_bytes: Option<usize>,
    moderate_idle_secs: Option<u64>,
    moderate_target_ratio: Option<f32>,
    high_idle_secs: Option<u64>,
}

/// Pipeline section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct PipelineSection {
    history_len: Option<usize>,
    queue_capacity: Option<usize>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use ms_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(config)
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = EngineConfig::default();

    if let Some(a) = file.analysis {
        let c = &mut config.analysis;
        if let Some(v) = a.window_size {
            c.window_size = v;
        }
        if let Some(v) = a.mfcc_coefficients {
            c.mfcc_coefficients = v;
        }
        if let Some(v) = a.mel_filters {
            c.mel_filters = v;
        }
        if let Some(v) = a.mel_min_hz {
            c.mel_min_hz = v;
        }
        if let Some(v) = a.rolloff_fraction {
            c.rolloff_fraction = v;
        }
        if let Some(v) = a.bass_cutoff_hz {
            c.bass_cutoff_hz = v;
        }
        if let Some(v) = a.treble_cutoff_hz {
            c.treble_cutoff_hz = v;
        }
        if let Some(v) = a.tempo_min_bpm {
            c.tempo_min_bpm = v;
        }
        if let Some(v) = a.tempo_max_bpm {
            c.tempo_max_bpm = v;
        }
        if let Some(v) = a.tempo_default_bpm {
            c.tempo_default_bpm = v;
        }
    }

    if let Some(p) = file.pool {
        let c = &mut config.pool;
        if let Some(v) = p.max_bytes {
            c.max_bytes = v;
        }
        if let Some(v) = p.moderate_idle_secs {
            c.moderate_idle_secs = v;
        }
        if let Some(v) = p.moderate_target_ratio {
            c.moderate_target_ratio = v;
        }
        if let Some(v) = p.high_idle_secs {
            c.high_idle_secs = v;
        }
    }

    if let Some(s) = file.pipeline {
        if let Some(v) = s.history_len {
            config.pipeline.history_len = v;
        }
        if let Some(v) = s.queue_capacity {
            config.pipeline.queue_capacity = v;
        }
    }

    config.clamp_all();
    Ok(config)
}
