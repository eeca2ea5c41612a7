use ms_core::config::AnalysisConfig;

/// BPM clamp and fallback used by [`estimate_tempo`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoRange {
    /// Lower clamp.
    pub min_bpm: f32,
    /// Upper clamp.
    pub max_bpm: f32,
    /// Reported when no peak is found.
    pub default_bpm: f32,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            min_bpm: 40.0,
            max_bpm: 240.0,
            default_bpm: 120.0,
        }
    }
}

impl From<&AnalysisConfig> for TempoRange {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            min_bpm: config.tempo_min_bpm,
            max_bpm: config.tempo_max_bpm,
            default_bpm: config.tempo_default_bpm,
        }
    }
}

/// Estimate a tempo from one window's magnitude spectrum.
///
/// The magnitude vector is autocorrelated with itself; the lag of the
/// strongest local maximum is read as a beat period of `lag` windows:
/// `bpm = 60 · sample_rate / (lag · window_size)`, clamped to the range.
/// Returns `range.default_bpm` when no peak exists (silence, flat spectra).
///
/// This correlates the spectrum, not an onset envelope over time, so it
/// tracks spectral periodicity (harmonic spacing) rather than rhythm.
///
/// # Example
/// ```
/// use ms_audio::tempo::{estimate_tempo, TempoRange};
/// let silent = vec![0.0f32; 512];
/// assert_eq!(estimate_tempo(&silent, 44100, 1024, TempoRange::default()), 120.0);
/// ```
#[must_use]
pub fn estimate_tempo(
    magnitudes: &[f32],
    sample_rate: u32,
    window_size: usize,
    range: TempoRange,
) -> f32 {
    let corr = autocorrelate(magnitudes);
    let Some(lag) = strongest_peak(&corr) else {
        return range.default_bpm;
    };
    let bpm = 60.0 * sample_rate as f32 / (lag as f32 * window_size as f32);
    bpm.clamp(range.min_bpm, range.max_bpm)
}

/// Raw (unnormalized) autocorrelation for lags `0..n`.
fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    (0..n)
        .map(|lag| {
            signal[..n - lag]
                .iter()
                .zip(signal[lag..].iter())
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Lag of the largest strictly-positive local maximum, lag 0 excluded.
///
/// A local maximum rises strictly from its left neighbour and does not fall
/// below its right one. Ties keep the shortest lag.
fn strongest_peak(corr: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for lag in 1..corr.len().saturating_sub(1) {
        let r = corr[lag];
        if r > 0.0 && r > corr[lag - 1] && r >= corr[lag + 1] {
            match best {
                Some((_, b)) if b >= r => {}
                _ => best = Some((lag, r)),
            }
        }
    }
    best.map(|(lag, _)| lag)
}
