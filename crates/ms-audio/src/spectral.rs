use ms_core::config::AnalysisConfig;
use ms_core::features::SpectralFeatures;
use ms_core::frame::SampleWindow;

use crate::error::AudioError;
use crate::fft::FftPipeline;
use crate::mfcc::MelFilterbank;
use crate::tempo::{TempoRange, estimate_tempo};

/// Per-window spectral analysis.
///
/// Stateless per call apart from the previous window's magnitudes, kept for
/// spectral flux and forgotten by [`SpectralEngine::reset`].
///
/// # Example
/// ```
/// use ms_audio::spectral::SpectralEngine;
/// use ms_core::config::AnalysisConfig;
/// use ms_core::frame::{AudioFormat, SampleWindow};
///
/// let config = AnalysisConfig { window_size: 1024, ..AnalysisConfig::default() };
/// let mut engine = SpectralEngine::new(&config, 44100).unwrap();
/// let samples = vec![0.0f32; 1024];
/// let features = engine
///     .analyze_window(&SampleWindow::new(&samples, AudioFormat::mono(44100)))
///     .unwrap();
/// assert_eq!(features.centroid, 0.0);
/// assert_eq!(features.rolloff, 22050.0);
/// ```
pub struct SpectralEngine {
    fft: FftPipeline,
    mel: MelFilterbank,
    sample_rate: u32,
    rolloff_fraction: f32,
    bass_cutoff_hz: f32,
    treble_cutoff_hz: f32,
    tempo: TempoRange,
    mono: Vec<f32>,
    power: Vec<f32>,
    prev_magnitudes: Vec<f32>,
    has_prev: bool,
}

impl SpectralEngine {
    /// Build an engine for `sample_rate` with the configured window size.
    ///
    /// # Errors
    /// Returns `TransformUnavailable` if the window size is not a power of
    /// two or the sample rate is zero. Both are configuration errors.
    pub fn new(config: &AnalysisConfig, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::TransformUnavailable(
                "taux d'échantillonnage nul".to_string(),
            ));
        }
        let fft = FftPipeline::new(config.window_size)?;
        let bins = fft.bins();
        let mel = MelFilterbank::new(
            config.window_size,
            sample_rate,
            config.mel_filters,
            config.mfcc_coefficients,
            config.mel_min_hz,
        );
        Ok(Self {
            fft,
            mel,
            sample_rate,
            rolloff_fraction: config.rolloff_fraction,
            bass_cutoff_hz: config.bass_cutoff_hz,
            treble_cutoff_hz: config.treble_cutoff_hz,
            tempo: TempoRange::from(config),
            mono: vec![0.0; config.window_size],
            power: vec![0.0; bins],
            prev_magnitudes: vec![0.0; bins],
            has_prev: false,
        })
    }

    /// Analyze one window.
    ///
    /// The leading `window_size` frames are used; interleaved channels are
    /// averaged to mono first.
    ///
    /// # Errors
    /// - `InvalidFormat` if the window has no channel or a different sample rate.
    /// - `InsufficientSamples` if it holds fewer than `window_size` frames.
    /// - `CorruptSamples` if any analyzed sample is NaN or infinite.
    ///
    /// All three leave the flux state untouched.
    pub fn analyze_window(
        &mut self,
        window: &SampleWindow<'_>,
    ) -> Result<SpectralFeatures, AudioError> {
        let format = window.format();
        if format.channels == 0 {
            return Err(AudioError::InvalidFormat("aucun canal".to_string()));
        }
        if format.sample_rate != self.sample_rate {
            return Err(AudioError::InvalidFormat(format!(
                "{} Hz reçu, {} Hz attendu",
                format.sample_rate, self.sample_rate
            )));
        }
        let window_size = self.fft.fft_size();
        let frames = window.frames();
        if frames < window_size {
            return Err(AudioError::InsufficientSamples {
                expected: window_size,
                got: frames,
            });
        }
        let used = window_size * usize::from(format.channels);
        if !window.samples()[..used].iter().all(|s| s.is_finite()) {
            return Err(AudioError::CorruptSamples);
        }

        window.downmix_into(&mut self.mono);
        let rms = rms(&self.mono);
        let zero_crossing_rate = zero_crossing_rate(&self.mono);

        let magnitudes = self.fft.process(&self.mono)?;
        let bin_hz = self.sample_rate as f32 / window_size as f32;
        let nyquist = format.nyquist();

        for (p, &m) in self.power.iter_mut().zip(magnitudes.iter()) {
            *p = m * m;
        }

        let (centroid, spread) = centroid_and_spread(magnitudes, bin_hz);
        let rolloff = rolloff(&self.power, bin_hz, self.rolloff_fraction, nyquist);
        let flatness = flatness(magnitudes);
        let (bass_energy, mid_energy, treble_energy) = band_shares(
            &self.power,
            bin_hz,
            self.bass_cutoff_hz,
            self.treble_cutoff_hz,
        );

        let flux = if self.has_prev {
            Some(l2_distance(magnitudes, &self.prev_magnitudes))
        } else {
            None
        };

        let estimated_tempo_bpm =
            estimate_tempo(magnitudes, self.sample_rate, window_size, self.tempo);
        let mfcc = self.mel.compute(&self.power);

        self.prev_magnitudes.copy_from_slice(magnitudes);
        self.has_prev = true;

        Ok(SpectralFeatures {
            rms,
            zero_crossing_rate,
            centroid,
            spread,
            rolloff,
            flux,
            flatness,
            bass_energy,
            mid_energy,
            treble_energy,
            mfcc,
            estimated_tempo_bpm,
        })
    }

    /// Forget the previous window; the next window reports no flux.
    pub fn reset(&mut self) {
        self.prev_magnitudes.fill(0.0);
        self.has_prev = false;
    }

    /// Configured window size, in frames.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.fft.fft_size()
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

/// Magnitude-weighted mean frequency and standard deviation. (0, 0) for silence.
fn centroid_and_spread(magnitudes: &[f32], bin_hz: f32) -> (f32, f32) {
    let total: f32 = magnitudes.iter().sum();
    if total <= 0.0 {
        return (0.0, 0.0);
    }
    let centroid = magnitudes
        .iter()
        .enumerate()
        .map(|(i, &m)| i as f32 * bin_hz * m)
        .sum::<f32>()
        / total;
    let variance = magnitudes
        .iter()
        .enumerate()
        .map(|(i, &m)| {
            let d = i as f32 * bin_hz - centroid;
            d * d * m
        })
        .sum::<f32>()
        / total;
    (centroid, variance.max(0.0).sqrt())
}

/// Lowest bin frequency whose cumulative energy reaches `fraction` of the
/// total. Nyquist for silence or if rounding keeps the sum short.
fn rolloff(power: &[f32], bin_hz: f32, fraction: f32, nyquist: f32) -> f32 {
    let total: f32 = power.iter().sum();
    if total <= 0.0 {
        return nyquist;
    }
    let threshold = total * fraction;
    let mut cumulative = 0.0f32;
    for (i, &p) in power.iter().enumerate() {
        cumulative += p;
        if cumulative >= threshold {
            return i as f32 * bin_hz;
        }
    }
    nyquist
}

/// Geometric mean / arithmetic mean of the magnitudes. 0 for silence.
fn flatness(magnitudes: &[f32]) -> f32 {
    let total: f32 = magnitudes.iter().sum();
    if total <= 0.0 || magnitudes.is_empty() {
        return 0.0;
    }
    let n = magnitudes.len() as f32;
    let log_sum: f32 = magnitudes.iter().map(|&m| (m + 1e-10).ln()).sum();
    let geo_mean = (log_sum / n).exp();
    let arith_mean = total / n;
    (geo_mean / arith_mean).clamp(0.0, 1.0)
}

/// Energy shares of the bass (< low), mid and treble (> high) bands.
/// All zero for silence, otherwise summing to 1.
fn band_shares(power: &[f32], bin_hz: f32, low_hz: f32, high_hz: f32) -> (f32, f32, f32) {
    let (mut bass, mut mid, mut treble) = (0.0f32, 0.0f32, 0.0f32);
    for (i, &p) in power.iter().enumerate() {
        let f = i as f32 * bin_hz;
        if f < low_hz {
            bass += p;
        } else if f <= high_hz {
            mid += p;
        } else {
            treble += p;
        }
    }
    let total = bass + mid + treble;
    if total <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    (bass / total, mid / total, treble / total)
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use ms_core::frame::AudioFormat;

    use super::*;

    const RATE: u32 = 44100;

    fn engine(window_size: usize) -> SpectralEngine {
        let config = AnalysisConfig {
            window_size,
            ..AnalysisConfig::default()
        };
        SpectralEngine::new(&config, RATE).expect("valid config")
    }

    fn sine(freq: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / RATE as f32).sin())
            .collect()
    }

    fn analyze(engine: &mut SpectralEngine, samples: &[f32]) -> Result<SpectralFeatures, AudioError> {
        engine.analyze_window(&SampleWindow::new(samples, AudioFormat::mono(RATE)))
    }

    #[test]
    fn silent_window() {
        let mut e = engine(1024);
        let f = analyze(&mut e, &[0.0; 1024]).expect("analysis");
        assert_eq!(f.centroid, 0.0);
        assert_eq!(f.spread, 0.0);
        assert_eq!(f.bass_energy, 0.0);
        assert_eq!(f.mid_energy, 0.0);
        assert_eq!(f.treble_energy, 0.0);
        assert!((f.rolloff - 22050.0).abs() < f32::EPSILON);
        assert_eq!(f.flatness, 0.0);
        assert_eq!(f.rms, 0.0);
        assert!(f.flux.is_none());
        assert!((f.estimated_tempo_bpm - 120.0).abs() < f32::EPSILON);
        assert_eq!(f.mfcc.len(), 13);
    }

    #[test]
    fn short_window_is_rejected() {
        let mut e = engine(1024);
        let err = analyze(&mut e, &[0.1; 1023]).expect_err("too short");
        assert!(matches!(
            err,
            AudioError::InsufficientSamples {
                expected: 1024,
                got: 1023
            }
        ));
        // The rejected window does not count as "previous" for flux.
        let f = analyze(&mut e, &[0.0; 1024]).expect("analysis");
        assert!(f.flux.is_none());
    }

    #[test]
    fn stereo_short_window_counts_frames() {
        let mut e = engine(512);
        let samples = vec![0.0f32; 1000];
        let err = e
            .analyze_window(&SampleWindow::new(&samples, AudioFormat::new(RATE, 2)))
            .expect_err("500 frames < 512");
        assert!(matches!(err, AudioError::InsufficientSamples { got: 500, .. }));
    }

    #[test]
    fn invalid_window_size_is_a_config_error() {
        let config = AnalysisConfig {
            window_size: 1000,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            SpectralEngine::new(&config, RATE),
            Err(AudioError::TransformUnavailable(_))
        ));
        assert!(SpectralEngine::new(&AnalysisConfig::default(), 0).is_err());
    }

    #[test]
    fn corrupt_and_mismatched_windows_are_per_window_errors() {
        let mut e = engine(256);
        let mut samples = vec![0.0f32; 256];
        samples[10] = f32::NAN;
        let err = analyze(&mut e, &samples).expect_err("nan");
        assert!(matches!(err, AudioError::CorruptSamples));
        assert!(err.is_per_window());

        let ok = vec![0.0f32; 256];
        let err = e
            .analyze_window(&SampleWindow::new(&ok, AudioFormat::mono(48000)))
            .expect_err("rate mismatch");
        assert!(matches!(err, AudioError::InvalidFormat(_)));
        let err = e
            .analyze_window(&SampleWindow::new(&ok, AudioFormat::new(RATE, 0)))
            .expect_err("no channel");
        assert!(err.is_per_window());
    }

    #[test]
    fn sine_shape_statistics() {
        let size = 2048;
        // Bin-centred: bin 47 of a 2048-point FFT at 44.1 kHz.
        let freq = 47.0 * RATE as f32 / size as f32;
        let mut e = engine(size);
        let f = analyze(&mut e, &sine(freq, size, 0.8)).expect("analysis");
        assert!((f.centroid - freq).abs() < 30.0, "centroid = {}", f.centroid);
        assert!(f.rolloff > 900.0 && f.rolloff < 1200.0, "rolloff = {}", f.rolloff);
        assert!(f.mid_energy > 0.99);
        assert!((f.bass_energy + f.mid_energy + f.treble_energy - 1.0).abs() < 1e-5);
        assert!(f.flatness < 0.1);
        assert!((f.rms - 0.8 / 2f32.sqrt()).abs() < 0.01);
        assert!((40.0..=240.0).contains(&f.estimated_tempo_bpm));
    }

    #[test]
    fn band_split_follows_cutoffs() {
        let size = 2048;
        let mut e = engine(size);
        let low = analyze(&mut e, &sine(100.0, size, 0.5)).expect("analysis");
        assert!(low.bass_energy > 0.95);
        let high = analyze(&mut e, &sine(8000.0, size, 0.5)).expect("analysis");
        assert!(high.treble_energy > 0.95);
        assert!(high.centroid > low.centroid);
    }

    #[test]
    fn flux_tracks_change_and_resets() {
        let size = 1024;
        let mut e = engine(size);
        let tone = sine(1000.0, size, 0.5);
        assert!(analyze(&mut e, &tone).expect("first").flux.is_none());
        let same = analyze(&mut e, &tone).expect("second").flux;
        assert!(same.is_some_and(|f| f.abs() < 1e-6));
        let silent = analyze(&mut e, &[0.0; 1024]).expect("third").flux;
        assert!(silent.is_some_and(|f| f > 0.1));
        e.reset();
        assert!(analyze(&mut e, &tone).expect("after reset").flux.is_none());
    }

    #[test]
    fn white_noise_is_flatter_than_a_tone() {
        let size = 2048;
        let mut e = engine(size);
        // Deterministic LCG noise.
        let mut state = 0x1234_5678u32;
        let noise: Vec<f32> = (0..size)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect();
        let noisy = analyze(&mut e, &noise).expect("noise");
        let tonal = analyze(&mut e, &sine(1000.0, size, 0.5)).expect("tone");
        assert!(noisy.flatness > tonal.flatness);
        assert!(noisy.zero_crossing_rate > tonal.zero_crossing_rate);
    }

    #[test]
    fn longer_window_uses_leading_frames() {
        let mut e = engine(256);
        let mut samples = vec![0.0f32; 512];
        samples[300] = 1.0;
        let f = analyze(&mut e, &samples).expect("analysis");
        assert_eq!(f.rms, 0.0);
    }
}
