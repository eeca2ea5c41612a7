//! Mel-Frequency Cepstral Coefficients (MFCC) extraction.
//!
//! Triangular mel-spaced filters from `min_hz` up to Nyquist, log energy,
//! DCT-II. Weights are pre-computed; `compute` only allocates the output.

/// Floor applied before the log so silent filters stay finite.
pub const LOG_FLOOR: f32 = 1e-10;

/// Mel filterbank for MFCC extraction.
///
/// # Example
/// ```
/// use ms_audio::mfcc::MelFilterbank;
/// let mut bank = MelFilterbank::new(2048, 44100, 26, 13, 20.0);
/// let power = vec![0.0f32; 1024];
/// let mfcc = bank.compute(&power);
/// assert_eq!(mfcc.len(), 13);
/// ```
pub struct MelFilterbank {
    /// Pre-computed filter descriptors (start_bin, end_bin), inclusive.
    filters: Vec<(usize, usize)>,
    /// Pre-computed filter weights per bin for each filter.
    weights: Vec<Vec<f32>>,
    /// Pre-computed DCT-II basis, `coefficients × filters`.
    dct: Vec<Vec<f32>>,
    /// Working buffer.
    log_energies: Vec<f32>,
}

impl MelFilterbank {
    /// Create a filterbank for the given FFT size and sample rate.
    ///
    /// The spectrum fed to `compute` is expected to hold `fft_size / 2` bins.
    #[must_use]
    pub fn new(
        fft_size: usize,
        sample_rate: u32,
        num_filters: usize,
        num_coefficients: usize,
        min_hz: f32,
    ) -> Self {
        let num_filters = num_filters.max(1);
        let num_coefficients = num_coefficients.clamp(1, num_filters);
        let nyquist = sample_rate as f32 / 2.0;
        let mel_low = hz_to_mel(min_hz.min(nyquist));
        let mel_high = hz_to_mel(nyquist);

        let bin_hz = sample_rate as f32 / fft_size.max(1) as f32;
        let num_bins = fft_size / 2;

        // Mel points: filters + 2 endpoints, evenly spaced on the mel scale
        let mel_points: Vec<f32> = (0..num_filters + 2)
            .map(|i| mel_low + (mel_high - mel_low) * i as f32 / (num_filters + 1) as f32)
            .collect();

        let mut filters = Vec::with_capacity(num_filters);
        let mut weights = Vec::with_capacity(num_filters);

        for f in 0..num_filters {
            let start_hz = mel_to_hz(mel_points[f]);
            let center_hz = mel_to_hz(mel_points[f + 1]);
            let end_hz = mel_to_hz(mel_points[f + 2]);

            let start_bin = ((start_hz / bin_hz) as usize).min(num_bins.saturating_sub(1));
            let end_bin = ((end_hz / bin_hz) as usize).min(num_bins.saturating_sub(1));

            filters.push((start_bin, end_bin));

            let mut w = Vec::with_capacity(end_bin.saturating_sub(start_bin) + 1);
            for bin in start_bin..=end_bin {
                let freq = bin as f32 * bin_hz;
                let weight = if freq < center_hz {
                    if (center_hz - start_hz).abs() < f32::EPSILON {
                        1.0
                    } else {
                        (freq - start_hz) / (center_hz - start_hz)
                    }
                } else if (end_hz - center_hz).abs() < f32::EPSILON {
                    1.0
                } else {
                    (end_hz - freq) / (end_hz - center_hz)
                };
                w.push(weight.max(0.0));
            }
            weights.push(w);
        }

        let dct = (0..num_coefficients)
            .map(|k| {
                (0..num_filters)
                    .map(|n| {
                        (std::f32::consts::PI * k as f32 * (n as f32 + 0.5) / num_filters as f32)
                            .cos()
                    })
                    .collect()
            })
            .collect();

        Self {
            filters,
            weights,
            dct,
            log_energies: vec![0.0; num_filters],
        }
    }

    /// Compute the cepstral coefficients of a power spectrum.
    pub fn compute(&mut self, power: &[f32]) -> Vec<f32> {
        // Apply mel filterbank, then log compression
        for (f, &(start, end)) in self.filters.iter().enumerate() {
            let mut energy = 0.0f32;
            if let Some(bins) = power.get(start..=end) {
                for (p, w) in bins.iter().zip(self.weights[f].iter()) {
                    energy += p * w;
                }
            }
            self.log_energies[f] = energy.max(LOG_FLOOR).ln();
        }

        // DCT-II
        self.dct
            .iter()
            .map(|basis| {
                basis
                    .iter()
                    .zip(self.log_energies.iter())
                    .map(|(b, e)| b * e)
                    .sum()
            })
            .collect()
    }

    /// Number of mel filters.
    #[must_use]
    pub fn num_filters(&self) -> usize {
        self.filters.len()
    }

    /// Number of coefficients produced by `compute`.
    #[must_use]
    pub fn num_coefficients(&self) -> usize {
        self.dct.len()
    }
}

/// Hz to Mel scale conversion.
#[inline]
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz conversion.
#[inline]
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}
