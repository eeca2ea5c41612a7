use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::AudioError;

/// FFT pipeline: Hann-windowed real FFT using realfft.
///
/// Pre-allocates the FFT plan and scratch buffers for zero-allocation hot path.
///
/// # Example
/// ```
/// use ms_audio::fft::FftPipeline;
/// let fft = FftPipeline::new(2048).unwrap();
/// assert_eq!(fft.bins(), 1024);
/// assert!(FftPipeline::new(1000).is_err());
/// ```
pub struct FftPipeline {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    plan: Arc<dyn RealToComplex<f32>>,
    /// Hann window coefficients.
    window: Vec<f32>,
}

impl FftPipeline {
    /// Create a new FFT pipeline with the given window size.
    ///
    /// # Errors
    /// Returns `TransformUnavailable` if `size` is not a power of two >= 4.
    pub fn new(size: usize) -> Result<Self, AudioError> {
        if size < 4 || !size.is_power_of_two() {
            return Err(AudioError::TransformUnavailable(format!(
                "taille FFT {size} : puissance de deux >= 4 requise"
            )));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        // Hann window
        let window: Vec<f32> = (0..size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos())
            })
            .collect();

        Ok(Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            magnitudes: vec![0.0; size / 2],
            plan,
            window,
        })
    }

    /// Process mono `samples` through the windowed FFT.
    ///
    /// Returns the magnitudes of the first N/2 bins, scaled by 2/N. Missing
    /// samples are treated as silence.
    ///
    /// # Errors
    /// Returns `TransformUnavailable` if the plan rejects the buffers.
    ///
    /// # Example
    /// ```
    /// use ms_audio::fft::FftPipeline;
    /// let mut fft = FftPipeline::new(256).unwrap();
    /// let samples = vec![0.0f32; 256];
    /// let spectrum = fft.process(&samples).unwrap();
    /// assert_eq!(spectrum.len(), 128); // N/2
    /// ```
    pub fn process(&mut self, samples: &[f32]) -> Result<&[f32], AudioError> {
        let n = self.fft_size.min(samples.len());

        // Copy and window
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n { samples[i] * self.window[i] } else { 0.0 };
        }

        // Forward FFT
        self.plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .map_err(|e| AudioError::TransformUnavailable(e.to_string()))?;

        // Magnitude
        let scale = 2.0 / self.fft_size as f32;
        for (slot, c) in self.magnitudes.iter_mut().zip(self.spectrum_buf.iter()) {
            *slot = (c.re * c.re + c.im * c.im).sqrt() * scale;
        }
        Ok(&self.magnitudes)
    }

    /// FFT window size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of magnitude bins returned by `process`.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.fft_size / 2
    }
}
