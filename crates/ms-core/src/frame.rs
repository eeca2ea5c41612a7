use serde::{Deserialize, Serialize};

/// Sample rate and channel layout of a sample stream. Fixed for a session.
///
/// # Example
/// ```
/// use ms_core::frame::AudioFormat;
/// let format = AudioFormat::new(44100, 2);
/// assert_eq!(format.bytes_per_frame(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct AudioFormat {
    /// Samples per second, per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl AudioFormat {
    /// Build a format descriptor.
    #[must_use]
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Mono format at the given rate.
    #[must_use]
    pub fn mono(sample_rate: u32) -> Self {
        Self::new(sample_rate, 1)
    }

    /// Size in bytes of one interleaved `f32` frame.
    #[inline]
    #[must_use]
    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.channels) * std::mem::size_of::<f32>()
    }

    /// Nyquist frequency in Hz.
    #[inline]
    #[must_use]
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }
}

/// Vue immuable sur une fenêtre d'échantillons entrelacés.
///
/// The window never owns or mutates its samples; whoever filled the backing
/// storage keeps it.
///
/// # Example
/// ```
/// use ms_core::frame::{AudioFormat, SampleWindow};
/// let samples = vec![0.0f32; 2048];
/// let window = SampleWindow::new(&samples, AudioFormat::new(48000, 2));
/// assert_eq!(window.frames(), 1024);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SampleWindow<'a> {
    samples: &'a [f32],
    format: AudioFormat,
}

impl<'a> SampleWindow<'a> {
    /// Wrap interleaved samples in the given format.
    #[must_use]
    pub fn new(samples: &'a [f32], format: AudioFormat) -> Self {
        Self { samples, format }
    }

    /// Raw interleaved samples.
    #[must_use]
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Format of the samples.
    #[must_use]
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Number of complete frames (one sample per channel). Zero when the
    /// format declares no channel.
    #[must_use]
    pub fn frames(&self) -> usize {
        match self.format.channels {
            0 => 0,
            c => self.samples.len() / usize::from(c),
        }
    }

    /// Downmix the leading `out.len()` frames to mono (channel mean).
    ///
    /// Frames past the end of the window are written as silence.
    ///
    /// # Example
    /// ```
    /// use ms_core::frame::{AudioFormat, SampleWindow};
    /// let samples = [1.0f32, 0.0, 0.5, 0.5];
    /// let window = SampleWindow::new(&samples, AudioFormat::new(44100, 2));
    /// let mut mono = [0.0f32; 2];
    /// window.downmix_into(&mut mono);
    /// assert_eq!(mono, [0.5, 0.5]);
    /// ```
    pub fn downmix_into(&self, out: &mut [f32]) {
        let channels = usize::from(self.format.channels.max(1));
        let mut frames = self.samples.chunks_exact(channels);
        for slot in out.iter_mut() {
            *slot = frames
                .next()
                .map_or(0.0, |frame| frame.iter().sum::<f32>() / channels as f32);
        }
    }
}

/// Fichier audio décodé en entier : échantillons entrelacés + format natif.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    /// Interleaved samples, normalized to [-1, 1].
    pub samples: Vec<f32>,
    /// Native format of the file.
    pub format: AudioFormat,
}
