use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::frame::{AudioFormat, DecodedAudio};

/// Reçoit les échantillons bruts livrés par une source de capture.
///
/// Called on the capture thread. Implementations must never block.
///
/// # Example
/// ```
/// use ms_core::traits::FrameSink;
///
/// struct CountingSink(usize);
/// impl FrameSink for CountingSink {
///     fn deliver(&mut self, samples: &[f32]) { self.0 += samples.len(); }
/// }
/// ```
pub trait FrameSink: Send {
    /// Hand over a block of interleaved samples in the session format.
    fn deliver(&mut self, samples: &[f32]);
}

/// Platform capture facility: start, stop and periodic frame delivery.
///
/// # Example
/// ```
/// use ms_core::frame::AudioFormat;
/// use ms_core::traits::{CaptureSource, FrameSink};
///
/// struct Silent { sink: Option<Box<dyn FrameSink>> }
/// impl CaptureSource for Silent {
///     fn format(&self) -> AudioFormat { AudioFormat::mono(44100) }
///     fn start(&mut self, sink: Box<dyn FrameSink>) -> anyhow::Result<()> {
///         self.sink = Some(sink);
///         Ok(())
///     }
///     fn stop(&mut self) { self.sink = None; }
/// }
/// ```
pub trait CaptureSource {
    /// Format of the frames this source delivers. Fixed for a session.
    fn format(&self) -> AudioFormat;

    /// Begin delivering frames to `sink`.
    ///
    /// # Errors
    /// Returns an error if the underlying device cannot be started.
    fn start(&mut self, sink: Box<dyn FrameSink>) -> anyhow::Result<()>;

    /// Stop delivering frames. Must drop the sink handed to `start`.
    /// Safe to call when not started.
    fn stop(&mut self);
}

/// Lit un fichier audio en entier.
pub trait FileReader: Send + Sync {
    /// Read every sample of the file at `path` with its native format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or decoded.
    fn read(&self, path: &Path) -> anyhow::Result<DecodedAudio>;
}

/// Niveau de pression mémoire signalé par le système hôte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPressure {
    /// Trim long-idle buffers down to the target ratio.
    Moderate,
    /// Drop every buffer idle for a few seconds.
    High,
    /// Drop everything that is not in use and release auxiliary resources.
    Critical,
}

/// Collaborator holding large auxiliary resources (cached models, lookup
/// tables) that it can release on critical memory pressure.
///
/// The buffer pool only signals; it never owns the responder's resources.
pub trait PressureResponder: Send + Sync {
    /// Release whatever can be rebuilt later.
    fn release_auxiliary(&self, level: MemoryPressure);
}
