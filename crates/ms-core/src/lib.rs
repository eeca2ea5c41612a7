/// Configuration, types, and shared structures for moodsense.
///
/// This crate contains the data model, the mood rule table, the collaborator
/// traits, and configuration logic used across the moodsense workspace.

pub mod config;
pub mod error;
pub mod features;
pub mod frame;
pub mod mood;
pub mod traits;

pub use config::EngineConfig;
pub use error::CoreError;
pub use features::{AudioFeatures, SpectralFeatures};
pub use frame::{AudioFormat, DecodedAudio, SampleWindow};
pub use mood::{Mood, classify};
pub use traits::{CaptureSource, FileReader, FrameSink, MemoryPressure, PressureResponder};
