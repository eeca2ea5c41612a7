// Analyse spectrale, pool de buffers et pipeline de capture pour moodsense.

pub mod batch;
pub mod capture;
pub mod decode;
pub mod error;
pub mod features;
pub mod fft;
pub mod history;
pub mod mfcc;
pub mod pipeline;
pub mod pool;
pub mod spectral;
pub mod tempo;

pub use error::AudioError;
pub use pipeline::{FeaturePipeline, FeatureUpdate};
pub use pool::{BufferPool, PoolStats};
