use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use ms_core::frame::AudioFormat;
use ms_core::traits::{CaptureSource, FrameSink};

use crate::error::AudioError;

/// Audio capture via cpal.
///
/// Forwards the device's interleaved f32 blocks to the sink given to
/// `start`, on cpal's callback thread. Dropping the stream on `stop` drops
/// the sink with it.
///
/// # Example
/// ```no_run
/// use ms_audio::capture::CpalCapture;
/// use ms_core::traits::CaptureSource;
/// let capture = CpalCapture::open_default().unwrap();
/// println!("{} Hz", capture.format().sample_rate);
/// ```
pub struct CpalCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: AudioFormat,
    stream: Option<cpal::Stream>,
}

impl CpalCapture {
    /// Open the default input device, without starting it.
    ///
    /// # Errors
    /// `NoInputDevice` if the host has none, `UnsupportedFormat` if it does
    /// not deliver f32 samples, `Capture` if its configuration is unreadable.
    pub fn open_default() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::Capture(e.to_string()))?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat(format!(
                "{:?} (f32 attendu)",
                supported.sample_format()
            )));
        }

        let config: cpal::StreamConfig = supported.into();
        let format = AudioFormat::new(config.sample_rate.0, config.channels);
        log::info!(
            "Périphérique d'entrée : {} Hz, {} canal(aux)",
            format.sample_rate,
            format.channels
        );

        Ok(Self {
            device,
            config,
            format,
            stream: None,
        })
    }
}

impl CaptureSource for CpalCapture {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn start(&mut self, mut sink: Box<dyn FrameSink>) -> Result<()> {
        self.stop();
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sink.deliver(data);
            },
            |err| {
                log::error!("Audio stream error: {err}");
            },
            None,
        )?;
        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("Pause du flux impossible : {e}");
            }
            drop(stream);
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
