use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use ms_core::frame::{AudioFormat, DecodedAudio};
use ms_core::traits::FileReader;

use crate::error::AudioError;

/// Lecteur de fichiers audio via symphonia (WAV, MP3, FLAC, OGG, AAC).
///
/// Samples stay interleaved at the native rate and channel count; the
/// analysis downmixes per window.
///
/// # Example
/// ```no_run
/// use ms_audio::decode::SymphoniaReader;
/// use ms_core::traits::FileReader;
/// let audio = SymphoniaReader.read("track.flac".as_ref()).unwrap();
/// println!("{} Hz", audio.format.sample_rate);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaReader;

impl FileReader for SymphoniaReader {
    fn read(&self, path: &Path) -> Result<DecodedAudio> {
        decode_file(path)
    }
}

/// Decode an audio file into interleaved f32 samples.
///
/// # Errors
/// Returns an error if the file cannot be opened, probed or decoded, or has
/// no usable track.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file =
        File::open(path).with_context(|| format!("Cannot open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let mut reader = probed.format;
    let track = reader
        .default_track()
        .context("No default audio track found")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::UnsupportedFormat("fréquence inconnue".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);
    let channels = u16::try_from(channels)
        .map_err(|_| AudioError::UnsupportedFormat(format!("{channels} canaux")))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeError(e.to_string()))?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut max_sample_frames: usize = 0;

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(e) => {
                end_of_stream(e)?;
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Audio decode frame error: {e}");
                continue;
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.capacity();
        // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<f32>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    let format = AudioFormat::new(sample_rate, channels);
    log::info!(
        "Decoded {} frames @ {}Hz, {} channel(s) from {}",
        samples.len() / usize::from(channels.max(1)),
        sample_rate,
        channels,
        path.display()
    );

    Ok(DecodedAudio { samples, format })
}

/// Tri des erreurs de `next_packet` : fin normale ou fichier illisible.
///
/// Only a clean end of stream ends the read successfully. A reset request
/// (chained streams) also ends it, with a warning, since the track set may
/// change. Anything else means the file is truncated or corrupt and a
/// partial result would be mistaken for the whole file.
fn end_of_stream(err: SymphoniaError) -> Result<(), AudioError> {
    match err {
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        SymphoniaError::ResetRequired => {
            log::warn!("Audio stream reset requested, decoding stopped");
            Ok(())
        }
        e => Err(AudioError::DecodeError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// Minimal 16-bit PCM WAV.
    fn wav_bytes(sample_rate: u32, channels: u16, pcm: &[i16]) -> Vec<u8> {
        let data_len = (pcm.len() * 2) as u32;
        let block_align = channels * 2;
        let mut out = Vec::with_capacity(44 + pcm.len() * 2);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in pcm {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn decodes_interleaved_wav_at_native_format() {
        let pcm: Vec<i16> = (0..2000).map(|i| if i % 2 == 0 { 16384 } else { -16384 }).collect();
        let mut file = tempfile::Builder::new()
            .suffix(".wav")
            .tempfile()
            .expect("tempfile");
        file.write_all(&wav_bytes(22050, 2, &pcm)).expect("write");
        file.flush().expect("flush");

        let audio = SymphoniaReader.read(file.path()).expect("decode");
        assert_eq!(audio.format, AudioFormat::new(22050, 2));
        assert_eq!(audio.samples.len(), 2000);
        assert!((audio.samples[0] - 0.5).abs() < 1e-3);
        assert!((audio.samples[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn only_end_of_stream_ends_cleanly() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "fin");
        assert!(end_of_stream(SymphoniaError::IoError(eof)).is_ok());
        assert!(end_of_stream(SymphoniaError::ResetRequired).is_ok());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "refusé");
        assert!(matches!(
            end_of_stream(SymphoniaError::IoError(io)),
            Err(AudioError::DecodeError(_))
        ));
        assert!(matches!(
            end_of_stream(SymphoniaError::DecodeError("paquet corrompu")),
            Err(AudioError::DecodeError(_))
        ));
        assert!(matches!(
            end_of_stream(SymphoniaError::Unsupported("codec")),
            Err(AudioError::DecodeError(_))
        ));
    }

    #[test]
    fn truncated_wav_keeps_whole_frames() {
        let pcm: Vec<i16> = vec![8192; 10_000];
        let mut bytes = wav_bytes(8000, 1, &pcm);
        // Header announces 10000 samples, only 6000 are present.
        bytes.truncate(44 + 6000 * 2);
        let mut file = tempfile::Builder::new()
            .suffix(".wav")
            .tempfile()
            .expect("tempfile");
        file.write_all(&bytes).expect("write");
        file.flush().expect("flush");

        let audio = SymphoniaReader.read(file.path()).expect("eof ends the read");
        assert!(audio.samples.len() <= 6000);
        assert!(!audio.samples.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(SymphoniaReader.read(&dir.path().join("absent.wav")).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".wav")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"pas un fichier audio").expect("write");
        file.flush().expect("flush");
        assert!(SymphoniaReader.read(file.path()).is_err());
    }
}
