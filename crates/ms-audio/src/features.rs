use ms_core::features::{AudioFeatures, SpectralFeatures};

/// Centroid at which brightness saturates, Hz.
const BRIGHTNESS_REF_HZ: f32 = 8000.0;
/// Gains bringing raw flux / ZCR / RMS into a usable [0, 1] range.
const FLUX_GAIN: f32 = 4.0;
const ZCR_GAIN: f32 = 4.0;
const ENERGY_GAIN: f32 = 2.0;

/// Map per-window spectral statistics to the published feature set.
///
/// Pure and deterministic: the same `SpectralFeatures` always yields the same
/// `AudioFeatures`. Every field except `tempo` is clamped to [0, 1].
///
/// # Example
/// ```
/// use ms_audio::features::to_audio_features;
/// use ms_core::features::SpectralFeatures;
///
/// let silent = SpectralFeatures { estimated_tempo_bpm: 120.0, ..SpectralFeatures::default() };
/// let f = to_audio_features(&silent);
/// assert_eq!(f.tempo, 120.0);
/// assert_eq!(f.energy, 0.0);
/// ```
#[must_use]
pub fn to_audio_features(s: &SpectralFeatures) -> AudioFeatures {
    let tempo = s.estimated_tempo_bpm;
    let brightness = unit(s.centroid / BRIGHTNESS_REF_HZ);
    let tempo_norm = unit((tempo - 40.0) / 200.0);
    let flux_norm = unit(s.flux.unwrap_or(0.0) * FLUX_GAIN);
    let zcr_norm = unit(s.zero_crossing_rate * ZCR_GAIN);

    let energy = unit(s.rms * ENERGY_GAIN);
    let valence = unit(0.45 * brightness + 0.35 * tempo_norm + 0.2 * (1.0 - s.bass_energy));
    let tempo_fit = unit(1.0 - (tempo - 120.0).abs() / 80.0);
    let danceability = unit(0.5 * tempo_fit + 0.3 * s.bass_energy + 0.2 * flux_norm);
    let acousticness = unit(
        0.5 * (1.0 - s.flatness) + 0.3 * (1.0 - s.treble_energy) + 0.2 * (1.0 - energy),
    );
    let speechiness = unit(0.5 * s.mid_energy * zcr_norm + 0.5 * s.flatness * s.mid_energy);
    let liveness = unit(0.6 * flux_norm + 0.4 * s.flatness);

    AudioFeatures {
        tempo,
        energy,
        valence,
        danceability,
        acousticness,
        instrumentalness: 1.0 - speechiness,
        speechiness,
        liveness,
    }
}

#[inline(always)]
fn unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}
