use serde::{Deserialize, Serialize};

/// Statistiques spectrales d'une fenêtre d'analyse.
///
/// Recomputed for every window and never persisted.
///
/// # Example
/// ```
/// use ms_core::features::SpectralFeatures;
/// let f = SpectralFeatures::default();
/// assert!(f.flux.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SpectralFeatures {
    // === Domaine temporel ===
    /// Root mean square of the mono downmix.
    pub rms: f32,
    /// Fraction of adjacent sample pairs that change sign [0.0, 1.0].
    pub zero_crossing_rate: f32,

    // === Forme spectrale ===
    /// Magnitude-weighted mean frequency, Hz. 0 for silence.
    pub centroid: f32,
    /// Magnitude-weighted standard deviation around the centroid, Hz.
    pub spread: f32,
    /// Frequency below which the rolloff fraction of energy lies, Hz.
    pub rolloff: f32,
    /// L2 distance to the previous window's magnitudes. `None` on the first
    /// window of a session.
    pub flux: Option<f32>,
    /// Geometric mean / arithmetic mean of the magnitudes [0.0, 1.0].
    pub flatness: f32,

    // === Bandes (somme = 1, ou toutes à 0) ===
    /// Share of energy below the bass cutoff.
    pub bass_energy: f32,
    /// Share of energy between the bass and treble cutoffs.
    pub mid_energy: f32,
    /// Share of energy above the treble cutoff.
    pub treble_energy: f32,

    // === Timbre & rythme ===
    /// Mel-frequency cepstral coefficients.
    pub mfcc: Vec<f32>,
    /// Tempo estimate, clamped to the configured BPM range.
    pub estimated_tempo_bpm: f32,
}

/// High-level perceptual features published to subscribers.
///
/// Every field except `tempo` lies in [0.0, 1.0]. Plain data, `Copy`,
/// compared by exact value.
///
/// # Example
/// ```
/// use ms_core::features::AudioFeatures;
/// let f = AudioFeatures::default();
/// assert_eq!(f.energy, 0.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AudioFeatures {
    /// Tempo in beats per minute.
    pub tempo: f32,
    /// Loudness-driven intensity.
    pub energy: f32,
    /// Musical positiveness.
    pub valence: f32,
    /// Suitability for dancing.
    pub danceability: f32,
    /// Confidence the signal is acoustic.
    pub acousticness: f32,
    /// Confidence the signal carries no vocals.
    pub instrumentalness: f32,
    /// Presence of spoken words.
    pub speechiness: f32,
    /// Presence of an audience / live room.
    pub liveness: f32,
}

impl AudioFeatures {
    /// Field-by-field arithmetic mean. `None` for an empty input.
    ///
    /// # Example
    /// ```
    /// use ms_core::features::AudioFeatures;
    /// let a = AudioFeatures { tempo: 100.0, energy: 0.2, ..AudioFeatures::default() };
    /// let b = AudioFeatures { tempo: 140.0, energy: 0.6, ..AudioFeatures::default() };
    /// let mean = AudioFeatures::mean([a, b].iter()).unwrap();
    /// assert_eq!(mean.tempo, 120.0);
    /// assert!(AudioFeatures::mean([].iter()).is_none());
    /// ```
    pub fn mean<'a, I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a AudioFeatures>,
    {
        let mut sum = Self::default();
        let mut count = 0usize;
        for f in items {
            sum.tempo += f.tempo;
            sum.energy += f.energy;
            sum.valence += f.valence;
            sum.danceability += f.danceability;
            sum.acousticness += f.acousticness;
            sum.instrumentalness += f.instrumentalness;
            sum.speechiness += f.speechiness;
            sum.liveness += f.liveness;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f32;
        Some(Self {
            tempo: sum.tempo / n,
            energy: sum.energy / n,
            valence: sum.valence / n,
            danceability: sum.danceability / n,
            acousticness: sum.acousticness / n,
            instrumentalness: sum.instrumentalness / n,
            speechiness: sum.speechiness / n,
            liveness: sum.liveness / n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_field_wise() {
        let frames = [
            AudioFeatures {
                tempo: 90.0,
                energy: 0.1,
                valence: 0.3,
                liveness: 1.0,
                ..AudioFeatures::default()
            },
            AudioFeatures {
                tempo: 110.0,
                energy: 0.3,
                valence: 0.5,
                liveness: 0.0,
                ..AudioFeatures::default()
            },
        ];
        let mean = AudioFeatures::mean(frames.iter()).expect("non-empty");
        assert!((mean.tempo - 100.0).abs() < f32::EPSILON);
        assert!((mean.energy - 0.2).abs() < 1e-6);
        assert!((mean.valence - 0.4).abs() < 1e-6);
        assert!((mean.liveness - 0.5).abs() < f32::EPSILON);
        assert_eq!(mean.speechiness, 0.0);
    }

    #[test]
    fn audio_features_survive_json() {
        let f = AudioFeatures {
            tempo: 128.0,
            energy: 0.75,
            valence: 0.5,
            ..AudioFeatures::default()
        };
        let json = serde_json::to_string(&f).expect("serialize");
        let back: AudioFeatures = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, f);
    }
}
