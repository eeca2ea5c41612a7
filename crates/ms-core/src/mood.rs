use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::AudioFeatures;

/// Humeur discrète déduite des features audio.
///
/// # Example
/// ```
/// use ms_core::mood::Mood;
/// assert_eq!(Mood::Energetic.to_string(), "energetic");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Fast, loud and bright.
    Energetic,
    /// Slow, quiet and warm.
    Relaxed,
    /// High valence.
    Happy,
    /// Slow, quiet and dark.
    Melancholic,
    /// Moderate energy, neutral valence.
    Focused,
    /// Gentle and warm.
    Romantic,
    /// Fast, loud and dark.
    Angry,
    /// Nothing stands out.
    Neutral,
}

impl Mood {
    /// Every mood, in declaration order.
    pub const ALL: [Mood; 8] = [
        Mood::Energetic,
        Mood::Relaxed,
        Mood::Happy,
        Mood::Melancholic,
        Mood::Focused,
        Mood::Romantic,
        Mood::Angry,
        Mood::Neutral,
    ];

    /// Lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Relaxed => "relaxed",
            Mood::Happy => "happy",
            Mood::Melancholic => "melancholic",
            Mood::Focused => "focused",
            Mood::Romantic => "romantic",
            Mood::Angry => "angry",
            Mood::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a feature set. Rules are evaluated in order and the first match
/// wins; reordering them changes results at the boundaries.
///
/// # Example
/// ```
/// use ms_core::features::AudioFeatures;
/// use ms_core::mood::{classify, Mood};
/// let f = AudioFeatures { tempo: 140.0, energy: 0.9, valence: 0.9, ..AudioFeatures::default() };
/// assert_eq!(classify(&f), Mood::Energetic);
/// ```
#[must_use]
pub fn classify(features: &AudioFeatures) -> Mood {
    let AudioFeatures {
        tempo,
        energy,
        valence,
        ..
    } = *features;

    if tempo > 120.0 && energy > 0.7 {
        return if valence > 0.6 {
            Mood::Energetic
        } else {
            Mood::Angry
        };
    }
    if tempo < 100.0 && energy < 0.4 {
        return if valence > 0.5 {
            Mood::Relaxed
        } else {
            Mood::Melancholic
        };
    }
    if valence > 0.7 {
        return Mood::Happy;
    }
    if (0.5..0.7).contains(&energy) && (0.4..0.6).contains(&valence) {
        return Mood::Focused;
    }
    if energy < 0.6 && (0.5..0.8).contains(&valence) {
        return Mood::Romantic;
    }
    Mood::Neutral
}
