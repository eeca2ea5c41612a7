use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The FFT plan cannot be built for this configuration. Fatal to the session.
    #[error("Transformée indisponible : {0}")]
    TransformUnavailable(String),

    /// The window holds fewer frames than the configured size.
    #[error("Échantillons insuffisants : {got} trames reçues, {expected} attendues")]
    InsufficientSamples {
        /// Configured window size, in frames.
        expected: usize,
        /// Frames actually present.
        got: usize,
    },

    /// Channel count or sample rate unusable for this window.
    #[error("Format invalide : {0}")]
    InvalidFormat(String),

    /// The window contains NaN or infinite samples.
    #[error("Échantillons corrompus (valeurs non finies)")]
    CorruptSamples,

    /// `start` called while a session is running.
    #[error("Analyse déjà active")]
    AlreadyActive,

    /// The analysis thread could not be spawned.
    #[error("Thread d'analyse indisponible : {0}")]
    Worker(String),

    /// The capture source refused to start.
    #[error("Erreur de capture : {0}")]
    Capture(String),

    /// No audio input device found.
    #[error("Aucun périphérique audio d'entrée trouvé")]
    NoInputDevice,

    /// Unsupported audio format.
    #[error("Format audio non supporté : {0}")]
    UnsupportedFormat(String),

    /// Audio decode error.
    #[error("Erreur de décodage : {0}")]
    DecodeError(String),
}

impl AudioError {
    /// `true` for errors that only affect the current window; the session
    /// skips the window and carries on.
    #[must_use]
    pub fn is_per_window(&self) -> bool {
        matches!(
            self,
            Self::InsufficientSamples { .. } | Self::InvalidFormat(_) | Self::CorruptSamples
        )
    }
}
