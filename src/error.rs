//! Error taxonomy for the drum machine core.
//!
//! Each failure family has its own enum so callers can match on exactly what
//! went wrong; `DrumError` collects them for the controller's entry points.
//! Scheduling overruns are not errors: they are recovered from and reported
//! in `TickReport`.

use std::fmt;

use crate::kit::PadId;

/// A kit, pad or pattern was rejected. Nothing was changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    InvalidPad { id: PadId, reason: String },
    DuplicatePadId(PadId),
    DuplicateKey(char),
    EmptyKit,
    StepCountMismatch { pad: PadId, len: usize },
    StepOutOfRange(usize),
    UnknownPad(PadId),
    TempoOutOfRange(u32),
    InvalidRepetitions { section: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::InvalidPad { id, reason } => {
                write!(f, "pad {id} is invalid: {reason}")
            }
            ConfigurationError::DuplicatePadId(id) => write!(f, "pad id {id} appears twice"),
            ConfigurationError::DuplicateKey(key) => {
                write!(f, "key '{key}' triggers more than one pad")
            }
            ConfigurationError::EmptyKit => write!(f, "a kit needs at least one pad"),
            ConfigurationError::StepCountMismatch { pad, len } => {
                write!(f, "pad {pad} has {len} steps, expected 16")
            }
            ConfigurationError::StepOutOfRange(step) => {
                write!(f, "step {step} is outside 0..16")
            }
            ConfigurationError::UnknownPad(id) => write!(f, "pad {id} is not in the kit"),
            ConfigurationError::TempoOutOfRange(bpm) => {
                write!(f, "tempo {bpm} bpm is outside 40..=300")
            }
            ConfigurationError::InvalidRepetitions { section } => {
                write!(f, "section '{section}' must repeat at least once")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Song playback could not continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrangementError {
    /// The named section refers to a pattern the library does not have
    PatternNotFound { section: String, pattern_id: String },
    EmptyArrangement,
}

impl fmt::Display for ArrangementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrangementError::PatternNotFound {
                section,
                pattern_id,
            } => write!(
                f,
                "section '{section}' refers to missing pattern '{pattern_id}'"
            ),
            ArrangementError::EmptyArrangement => write!(f, "arrangement has no sections"),
        }
    }
}

impl std::error::Error for ArrangementError {}

/// The audio output could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    ResourceUnavailable(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ResourceUnavailable(reason) => {
                write!(f, "audio output unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Everything the controller can fail with.
#[derive(Debug)]
pub enum DrumError {
    Configuration(ConfigurationError),
    Arrangement(ArrangementError),
    Engine(EngineError),
    /// A store or generator collaborator failed
    Collaborator(Box<dyn std::error::Error + Send + Sync>),
    /// A record id was not present in the store
    NotFound(String),
}

impl fmt::Display for DrumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrumError::Configuration(err) => write!(f, "configuration rejected: {err}"),
            DrumError::Arrangement(err) => write!(f, "arrangement halted: {err}"),
            DrumError::Engine(err) => write!(f, "{err}"),
            DrumError::Collaborator(err) => write!(f, "collaborator failed: {err}"),
            DrumError::NotFound(id) => write!(f, "no record with id '{id}'"),
        }
    }
}

impl std::error::Error for DrumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrumError::Configuration(err) => Some(err),
            DrumError::Arrangement(err) => Some(err),
            DrumError::Engine(err) => Some(err),
            DrumError::Collaborator(err) => Some(&**err),
            DrumError::NotFound(_) => None,
        }
    }
}

impl From<ConfigurationError> for DrumError {
    fn from(err: ConfigurationError) -> Self {
        DrumError::Configuration(err)
    }
}

impl From<ArrangementError> for DrumError {
    fn from(err: ArrangementError) -> Self {
        DrumError::Arrangement(err)
    }
}

impl From<EngineError> for DrumError {
    fn from(err: EngineError) -> Self {
        DrumError::Engine(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_not_found_names_the_section() {
        let err: DrumError = ArrangementError::PatternNotFound {
            section: "chorus".into(),
            pattern_id: "p9".into(),
        }
        .into();
        let message = err.to_string();
        assert!(message.contains("chorus"));
        assert!(message.contains("p9"));
    }

    #[test]
    fn source_chain_is_preserved() {
        let err: DrumError = ConfigurationError::TempoOutOfRange(500).into();
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("tempo 500 bpm is outside 40..=300"));
    }
}
