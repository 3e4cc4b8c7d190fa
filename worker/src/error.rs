use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Step of a run an engine error surfaced from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    Session,
    Research,
    Synthesis,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Configuration => "configuration",
            Phase::Session => "session",
            Phase::Research => "research",
            Phase::Synthesis => "synthesis",
        })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("No API Key (Gemini or OpenAI) found.")]
    MissingCredentials,

    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("{phase} failed: {source}")]
    Engine {
        phase: Phase,
        source: researcher::Error,
    },

    #[error("persistence failed: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Tags an engine error with the phase it came from, for `map_err`.
    pub fn engine(phase: Phase) -> impl FnOnce(researcher::Error) -> Self {
        move |source| Error::Engine { phase, source }
    }
}
