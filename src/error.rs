use thiserror::Error;

/// Failures of the smoothing / derivative core.
///
/// All of these are caller or data errors: nothing is retried and nothing is
/// recovered inside the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Malformed window / poly-order relationship, mismatched lengths, or an
    /// unrecognised label such as a spectrum type.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The x grid is not strictly increasing.
    #[error("x values must be strictly increasing: x[{index}] = {value} follows {previous}")]
    NonMonotonicInput {
        index: usize,
        previous: f64,
        value: f64,
    },

    /// The local least-squares system around `index` is rank deficient.
    #[error("singular least-squares fit for the window around index {index}")]
    SingularFit { index: usize },
}

impl AnalysisError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        AnalysisError::InvalidParameter(msg.into())
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
