use crate::detect::SearchError;
use crate::table::TableError;

/// Failures that end a scan early with a dedicated exit status.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("No log file specified")]
    MissingInput,

    #[error("No maximum orbital period specified")]
    MissingMaxPeriod,

    #[error("Maximum orbital period ({max} days) must be greater than the minimum orbital period ({min} days)")]
    DegenerateRange { min: f64, max: f64 },

    #[error("Number of data samples too small: {found} (need {required})")]
    TooFewSamples { found: usize, required: usize },

    #[error("No sections detected in the time series")]
    NoSegments,

    #[error("No transits detected")]
    NoTransit,

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Failure = 1,
    Usage = 2,
    NoInput = 3,
    NoMaxPeriod = 4,
    InvalidSearchSpace = 5,
    TooFewSamples = 6,
    NoSegments = 7,
    NoTransit = 8,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl ScanError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ScanError::MissingInput => ExitStatus::NoInput,
            ScanError::MissingMaxPeriod => ExitStatus::NoMaxPeriod,
            ScanError::DegenerateRange { .. } => ExitStatus::InvalidSearchSpace,
            ScanError::TooFewSamples { .. } => ExitStatus::TooFewSamples,
            ScanError::NoSegments => ExitStatus::NoSegments,
            ScanError::NoTransit => ExitStatus::NoTransit,
            ScanError::Search(SearchError::ThreadPool(_)) => ExitStatus::Failure,
            ScanError::Search(_) => ExitStatus::InvalidSearchSpace,
            ScanError::Table(_) => ExitStatus::Failure,
        }
    }
}

/// Exit status for an error bubbled up through `anyhow`.
pub fn exit_status(err: &anyhow::Error) -> ExitStatus {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ScanError>())
        .map_or(ExitStatus::Failure, ScanError::exit_status)
}
