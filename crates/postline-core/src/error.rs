use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Parse failures for domain string values coming off the wire or out of
/// the database.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown post status: {0}")]
    UnknownPostStatus(String),
    #[error("unknown content type: {0}")]
    UnknownContentType(String),
    #[error("unknown content format: {0}")]
    UnknownContentFormat(String),
    #[error("unknown launch status: {0}")]
    UnknownLaunchStatus(String),
    #[error("unknown launch category: {0}")]
    UnknownLaunchCategory(String),
    #[error("unknown phase status: {0}")]
    UnknownPhaseStatus(String),
    #[error("unknown schedule status: {0}")]
    UnknownScheduleStatus(String),
}

/// Local validation failures, caught before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one profile must be selected")]
    NoProfilesSelected,
    #[error("copy references profile {profile_id}, which is not among the post's profiles")]
    CopyForUnselectedProfile { profile_id: i64 },
    #[error("status cannot change from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },
    #[error("date range end must not precede start")]
    EmptyDateRange,
}
