use common::{JobId, SelectionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Cannot read upload file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job {0} has no output file yet")]
    NoOutput(JobId),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

/// Reasons a form cannot be turned into an upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Please select {}", .missing.join(" and "))]
    MissingInputs { missing: Vec<String> },

    #[error("Please enter a prompt")]
    MissingPrompt,

    #[error("Profile has no input named '{0}'")]
    UnknownInput(String),

    #[error("Expected {expected} video file(s), got {got}")]
    WrongInputCount { expected: usize, got: usize },
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),

    /// Shown to the user as a generic failure; the cause goes to the log.
    #[error("Upload failed. Please try again.")]
    Upload(#[source] ClientError),
}
