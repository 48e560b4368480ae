//! Upload-and-poll client for the SportsVoice job API.
//!
//! [`Session`] holds the form state and the job being tracked, [`ApiClient`]
//! talks HTTP, and [`poller`] runs the cancellable status loop.

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, JobApi};
pub use config::Config;
pub use error::{ClientError, FormError, SubmitError};
pub use form::{Selection, UploadForm};
pub use poller::PollHandle;
pub use session::Session;
