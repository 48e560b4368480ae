pub mod job;
pub mod profile;
pub mod validation;
pub mod wire;

pub use job::{Job, JobId, JobStatus, Outcome};
pub use profile::{builtin_profiles, merge_profiles, InputSlot, PromptSlot, StatusLabels, UploadProfile};
pub use validation::{validate_video, SelectionError, VideoFile, MAX_FILE_SIZE};
pub use wire::{Guidance, HealthStatus, RemoteValidation, UploadReceipt};

// Backend contract
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const JOBS_PATH: &str = "/api/jobs";
pub const MEDIA_PREFIX: &str = "/jobs";
pub const VALIDATE_PATH: &str = "/api/validate-videos";
pub const HEALTH_PATH: &str = "/health";
pub const POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_PROFILE: &str = "sports";

pub const USER_CONFIG_PATH: &str = "~/.config/sportsvoice/config.yaml";

/// Joins the media prefix and a server-supplied file name verbatim.
pub fn media_path(prefix: &str, output_file: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), output_file)
}
