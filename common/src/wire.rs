use serde::{Deserialize, Serialize};
use crate::job::{JobId, JobStatus};

/// Body of a successful `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadReceipt {
    pub job_id: JobId,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

/// Body of `POST /api/validate-videos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteValidation {
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub guidance: Option<Guidance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Guidance {
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
