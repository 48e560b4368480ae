use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
    /// Anything the backend reports that this client does not know about.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Every status other than `processing` ends the job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Server-side job record as returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub character_file: Option<String>,
    #[serde(default)]
    pub reference_file: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<'a> {
    Pending,
    Ready { output_file: &'a str },
    Failed { error: &'a str },
    Inconsistent { reason: String },
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match (self.status, self.output_file.as_deref(), self.error.as_deref()) {
            (JobStatus::Processing, _, _) => Outcome::Pending,
            (JobStatus::Completed, Some(output_file), _) => Outcome::Ready { output_file },
            (JobStatus::Failed, _, Some(error)) => Outcome::Failed { error },
            _ => Outcome::Inconsistent {
                reason: self
                    .check_shape()
                    .err()
                    .unwrap_or_else(|| format!("unrecognised status '{}'", self.status)),
            },
        }
    }

    /// Checks that `output_file` is set iff completed and `error` iff failed.
    pub fn check_shape(&self) -> Result<(), String> {
        let completed = self.status == JobStatus::Completed;
        let failed = self.status == JobStatus::Failed;
        if completed != self.output_file.is_some() {
            return Err(if completed {
                "job completed without an output file".to_string()
            } else {
                format!("job is {} but reports an output file", self.status)
            });
        }
        if failed != self.error.is_some() {
            return Err(if failed {
                "job failed without an error message".to_string()
            } else {
                format!("job is {} but reports an error", self.status)
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Other(serde::de::IgnoredAny),
}

// The backend writes naive local ISO-8601 stamps; accept RFC 3339 as well.
// Timestamps are informational, so anything unparseable is dropped with a
// warning instead of failing the whole record.
fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Text(s)) => match parse_timestamp(&s) {
            Ok(dt) => Ok(Some(dt)),
            Err(e) => {
                log::warn!("Ignoring {}", e);
                Ok(None)
            }
        },
        Some(RawTimestamp::Other(_)) => {
            log::warn!("Ignoring non-string timestamp");
            Ok(None)
        }
    }
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    s.parse::<NaiveDateTime>()
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
}
