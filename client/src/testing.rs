use async_trait::async_trait;
use common::{Job, JobId, JobStatus, UploadReceipt};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

use crate::api::JobApi;
use crate::error::ClientError;
use crate::form::UploadForm;

pub(crate) fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: JobId::from(id),
        status,
        prompt: None,
        input_file: None,
        character_file: Some(format!("{}_character.mp4", id)),
        reference_file: Some(format!("{}_reference.mp4", id)),
        output_file: (status == JobStatus::Completed).then(|| "out.mp4".to_string()),
        error: (status == JobStatus::Failed).then(|| "X".to_string()),
        created_at: None,
        completed_at: None,
    }
}

/// Scripted backend. Once the poll script runs out every fetch reports
/// `processing`.
pub(crate) struct FakeApi {
    script: Mutex<VecDeque<Result<Job, ClientError>>>,
    polls: Mutex<Vec<(String, Instant)>>,
    submissions: Mutex<Vec<UploadForm>>,
    reject_uploads: bool,
}

impl FakeApi {
    pub(crate) fn with_polls(script: Vec<Result<Job, ClientError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            polls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            reject_uploads: false,
        }
    }

    pub(crate) fn rejecting_uploads() -> Self {
        Self {
            reject_uploads: true,
            ..Self::with_polls(vec![])
        }
    }

    pub(crate) fn server_error() -> ClientError {
        ClientError::Status {
            url: "http://fake/api".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream unavailable".to_string(),
        }
    }

    pub(crate) fn polls(&self) -> Vec<(String, Instant)> {
        self.polls.lock().unwrap().clone()
    }

    pub(crate) fn submissions(&self) -> Vec<UploadForm> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobApi for FakeApi {
    async fn submit(&self, form: &UploadForm) -> Result<UploadReceipt, ClientError> {
        self.submissions.lock().unwrap().push(form.clone());
        if self.reject_uploads {
            return Err(Self::server_error());
        }
        Ok(UploadReceipt {
            job_id: JobId::from("abc"),
            status: Some(JobStatus::Processing),
        })
    }

    async fn fetch_job(&self, id: &JobId) -> Result<Job, ClientError> {
        self.polls.lock().unwrap().push((id.0.clone(), Instant::now()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(job(&id.0, JobStatus::Processing)))
    }
}
