use common::{Job, JobId, UploadProfile, VideoFile};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::JobApi;
use crate::error::{FormError, SubmitError};
use crate::form::Selection;
use crate::poller::{self, PollHandle};

/// One upload form and the job it is currently tracking.
///
/// At most one poll chain is alive per session. Submitting again, calling
/// [`Session::reset`] or dropping the session cancels it.
pub struct Session<A: JobApi> {
    api: Arc<A>,
    selection: Selection,
    poll_interval: Duration,
    active: Option<PollHandle>,
}

impl<A: JobApi> Session<A> {
    pub fn new(api: Arc<A>, profile: UploadProfile, max_file_size: u64, poll_interval: Duration) -> Self {
        Self {
            api,
            selection: Selection::new(profile, max_file_size),
            poll_interval,
            active: None,
        }
    }

    pub fn profile(&self) -> &UploadProfile {
        self.selection.profile()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select(&mut self, field: &str, file: VideoFile) -> Result<(), FormError> {
        self.selection.select(field, file)
    }

    pub fn select_path(&mut self, field: &str, path: &Path, mime: Option<&str>) -> Result<(), FormError> {
        self.selection.select_path(field, path, mime)
    }

    pub fn select_all(&mut self, files: Vec<VideoFile>) -> Result<(), FormError> {
        self.selection.select_all(files)
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.selection.set_prompt(prompt);
    }

    pub fn can_submit(&self) -> bool {
        self.selection.is_ready()
    }

    /// Validates the form, issues exactly one upload and starts polling the
    /// returned job. Nothing is sent when the form is incomplete. A failed
    /// upload leaves any job already being tracked untouched.
    pub async fn submit(&mut self) -> Result<JobId, SubmitError> {
        let form = self.selection.build()?;

        let receipt = self.api.submit(&form).await.map_err(|e| {
            log::error!("Upload error: {}", e);
            SubmitError::Upload(e)
        })?;

        self.track(receipt.job_id.clone());
        Ok(receipt.job_id)
    }

    /// Starts polling a job that was created elsewhere.
    pub fn track(&mut self, job_id: JobId) {
        self.stop_tracking();
        self.active = Some(poller::spawn(self.api.clone(), job_id, self.poll_interval));
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.active.as_ref().map(PollHandle::job_id)
    }

    /// Latest snapshot of the tracked job.
    pub fn job(&self) -> Option<Job> {
        self.active.as_ref().and_then(PollHandle::latest)
    }

    pub fn poll_handle(&self) -> Option<&PollHandle> {
        self.active.as_ref()
    }

    /// Waits until the tracked job is terminal or its polling was stopped.
    pub async fn wait_terminal(&self) -> Option<Job> {
        match &self.active {
            Some(handle) => handle.wait_terminal().await,
            None => None,
        }
    }

    fn stop_tracking(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }

    /// Back to the initial state: no files, no prompt, no job.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.stop_tracking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{job, FakeApi};
    use common::{builtin_profiles, JobStatus, SelectionError, MAX_FILE_SIZE};

    const INTERVAL: Duration = Duration::from_millis(3000);

    fn session(api: Arc<FakeApi>, profile: &str) -> Session<FakeApi> {
        let profile = builtin_profiles().into_iter().find(|p| p.name == profile).unwrap();
        Session::new(api, profile, MAX_FILE_SIZE, INTERVAL)
    }

    fn video(name: &str) -> VideoFile {
        VideoFile::new(name, "video/mp4", 2048)
    }

    #[tokio::test(start_paused = true)]
    async fn submit_sends_one_request_with_both_files_then_polls() {
        let api = Arc::new(FakeApi::with_polls(vec![
            Ok(job("abc", JobStatus::Processing)),
            Ok(job("abc", JobStatus::Completed)),
        ]));
        let mut s = session(api.clone(), "sports");
        s.select("character_file", video("athlete.mp4")).unwrap();
        s.select("reference_file", video("anchor.mp4")).unwrap();
        assert!(s.can_submit());

        let id = s.submit().await.unwrap();
        assert_eq!(id, JobId::from("abc"));

        let submissions = api.submissions();
        assert_eq!(submissions.len(), 1);
        let names: Vec<_> = submissions[0].files().map(|(field, f)| (field, f.name.clone())).collect();
        assert_eq!(
            names,
            vec![
                ("character_file", "athlete.mp4".to_string()),
                ("reference_file", "anchor.mp4".to_string())
            ]
        );

        let done = s.wait_terminal().await.unwrap();
        assert_eq!(done.output_file.as_deref(), Some("out.mp4"));
        assert_eq!(api.polls().len(), 2);
        assert_eq!(s.job().unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn prompt_variant_sends_prompt() {
        let api = Arc::new(FakeApi::with_polls(vec![Ok(job("abc", JobStatus::Failed))]));
        let mut s = session(api.clone(), "prompt");
        s.select("file", video("in.mp4")).unwrap();
        s.set_prompt(" add confetti ");
        s.submit().await.unwrap();

        let submissions = api.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].prompt(), Some(("prompt", "add confetti")));

        let done = s.wait_terminal().await.unwrap();
        assert_eq!(done.error.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn incomplete_form_makes_no_request() {
        let api = Arc::new(FakeApi::with_polls(vec![]));
        let mut s = session(api.clone(), "sports");
        s.select("character_file", video("a.mp4")).unwrap();

        let err = s.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Form(FormError::MissingInputs { .. })));
        assert!(api.submissions().is_empty());
        assert!(api.polls().is_empty());
        assert!(s.job_id().is_none());
    }

    #[tokio::test]
    async fn rejected_selection_does_not_change_state() {
        let api = Arc::new(FakeApi::with_polls(vec![]));
        let mut s = session(api, "sports");
        let err = s
            .select("character_file", VideoFile::new("a.gif", "image/gif", 10))
            .unwrap_err();
        assert!(matches!(err, FormError::Selection(SelectionError::NotAVideo { .. })));
        assert!(s.selection().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_is_generic_and_starts_no_polling() {
        let api = Arc::new(FakeApi::rejecting_uploads());
        let mut s = session(api.clone(), "sports");
        s.select_all(vec![video("a.mp4"), video("b.mp4")]).unwrap();

        let err = s.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Upload(_)));
        assert_eq!(err.to_string(), "Upload failed. Please try again.");
        assert_eq!(api.submissions().len(), 1);
        assert!(s.job_id().is_none());
        // The selection survives so the user can retry.
        assert!(s.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_resubmit_keeps_tracking_previous_job() {
        let api = Arc::new(FakeApi::rejecting_uploads());
        let mut s = session(api.clone(), "sports");
        s.track(JobId::from("old"));
        s.select_all(vec![video("a.mp4"), video("b.mp4")]).unwrap();

        let err = s.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Upload(_)));
        assert_eq!(s.job_id(), Some(&JobId::from("old")));

        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(100)).await;
        let old_polls = api.polls().iter().filter(|(id, _)| id == "old").count();
        assert_eq!(old_polls, 4);
        assert!(s.job().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_state_and_stops_polling() {
        let api = Arc::new(FakeApi::with_polls(vec![]));
        let mut s = session(api.clone(), "prompt");
        s.select("file", video("in.mp4")).unwrap();
        s.set_prompt("slow it down");
        s.submit().await.unwrap();

        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(api.polls().len(), 2);
        assert!(s.job().is_some());

        s.reset();
        assert!(s.selection().is_empty());
        assert!(s.job().is_none());
        assert!(s.job_id().is_none());

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(api.polls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_a_new_job_cancels_the_old_chain() {
        let api = Arc::new(FakeApi::with_polls(vec![]));
        let mut s = session(api.clone(), "sports");
        s.track(JobId::from("first"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        s.track(JobId::from("second"));
        tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(100)).await;

        let polls = api.polls();
        assert_eq!(polls.iter().filter(|(id, _)| id == "first").count(), 1);
        assert_eq!(polls.iter().filter(|(id, _)| id == "second").count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_stops_polling() {
        let api = Arc::new(FakeApi::with_polls(vec![]));
        let mut s = session(api.clone(), "sports");
        s.track(JobId::from("abc"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(s);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(api.polls().len(), 1);
    }
}
