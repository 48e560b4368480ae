use comfy_table::Table;
use common::{Job, JobStatus, Outcome, RemoteValidation, StatusLabels, UploadProfile};
use std::fmt::Write;

pub fn status_badge(status: JobStatus, labels: &StatusLabels) -> String {
    match status {
        JobStatus::Processing => format!("⏳ {}", labels.processing),
        JobStatus::Completed => format!("✅ {}", labels.completed),
        JobStatus::Failed => format!("❌ {}", labels.failed),
        JobStatus::Unknown => "❔ Unknown status".to_string(),
    }
}

/// Text view of a job snapshot. `media_url` turns the server-supplied
/// output file name into a fetchable URL.
pub fn job_view(job: &Job, profile: &UploadProfile, media_url: impl Fn(&str) -> String) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Job:       {}", job.id);
    let _ = writeln!(out, "Status:    {}", status_badge(job.status, &profile.labels));
    if let Some(prompt) = &job.prompt {
        let _ = writeln!(out, "Prompt:    {}", prompt);
    }
    if let Some(created) = job.created_at {
        let _ = writeln!(out, "Created:   {}", created.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(completed) = job.completed_at {
        let _ = writeln!(out, "Finished:  {}", completed.format("%Y-%m-%d %H:%M:%S"));
    }

    match job.outcome() {
        Outcome::Pending => {
            let _ = writeln!(out, "This may take a few minutes.");
        }
        Outcome::Ready { output_file } => {
            let _ = writeln!(out, "Result:    {}", media_url(output_file));
        }
        Outcome::Failed { error } => {
            let _ = writeln!(out, "Error:     {}", error);
            if !profile.tips.is_empty() {
                let _ = writeln!(out, "Tips for better results:");
                for tip in &profile.tips {
                    let _ = writeln!(out, "  - {}", tip);
                }
            }
        }
        Outcome::Inconsistent { reason } => {
            let _ = writeln!(out, "Warning:   {}", reason);
        }
    }
    out
}

pub fn remote_validation(report: &RemoteValidation) -> String {
    let mut out = String::new();
    if report.valid {
        let _ = writeln!(out, "Server accepted the videos.");
    } else {
        let _ = writeln!(out, "Server rejected the videos:");
        for issue in &report.issues {
            let _ = writeln!(out, "  - {}", issue);
        }
    }
    if let Some(guidance) = &report.guidance {
        if !guidance.requirements.is_empty() {
            let _ = writeln!(out, "Requirements:");
            for r in &guidance.requirements {
                let _ = writeln!(out, "  - {}", r);
            }
        }
        if !guidance.tips.is_empty() {
            let _ = writeln!(out, "Tips:");
            for t in &guidance.tips {
                let _ = writeln!(out, "  - {}", t);
            }
        }
    }
    out
}

pub fn profiles_table(profiles: &[UploadProfile], default: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Title", "Inputs", "Prompt"]);
    for p in profiles {
        let name = if p.name == default {
            format!("{} (default)", p.name)
        } else {
            p.name.clone()
        };
        let inputs = p
            .inputs
            .iter()
            .map(|s| format!("{} [{}]", s.label, s.field))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = p.prompt.as_ref().map(|s| s.label.clone()).unwrap_or_else(|| "-".to_string());
        table.add_row(vec![name, p.title.clone(), inputs, prompt]);
    }
    table
}
