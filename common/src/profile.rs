use serde::{Deserialize, Serialize};

/// One video input of an upload form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputSlot {
    /// Multipart field name sent to the upload endpoint.
    pub field: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptSlot {
    #[serde(default = "default_prompt_field")]
    pub field: String,
    #[serde(default = "default_prompt_label")]
    pub label: String,
}

fn default_prompt_field() -> String { "prompt".to_string() }
fn default_prompt_label() -> String { "Prompt".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusLabels {
    #[serde(default = "default_submit_label")]
    pub submit: String,
    #[serde(default = "default_processing_label")]
    pub processing: String,
    #[serde(default = "default_completed_label")]
    pub completed: String,
    #[serde(default = "default_failed_label")]
    pub failed: String,
}

fn default_submit_label() -> String { "Submit".to_string() }
fn default_processing_label() -> String { "Processing...".to_string() }
fn default_completed_label() -> String { "Completed".to_string() }
fn default_failed_label() -> String { "Failed".to_string() }

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            submit: default_submit_label(),
            processing: default_processing_label(),
            completed: default_completed_label(),
            failed: default_failed_label(),
        }
    }
}

/// Everything that distinguishes one themed upload form from another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadProfile {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub prompt: Option<PromptSlot>,
    #[serde(default)]
    pub labels: StatusLabels,
    /// Shown next to a failed job's error message.
    #[serde(default)]
    pub tips: Vec<String>,
}

impl UploadProfile {
    pub fn requires_prompt(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn slot(&self, field: &str) -> Option<&InputSlot> {
        self.inputs.iter().find(|s| s.field == field)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("profile name must not be empty".to_string());
        }
        if self.inputs.is_empty() {
            return Err(format!("profile '{}' declares no video inputs", self.name));
        }
        let mut fields: Vec<&str> = self.inputs.iter().map(|s| s.field.as_str()).collect();
        if let Some(p) = &self.prompt {
            fields.push(p.field.as_str());
        }
        let total = fields.len();
        fields.sort_unstable();
        fields.dedup();
        if fields.len() != total {
            return Err(format!("profile '{}' reuses a form field name", self.name));
        }
        Ok(())
    }
}

fn slot(field: &str, label: &str, description: &str) -> InputSlot {
    InputSlot {
        field: field.to_string(),
        label: label.to_string(),
        description: Some(description.to_string()),
    }
}

pub fn builtin_profiles() -> Vec<UploadProfile> {
    vec![
        UploadProfile {
            name: "sports".to_string(),
            title: "SportsVoice AI".to_string(),
            tagline: Some("Transform any athlete into your perfect sports interviewer".to_string()),
            inputs: vec![
                slot("character_file", "Your Athlete", "Video of your favorite player (clear face shot works best)"),
                slot("reference_file", "Interview Style", "Professional interviewer or presenter style to copy"),
            ],
            prompt: None,
            labels: StatusLabels {
                submit: "Create Sports Interview".to_string(),
                processing: "Creating Sports Interview...".to_string(),
                completed: "Sports Content Ready!".to_string(),
                failed: "Production Failed".to_string(),
            },
            tips: vec![
                "Use clear face shots of athletes".to_string(),
                "Choose professional interview videos".to_string(),
                "Ensure good lighting in both videos".to_string(),
            ],
        },
        UploadProfile {
            name: "act-two".to_string(),
            title: "Character Performance".to_string(),
            tagline: Some("Transfer a reference performance onto a character video".to_string()),
            inputs: vec![
                slot("character_file", "Character video", "The face that should perform"),
                slot("reference_file", "Reference performance", "The performance to transfer"),
            ],
            prompt: None,
            labels: StatusLabels {
                submit: "Animate Character".to_string(),
                processing: "Animating character...".to_string(),
                completed: "Animation ready".to_string(),
                failed: "Animation failed".to_string(),
            },
            tips: vec![
                "Front-facing faces work best".to_string(),
                "Avoid motion blur or fast movements".to_string(),
                "Close-up or medium shots are preferred".to_string(),
            ],
        },
        UploadProfile {
            name: "prompt".to_string(),
            title: "Prompt Video Editor".to_string(),
            tagline: Some("Describe the change and let the pipeline render it".to_string()),
            inputs: vec![slot("file", "Source video", "The clip to transform")],
            prompt: Some(PromptSlot {
                field: default_prompt_field(),
                label: "Describe the edit".to_string(),
            }),
            labels: StatusLabels {
                submit: "Generate".to_string(),
                processing: "Generating video...".to_string(),
                completed: "Video ready".to_string(),
                failed: "Generation failed".to_string(),
            },
            tips: vec![
                "Keep prompts short and concrete".to_string(),
                "Videos should be at least 1-2 seconds long".to_string(),
            ],
        },
    ]
}

/// Built-ins overlaid with `extra`; an extra profile replaces a built-in of the same name.
pub fn merge_profiles(extra: &[UploadProfile]) -> Vec<UploadProfile> {
    let mut profiles = builtin_profiles();
    for p in extra {
        match profiles.iter_mut().find(|existing| existing.name == p.name) {
            Some(existing) => *existing = p.clone(),
            None => profiles.push(p.clone()),
        }
    }
    profiles
}
