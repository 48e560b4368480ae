use common::{validate_video, UploadProfile, VideoFile};
use std::path::Path;

use crate::error::FormError;

/// Local form state: one optional file per profile input plus the prompt text.
#[derive(Debug, Clone)]
pub struct Selection {
    profile: UploadProfile,
    max_file_size: u64,
    files: Vec<Option<VideoFile>>,
    prompt: String,
}

impl Selection {
    pub fn new(profile: UploadProfile, max_file_size: u64) -> Self {
        let files = vec![None; profile.inputs.len()];
        Self {
            profile,
            max_file_size,
            files,
            prompt: String::new(),
        }
    }

    pub fn profile(&self) -> &UploadProfile {
        &self.profile
    }

    fn index_of(&self, field: &str) -> Result<usize, FormError> {
        self.profile
            .inputs
            .iter()
            .position(|s| s.field == field)
            .ok_or_else(|| FormError::UnknownInput(field.to_string()))
    }

    /// Puts `file` into the input named `field`. A rejected file leaves the
    /// selection untouched.
    pub fn select(&mut self, field: &str, file: VideoFile) -> Result<(), FormError> {
        let idx = self.index_of(field)?;
        validate_video(&file, self.max_file_size)?;
        log::debug!("Selected {} for {}", file.name, field);
        self.files[idx] = Some(file);
        Ok(())
    }

    pub fn select_path(&mut self, field: &str, path: &Path, mime: Option<&str>) -> Result<(), FormError> {
        let file = VideoFile::from_path(path, mime)?;
        self.select(field, file)
    }

    /// Fills every input in profile order. All files are validated before any
    /// is stored.
    pub fn select_all(&mut self, files: Vec<VideoFile>) -> Result<(), FormError> {
        if files.len() != self.profile.inputs.len() {
            return Err(FormError::WrongInputCount {
                expected: self.profile.inputs.len(),
                got: files.len(),
            });
        }
        for file in &files {
            validate_video(file, self.max_file_size)?;
        }
        self.files = files.into_iter().map(Some).collect();
        Ok(())
    }

    pub fn selected(&self, field: &str) -> Option<&VideoFile> {
        self.index_of(field).ok().and_then(|i| self.files[i].as_ref())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn clear(&mut self) {
        self.files.iter_mut().for_each(|f| *f = None);
        self.prompt.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(Option::is_none) && self.prompt.is_empty()
    }

    /// Whether the submit control would be enabled.
    pub fn is_ready(&self) -> bool {
        self.build().is_ok()
    }

    pub fn build(&self) -> Result<UploadForm, FormError> {
        let missing: Vec<String> = self
            .profile
            .inputs
            .iter()
            .zip(&self.files)
            .filter(|(_, f)| f.is_none())
            .map(|(slot, _)| slot.label.clone())
            .collect();
        if !missing.is_empty() {
            return Err(FormError::MissingInputs { missing });
        }

        let prompt = match &self.profile.prompt {
            Some(slot) => {
                let text = self.prompt.trim();
                if text.is_empty() {
                    return Err(FormError::MissingPrompt);
                }
                Some((slot.field.clone(), text.to_string()))
            }
            None => None,
        };

        let files = self
            .profile
            .inputs
            .iter()
            .zip(&self.files)
            .filter_map(|(slot, f)| f.clone().map(|f| (slot.field.clone(), f)))
            .collect();

        Ok(UploadForm { files, prompt })
    }
}

/// A complete, validated multipart payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    files: Vec<(String, VideoFile)>,
    prompt: Option<(String, String)>,
}

impl UploadForm {
    pub fn files(&self) -> impl Iterator<Item = (&str, &VideoFile)> {
        self.files.iter().map(|(field, f)| (field.as_str(), f))
    }

    pub fn prompt(&self) -> Option<(&str, &str)> {
        self.prompt.as_ref().map(|(field, text)| (field.as_str(), text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{builtin_profiles, SelectionError, MAX_FILE_SIZE};

    fn profile(name: &str) -> UploadProfile {
        builtin_profiles().into_iter().find(|p| p.name == name).unwrap()
    }

    fn video(name: &str) -> VideoFile {
        VideoFile::new(name, "video/mp4", 1024)
    }

    #[test]
    fn rejected_file_leaves_selection_unchanged() {
        let mut sel = Selection::new(profile("sports"), MAX_FILE_SIZE);
        sel.select("character_file", video("athlete.mp4")).unwrap();

        let err = sel
            .select("character_file", VideoFile::new("photo.png", "image/png", 10))
            .unwrap_err();
        assert!(matches!(err, FormError::Selection(SelectionError::NotAVideo { .. })));
        assert_eq!(sel.selected("character_file").unwrap().name, "athlete.mp4");

        let err = sel
            .select("character_file", VideoFile::new("huge.mp4", "video/mp4", MAX_FILE_SIZE + 1))
            .unwrap_err();
        assert!(matches!(err, FormError::Selection(SelectionError::TooLarge { .. })));
        assert_eq!(sel.selected("character_file").unwrap().name, "athlete.mp4");
    }

    #[test]
    fn missing_inputs_block_the_form() {
        let mut sel = Selection::new(profile("sports"), MAX_FILE_SIZE);
        sel.select("character_file", video("a.mp4")).unwrap();
        assert!(!sel.is_ready());
        match sel.build().unwrap_err() {
            FormError::MissingInputs { missing } => assert_eq!(missing, vec!["Interview Style"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pair_form_carries_both_files_in_profile_order() {
        let mut sel = Selection::new(profile("sports"), MAX_FILE_SIZE);
        sel.select("reference_file", video("ref.mp4")).unwrap();
        sel.select("character_file", video("char.mp4")).unwrap();
        let form = sel.build().unwrap();
        let fields: Vec<_> = form.files().map(|(f, v)| (f, v.name.as_str())).collect();
        assert_eq!(fields, vec![("character_file", "char.mp4"), ("reference_file", "ref.mp4")]);
        assert!(form.prompt().is_none());
    }

    #[test]
    fn prompt_is_required_and_trimmed() {
        let mut sel = Selection::new(profile("prompt"), MAX_FILE_SIZE);
        sel.select("file", video("in.mp4")).unwrap();
        sel.set_prompt("   ");
        assert_eq!(sel.build().unwrap_err(), FormError::MissingPrompt);

        sel.set_prompt("  make it rain  ");
        let form = sel.build().unwrap();
        assert_eq!(form.prompt(), Some(("prompt", "make it rain")));
    }

    #[test]
    fn select_all_is_atomic() {
        let mut sel = Selection::new(profile("sports"), MAX_FILE_SIZE);
        let err = sel
            .select_all(vec![video("a.mp4"), VideoFile::new("b.txt", "text/plain", 3)])
            .unwrap_err();
        assert!(matches!(err, FormError::Selection(_)));
        assert!(sel.is_empty());

        assert!(matches!(
            sel.select_all(vec![video("a.mp4")]),
            Err(FormError::WrongInputCount { expected: 2, got: 1 })
        ));

        sel.select_all(vec![video("a.mp4"), video("b.mp4")]).unwrap();
        assert!(sel.is_ready());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut sel = Selection::new(profile("prompt"), MAX_FILE_SIZE);
        assert_eq!(
            sel.select("character_file", video("a.mp4")).unwrap_err(),
            FormError::UnknownInput("character_file".to_string())
        );
    }

    #[test]
    fn clear_resets_everything() {
        let mut sel = Selection::new(profile("prompt"), MAX_FILE_SIZE);
        sel.select("file", video("in.mp4")).unwrap();
        sel.set_prompt("x");
        sel.clear();
        assert!(sel.is_empty());
        assert!(sel.selected("file").is_none());
    }
}
