use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One unit of work: a prompt and an optional output filename template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub prompt: String,
    #[serde(default)]
    pub filename: Option<String>,
}

impl PromptEntry {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Items in a prompts file may be bare strings or full objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPromptEntry {
    Text(String),
    Entry(PromptEntry),
}

impl From<RawPromptEntry> for PromptEntry {
    fn from(raw: RawPromptEntry) -> Self {
        match raw {
            RawPromptEntry::Text(prompt) => PromptEntry::new(prompt),
            RawPromptEntry::Entry(entry) => entry,
        }
    }
}

pub fn parse_prompt_entries(json: &str) -> Result<Vec<PromptEntry>> {
    let raw: Vec<RawPromptEntry> = serde_json::from_str(json)
        .map_err(|e| GenerationError::SerializationError(format!("Invalid prompts file: {}", e)))?;

    let entries: Vec<PromptEntry> = raw.into_iter().map(PromptEntry::from).collect();
    if let Some(index) = entries.iter().position(|e| e.prompt.trim().is_empty()) {
        return Err(GenerationError::ConfigError(format!(
            "Prompt entry {} is empty",
            index + 1
        )));
    }
    Ok(entries)
}

pub fn load_prompt_entries(path: &Path) -> Result<Vec<PromptEntry>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        GenerationError::ConfigError(format!("Cannot read prompts file {}: {}", path.display(), e))
    })?;
    parse_prompt_entries(&contents)
}

/// Built-in batch used when no prompts file is configured.
pub fn default_prompt_entries() -> Vec<PromptEntry> {
    vec![
        PromptEntry::new("a wooden ruler with centimeter markings").with_filename("ruler.png"),
        PromptEntry::new("a yellow pencil with a pink eraser").with_filename("pencil.png"),
        PromptEntry::new("an open spiral notebook with lined pages")
            .with_filename("notebook_{timestamp}.png"),
        PromptEntry::new("a pair of blue safety scissors").with_filename("scissors.png"),
        PromptEntry::new("a red backpack with two front pockets"),
        PromptEntry::new("a green glue stick with the cap off"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_shapes_resolve_to_entries() {
        let entries = parse_prompt_entries(
            r#"["a ruler", {"prompt": "a pencil", "filename": "pencil.png"}, {"prompt": "a pen"}]"#,
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![
                PromptEntry::new("a ruler"),
                PromptEntry::new("a pencil").with_filename("pencil.png"),
                PromptEntry::new("a pen"),
            ]
        );
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let err = parse_prompt_entries(r#"["ok", "  "]"#).unwrap_err();
        assert!(err.to_string().contains("Prompt entry 2"));
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        assert!(parse_prompt_entries(r#"{"prompt": "not a list"}"#).is_err());
        assert!(parse_prompt_entries(r#"[42]"#).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        fs::write(&path, r#"["a compass"]"#).unwrap();
        assert_eq!(load_prompt_entries(&path).unwrap().len(), 1);
        assert!(load_prompt_entries(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_default_list_is_not_empty() {
        assert!(!default_prompt_entries().is_empty());
    }
}
