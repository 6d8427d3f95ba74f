use crate::error::{GenerationError, Result};
use std::env;
use std::path::PathBuf;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const API_KEY_ALIAS_VAR: &str = "GOOGLE_API_KEY";
pub const CREDENTIALS_FILE_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const RUN_ID_VAR: &str = "IMAGE_RUN_ID";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OUTPUT_DIR: &str = "generated_images";
pub const DEFAULT_STYLE: &str = "flat vector illustration";
pub const DEFAULT_SIZE: u32 = 1024;
pub const DEFAULT_QUALITY: u8 = 90;
pub const DEFAULT_BACKGROUND: [u8; 3] = [248, 248, 248];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Style and constraint text appended to every prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptStyle {
    pub style: String,
    pub width: u32,
    pub height: u32,
    pub constraints: Option<String>,
}

impl Default for PromptStyle {
    fn default() -> Self {
        PromptStyle {
            style: DEFAULT_STYLE.to_string(),
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            constraints: None,
        }
    }
}

impl PromptStyle {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            ..Self::default()
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Replaces the generated constraint sentence entirely.
    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    pub fn constraint_text(&self) -> String {
        match &self.constraints {
            Some(text) => text.clone(),
            None => format!(
                "Image size {}x{} pixels. No borders, no background color, no text.",
                self.width, self.height
            ),
        }
    }
}

/// Canvas the decoded image is normalized onto.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    pub format: OutputFormat,
    pub quality: u8,
}

impl Default for OutputSpec {
    fn default() -> Self {
        OutputSpec {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            background: DEFAULT_BACKGROUND,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_QUALITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub output_dir: PathBuf,
    pub run_id: String,
    pub prompts_file: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub style: PromptStyle,
    pub output: OutputSpec,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            run_id: String::new(),
            prompts_file: None,
            request_timeout_secs: None,
            style: PromptStyle::default(),
            output: OutputSpec::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parse_u32 = |key: &str, default: u32| -> Result<u32> {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| {
                        GenerationError::ConfigError(format!("{} must be a positive integer", key))
                    }),
                None => Ok(default),
            }
        };

        let width = parse_u32("IMAGE_WIDTH", DEFAULT_SIZE)?;
        let height = parse_u32("IMAGE_HEIGHT", DEFAULT_SIZE)?;
        let quality = match get("IMAGE_QUALITY") {
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|q| (1..=100).contains(q))
                .ok_or_else(|| {
                    GenerationError::ConfigError("IMAGE_QUALITY must be between 1 and 100".into())
                })?,
            None => DEFAULT_QUALITY,
        };
        let format = match get("IMAGE_FORMAT") {
            Some(raw) => OutputFormat::parse(&raw).ok_or_else(|| {
                GenerationError::ConfigError(format!("Unsupported IMAGE_FORMAT: {}", raw))
            })?,
            None => OutputFormat::Jpeg,
        };
        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                GenerationError::ConfigError("REQUEST_TIMEOUT_SECS must be an integer".into())
            })?),
            None => None,
        };

        let style = PromptStyle::new(get("IMAGE_STYLE").unwrap_or_else(|| DEFAULT_STYLE.into()))
            .with_dimensions(width, height);

        Ok(GeneratorConfig {
            api_key: get(API_KEY_VAR).or_else(|| get(API_KEY_ALIAS_VAR)),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            output_dir: get("IMAGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            run_id: get(RUN_ID_VAR).map(|r| r.trim().to_string()).unwrap_or_default(),
            prompts_file: get("PROMPTS_FILE").map(PathBuf::from),
            request_timeout_secs,
            style,
            output: OutputSpec {
                width,
                height,
                background: DEFAULT_BACKGROUND,
                format,
                quality,
            },
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the canvas size for both the prompt text and the post-processor.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.style = self.style.with_dimensions(width, height);
        self.output.width = width;
        self.output.height = height;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output.format = format;
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            GenerationError::ConfigError(format!(
                "{} (or {}) must be set",
                API_KEY_VAR, API_KEY_ALIAS_VAR
            ))
        })
    }
}

/// Which of the two recognized key names is missing, and the value to copy onto it.
/// Empty values count as unset; nothing is overwritten when both are present.
pub fn api_key_mirror(
    primary: Option<&str>,
    alias: Option<&str>,
) -> Option<(&'static str, String)> {
    let primary = primary.filter(|v| !v.is_empty());
    let alias = alias.filter(|v| !v.is_empty());
    match (primary, alias) {
        (Some(key), None) => Some((API_KEY_ALIAS_VAR, key.to_string())),
        (None, Some(key)) => Some((API_KEY_VAR, key.to_string())),
        _ => None,
    }
}

/// Copies the API key onto whichever of the two recognized names is missing,
/// for collaborators that only read the alternate one. Must run before any
/// threads are spawned.
pub fn mirror_api_key_env() {
    let primary = env::var(API_KEY_VAR).ok();
    let alias = env::var(API_KEY_ALIAS_VAR).ok();
    if let Some((var, key)) = api_key_mirror(primary.as_deref(), alias.as_deref()) {
        env::set_var(var, key);
    }
}
