pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod pipeline;

pub use config::{GeneratorConfig, OutputFormat, OutputSpec, PromptStyle};
pub use error::{GenerationError, Result};
pub use gemini::{GeminiClient, ImageGenerator};
pub use models::*;
pub use pipeline::{BatchRunner, BatchSummary, EntryOutcome};
