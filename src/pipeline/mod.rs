pub mod batch;
pub mod extractor;
pub mod filename;
pub mod output;
pub mod postprocess;
pub mod prompt_builder;

pub use batch::{BatchRunner, BatchSummary, EntryOutcome};
pub use extractor::{extract_image, ResponseSummary};
pub use filename::FilenameResolver;
pub use output::OutputDir;
pub use postprocess::normalize_image;
pub use prompt_builder::PromptBuilder;
