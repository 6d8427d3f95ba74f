use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Authentication error: {0}")]
    AuthError(String),
    #[error("Quota exceeded: {0}")]
    QuotaError(String),
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("No image payload found: {0}")]
    ExtractionError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Image processing error: {0}")]
    ImageError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl GenerationError {
    /// Short stable label used in batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::ConfigError(_) => "config",
            GenerationError::RequestError(_)
            | GenerationError::AuthError(_)
            | GenerationError::QuotaError(_)
            | GenerationError::ApiError { .. }
            | GenerationError::ResponseError(_) => "generation",
            GenerationError::ExtractionError(_) => "extraction",
            GenerationError::DecodeError(_) | GenerationError::ImageError(_) => "post-processing",
            GenerationError::IoError(_) => "write",
            GenerationError::SerializationError(_) => "serialization",
        }
    }
}

impl From<image::ImageError> for GenerationError {
    fn from(e: image::ImageError) -> Self {
        GenerationError::ImageError(e.to_string())
    }
}

impl From<base64::DecodeError> for GenerationError {
    fn from(e: base64::DecodeError) -> Self {
        GenerationError::DecodeError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
