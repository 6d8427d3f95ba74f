pub mod client;

use crate::{error::Result, models::GenerationRequest};
use async_trait::async_trait;
use serde_json::Value;

pub use client::GeminiClient;

/// Anything that turns a generation request into a raw JSON response.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value>;
}
