use crate::{
    config::{GeneratorConfig, OutputSpec},
    error::{GenerationError, Result},
    gemini::ImageGenerator,
    logger,
    models::{GenerationRequest, PromptEntry},
    pipeline::{
        extractor::{extract_image, ResponseSummary},
        filename::FilenameResolver,
        output::OutputDir,
        postprocess::{decode_payload, normalize_image},
        prompt_builder::PromptBuilder,
    },
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Written {
        index: usize,
        path: PathBuf,
    },
    Failed {
        index: usize,
        kind: &'static str,
        message: String,
    },
}

impl EntryOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, EntryOutcome::Written { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchSummary {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct BatchRunner {
    generator: Arc<dyn ImageGenerator>,
    model: String,
    prompts: PromptBuilder,
    filenames: FilenameResolver,
    output_spec: OutputSpec,
    output_root: PathBuf,
    clock: fn() -> i64,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl BatchRunner {
    pub fn new(config: &GeneratorConfig, generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            model: config.model.clone(),
            prompts: PromptBuilder::new(config.style.clone()),
            filenames: FilenameResolver::new(
                config.run_id.clone(),
                config.output.format.extension(),
            ),
            output_spec: config.output.clone(),
            output_root: config.output_dir.clone(),
            clock: now_millis,
        }
    }

    /// Overrides the millisecond clock used for filenames.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Runs every entry in order. Only output directory creation can fail the whole
    /// batch; per-entry failures are logged and recorded in the summary.
    pub async fn run(&self, entries: &[PromptEntry]) -> Result<BatchSummary> {
        let output = OutputDir::create(&self.output_root)?;
        log::info!(
            "📁 Writing {} image(s) to {}",
            entries.len(),
            output.path().display()
        );

        let mut summary = BatchSummary::default();
        for (i, entry) in entries.iter().enumerate() {
            let index = i + 1;
            log::info!("🎨 [{}/{}] {}", index, entries.len(), entry.prompt);
            let _timer = logger::timer(&format!("entry {}", index));

            let outcome = match self.process_entry(&output, index, entry).await {
                Ok(path) => {
                    log::info!("✅ [{}] Saved {}", index, path.display());
                    EntryOutcome::Written { index, path }
                }
                Err(e) => {
                    match &e {
                        GenerationError::ExtractionError(_) => {
                            log::warn!("⚠️  [{}] Skipped: {}", index, e)
                        }
                        _ => log::error!("❌ [{}] Failed: {}", index, e),
                    }
                    EntryOutcome::Failed {
                        index,
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };
            summary.outcomes.push(outcome);
        }

        log::info!(
            "🏁 Batch complete: {} written, {} failed, {} total",
            summary.written(),
            summary.failed(),
            summary.total()
        );
        Ok(summary)
    }

    async fn process_entry(
        &self,
        output: &OutputDir,
        index: usize,
        entry: &PromptEntry,
    ) -> Result<PathBuf> {
        let request = GenerationRequest::new(&self.model, self.prompts.build(&entry.prompt));
        log::debug!("Prompt: {}", request.prompt);

        let response = self.generator.generate(&request).await?;

        let image = extract_image(&response).ok_or_else(|| {
            let diagnostics = ResponseSummary::from_response(&response);
            log::warn!("🔍 [{}] Response summary: {}", index, diagnostics);
            GenerationError::ExtractionError(format!(
                "{} candidate(s), no image/* inline data within depth",
                diagnostics.candidates.len()
            ))
        })?;
        log::debug!(
            "Found {} payload ({} base64 chars)",
            image.mime_type,
            image.data.len()
        );

        let bytes = decode_payload(&image.data)?;
        let spec = self.output_spec.clone();
        let encoded = tokio::task::spawn_blocking(move || normalize_image(&bytes, &spec))
            .await
            .map_err(|e| GenerationError::ImageError(format!("post-processing task: {}", e)))??;

        let filename = self
            .filenames
            .resolve(index, entry.filename.as_deref(), (self.clock)());
        output.write(&filename, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Replays canned results in order and records the prompts it saw.
    struct FakeGenerator {
        responses: Mutex<Vec<Result<Value>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(mut responses: Vec<Result<Value>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(GenerationError::RequestError("no more responses".into())))
        }
    }

    fn png_base64(width: u32, height: u32) -> String {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        BASE64.encode(bytes)
    }

    fn image_response(data: String) -> Value {
        json!({"candidates": [{"content": {"parts": [
            {"text": "Here is your image"},
            {"inlineData": {"mimeType": "image/png", "data": data}}
        ]}}]})
    }

    fn fixed_clock() -> i64 {
        1_700_000_000_000
    }

    fn config(dir: &std::path::Path) -> GeneratorConfig {
        GeneratorConfig::new()
            .with_output_dir(dir.join("out"))
            .with_dimensions(64, 48)
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![
            Ok(image_response(png_base64(30, 90))),
            Err(GenerationError::QuotaError("slow down".into())),
            Ok(json!({"candidates": [{"content": {"parts": [{"text": "sorry"}]}}]})),
            Ok(image_response("%%%not-base64%%%".into())),
            Ok(image_response(BASE64.encode(b"not a png"))),
            Ok(image_response(png_base64(90, 30))),
        ]));
        let runner = BatchRunner::new(&config(dir.path()).with_run_id("run1"), generator.clone())
            .with_clock(fixed_clock);

        let entries = vec![
            PromptEntry::new("a ruler").with_filename("ruler.png"),
            PromptEntry::new("a pencil"),
            PromptEntry::new("a pen"),
            PromptEntry::new("an eraser"),
            PromptEntry::new("a stapler"),
            PromptEntry::new("a globe"),
        ];
        let summary = runner.run(&entries).await.unwrap();

        assert_eq!(summary.total(), 6);
        assert_eq!(summary.written(), 2);
        assert_eq!(summary.failed(), 4);

        let kinds: Vec<&str> = summary
            .outcomes
            .iter()
            .filter_map(|o| match o {
                EntryOutcome::Failed { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["generation", "extraction", "post-processing", "post-processing"]);

        let out = dir.path().join("out");
        let mut files: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(
            files,
            vec!["image_6_run1_1700000000000.jpg", "run1_ruler.jpg"]
        );

        for name in &files {
            let decoded = image::open(out.join(name)).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (64, 48));
        }

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 6);
        assert!(prompts[0].starts_with("a ruler -- Style: \""));
        assert!(prompts[0].contains("64x48"));
    }

    #[tokio::test]
    async fn test_nested_payload_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![Ok(json!({
            "envelope": {"result": [{"media": {"mimeType": "image/png", "data": png_base64(8, 8)}}]}
        }))]));
        let runner = BatchRunner::new(&config(dir.path()), generator).with_clock(fixed_clock);

        let summary = runner.run(&[PromptEntry::new("x")]).await.unwrap();
        assert_eq!(
            summary.outcomes,
            vec![EntryOutcome::Written {
                index: 1,
                path: dir.path().join("out").join("image_1_1700000000000.jpg"),
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_still_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(&config(dir.path()), Arc::new(FakeGenerator::new(vec![])));
        let summary = runner.run(&[]).await.unwrap();
        assert_eq!(summary.total(), 0);
        assert!(dir.path().join("out").is_dir());
    }
}
