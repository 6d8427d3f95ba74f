use imgbatch::{
    config::mirror_api_key_env, logger, models, BatchRunner, GeminiClient, GeneratorConfig,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    // env::set_var is only sound while the process is still single-threaded.
    mirror_api_key_env();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(dotenv_loaded))
}

async fn run(dotenv_loaded: bool) -> Result<(), Box<dyn std::error::Error>> {
    logger::init()?;
    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = GeneratorConfig::from_env()?;
    logger::log_config_info(&config);

    let entries = match &config.prompts_file {
        Some(path) => {
            log::info!("📄 Loading prompts from {}", path.display());
            models::load_prompt_entries(path)?
        }
        None => {
            log::info!("📄 No PROMPTS_FILE set, using the built-in prompt list");
            models::default_prompt_entries()
        }
    };

    let client = match GeminiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    let runner = BatchRunner::new(&config, Arc::new(client));
    let summary = runner.run(&entries).await?;

    if summary.failed() > 0 {
        log::warn!(
            "💡 {} of {} entries produced no image; see the messages above",
            summary.failed(),
            summary.total()
        );
    }
    log::info!("🎉 Done. Images are in {}", config.output_dir.display());

    Ok(())
}
