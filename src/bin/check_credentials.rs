use imgbatch::{credentials, logger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init()?;
    if !dotenv_loaded {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    log::info!("🔍 Checking Gemini credentials...");
    let report = credentials::inspect_env();
    report.log();

    if report.has_warnings() {
        log::warn!("⚠️  Credential check finished with warnings");
    } else {
        log::info!("✅ Credential check finished");
    }
    Ok(())
}
