//! Local credential diagnostics for the `check-credentials` binary.

use crate::config::{API_KEY_ALIAS_VAR, API_KEY_VAR, CREDENTIALS_FILE_VAR, RUN_ID_VAR};
use log::Level;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;

const SECRET_VARS: [&str; 2] = [API_KEY_VAR, API_KEY_ALIAS_VAR];
const PLAIN_VARS: [&str; 4] = [
    CREDENTIALS_FILE_VAR,
    "GOOGLE_CLOUD_PROJECT",
    "GOOGLE_CLOUD_LOCATION",
    RUN_ID_VAR,
];
const SUMMARY_FIELDS: [&str; 3] = ["type", "project_id", "client_email"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub level: Level,
    pub text: String,
}

impl ReportLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    fn warn(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialReport {
    pub lines: Vec<ReportLine>,
}

impl CredentialReport {
    pub fn log(&self) {
        for line in &self.lines {
            log::log!(line.level, "{}", line.text);
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.lines.iter().any(|l| l.level == Level::Warn)
    }
}

pub fn inspect_env() -> CredentialReport {
    inspect_with(|key| env::var(key).ok())
}

/// Environment lines always come first; the credentials file is inspected last and
/// any failure there becomes a single warning line.
pub fn inspect_with<F>(lookup: F) -> CredentialReport
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let mut report = CredentialReport::default();

    for var in SECRET_VARS {
        let state = if get(var).is_some() { "present" } else { "not set" };
        report.lines.push(ReportLine::info(format!("{}: {}", var, state)));
    }
    for var in PLAIN_VARS {
        let value = get(var).unwrap_or_else(|| "not set".to_string());
        report.lines.push(ReportLine::info(format!("{}: {}", var, value)));
    }

    if SECRET_VARS.iter().all(|&var| get(var).is_none()) {
        report
            .lines
            .push(ReportLine::warn("No API key found; generation requests will fail"));
    }

    if let Some(path) = get(CREDENTIALS_FILE_VAR) {
        match read_credentials_file(Path::new(&path)) {
            Ok(fields) => {
                report
                    .lines
                    .push(ReportLine::info(format!("Credentials file {} parsed", path)));
                for (name, value) in fields {
                    report
                        .lines
                        .push(ReportLine::info(format!("  {}: {}", name, value)));
                }
            }
            Err(message) => report.lines.push(ReportLine::warn(message)),
        }
    }

    report
}

/// Returns the summary fields present in the file, in a fixed order.
fn read_credentials_file(path: &Path) -> Result<Vec<(&'static str, String)>, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Could not read credentials file {}: {}", path.display(), e))?;
    let parsed: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Could not parse credentials file {}: {}", path.display(), e))?;
    if !parsed.is_object() {
        return Err(format!(
            "Could not parse credentials file {}: expected a JSON object",
            path.display()
        ));
    }

    Ok(SUMMARY_FIELDS
        .iter()
        .filter_map(|field| {
            parsed.get(*field).map(|v| match v {
                Value::String(s) => (*field, s.clone()),
                other => (*field, other.to_string()),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_secrets_are_never_printed() {
        let report = inspect_with(vars(&[(API_KEY_VAR, "super-secret-key".into())]));
        assert!(report.lines.iter().all(|l| !l.text.contains("super-secret")));
        assert_eq!(report.lines[0].text, "GEMINI_API_KEY: present");
        assert_eq!(report.lines[1].text, "GOOGLE_API_KEY: not set");
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_missing_key_warns() {
        let report = inspect_with(|_| None);
        assert!(report.has_warnings());
        assert_eq!(report.lines.len(), SECRET_VARS.len() + PLAIN_VARS.len() + 1);
    }

    #[test]
    fn test_service_account_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa.json");
        fs::write(
            &path,
            r#"{"type": "service_account", "project_id": "demo", "private_key": "-----BEGIN", "client_email": "bot@demo.iam"}"#,
        )
        .unwrap();

        let report = inspect_with(vars(&[
            (API_KEY_VAR, "k".into()),
            (CREDENTIALS_FILE_VAR, path.display().to_string()),
        ]));
        let texts: Vec<&str> = report.lines.iter().map(|l| l.text.as_str()).collect();
        let tail = &texts[texts.len() - 3..];
        assert_eq!(
            tail,
            ["  type: service_account", "  project_id: demo", "  client_email: bot@demo.iam"]
        );
        assert!(texts.iter().all(|t| !t.contains("BEGIN")));
    }

    #[test]
    fn test_malformed_file_reports_after_env_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let report = inspect_with(vars(&[
            (API_KEY_VAR, "k".into()),
            (CREDENTIALS_FILE_VAR, path.display().to_string()),
        ]));
        let env_lines = SECRET_VARS.len() + PLAIN_VARS.len();
        assert_eq!(report.lines.len(), env_lines + 1);
        assert!(report.lines[..env_lines]
            .iter()
            .all(|l| l.level == Level::Info));
        let last = report.lines.last().unwrap();
        assert_eq!(last.level, Level::Warn);
        assert!(last.text.starts_with("Could not parse credentials file"));
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let report = inspect_with(vars(&[
            (API_KEY_VAR, "k".into()),
            (CREDENTIALS_FILE_VAR, "/nonexistent/creds.json".into()),
        ]));
        assert!(report
            .lines
            .last()
            .unwrap()
            .text
            .starts_with("Could not read credentials file"));
    }
}
