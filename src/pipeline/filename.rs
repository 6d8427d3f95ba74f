pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Turns a prompt entry's optional template into the final output filename.
#[derive(Debug, Clone)]
pub struct FilenameResolver {
    run_id: String,
    extension: String,
}

impl FilenameResolver {
    pub fn new(run_id: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into().trim().to_string(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// `index` is 1-based; `timestamp_ms` is milliseconds since the epoch.
    pub fn resolve(&self, index: usize, template: Option<&str>, timestamp_ms: i64) -> String {
        let template = template.map(str::trim).filter(|t| !t.is_empty());
        match template {
            Some(template) => {
                let substituted = template.replace(TIMESTAMP_PLACEHOLDER, &timestamp_ms.to_string());
                let named = self.fix_extension(&substituted);
                self.prefix_run_id(named)
            }
            None => {
                let run_segment = if self.run_id.is_empty() {
                    String::new()
                } else {
                    format!("{}_", self.run_id)
                };
                format!(
                    "image_{}_{}{}.{}",
                    index, run_segment, timestamp_ms, self.extension
                )
            }
        }
    }

    /// Leaves names already ending in the extension alone, otherwise swaps the
    /// final segment's extension for ours.
    pub fn fix_extension(&self, name: &str) -> String {
        let suffix = format!(".{}", self.extension);
        if name.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase()) {
            return name.to_string();
        }
        let segment_start = name.rfind('/').map_or(0, |i| i + 1);
        let stem = match name[segment_start..].rfind('.') {
            Some(dot) if dot > 0 => &name[..segment_start + dot],
            _ => name,
        };
        format!("{}{}", stem, suffix)
    }

    fn prefix_run_id(&self, name: String) -> String {
        if self.run_id.is_empty() {
            return name;
        }
        let prefix = format!("{}_", self.run_id);
        let segment_start = name.rfind('/').map_or(0, |i| i + 1);
        let (dir, file) = name.split_at(segment_start);
        if file.starts_with(&prefix) {
            name
        } else {
            format!("{}{}{}", dir, prefix, file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_with_run_id() {
        let resolver = FilenameResolver::new("run1", "jpg");
        assert_eq!(resolver.resolve(1, Some("ruler.png"), 42), "run1_ruler.jpg");
        assert_eq!(resolver.resolve(1, Some("run1_ruler.jpg"), 42), "run1_ruler.jpg");
    }

    #[test]
    fn test_run_id_prefixes_file_not_directory() {
        let resolver = FilenameResolver::new("run1", "jpg");
        assert_eq!(resolver.resolve(1, Some("nested/a.png"), 1), "nested/run1_a.jpg");
        assert_eq!(resolver.resolve(1, Some("nested/run1_a.jpg"), 1), "nested/run1_a.jpg");
    }

    #[test]
    fn test_synthesized_name() {
        let resolver = FilenameResolver::new("", "jpg");
        assert_eq!(resolver.resolve(1, None, 1_700_000_000_000), "image_1_1700000000000.jpg");

        let resolver = FilenameResolver::new("run1", "jpg");
        assert_eq!(resolver.resolve(3, Some("  "), 7), "image_3_run1_7.jpg");
    }

    #[test]
    fn test_every_placeholder_is_replaced() {
        let resolver = FilenameResolver::new("", "jpg");
        assert_eq!(
            resolver.resolve(1, Some("a_{timestamp}_b_{timestamp}.jpg"), 99),
            "a_99_b_99.jpg"
        );
    }

    #[test]
    fn test_extension_fix_is_idempotent() {
        let resolver = FilenameResolver::new("", "jpg");
        for name in ["ruler", "ruler.png", "ruler.jpg", "a.b.webp", ".hidden", "dir.v2/file", ".jpg", ".JPG"] {
            let once = resolver.fix_extension(name);
            assert!(once.to_ascii_lowercase().ends_with(".jpg"));
            assert!(!once.to_ascii_lowercase().ends_with(".jpg.jpg"));
            assert_eq!(resolver.fix_extension(&once), once, "name {}", name);
        }
        assert_eq!(resolver.fix_extension("a.b.webp"), "a.b.jpg");
        assert_eq!(resolver.fix_extension(".hidden"), ".hidden.jpg");
        assert_eq!(resolver.fix_extension("dir.v2/file"), "dir.v2/file.jpg");
        assert_eq!(resolver.fix_extension("PHOTO.JPG"), "PHOTO.JPG");
        assert_eq!(resolver.fix_extension(".jpg"), ".jpg");
        assert_eq!(resolver.fix_extension("dir/.JPG"), "dir/.JPG");

        let resolver = FilenameResolver::new("run1", "jpg");
        let resolved = resolver.resolve(1, Some(".jpg"), 1);
        assert_eq!(resolved, "run1_.jpg");
        assert!(!resolved.to_ascii_lowercase().ends_with(".jpg.jpg"));
    }

    #[test]
    fn test_extension_with_leading_dot() {
        let resolver = FilenameResolver::new("", ".png");
        assert_eq!(resolver.resolve(2, None, 5), "image_2_5.png");
    }
}
