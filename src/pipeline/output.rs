use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Directory that receives the batch's image files.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Creates the directory if needed. Safe to call on an existing directory.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes through a sibling temp file and renames it into place, so a failed
    /// write never leaves a truncated image under the final name.
    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let relative = Path::new(filename);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.file_name().is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write outside the output directory: {}", filename),
            )
            .into());
        }

        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut partial = target.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        if let Err(e) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, &target)) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(target)
    }
}
