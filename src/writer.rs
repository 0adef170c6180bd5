//! Artifact persistence.
//!
//! Writes a verified artifact set into the conventional project layout.
//! Each file is written to a temporary sibling and renamed into place, so a
//! reader never sees a half-written inventory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::inventory::ArtifactSet;

/// Writes artifacts under a project root.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    /// Project root that contains `Kubespray/` and `Ansible/`.
    root: PathBuf,
}

impl ArtifactWriter {
    /// Creates a writer rooted at a project directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes every artifact, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error naming the path that could not be written.
    pub fn write_all(&self, environment: &str, artifacts: &ArtifactSet) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(artifacts.len());

        for artifact in artifacts.iter() {
            let path = self.root.join(artifact.kind.relative_path(environment));
            Self::write_file(&path, &artifact.content)?;
            info!("Wrote {}: {}", artifact.kind, path.display());
            written.push(path);
        }

        Ok(written)
    }

    fn write_file(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!("Creating directory: {}", parent.display());
                fs::create_dir_all(parent).map_err(|e| with_path(parent, &e))?;
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(|e| with_path(&temp_path, &e))?;
        fs::rename(&temp_path, path).map_err(|e| with_path(path, &e))?;
        Ok(())
    }
}

fn with_path(path: &Path, error: &io::Error) -> io::Error {
    io::Error::new(error.kind(), format!("{}: {error}", path.display()))
}
