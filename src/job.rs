use serde::Deserialize;
use std::path::PathBuf;

/// A named backup job: one source copied into one destination directory.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Job name, the key under `[jobs]` in the configuration file.
    #[serde(skip)]
    pub name: String,
    /// Source file or directory path.
    pub source: PathBuf,
    /// Destination directory that receives the timestamped backup entry.
    pub destination: PathBuf,
}

impl Job {
    pub fn new(name: impl Into<String>, source: PathBuf, destination: PathBuf) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
        }
    }
}
