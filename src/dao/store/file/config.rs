use std::path::PathBuf;

/// Directory used when `DATA_DIR` is not set.
const DEFAULT_DATA_DIR: &str = "data";

/// Location of the JSON documents backing the file store.
#[derive(Debug, Clone)]
pub struct FileConfig {
    pub data_dir: PathBuf,
}

impl FileConfig {
    /// Store documents under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Read `DATA_DIR`, falling back to `./data`.
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os("DATA_DIR")
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self::new(data_dir)
    }
}
