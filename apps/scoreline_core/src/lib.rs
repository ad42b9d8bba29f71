pub mod records;
pub mod serializers;
pub mod urls;
pub mod views;

use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    /// Directory holding one `<branch>.json` file per branch
    /// (default `data`). Override with DATA_DIR.
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into());

        Self {
            data_dir: PathBuf::from(data_dir),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cfg: AppConfig,
}
