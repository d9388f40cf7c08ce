use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::Deserialize;

use larder_core::store::{CatalogStore, SqliteStore};

use crate::postgrest::PostgrestStore;

/// Which catalog store the commands talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Local SQLite database in the data directory
    #[default]
    Sqlite,
    /// Hosted PostgREST/Supabase backend
    Hosted,
}

/// Optional `config.json` in the data directory.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    store: Option<StoreKind>,
    hosted_url: Option<String>,
    hosted_key: Option<String>,
}

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub hosted_url: Option<String>,
    pub hosted_key: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "larder").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let mut config = Self::from_dir(&data_dir)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read `config.json` from `data_dir` if present; defaults otherwise.
    fn from_dir(data_dir: &Path) -> Result<Self> {
        let file_path = data_dir.join("config.json");
        let file = if file_path.exists() {
            let text = std::fs::read_to_string(&file_path)
                .with_context(|| format!("Failed to read {}", file_path.display()))?;
            serde_json::from_str::<FileConfig>(&text)
                .with_context(|| format!("Invalid config file: {}", file_path.display()))?
        } else {
            FileConfig::default()
        };

        Ok(Config {
            db_path: data_dir.join("larder.db"),
            data_dir: data_dir.to_path_buf(),
            store: file.store.unwrap_or_default(),
            hosted_url: file.hosted_url,
            hosted_key: file.hosted_key,
        })
    }

    /// `LARDER_STORE`, `LARDER_HOSTED_URL` and `LARDER_HOSTED_KEY` override
    /// the config file.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(store) = lookup("LARDER_STORE") {
            self.store = StoreKind::from_str(&store, true)
                .map_err(|_| anyhow!("Invalid store '{store}'. Use 'sqlite' or 'hosted'"))?;
        }
        if let Some(url) = lookup("LARDER_HOSTED_URL") {
            self.hosted_url = Some(url);
        }
        if let Some(key) = lookup("LARDER_HOSTED_KEY") {
            self.hosted_key = Some(key);
        }
        Ok(())
    }

    /// Open the configured store, or `kind` when given on the command line.
    pub fn open_store(&self, kind: Option<StoreKind>) -> Result<Arc<dyn CatalogStore>> {
        match kind.unwrap_or(self.store) {
            StoreKind::Sqlite => Ok(Arc::new(SqliteStore::open(&self.db_path)?)),
            StoreKind::Hosted => {
                let (Some(url), Some(key)) = (&self.hosted_url, &self.hosted_key) else {
                    bail!(
                        "Hosted store needs a URL and key: set LARDER_HOSTED_URL and LARDER_HOSTED_KEY, or hosted_url/hosted_key in {}",
                        self.data_dir.join("config.json").display()
                    );
                };
                Ok(Arc::new(PostgrestStore::new(url, key)?))
            }
        }
    }

    /// Load the server API key from disk, or generate a new one.
    pub fn load_or_create_api_key(&self) -> Result<String> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok(key);
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok(key)
    }
}
