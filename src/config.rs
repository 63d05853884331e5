use crate::annotation::SavePolicy;
use crate::clock::{DEFAULT_OFFSET, ReviewClock};
use crate::record::SourceTable;
use crate::storage::{AnnotationStore, CsvStore, SqliteStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_INPUT: &str = "qa_dataset - Sheet1.csv";
pub const DEFAULT_OUTPUT: &str = "qa_dataset_with_remarks.csv";
pub const DEFAULT_DATABASE: &str = ".qareview/reviews.db";

/// Contents of `qareview.toml`; every key is optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QaReviewConfig {
    pub input: Option<String>,
    pub output: Option<String>,
    pub backend: Option<String>,
    pub database: Option<String>,
    pub timezone: Option<String>,
    pub require_reviewer_identity: Option<bool>,
    pub stamp_empty_saves: Option<bool>,
    pub anonymous_reviewer: Option<String>,
    pub export_dir: Option<String>,
}

/// Where annotations are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Csv,
    Sqlite,
}

impl FromStr for Backend {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" | "file" => Ok(Backend::Csv),
            "sqlite" | "db" => Ok(Backend::Sqlite),
            other => Err(crate::Error::Config(format!("unknown backend '{}' (csv or sqlite)", other))),
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub backend: Backend,
    pub database: PathBuf,
    pub clock: ReviewClock,
    pub policy: SavePolicy,
    pub export_dir: PathBuf,
}

impl Settings {
    /// Apply defaults to whatever the config file set
    pub fn resolve(config: &QaReviewConfig) -> crate::Result<Self> {
        let defaults = SavePolicy::default();
        let backend = match &config.backend {
            Some(name) => name.parse()?,
            None => Backend::default(),
        };
        let clock = ReviewClock::from_offset_str(config.timezone.as_deref().unwrap_or(DEFAULT_OFFSET))?;

        Ok(Self {
            input: PathBuf::from(config.input.as_deref().unwrap_or(DEFAULT_INPUT)),
            output: PathBuf::from(config.output.as_deref().unwrap_or(DEFAULT_OUTPUT)),
            backend,
            database: PathBuf::from(config.database.as_deref().unwrap_or(DEFAULT_DATABASE)),
            clock,
            policy: SavePolicy {
                require_reviewer_identity: config
                    .require_reviewer_identity
                    .unwrap_or(defaults.require_reviewer_identity),
                stamp_empty_saves: config.stamp_empty_saves.unwrap_or(defaults.stamp_empty_saves),
                anonymous_name: config.anonymous_reviewer.clone().unwrap_or(defaults.anonymous_name),
            },
            export_dir: PathBuf::from(config.export_dir.as_deref().unwrap_or(".")),
        })
    }

    /// Open the configured annotation store over `source`
    pub fn open_store(&self, source: SourceTable) -> crate::Result<Box<dyn AnnotationStore>> {
        let store: Box<dyn AnnotationStore> = match self.backend {
            Backend::Csv => Box::new(CsvStore::new(&self.output, source, self.policy.clone())),
            Backend::Sqlite => Box::new(SqliteStore::open(&self.database, source, self.policy.clone())?),
        };
        tracing::debug!("Using {:?} annotation store at {}", self.backend, store.location().display());
        Ok(store)
    }
}

/// Config written by `qareview init`, with every default spelled out
pub fn default_config() -> QaReviewConfig {
    let policy = SavePolicy::default();
    QaReviewConfig {
        input: Some(DEFAULT_INPUT.to_string()),
        output: Some(DEFAULT_OUTPUT.to_string()),
        backend: Some("csv".to_string()),
        database: Some(DEFAULT_DATABASE.to_string()),
        timezone: Some(DEFAULT_OFFSET.to_string()),
        require_reviewer_identity: Some(policy.require_reviewer_identity),
        stamp_empty_saves: Some(policy.stamp_empty_saves),
        anonymous_reviewer: Some(policy.anonymous_name),
        export_dir: Some(".".to_string()),
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("qareview.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<QaReviewConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: QaReviewConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &QaReviewConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_follow_original_tool() {
        let settings = Settings::resolve(&QaReviewConfig::default()).unwrap();
        assert_eq!(settings.input, PathBuf::from("qa_dataset - Sheet1.csv"));
        assert_eq!(settings.output, PathBuf::from("qa_dataset_with_remarks.csv"));
        assert_eq!(settings.backend, Backend::Csv);
        assert_eq!(settings.clock, ReviewClock::default());
        assert!(settings.policy.require_reviewer_identity);
        assert!(settings.policy.stamp_empty_saves);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qareview.toml");
        write_config(&path, &default_config(), false).unwrap();
        assert!(write_config(&path, &default_config(), false).is_err());

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.timezone.as_deref(), Some("+06:00"));
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: QaReviewConfig = toml::from_str(
            "backend = \"sqlite\"\ntimezone = \"UTC\"\nrequire_reviewer_identity = false\nanonymous_reviewer = \"Guest\"\n",
        )
        .unwrap();
        let settings = Settings::resolve(&config).unwrap();
        assert_eq!(settings.backend, Backend::Sqlite);
        assert!(!settings.policy.require_reviewer_identity);
        assert_eq!(settings.policy.anonymous_name, "Guest");
        assert_eq!(settings.input, PathBuf::from(DEFAULT_INPUT));
    }

    #[test]
    fn test_open_store_per_backend() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("qa.csv");
        std::fs::write(&input, "Question,Answer,Gold Answer\nq,a,g\n").unwrap();

        let mut config = QaReviewConfig {
            output: Some(dir.path().join("reviews.csv").display().to_string()),
            database: Some(dir.path().join("db").join("reviews.db").display().to_string()),
            ..QaReviewConfig::default()
        };
        let settings = Settings::resolve(&config).unwrap();
        let store = settings.open_store(crate::load_source(&input).unwrap()).unwrap();
        assert_eq!(store.location(), settings.output.as_path());

        config.backend = Some("sqlite".into());
        let settings = Settings::resolve(&config).unwrap();
        let store = settings.open_store(crate::load_source(&input).unwrap()).unwrap();
        assert_eq!(store.location(), settings.database.as_path());
        assert!(settings.database.exists());
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let config = QaReviewConfig {
            backend: Some("parquet".into()),
            ..QaReviewConfig::default()
        };
        assert!(matches!(Settings::resolve(&config), Err(crate::Error::Config(_))));

        let config = QaReviewConfig {
            timezone: Some("Asia/Dhaka".into()),
            ..QaReviewConfig::default()
        };
        assert!(matches!(Settings::resolve(&config), Err(crate::Error::Config(_))));
    }
}
