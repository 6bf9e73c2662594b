//! Seeder configuration loaded via OrthoConfig.
//!
//! Every setting can come from the environment with the `SEEDER_` prefix or
//! from an OrthoConfig configuration file. Accessors apply the defaults so
//! callers never see a missing value.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use fixture_data::{Profile, ProfileRegistry};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::backup::BackupManager;
use crate::error::ConfigurationError;
use crate::pipeline::SeedPipeline;
use crate::progress::ProgressMode;
use crate::store::{DocumentStore, JsonDirDocumentStore, MemoryDocumentStore};

const DEFAULT_STORE_DIR: &str = ".seed-store";
const DEFAULT_BACKUP_DIR: &str = "backups";

/// Deployment environment; selects the profile of the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Local development data.
    #[default]
    Development,
    /// Small deterministic data for automated tests.
    Test,
    /// Production: every count is zero, so nothing is seeded.
    Production,
}

impl Environment {
    /// Profile name for this environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            _ => Err(ConfigurationError::UnknownEnvironment {
                value: value.to_owned(),
            }),
        }
    }
}

/// Settings shared by the seeding binaries.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SEEDER")]
pub struct SeederSettings {
    /// Environment name: `development`, `test`, or `production`.
    pub environment: Option<String>,
    /// Profile registry override; the built-in registry is used otherwise.
    pub profile_path: Option<PathBuf>,
    /// Directory of the JSON document store.
    pub store_dir: Option<PathBuf>,
    /// Backup root. An empty value disables backups.
    pub backup_dir: Option<PathBuf>,
    /// Overrides the profile's RNG seed.
    pub seed: Option<u64>,
    /// Render progress bars.
    #[ortho_config(default = true)]
    pub progress: bool,
    /// Emit logs as JSON lines.
    #[ortho_config(default = false)]
    pub log_json: bool,
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf, ConfigurationError> {
    Utf8PathBuf::from_path_buf(path).map_err(|rejected| ConfigurationError::Settings {
        message: format!("path '{}' is not valid UTF-8", rejected.display()),
    })
}

impl SeederSettings {
    /// Loads settings from the environment and configuration files only.
    ///
    /// Command-line parsing belongs to the binaries, so no arguments are
    /// forwarded to OrthoConfig.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Settings`] when a value fails to parse.
    pub fn from_environment() -> Result<Self, ConfigurationError> {
        Self::load_from_iter([OsString::from("seeder")]).map_err(|error| {
            ConfigurationError::Settings {
                message: error.to_string(),
            }
        })
    }

    /// The configured environment, defaulting to development.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownEnvironment`] for unrecognised
    /// names.
    pub fn environment(&self) -> Result<Environment, ConfigurationError> {
        self.environment
            .as_deref()
            .map_or(Ok(Environment::default()), str::parse)
    }

    /// Directory of the JSON document store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Settings`] for non UTF-8 paths.
    pub fn store_dir(&self) -> Result<Utf8PathBuf, ConfigurationError> {
        self.store_dir
            .clone()
            .map_or_else(|| Ok(Utf8PathBuf::from(DEFAULT_STORE_DIR)), utf8)
    }

    /// Backup root, or `None` when backups are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Settings`] for non UTF-8 paths.
    pub fn backup_dir(&self) -> Result<Option<Utf8PathBuf>, ConfigurationError> {
        match &self.backup_dir {
            None => Ok(Some(Utf8PathBuf::from(DEFAULT_BACKUP_DIR))),
            Some(path) if path.as_os_str().is_empty() => Ok(None),
            Some(path) => utf8(path.clone()).map(Some),
        }
    }

    /// Loads the profile for the configured environment, applying the seed
    /// override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the environment is unknown, the
    /// registry cannot be read or parsed, or it lacks the profile.
    pub fn load_profile(&self) -> Result<Profile, ConfigurationError> {
        let environment = self.environment()?;
        let registry = match &self.profile_path {
            Some(path) => load_registry(&utf8(path.clone())?)?,
            None => ProfileRegistry::builtin()?,
        };
        let profile = registry.find_profile(environment.as_str())?.clone();
        Ok(match self.seed {
            Some(seed) => profile.with_seed(seed),
            None => profile,
        })
    }

    /// Progress rendering chosen by the `progress` flag.
    #[must_use]
    pub const fn progress_mode(&self) -> ProgressMode {
        if self.progress {
            ProgressMode::Visible
        } else {
            ProgressMode::Hidden
        }
    }

    /// Opens the JSON document store under [`Self::store_dir`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Io`] when the directory cannot be used.
    pub fn open_store(&self) -> Result<Arc<dyn DocumentStore>, ConfigurationError> {
        let root = self.store_dir()?;
        let store = JsonDirDocumentStore::open(root.clone()).map_err(|error| {
            ConfigurationError::Io {
                path: root,
                message: error.to_string(),
            }
        })?;
        Ok(Arc::new(store))
    }

    /// Opens a backup manager over `store`, or `None` when backups are
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Io`] when the backup root cannot be used.
    pub fn open_backups(
        &self,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Option<BackupManager>, ConfigurationError> {
        let Some(root) = self.backup_dir()? else {
            return Ok(None);
        };
        BackupManager::open(store, root.clone(), Arc::new(DefaultClock))
            .map(Some)
            .map_err(|error| ConfigurationError::Io {
                path: root,
                message: error.to_string(),
            })
    }

    /// A pipeline for listing planned steps.
    ///
    /// It runs against an empty in-memory store without backups, so nothing
    /// on disk is opened or created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the profile cannot be loaded.
    pub fn planning_pipeline(&self) -> Result<SeedPipeline, ConfigurationError> {
        let profile = self.load_profile()?;
        SeedPipeline::builder(Arc::new(MemoryDocumentStore::new("plan")), profile)
            .with_progress(ProgressMode::Hidden)
            .build()
    }
}

fn load_registry(path: &Utf8Path) -> Result<ProfileRegistry, ConfigurationError> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| ConfigurationError::Io {
        path: path.to_owned(),
        message: "profile path names no file".to_owned(),
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        ConfigurationError::Io {
            path: parent.to_owned(),
            message: error.to_string(),
        }
    })?;
    Ok(ProfileRegistry::from_file(&dir, Utf8Path::new(file_name))?)
}

#[cfg(test)]
mod tests {
    //! Unit tests for seeder settings and profile selection.

    use env_lock::lock_env;
    use fixture_data::ProfileError;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    const VARS: [&str; 7] = [
        "SEEDER_ENVIRONMENT",
        "SEEDER_PROFILE_PATH",
        "SEEDER_STORE_DIR",
        "SEEDER_BACKUP_DIR",
        "SEEDER_SEED",
        "SEEDER_PROGRESS",
        "SEEDER_LOG_JSON",
    ];

    fn cleared_env() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    fn with_env(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared_env());

        let settings = SeederSettings::from_environment().expect("settings load");

        assert_eq!(settings.environment().expect("env"), Environment::Development);
        assert_eq!(
            settings.store_dir().expect("store dir"),
            Utf8PathBuf::from(DEFAULT_STORE_DIR)
        );
        assert_eq!(
            settings.backup_dir().expect("backup dir"),
            Some(Utf8PathBuf::from(DEFAULT_BACKUP_DIR))
        );
        assert!(settings.progress);
        assert!(!settings.log_json);
        assert!(settings.seed.is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(with_env(&[
            ("SEEDER_ENVIRONMENT", "test"),
            ("SEEDER_STORE_DIR", "/tmp/seed-store"),
            ("SEEDER_SEED", "7"),
            ("SEEDER_PROGRESS", "false"),
            ("SEEDER_LOG_JSON", "true"),
        ]));

        let settings = SeederSettings::from_environment().expect("settings load");

        assert_eq!(settings.environment().expect("env"), Environment::Test);
        assert_eq!(
            settings.store_dir().expect("store dir"),
            Utf8PathBuf::from("/tmp/seed-store")
        );
        assert!(!settings.progress);
        assert!(settings.log_json);
        let profile = settings.load_profile().expect("profile");
        assert_eq!(profile.name(), "test");
        assert_eq!(profile.seed(), 7);
    }

    #[rstest]
    #[case("development", Environment::Development)]
    #[case(" Production ", Environment::Production)]
    #[case("TEST", Environment::Test)]
    fn environments_parse_case_insensitively(#[case] raw: &str, #[case] expected: Environment) {
        assert_eq!(raw.parse::<Environment>().expect("known"), expected);
    }

    #[rstest]
    fn unknown_environments_are_rejected() {
        let err = "staging".parse::<Environment>().expect_err("unknown");
        assert_eq!(
            err,
            ConfigurationError::UnknownEnvironment {
                value: "staging".to_owned()
            }
        );
    }

    fn settings(environment: &str) -> SeederSettings {
        SeederSettings {
            environment: Some(environment.to_owned()),
            profile_path: None,
            store_dir: None,
            backup_dir: None,
            seed: None,
            progress: false,
            log_json: false,
        }
    }

    #[rstest]
    fn production_profile_seeds_nothing() {
        let profile = settings("production").load_profile().expect("profile");
        let counts = profile.counts();
        assert!(counts.users.is_zero());
        assert!(counts.workspaces.is_zero());
        assert!(counts.analytics.is_zero());
    }

    #[rstest]
    fn empty_backup_dir_disables_backups() {
        let mut configured = settings("test");
        configured.backup_dir = Some(PathBuf::new());
        assert_eq!(configured.backup_dir().expect("backup dir"), None);
    }

    #[rstest]
    fn profile_path_overrides_the_builtin_registry() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "profiles": [{
                "name": "test", "seed": 99,
                "referenceTime": "2030-05-01T00:00:00Z",
                "counts": {"users": 2}
            }]}"#,
        )
        .expect("write registry");
        let mut configured = settings("test");
        configured.profile_path = Some(path);

        let profile = configured.load_profile().expect("profile");

        assert_eq!(profile.seed(), 99);
        assert_eq!(profile.counts().users.max(), 2);
    }

    #[rstest]
    fn planning_leaves_the_filesystem_alone() {
        let temp = TempDir::new().expect("temp dir");
        let store_dir = temp.path().join("store");
        let backup_dir = temp.path().join("backups");
        let mut configured = settings("test");
        configured.store_dir = Some(store_dir.clone());
        configured.backup_dir = Some(backup_dir.clone());

        let pipeline = configured.planning_pipeline().expect("planning pipeline");

        assert!(!pipeline.plan(&[]).is_empty());
        assert!(!store_dir.exists());
        assert!(!backup_dir.exists());
    }

    #[rstest]
    fn missing_environment_profile_is_reported() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "profiles": [{
                "name": "development", "seed": 1,
                "referenceTime": "2030-05-01T00:00:00Z", "counts": {}
            }]}"#,
        )
        .expect("write registry");
        let mut configured = settings("test");
        configured.profile_path = Some(path);

        let err = configured.load_profile().expect_err("no test profile");

        assert_eq!(
            err,
            ConfigurationError::Profile(ProfileError::ProfileNotFound {
                name: "test".to_owned()
            })
        );
    }
}
