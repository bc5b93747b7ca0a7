use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "BACKDROP_CONFIG_DIR";
pub const CONFIG_FILE: &str = "backdrop.toml";

const QUALIFIER: &str = "io";
const ORGANISATION: &str = "Xpectra";
const APPLICATION: &str = "Backdrop";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Where the scene configuration is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed with `--config`; a missing file is an error.
    Explicit(PathBuf),
    /// Found in the config directory.
    Discovered(PathBuf),
    /// No file present; built-in defaults apply.
    Defaults,
}

impl ConfigSource {
    pub fn resolve(explicit: Option<&Path>, paths: &AppPaths) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }
        let candidate = paths.config_file();
        if candidate.is_file() {
            Self::Discovered(candidate)
        } else {
            Self::Defaults
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Discovered(path) => Some(path.as_path()),
            Self::Defaults => None,
        }
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn set_empty(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, "");
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_takes_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let paths = AppPaths::discover().unwrap();
        assert_eq!(paths.config_dir(), root.path());
        assert_eq!(paths.config_file(), root.path().join(CONFIG_FILE));
    }

    #[test]
    fn empty_override_is_ignored() {
        let _guard = env_lock().lock().unwrap();
        let _config_guard = EnvGuard::set_empty(ENV_CONFIG_DIR);
        assert!(env_override(ENV_CONFIG_DIR).is_none());
    }

    #[test]
    fn resolves_config_source() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, root.path());
        let paths = AppPaths::discover().unwrap();

        assert_eq!(ConfigSource::resolve(None, &paths), ConfigSource::Defaults);
        assert_eq!(ConfigSource::Defaults.path(), None);

        fs::write(paths.config_file(), "[pointer]\nsmoothing = 0.2\n").unwrap();
        assert_eq!(
            ConfigSource::resolve(None, &paths),
            ConfigSource::Discovered(paths.config_file())
        );

        let explicit = root.path().join("elsewhere.toml");
        let source = ConfigSource::resolve(Some(&explicit), &paths);
        assert_eq!(source, ConfigSource::Explicit(explicit.clone()));
        assert_eq!(source.path(), Some(explicit.as_path()));
    }
}
