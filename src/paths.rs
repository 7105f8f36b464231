use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Overrides the claudeswap base directory (default `~/.claude-swap`)
pub const HOME_ENV: &str = "CLAUDESWAP_HOME";
/// Claude Code's own override for its configuration directory
pub const CLAUDE_CONFIG_ENV: &str = "CLAUDE_CONFIG_DIR";

/// All computed paths used by claudeswap
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.claude-swap
    pub base_dir: PathBuf,
    /// ~/.claude-swap/profiles
    pub profiles_dir: PathBuf,
    /// ~/.claude-swap/backups
    pub backups_dir: PathBuf,
    /// ~/.claude-swap/state.json
    pub state_file: PathBuf,
    /// ~/.claude-swap/.lock
    pub lock_file: PathBuf,
    /// ~/.claude
    pub claude_dir: PathBuf,
    /// ~/.claude/settings.json
    pub claude_settings: PathBuf,
}

impl Paths {
    /// Resolve paths from the environment, falling back to the home directory
    pub fn new() -> Result<Self> {
        let base_override = env_path(HOME_ENV);
        let claude_override = env_path(CLAUDE_CONFIG_ENV);

        if let (Some(base), Some(claude)) = (&base_override, &claude_override) {
            return Ok(Self::from_roots(base, claude));
        }

        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let home = base_dirs.home_dir();

        let base_dir = base_override.unwrap_or_else(|| home.join(".claude-swap"));
        let claude_dir = claude_override.unwrap_or_else(|| home.join(".claude"));
        Ok(Self::from_roots(&base_dir, &claude_dir))
    }

    /// Build all paths below an explicit base directory and Claude directory
    pub fn from_roots(base_dir: &Path, claude_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            profiles_dir: base_dir.join("profiles"),
            backups_dir: base_dir.join("backups"),
            state_file: base_dir.join("state.json"),
            lock_file: base_dir.join(".lock"),
            claude_dir: claude_dir.to_path_buf(),
            claude_settings: claude_dir.join("settings.json"),
        }
    }

    /// Get the path to a specific profile's file
    pub fn profile_file(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.json"))
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.profiles_dir).with_context(|| {
            format!(
                "Failed to create profiles directory: {}",
                self.profiles_dir.display()
            )
        })?;
        std::fs::create_dir_all(&self.backups_dir).with_context(|| {
            format!(
                "Failed to create backups directory: {}",
                self.backups_dir.display()
            )
        })?;
        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_profile_file_path() {
        let paths = Paths::from_roots(Path::new("/base"), Path::new("/claude"));
        assert_eq!(
            paths.profile_file("work"),
            PathBuf::from("/base/profiles/work.json")
        );
        assert_eq!(
            paths.claude_settings,
            PathBuf::from("/claude/settings.json")
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("swap");
        let claude = temp.path().join("claude");
        unsafe {
            std::env::set_var(HOME_ENV, &base);
            std::env::set_var(CLAUDE_CONFIG_ENV, &claude);
        }

        let paths = Paths::new().unwrap();

        unsafe {
            std::env::remove_var(HOME_ENV);
            std::env::remove_var(CLAUDE_CONFIG_ENV);
        }

        assert_eq!(paths.base_dir, base);
        assert_eq!(paths.state_file, base.join("state.json"));
        assert_eq!(paths.claude_settings, claude.join("settings.json"));
    }

    #[test]
    #[serial]
    fn test_empty_override_is_ignored() {
        unsafe { std::env::set_var(HOME_ENV, "") };
        let paths = Paths::new().unwrap();
        unsafe { std::env::remove_var(HOME_ENV) };

        assert!(paths.base_dir.ends_with(".claude-swap"));
    }

    #[test]
    fn test_ensure_dirs() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::from_roots(&temp.path().join("swap"), &temp.path().join("claude"));
        paths.ensure_dirs().unwrap();
        assert!(paths.profiles_dir.is_dir());
        assert!(paths.backups_dir.is_dir());
    }
}
