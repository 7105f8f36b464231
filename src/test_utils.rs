//! Test utilities shared across test modules

use crate::paths::Paths;
use crate::profile::{Credential, Profile};
use tempfile::TempDir;

/// Create a Paths struct for testing using a temporary directory
///
/// Mimics the real ~/.claude-swap/ and ~/.claude/ layout inside the temp dir.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths::from_roots(
        &temp_dir.path().join(".claude-swap"),
        &temp_dir.path().join(".claude"),
    )
}

/// A valid profile with a literal token
pub fn sample_profile(name: &str, base_url: &str) -> Profile {
    Profile::new(name, base_url, Credential::new(format!("{name}-token-0123456789")))
}
