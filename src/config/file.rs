//! Configuration file discovery

use std::path::{Path, PathBuf};

/// Configuration file locations (in order of precedence)
pub const CONFIG_LOCATIONS: &[&str] = &[
    "./suite-scheduler.yaml",
    "./suite-scheduler.yml",
    "./.suite-scheduler.yaml",
    "~/.config/suite-scheduler/config.yaml",
];

/// Find configuration file in standard locations
pub fn find_config() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.exists())
}

/// Expand `~/` to the home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
pub(super) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("./local.yaml"), PathBuf::from("./local.yaml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x.yaml"), home.join("x.yaml"));
        }
    }

    #[test]
    fn test_is_yaml_file() {
        assert!(is_yaml_file(Path::new("config.yaml")));
        assert!(is_yaml_file(Path::new("config.yml")));
        assert!(!is_yaml_file(Path::new("config.json")));
        assert!(!is_yaml_file(Path::new("config")));
    }
}
