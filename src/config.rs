use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ClaimLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming an explicit pipeline config file.
pub const CONFIG_ENV_VAR: &str = "CLAIMLENS_CONFIG";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "claimlens=info"
}

/// Get the application config directory
/// (`~/.config/ClaimLens` on Linux, platform equivalent elsewhere).
/// Falls back to the working directory when no config dir exists.
pub fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Location of the pipeline threshold file.
/// `CLAIMLENS_CONFIG` wins over the per-user default.
pub fn pipeline_config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_config_dir().join("pipeline.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_dir_ends_with_app_name() {
        let dir = app_config_dir();
        assert!(dir.ends_with("ClaimLens"));
    }

    #[test]
    fn default_pipeline_config_under_app_dir() {
        if std::env::var_os(CONFIG_ENV_VAR).is_some() {
            return;
        }
        let path = pipeline_config_path();
        assert!(path.starts_with(app_config_dir()));
        assert!(path.ends_with("pipeline.json"));
    }

    #[test]
    fn app_name_is_claimlens() {
        assert_eq!(APP_NAME, "ClaimLens");
    }

    #[test]
    fn log_filter_targets_crate() {
        assert!(default_log_filter().starts_with("claimlens"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
