//! User configuration (`config.toml`).

use directories::ProjectDirs;
use gridcalc_engine::engine::EvalPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheet: SheetConfig,
    pub eval: EvalPolicy,
}

/// Size of new sheets; imported sheets grow past it to fit their data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub rows: usize,
    pub cols: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig { rows: 20, cols: 10 }
    }
}

/// Load the config from `explicit` or the user config dir.
///
/// Problems never abort the program: they come back as warnings and the
/// defaults are used.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(path) = explicit.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<Config>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "config loaded");
                config
            }
            Err(err) => {
                warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                Config::default()
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read {}: {}", path.display(), err));
            Config::default()
        }
    };
    (config, warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::ErrorCode;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            "[sheet]\nrows = 50\ncols = 26\n\n[eval]\nunknown_function = \"REF\"\n",
        )
        .unwrap();
        assert_eq!(config.sheet, SheetConfig { rows: 50, cols: 26 });
        assert_eq!(config.eval.unknown_function, ErrorCode::Ref);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[sheet]\nrows = 100\n").unwrap();
        assert_eq!(config.sheet, SheetConfig { rows: 100, cols: 10 });
        assert_eq!(config.eval, EvalPolicy::default());
    }

    #[test]
    fn test_load_config_warnings() {
        let (config, warnings) = load_config(Some(Path::new("/nonexistent/gridcalc.toml")));
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[sheet\nrows = ").unwrap();
        let (config, warnings) = load_config(Some(file.path()));
        assert_eq!(config, Config::default());
        assert!(warnings[0].starts_with("Failed to parse"));
    }
}
