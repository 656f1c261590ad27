use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the corpus path.
pub const CORPUS_ENV: &str = "APPAREL_CORPUS";
/// Environment variable overriding the model path.
pub const MODEL_ENV: &str = "APPAREL_MODEL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One YAML file's worth of settings; absent keys leave earlier values alone.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    debug: Option<bool>,
    testing: Option<bool>,
    corpus: Option<PathBuf>,
    model: Option<PathBuf>,
}

/// Application settings.
///
/// - `debug`: log at debug level
/// - `testing`: the app will not overwrite important resources
/// - `corpus`: the training CSV used by `build`
/// - `model`: the model used by `classify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApparelConfig {
    pub debug: bool,
    pub testing: bool,
    pub corpus: Option<PathBuf>,
    pub model: Option<PathBuf>,
}

impl Default for ApparelConfig {
    fn default() -> Self {
        Self {
            debug: true,
            testing: true,
            corpus: None,
            model: None,
        }
    }
}

impl ApparelConfig {
    /// Config files in increasing priority: system, user, then working directory
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/apparel.yaml")];
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".apparel.yaml"));
        }
        paths.push(PathBuf::from("conf").join("apparel.yaml"));
        paths
    }

    /// Loads the default config files, then applies environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_paths(&Self::default_paths())?;
        config.apply_env();
        Ok(config)
    }

    /// Merges the given files in order; missing files are skipped
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in paths {
            let path = path.as_ref();
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };
            log::debug!("Loading configuration from {:?}", path);
            let layer = Self::parse_layer(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            config.merge(layer);
        }
        Ok(config)
    }

    /// Parses a single YAML document on top of the defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge(Self::parse_layer(yaml)?);
        Ok(config)
    }

    fn parse_layer(yaml: &str) -> Result<ConfigLayer, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(ConfigLayer::default());
        }
        serde_yaml::from_str(yaml)
    }

    fn merge(&mut self, layer: ConfigLayer) {
        if let Some(debug) = layer.debug {
            self.debug = debug;
        }
        if let Some(testing) = layer.testing {
            self.testing = testing;
        }
        if layer.corpus.is_some() {
            self.corpus = layer.corpus;
        }
        if layer.model.is_some() {
            self.model = layer.model;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(path) = env::var(CORPUS_ENV) {
            self.corpus = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var(MODEL_ENV) {
            self.model = Some(PathBuf::from(path));
        }
    }
}
