use std::fmt::Debug;
use std::io::Error as IoError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::fs::{File, read_to_string};

use tracing::debug;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("unable to read config file {path:?}: {source}")]
    IoError { path: PathBuf, source: IoError },
    #[error("invalid TOML config: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum SaveConfigError {
    #[error(transparent)]
    IoError(#[from] IoError),
    #[error("unable to render TOML config: {0}")]
    TomlError(#[from] toml::ser::Error),
}

/// Load and save any serde type as TOML
pub trait SaveLoadConfig {
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), SaveConfigError>;
    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, LoadConfigError>
    where
        Self: Sized;
    fn load_str(config: &str) -> Result<Self, LoadConfigError>
    where
        Self: Sized;
}

impl<S> SaveLoadConfig for S
where
    S: Serialize + DeserializeOwned + Debug,
{
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), SaveConfigError> {
        let path_ref = path.as_ref();
        debug!("saving config: {:#?} to: {:#?}", self, path_ref);
        let toml = toml::to_string(self)?;

        let mut file = File::create(path_ref)?;
        file.write_all(toml.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, LoadConfigError> {
        let path_ref = path.as_ref();
        debug!(?path_ref, "loading from");

        let file_str = read_to_string(path_ref).map_err(|source| LoadConfigError::IoError {
            path: path_ref.to_owned(),
            source,
        })?;

        Self::load_str(&file_str)
    }

    fn load_str(config: &str) -> Result<Self, LoadConfigError> {
        let config = toml::from_str(config)?;
        Ok(config)
    }
}
