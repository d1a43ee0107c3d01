//! Locating config layers on disk.

use super::{
    ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LayeredConfigOptions,
    SYSTEM_CONFIG_PATH,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Layer files to try, lowest precedence first. Runtime overrides are not included.
pub(super) fn candidate_layers(
    options: &LayeredConfigOptions,
) -> Result<Vec<(ConfigLayerSource, PathBuf)>, ConfigError> {
    let cwd = resolve_cwd(&options.cwd)?;
    let project_root = project_root(&cwd, &options.project_root_markers);

    let mut candidates: Vec<(ConfigLayerSource, PathBuf)> = [
        (ConfigLayerSource::System, options.system_config_path.clone()),
        (ConfigLayerSource::User, options.user_config_path.clone()),
    ]
    .into_iter()
    .filter_map(|(source, path)| path.map(|path| (source, path)))
    .collect();
    if let Some(root) = &project_root {
        candidates.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
    }
    candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
    if let Some(root) = &project_root {
        candidates.push((
            ConfigLayerSource::Repo,
            root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        ));
    }
    Ok(candidates)
}

/// Canonical form of the working directory. A directory that does not exist is used as given.
fn resolve_cwd(cwd: &Path) -> Result<PathBuf, ConfigError> {
    match cwd.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(cwd.to_path_buf()),
        Err(source) => Err(ConfigError::Io {
            path: cwd.to_path_buf(),
            source,
        }),
    }
}

/// Nearest ancestor of `cwd` holding one of `markers`.
fn project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    let Some(root) = cwd
        .ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
    else {
        debug!("no project root above {}", cwd.display());
        return None;
    };
    debug!("resolved project root (path={})", root.display());
    Some(root.to_path_buf())
}

/// Identity of a layer file, independent of how its path was spelled.
pub(super) fn layer_identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

pub(super) fn default_system_path() -> Option<PathBuf> {
    Some(PathBuf::from(SYSTEM_CONFIG_PATH))
}

/// `~/.ragloop/ragloop.json5`, when a home directory is known.
pub(super) fn default_user_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
    )
}
