use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const ASSET_ROOT_ENV_VAR: &str = "LEPAK_ROOT";
pub const DEFAULT_SPRITE_CATALOG: &str = "assets/sprites/lepak.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub sprite_catalog: PathBuf,
}

impl AssetPaths {
    fn for_root(root: PathBuf) -> Self {
        let sprite_catalog = root.join(DEFAULT_SPRITE_CATALOG);
        Self {
            root,
            sprite_catalog,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetRootError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("{var} is set to {path}, which has no {DEFAULT_SPRITE_CATALOG}")]
    MissingCatalog { var: &'static str, path: PathBuf },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] io::Error),
    #[error(
        "no directory above {searched_from:?} contains {DEFAULT_SPRITE_CATALOG}; \
set {ASSET_ROOT_ENV_VAR} to the workspace root"
    )]
    NotFound { searched_from: Vec<PathBuf> },
}

/// Finds the directory holding `assets/`. `LEPAK_ROOT` wins when set;
/// otherwise the working directory and then the executable's directory are
/// walked upward.
pub fn locate_assets() -> Result<AssetPaths, AssetRootError> {
    match env::var(ASSET_ROOT_ENV_VAR) {
        Ok(raw) => root_from_env(Path::new(raw.trim())),
        Err(env::VarError::NotPresent) => {
            let mut starts = Vec::with_capacity(2);
            if let Ok(cwd) = env::current_dir() {
                starts.push(cwd);
            }
            let exe = env::current_exe().map_err(AssetRootError::CurrentExe)?;
            if let Some(dir) = exe.parent() {
                starts.push(dir.to_path_buf());
            }
            search_upward(&starts)
        }
        Err(source) => Err(AssetRootError::EnvVar {
            var: ASSET_ROOT_ENV_VAR,
            source,
        }),
    }
}

fn root_from_env(path: &Path) -> Result<AssetPaths, AssetRootError> {
    let root = canonical(path);
    if has_sprite_catalog(&root) {
        Ok(AssetPaths::for_root(root))
    } else {
        Err(AssetRootError::MissingCatalog {
            var: ASSET_ROOT_ENV_VAR,
            path: root,
        })
    }
}

fn search_upward(starts: &[PathBuf]) -> Result<AssetPaths, AssetRootError> {
    let found = starts
        .iter()
        .flat_map(|start| start.ancestors())
        .find(|candidate| has_sprite_catalog(candidate));
    match found {
        Some(root) => {
            debug!(root = %root.display(), "asset_root_found");
            Ok(AssetPaths::for_root(canonical(root)))
        }
        None => Err(AssetRootError::NotFound {
            searched_from: starts.to_vec(),
        }),
    }
}

fn has_sprite_catalog(path: &Path) -> bool {
    path.join(DEFAULT_SPRITE_CATALOG).is_file()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
