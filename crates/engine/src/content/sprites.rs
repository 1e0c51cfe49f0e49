use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::anim::SpriteConfig;
use crate::sprite_keys::{validate_sheet_key, validate_sprite_id, SpriteKeyError};

#[derive(Debug, Error)]
pub enum SpriteConfigError {
    #[error("failed to read sprite file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse sprite json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("sprite id '{id}' {source}")]
    InvalidId {
        id: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("sprite '{id}' sheet '{sheet}' {source}")]
    InvalidSheet {
        id: String,
        sheet: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("sprite '{id}' is declared more than once")]
    DuplicateId { id: String },
    #[error("sprite '{id}' has a zero-sized frame ({width}x{height})")]
    ZeroFrameSize { id: String, width: u32, height: u32 },
    #[error("sprite '{id}' has invalid {field} {value}; expected a positive finite number")]
    InvalidNumber {
        id: String,
        field: &'static str,
        value: f32,
    },
}

/// Load-time sprite configurations keyed by sprite id. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteCatalog {
    sprites: BTreeMap<String, SpriteConfig>,
}

impl SpriteCatalog {
    pub fn new(sprites: Vec<SpriteConfig>) -> Result<Self, SpriteConfigError> {
        let mut by_id = BTreeMap::new();
        for sprite in sprites {
            validate_sprite(&sprite)?;
            if by_id.contains_key(&sprite.id) {
                return Err(SpriteConfigError::DuplicateId { id: sprite.id });
            }
            by_id.insert(sprite.id.clone(), sprite);
        }
        Ok(Self { sprites: by_id })
    }

    /// Parses a JSON array of sprite configs. Errors name the offending field,
    /// e.g. `[1].frame_width`.
    pub fn from_json_str(raw: &str) -> Result<Self, SpriteConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let sprites = match serde_path_to_error::deserialize::<_, Vec<SpriteConfig>>(&mut deserializer)
        {
            Ok(sprites) => sprites,
            Err(error) => {
                let path = error.path().to_string();
                return Err(SpriteConfigError::Parse {
                    path,
                    source: error.into_inner(),
                });
            }
        };
        Self::new(sprites)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SpriteConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| SpriteConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            sprite_count = catalog.len(),
            "sprite_catalog_loaded"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&SpriteConfig> {
        self.sprites.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

fn validate_sprite(sprite: &SpriteConfig) -> Result<(), SpriteConfigError> {
    validate_sprite_id(&sprite.id).map_err(|source| SpriteConfigError::InvalidId {
        id: sprite.id.clone(),
        source,
    })?;
    validate_sheet_key(&sprite.sheet).map_err(|source| SpriteConfigError::InvalidSheet {
        id: sprite.id.clone(),
        sheet: sprite.sheet.clone(),
        source,
    })?;
    if sprite.frame_width == 0 || sprite.frame_height == 0 {
        return Err(SpriteConfigError::ZeroFrameSize {
            id: sprite.id.clone(),
            width: sprite.frame_width,
            height: sprite.frame_height,
        });
    }
    for (field, value) in [("fps", sprite.fps), ("scale", sprite.scale)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(SpriteConfigError::InvalidNumber {
                id: sprite.id.clone(),
                field,
                value,
            });
        }
    }
    Ok(())
}
