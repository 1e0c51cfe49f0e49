use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("must not be empty")]
    Empty,
    #[error("must not start with '/'")]
    LeadingSlash,
    #[error("must not end with '/'")]
    TrailingSlash,
    #[error("must not contain '..'")]
    ParentTraversal,
    #[error("contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Sprite ids are flat names: `sprite1`, `npc-cat_2`.
pub(crate) fn validate_sprite_id(id: &str) -> Result<(), SpriteKeyError> {
    validate_chars(id, false)
}

/// Sheet keys are relative resource paths: `sprites/lepak/sprite1`.
pub(crate) fn validate_sheet_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.ends_with('/') {
        return Err(SpriteKeyError::TrailingSlash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    validate_chars(key, true)
}

fn validate_chars(value: &str, allow_slash: bool) -> Result<(), SpriteKeyError> {
    if value.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    for ch in value.chars() {
        let allowed = ch.is_ascii_lowercase()
            || ch.is_ascii_digit()
            || matches!(ch, '_' | '-' | '.')
            || (allow_slash && ch == '/');
        if !allowed {
            return Err(SpriteKeyError::InvalidCharacter { character: ch });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_ids_and_sheet_keys() {
        for id in ["sprite1", "npc-cat_2"] {
            assert!(validate_sprite_id(id).is_ok(), "id={id}");
        }
        for key in ["sprites/lepak/sprite1", "sheet.png", "a-b/c_d"] {
            assert!(validate_sheet_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_ids_and_sheet_keys() {
        for id in ["", "Sprite", "a/b", "a b"] {
            assert!(validate_sprite_id(id).is_err(), "id={id}");
        }
        for key in ["", "/a", "a/", "..", "a/../b", r"a\b", "A"] {
            assert!(validate_sheet_key(key).is_err(), "key={key}");
        }
    }
}
