mod assets;
mod rooms;
mod sprites;

pub use assets::{
    locate_assets, AssetPaths, AssetRootError, ASSET_ROOT_ENV_VAR, DEFAULT_SPRITE_CATALOG,
};
pub use rooms::{parse_room_layout, RoomKind, RoomLayoutError, UnknownRoomError, LEPAK_GRID};
pub use sprites::{SpriteCatalog, SpriteConfigError};
