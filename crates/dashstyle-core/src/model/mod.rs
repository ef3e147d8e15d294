pub mod configuration;
pub mod entity_id;
pub mod live;

pub use configuration::{
    Configuration, DEFAULT_ROOM_ICON, EntityKind, EntityRef, Room, RoomId, STYLE_DEFAULTS, Styles,
    default_styles, is_recognized_style,
};
pub use entity_id::{EntityId, EntityIdError, domain_of, humanize_object_id, object_id_of};
pub use live::{LiveEntityState, LiveSnapshot, snapshot_from_host};
