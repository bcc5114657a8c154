// ── Entity storage ──
//
// Concurrent entity storage with push-based change notification.

mod entity_table;

pub use entity_table::EntityTable;
