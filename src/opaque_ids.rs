//! Opaque record identifiers for the process boundary.
//!
//! Record GUIDs never leave the engine's process. Suggestions carry a packed
//! i32 instead: card table entry in the high 16 bits, profile entry in the
//! low 16 bits. The table is owned by one engine, lives for the whole
//! session and is never cleared, so an id handed out before a navigation
//! still resolves after it.

use std::collections::HashMap;

/// Reserved id carried by warning rows. Never resolves to a record.
pub const INVALID_UNIQUE_ID: i32 = -1;

/// Id reserved for "no record"; `pack("", "")` returns it.
pub const EMPTY_UNIQUE_ID: i32 = 0;

/// Session-scoped bidirectional GUID/id table with the packing codec.
#[derive(Debug, Default)]
pub struct OpaqueIdTable {
    guid_to_id: HashMap<String, i32>,
    id_to_guid: HashMap<i32, String>,
    next_id: i32,
}

impl OpaqueIdTable {
    pub fn new() -> Self {
        OpaqueIdTable {
            guid_to_id: HashMap::new(),
            id_to_guid: HashMap::new(),
            next_id: 1,
        }
    }

    /// Packs a card GUID and a profile GUID into one opaque i32. At most one
    /// argument may be non-empty; both halves draw ids from the same
    /// monotonic counter.
    pub fn pack(&mut self, card_guid: &str, profile_guid: &str) -> i32 {
        debug_assert!(
            card_guid.is_empty() || profile_guid.is_empty(),
            "an opaque id carries one record, not two"
        );
        let card_id = self.id_for_guid(card_guid);
        let profile_id = self.id_for_guid(profile_guid);
        debug_assert!(card_id <= u16::MAX as i32, "card id space exhausted");
        debug_assert!(profile_id <= u16::MAX as i32, "profile id space exhausted");
        (card_id << u16::BITS) | profile_id
    }

    /// Splits an opaque id back into `(card_guid, profile_guid)`. A zero
    /// half yields an empty GUID; an unknown non-zero half is an internal
    /// defect and yields an empty GUID in release builds, which makes the
    /// caller's record lookup a no-op.
    pub fn unpack(&self, id: i32) -> (String, String) {
        let card_id = (id >> u16::BITS) & u16::MAX as i32;
        let profile_id = id & u16::MAX as i32;
        let card_guid = self.guid_for_id(card_id);
        let profile_guid = self.guid_for_id(profile_id);
        debug_assert!(
            card_guid.is_empty() || profile_guid.is_empty(),
            "an opaque id carries one record, not two"
        );
        (card_guid, profile_guid)
    }

    fn id_for_guid(&mut self, guid: &str) -> i32 {
        if guid.is_empty() {
            return 0;
        }
        if let Some(&id) = self.guid_to_id.get(guid) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.guid_to_id.insert(guid.to_string(), id);
        self.id_to_guid.insert(id, guid.to_string());
        id
    }

    fn guid_for_id(&self, id: i32) -> String {
        if id == 0 {
            return String::new();
        }
        match self.id_to_guid.get(&id) {
            Some(guid) => guid.clone(),
            None => {
                debug_assert!(false, "opaque id {id} was never handed out");
                String::new()
            }
        }
    }
}
