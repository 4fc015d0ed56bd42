//! Dense integer identifiers for high-cardinality trace entities.
//!
//! Stream names and packet identities arrive with every event; the
//! trace output refers to them by small stable ids instead. Id 0 is
//! reserved for "none" in both tables and is never assigned to a real
//! key.

use std::collections::HashMap;
use std::sync::Arc;

use weft_core::PacketDataId;

/// Assigns dense ids to stream names.
///
/// The canonical id is keyed by content, so two allocations holding
/// equal content intern to the same id. An address-keyed cache in front
/// skips re-hashing the content when the same shared name arrives
/// repeatedly, which is the common case for events of a hot stream.
#[derive(Debug, Clone, Default)]
pub struct StreamNameIndex {
    by_content: HashMap<Arc<str>, u32>,
    // The cached Arc pins its allocation, so an address in this map can
    // never be recycled by a different string while the entry lives.
    by_addr: HashMap<usize, (u32, Arc<str>)>,
    last_id: u32,
}

impl StreamNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for a stream name, assigning the next unused id
    /// when the content has not been seen before. `None` maps to 0.
    pub fn intern(&mut self, name: Option<&Arc<str>>) -> u32 {
        let Some(name) = name else {
            return 0;
        };
        let addr = Arc::as_ptr(name) as *const u8 as usize;
        if let Some(&(id, _)) = self.by_addr.get(&addr) {
            return id;
        }
        let id = match self.by_content.get(name.as_ref()) {
            Some(&id) => id,
            None => {
                self.last_id += 1;
                self.by_content.insert(name.clone(), self.last_id);
                self.last_id
            }
        };
        self.by_addr.insert(addr, (id, name.clone()));
        id
    }

    /// Looks up the id previously assigned to `name`, if any.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.by_content.get(name).copied()
    }

    /// The name table for trace output, indexed by id. Index 0 holds
    /// the empty name reserved for "no stream".
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.by_content.len() + 1];
        for (name, &id) in &self.by_content {
            names[id as usize] = name.to_string();
        }
        names
    }

    /// Number of distinct names interned.
    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }

    /// Drops every assignment and restarts numbering from 1. Ids issued
    /// before and after a clear are not comparable.
    pub fn clear(&mut self) {
        self.by_content.clear();
        self.by_addr.clear();
        self.last_id = 0;
    }
}

/// Assigns dense ids to packet payload identities.
#[derive(Debug, Clone, Default)]
pub struct PacketIdIndex {
    by_identity: HashMap<PacketDataId, u32>,
    last_id: u32,
}

impl PacketIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for a payload identity, assigning the next unused
    /// id when the identity has not been seen before. `None` maps to 0.
    pub fn intern(&mut self, identity: Option<PacketDataId>) -> u32 {
        let Some(identity) = identity else {
            return 0;
        };
        match self.by_identity.get(&identity) {
            Some(&id) => id,
            None => {
                self.last_id += 1;
                self.by_identity.insert(identity, self.last_id);
                self.last_id
            }
        }
    }

    /// Number of distinct identities interned.
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    /// Drops every assignment and restarts numbering from 1.
    pub fn clear(&mut self) {
        self.by_identity.clear();
        self.last_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_always_maps_to_zero() {
        let mut index = StreamNameIndex::new();
        assert_eq!(index.intern(None), 0);
        let name: Arc<str> = Arc::from("audio");
        assert_eq!(index.intern(Some(&name)), 1);
        assert_eq!(index.intern(None), 0);

        let mut packets = PacketIdIndex::new();
        assert_eq!(packets.intern(None), 0);
        assert_eq!(packets.intern(Some(PacketDataId(9))), 1);
        assert_eq!(packets.intern(None), 0);
    }

    #[test]
    fn ids_are_dense_and_stable() {
        let mut index = StreamNameIndex::new();
        let a: Arc<str> = Arc::from("a");
        let b: Arc<str> = Arc::from("b");
        let c: Arc<str> = Arc::from("c");
        assert_eq!(index.intern(Some(&a)), 1);
        assert_eq!(index.intern(Some(&b)), 2);
        assert_eq!(index.intern(Some(&c)), 3);
        assert_eq!(index.intern(Some(&b)), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("b"), Some(2));
        assert_eq!(index.get("unseen"), None);
    }

    #[test]
    fn equal_content_in_distinct_allocations_shares_one_id() {
        let mut index = StreamNameIndex::new();
        let first: Arc<str> = Arc::from("video");
        let second: Arc<str> = Arc::from("video");
        assert!(!Arc::ptr_eq(&first, &second));

        let id = index.intern(Some(&first));
        assert_eq!(index.intern(Some(&second)), id);
        // Both addresses are now cached and still agree.
        assert_eq!(index.intern(Some(&first)), id);
        assert_eq!(index.intern(Some(&second)), id);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn name_table_is_indexed_by_id() {
        let mut index = StreamNameIndex::new();
        let a: Arc<str> = Arc::from("left");
        let b: Arc<str> = Arc::from("right");
        let a_id = index.intern(Some(&a));
        let b_id = index.intern(Some(&b));

        let names = index.names();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "");
        assert_eq!(names[a_id as usize], "left");
        assert_eq!(names[b_id as usize], "right");
    }

    #[test]
    fn clear_restarts_numbering() {
        let mut index = StreamNameIndex::new();
        let a: Arc<str> = Arc::from("a");
        let b: Arc<str> = Arc::from("b");
        assert_eq!(index.intern(Some(&a)), 1);
        assert_eq!(index.intern(Some(&b)), 2);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.intern(Some(&b)), 1);

        let mut packets = PacketIdIndex::new();
        assert_eq!(packets.intern(Some(PacketDataId(7))), 1);
        packets.clear();
        assert_eq!(packets.intern(Some(PacketDataId(8))), 1);
    }

    #[test]
    fn packet_identities_intern_by_value() {
        let mut packets = PacketIdIndex::new();
        let first = packets.intern(Some(PacketDataId(0x1000)));
        let second = packets.intern(Some(PacketDataId(0x2000)));
        assert_ne!(first, second);
        assert_eq!(packets.intern(Some(PacketDataId(0x1000))), first);
        assert_eq!(packets.len(), 2);
    }
}
