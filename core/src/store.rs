use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::processing::IdentityIndex;
use crate::record::{CategoryKey, DetectionCollection};

/// A published collection together with its identity index.
#[derive(Debug)]
pub struct CategoryEntry {
    pub collection: DetectionCollection,
    pub identities: IdentityIndex,
}

impl CategoryEntry {
    pub fn new(collection: DetectionCollection) -> Self {
        let identities = IdentityIndex::build(&collection);
        Self {
            collection,
            identities,
        }
    }
}

/// Per-category collections, replaced wholesale on every publish.
///
/// Readers hold an `Arc` to the entry they looked up, so a concurrent publish
/// never exposes a half-built collection.
#[derive(Default)]
pub struct DetectionStore {
    entries: RwLock<HashMap<CategoryKey, Arc<CategoryEntry>>>,
}

impl DetectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CategoryKey, Arc<CategoryEntry>>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CategoryKey, Arc<CategoryEntry>>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publishes `collection` under its own category, returning the new entry.
    pub fn publish(&self, collection: DetectionCollection) -> Arc<CategoryEntry> {
        let category = collection.category().clone();
        let entry = Arc::new(CategoryEntry::new(collection));
        self.write().insert(category, entry.clone());
        entry
    }

    pub fn get(&self, category: &CategoryKey) -> Option<Arc<CategoryEntry>> {
        self.read().get(category).cloned()
    }

    pub fn contains(&self, category: &CategoryKey) -> bool {
        self.read().contains_key(category)
    }

    pub fn categories(&self) -> Vec<CategoryKey> {
        let mut keys: Vec<_> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Detection, IdentityKey};
    use chrono::{Local, TimeZone};

    fn collection(category: &str, ids: &[&str]) -> DetectionCollection {
        let stamp = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        DetectionCollection::new(
            category.into(),
            ids.iter()
                .map(|id| Detection::new((*id).into(), 77.0, 28.5, stamp))
                .collect(),
        )
    }

    #[test]
    fn categories_stay_separate() {
        let store = DetectionStore::new();
        store.publish(collection("face", &["F1", "F2"]));
        store.publish(collection("car", &["C1"]));

        let face = store.get(&"face".into()).unwrap();
        let car = store.get(&"car".into()).unwrap();
        assert_eq!(face.collection.len(), 2);
        assert_eq!(car.identities.as_slice(), &[IdentityKey::from("C1")]);
        assert_eq!(
            store.categories(),
            vec![CategoryKey::from("car"), CategoryKey::from("face")]
        );
    }

    #[test]
    fn publish_swaps_without_touching_held_entries() {
        let store = DetectionStore::new();
        store.publish(collection("face", &["F1"]));
        let held = store.get(&"face".into()).unwrap();

        store.publish(collection("face", &["F7", "F8"]));
        assert_eq!(held.collection.len(), 1);
        assert_eq!(store.get(&"face".into()).unwrap().identities.len(), 2);
        assert!(!store.contains(&"car".into()));
    }
}
