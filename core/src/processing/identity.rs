use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::record::{DetectionCollection, IdentityKey};

/// Distinct identities of a collection in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityIndex {
    identities: Vec<IdentityKey>,
}

impl IdentityIndex {
    pub fn build(collection: &DetectionCollection) -> Self {
        let mut seen = HashSet::with_capacity(collection.len());
        let identities = collection
            .iter()
            .map(|detection| detection.identity())
            .filter(|identity| seen.insert(*identity))
            .cloned()
            .collect();
        Self { identities }
    }

    pub fn contains(&self, identity: &IdentityKey) -> bool {
        self.identities.contains(identity)
    }

    pub fn position(&self, identity: &IdentityKey) -> Option<usize> {
        self.identities.iter().position(|known| known == identity)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IdentityKey> {
        self.identities.iter()
    }

    pub fn as_slice(&self) -> &[IdentityKey] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

pub fn distinct_identities(collection: &DetectionCollection) -> IdentityIndex {
    IdentityIndex::build(collection)
}
