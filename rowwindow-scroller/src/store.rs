use std::collections::HashMap;

use rowwindow::FrameState;

/// What a scroller persists for a collection: where it was scrolled to and the row heights it
/// had learned.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SavedView<K> {
    pub frame: FrameState,
    pub measurements: Vec<(K, f64)>,
}

/// Key-value storage collaborator, keyed by a caller-supplied collection name.
///
/// Reads and writes happen outside the render path: on explicit `save_view` / `restore_view`
/// calls only.
pub trait ViewStore<K> {
    fn load(&self, collection: &str) -> Option<SavedView<K>>;
    fn save(&mut self, collection: &str, view: SavedView<K>);
}

/// In-memory [`ViewStore`].
#[derive(Clone, Debug)]
pub struct MemoryViewStore<K> {
    views: HashMap<String, SavedView<K>>,
}

impl<K> Default for MemoryViewStore<K> {
    fn default() -> Self {
        Self {
            views: HashMap::new(),
        }
    }
}

impl<K> MemoryViewStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn remove(&mut self, collection: &str) -> Option<SavedView<K>> {
        self.views.remove(collection)
    }
}

impl<K: Clone> ViewStore<K> for MemoryViewStore<K> {
    fn load(&self, collection: &str) -> Option<SavedView<K>> {
        self.views.get(collection).cloned()
    }

    fn save(&mut self, collection: &str, view: SavedView<K>) {
        self.views.insert(collection.to_owned(), view);
    }
}
