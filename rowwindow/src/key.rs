#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

/// Bound for item identifiers.
///
/// With `std` an id must be hashable; without it, ordered. Either way it must be cloneable, since
/// the tracker keeps one copy in the ordered sequence and one in its index.
#[cfg(feature = "std")]
pub trait RowId: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> RowId for K {}

#[cfg(not(feature = "std"))]
pub trait RowId: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> RowId for K {}
