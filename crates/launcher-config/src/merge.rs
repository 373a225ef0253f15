//! Override merge between config layers
//!
//! Folding a layer into the accumulator follows these rules:
//! - Scalars: replaced only when the incoming value is non-default
//!   (non-empty string, `true`)
//! - Maps: merged key by key, incoming keys added or overwritten
//! - Lists: REPLACED by a non-empty incoming list (never concatenated)

use std::collections::BTreeMap;

/// Merge an incoming layer value into an accumulator in place.
pub trait OverrideMerge {
    fn merge_from(&mut self, incoming: Self);
}

impl OverrideMerge for String {
    fn merge_from(&mut self, incoming: Self) {
        if !incoming.is_empty() {
            *self = incoming;
        }
    }
}

impl OverrideMerge for bool {
    fn merge_from(&mut self, incoming: Self) {
        if incoming {
            *self = true;
        }
    }
}

impl<T> OverrideMerge for Vec<T> {
    fn merge_from(&mut self, incoming: Self) {
        if !incoming.is_empty() {
            *self = incoming;
        }
    }
}

impl<K: Ord, V> OverrideMerge for BTreeMap<K, V> {
    fn merge_from(&mut self, incoming: Self) {
        self.extend(incoming);
    }
}
