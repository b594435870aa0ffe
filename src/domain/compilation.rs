//! Curated, optionally pinned lists of events.

/// A stored compilation; events are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    /// Store-assigned id.
    pub id: i64,
    /// Title, 1..50 chars.
    pub title: String,
    /// Whether the compilation is pinned on the front page.
    pub pinned: bool,
    /// Referenced events, ascending.
    pub event_ids: Vec<i64>,
}

/// Input for a new compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompilation {
    /// Title.
    pub title: String,
    /// Pinned flag.
    pub pinned: bool,
    /// Events to include.
    pub event_ids: Vec<i64>,
}

/// A partial update; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationPatch {
    /// New title.
    pub title: Option<String>,
    /// New pinned flag.
    pub pinned: Option<bool>,
    /// Replacement event set.
    pub event_ids: Option<Vec<i64>>,
}

/// Sorted, de-duplicated copy of `ids`.
#[must_use]
pub fn normalize_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Ids from `wanted` that are missing from `found`, in `wanted` order.
#[must_use]
pub fn missing_ids(wanted: &[i64], found: &[i64]) -> Vec<i64> {
    wanted.iter().copied().filter(|id| !found.contains(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_normalized() {
        assert_eq!(normalize_ids(&[3, 1, 3, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn missing_ids_keeps_request_order() {
        assert_eq!(missing_ids(&[5, 1, 9], &[1]), vec![5, 9]);
        assert!(missing_ids(&[1], &[1, 2]).is_empty());
    }
}
