//! Global-to-local identifier remapping
//!
//! Training and partitioning assign each global row/column identifier a
//! compact local index usable as an array offset. The mapping is a dense
//! array where entry `g` holds the 1-based local index of global id `g`, or
//! `0` when the id was never seen.

/// Read-only view over a dense identifier mapping
///
/// Test data routinely references identifiers unseen during training, either
/// as a `0` entry or as an id past the end of the array. Both translate to
/// `None` rather than an error.
#[derive(Clone, Copy, Debug)]
pub struct IdMap<'a> {
    map: &'a [u32],
}

impl<'a> IdMap<'a> {
    /// Create a view over a mapping array (`0` = unmapped, else 1-based index)
    pub fn new(map: &'a [u32]) -> Self {
        Self { map }
    }

    /// Translate a global identifier into a zero-based local index
    #[inline]
    pub fn local(&self, global: usize) -> Option<usize> {
        match self.map.get(global) {
            Some(&0) | None => None,
            Some(&m) => Some(m as usize - 1),
        }
    }

    /// Size of the global identifier space covered by this map
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the map covers no identifiers
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_id() {
        let map = IdMap::new(&[3, 0, 1]);
        assert_eq!(map.local(0), Some(2));
        assert_eq!(map.local(2), Some(0));
    }

    #[test]
    fn test_unmapped_id() {
        let map = IdMap::new(&[3, 0, 1]);
        assert_eq!(map.local(1), None);
    }

    #[test]
    fn test_out_of_bounds_id() {
        let map = IdMap::new(&[3, 0, 1]);
        assert_eq!(map.local(3), None);
        assert_eq!(map.local(usize::MAX), None);
    }

    #[test]
    fn test_identity_map() {
        // mapping[i] = i + 1 is the identity remap
        let raw: Vec<u32> = (1..=5).collect();
        let map = IdMap::new(&raw);
        for g in 0..5 {
            assert_eq!(map.local(g), Some(g));
        }
    }

    #[test]
    fn test_empty_map() {
        let map = IdMap::new(&[]);
        assert!(map.is_empty());
        assert_eq!(map.local(0), None);
    }
}
