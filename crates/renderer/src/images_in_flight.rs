//! Per-image ownership markers.
//!
//! Swapchain images and frame slots are counted independently (M and N), so
//! waiting on the current slot's fence does not prove that the acquired image
//! is idle: another slot may still be rendering into it. Each image records
//! the slot that last submitted against it, and the scheduler waits on that
//! slot's fence before reusing the image.

/// Which frame slot last submitted work against each swapchain image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagesInFlight {
    owners: Vec<Option<usize>>,
}

impl ImagesInFlight {
    /// A table of `image_count` idle images.
    pub fn new(image_count: usize) -> Self {
        Self {
            owners: vec![None; image_count],
        }
    }

    /// Number of images (M).
    #[inline]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Slot that last submitted to `image_index`, if any.
    #[inline]
    pub fn owner(&self, image_index: usize) -> Option<usize> {
        self.owners.get(image_index).copied().flatten()
    }

    /// Records `slot` as the last submitter to `image_index`, returning the
    /// previous owner.
    ///
    /// Indices outside the table are ignored and return `None`; the
    /// scheduler rejects them before marking.
    pub fn mark(&mut self, image_index: usize, slot: usize) -> Option<usize> {
        self.owners
            .get_mut(image_index)
            .and_then(|owner| owner.replace(slot))
    }

    /// Forgets every marker and resizes to `image_count`. Used after a
    /// rebuild, when the old images no longer exist and the device is idle.
    pub fn reset(&mut self, image_count: usize) {
        self.owners.clear();
        self.owners.resize(image_count, None);
    }

    /// Number of images currently marked.
    pub fn marked(&self) -> usize {
        self.owners.iter().filter(|owner| owner.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_idle() {
        let images = ImagesInFlight::new(3);
        assert_eq!(images.len(), 3);
        assert_eq!(images.marked(), 0);
        assert!((0..3).all(|i| images.owner(i).is_none()));
    }

    #[test]
    fn test_mark_returns_previous_owner() {
        let mut images = ImagesInFlight::new(2);
        assert_eq!(images.mark(1, 0), None);
        assert_eq!(images.owner(1), Some(0));
        assert_eq!(images.mark(1, 1), Some(0));
        assert_eq!(images.owner(1), Some(1));
        assert_eq!(images.marked(), 1);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut images = ImagesInFlight::new(2);
        assert_eq!(images.mark(5, 0), None);
        assert_eq!(images.owner(5), None);
        assert_eq!(images.marked(), 0);
    }

    #[test]
    fn test_reset_resizes_and_clears() {
        let mut images = ImagesInFlight::new(3);
        images.mark(0, 0);
        images.mark(2, 1);

        images.reset(4);
        assert_eq!(images.len(), 4);
        assert_eq!(images.marked(), 0);

        images.mark(3, 1);
        images.reset(2);
        assert_eq!(images.len(), 2);
        assert_eq!(images.owner(3), None);
    }
}
