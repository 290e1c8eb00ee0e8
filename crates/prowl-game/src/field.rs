//! The collectible field: a fixed-size set of one-time pickups.

use prowl_protocol::{CollectibleSnapshot, Vec3};
use rand::Rng;

/// A single scoring object. `collected` is monotonic: once true it stays
/// true until the whole field is recreated on session reset.
#[derive(Debug, Clone)]
pub struct Collectible {
    pub id: usize,
    pub position: Vec3,
    pub value: u32,
    pub collected: bool,
}

/// The scarce-resource set for one session.
///
/// Ids are dense (`0..count`) and stable for the session's lifetime;
/// a reset replaces the entire field rather than reviving items.
#[derive(Debug, Clone)]
pub struct CollectibleField {
    items: Vec<Collectible>,
}

impl CollectibleField {
    /// Spawns a fresh field with random positions within ±`extent` on the
    /// horizontal axes. Collectibles float slightly above the floor.
    pub fn spawn(count: usize, value: u32, extent: f32) -> Self {
        let mut rng = rand::rng();
        let items = (0..count)
            .map(|id| Collectible {
                id,
                position: Vec3::new(
                    rng.random_range(-extent..=extent),
                    0.5,
                    rng.random_range(-extent..=extent),
                ),
                value,
                collected: false,
            })
            .collect();
        Self { items }
    }

    /// All collectibles, in id order.
    pub fn items(&self) -> &[Collectible] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Collectible> {
        self.items.get(index)
    }

    /// Marks the collectible at `index` as taken.
    ///
    /// Callers check range and the `collected` flag first; this only
    /// flips the bit.
    pub(crate) fn mark_collected(&mut self, index: usize) {
        self.items[index].collected = true;
    }

    #[cfg(test)]
    pub(crate) fn items_mut(&mut self) -> &mut [Collectible] {
        &mut self.items
    }

    /// Number of uncollected items left.
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|c| !c.collected).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn snapshot(&self) -> Vec<CollectibleSnapshot> {
        self.items
            .iter()
            .map(|c| CollectibleSnapshot {
                id: c.id,
                position: c.position,
                value: c.value,
                collected: c.collected,
            })
            .collect()
    }
}
