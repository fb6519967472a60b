//! The vehicle arena and the code that populates it.

pub mod allocation;
/// Per-vehicle attribute draws and fleet construction.
pub mod init;

pub use allocation::allocate;
pub use init::{FleetBuild, build_fleet};

use crate::agents::Ev;

/// Stable handle of a vehicle in the [`Fleet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvId(pub usize);

/// Owns every vehicle of a run; municipalities refer to them by [`EvId`].
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    evs: Vec<Ev>,
}

impl Fleet {
    /// Adds a vehicle and returns its handle.
    pub fn push(&mut self, ev: Ev) -> EvId {
        self.evs.push(ev);
        EvId(self.evs.len() - 1)
    }

    /// # Panics
    ///
    /// Panics if `id` did not come from this fleet.
    pub fn get(&self, id: EvId) -> &Ev {
        &self.evs[id.0]
    }

    pub fn len(&self) -> usize {
        self.evs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ev> {
        self.evs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Ev> {
        self.evs.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ev::test_profile;

    #[test]
    fn handles_are_stable_indices() {
        let mut fleet = Fleet::default();
        let a = fleet.push(Ev::new(test_profile(), Default::default(), 1));
        let mut profile = test_profile();
        profile.home_id = "GM0009".into();
        let b = fleet.push(Ev::new(profile, Default::default(), 2));

        assert_eq!(a, EvId(0));
        assert_eq!(b, EvId(1));
        assert_eq!(fleet.get(b).profile.home_id, "GM0009");
        assert_eq!(fleet.len(), 2);
    }
}
