use crate::kind::{Instance, Kind};

/// Host-owned ordered sequence of live instances of one family.
///
/// Indices passed to `replace_at` and `remove_at` are always below `len()`;
/// the engine never asks for anything else.
pub trait ManagedCollection {
    fn len(&self) -> usize;
    /// Must be `Some` for every index below `len()` and `None` past the end.
    /// A slot without a kind can never match a target and is left out of
    /// [`ManagedCollection::kinds`].
    fn kind_at(&self, index: usize) -> Option<&Kind>;
    fn replace_at(&mut self, index: usize, instance: Instance) -> Instance;
    fn push(&mut self, instance: Instance);
    fn remove_at(&mut self, index: usize) -> Instance;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn kinds(&self) -> Vec<Kind> {
        (0..self.len())
            .filter_map(|index| self.kind_at(index).cloned())
            .collect()
    }
}

impl ManagedCollection for Vec<Instance> {
    fn len(&self) -> usize {
        <[Instance]>::len(self)
    }
    fn kind_at(&self, index: usize) -> Option<&Kind> {
        self.get(index).map(Instance::kind)
    }
    fn replace_at(&mut self, index: usize, instance: Instance) -> Instance {
        std::mem::replace(&mut self[index], instance)
    }
    fn push(&mut self, instance: Instance) {
        Vec::push(self, instance)
    }
    fn remove_at(&mut self, index: usize) -> Instance {
        self.remove(index)
    }
}
