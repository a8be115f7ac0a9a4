use std::collections::HashMap;

/// Structural key identifying a single CNF variable.
///
/// `Wall` is one per cell; `Island` is per (cell, island, distance-from-clue);
/// `WallDist` is per (cell, distance-from-wall-anchor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKey {
    Wall(usize, usize),
    Island(usize, usize, usize, usize),
    WallDist(usize, usize, usize),
}

/// Allocates stable, never-reused positive ids for [`VarKey`]s.
///
/// The first call with a given key returns a fresh id one greater than any
/// previously issued; later calls with an equal key return the same id.
#[derive(Debug, Default)]
pub struct VariablePool {
    ids: HashMap<VarKey, isize>,
    next: isize,
}

impl VariablePool {
    pub fn new() -> Self {
        VariablePool {
            ids: HashMap::new(),
            next: 1,
        }
    }

    /// Returns the id for `key`, allocating one if this is the first request.
    pub fn id(&mut self, key: VarKey) -> isize {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.next;
        self.next += 1;
        self.ids.insert(key, id);
        id
    }

    /// Highest id issued so far, 0 if none. Callers (e.g. the cardinality
    /// compiler) use this to allocate fresh auxiliary ids above it.
    pub fn highest_id(&self) -> isize {
        self.next - 1
    }

    /// Allocates and returns a brand-new id with no associated key, for use
    /// as an auxiliary variable.
    pub fn fresh(&mut self) -> isize {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Read-only lookup: the id for `key` if it was already allocated.
    pub fn get(&self, key: VarKey) -> Option<isize> {
        self.ids.get(&key).copied()
    }
}
