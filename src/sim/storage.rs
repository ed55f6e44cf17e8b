//! Dense slot storage with reusable integer ids
//!
//! Values live in a `Vec` of slots indexed by id, so lookups never hash.
//! Removing a value frees its slot; the id is pushed on a free stack and the
//! most recently freed id is handed out by the next allocation. Other ids are
//! never moved.
//!
//! ```text
//!   slots:    [ T ][ - ][ T ][ - ][ T ]
//!   ids:        0    1    2    3    4
//!   free_ids: [3, 1]        <- 1 was freed last, allocate pops it first
//! ```
//!
//! Each slot also carries a generation that is bumped on removal. Code that
//! keeps an id across frames (an AI target, a bullet's owner) holds a [`Key`]
//! instead and checks it with [`Storage::resolve`], so a recycled slot is
//! never mistaken for the entity it used to hold.

/// Id paired with the generation it was allocated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub id: usize,
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Dense reusable-id storage
#[derive(Debug, Clone)]
pub struct Storage<T> {
    slots: Vec<Slot<T>>,
    /// Free ids, most recently freed last
    free_ids: Vec<usize>,
    /// Cached ascending list of occupied ids
    occupied: Vec<usize>,
    count: usize,
    outdated: bool,
    /// Generation given to newly pushed slots; raised by `clear`
    floor: u32,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_ids: Vec::new(),
            occupied: Vec::new(),
            count: 0,
            outdated: false,
            floor: 0,
        }
    }

    /// Store a value built from its id and return that id
    ///
    /// Reuses the most recently freed id if there is one, otherwise grows by one
    /// slot. The closure receives the id so records can embed it.
    pub fn allocate_with(&mut self, make: impl FnOnce(usize) -> T) -> usize {
        self.count += 1;
        self.outdated = true;

        if let Some(id) = self.free_ids.pop() {
            self.slots[id].value = Some(make(id));
            return id;
        }

        let id = self.slots.len();
        self.slots.push(Slot {
            generation: self.floor,
            value: Some(make(id)),
        });
        id
    }

    /// Store a value and return its id
    pub fn allocate(&mut self, value: T) -> usize {
        self.allocate_with(|_| value)
    }

    /// Store a value under a specific id if that id is currently free
    ///
    /// Returns `None` when the id is occupied or was never handed out.
    /// Finding the id on the free stack is a linear scan, O(free ids).
    pub fn allocate_id(&mut self, id: usize, value: T) -> Option<&mut T> {
        if id >= self.slots.len() || self.slots[id].value.is_some() {
            return None;
        }

        let idx = self.free_ids.iter().rposition(|&f| f == id)?;
        self.free_ids.remove(idx);
        self.count += 1;
        self.outdated = true;

        self.slots[id].value = Some(value);
        self.slots[id].value.as_mut()
    }

    /// Free the slot under `id` and return its value
    ///
    /// # Panics
    ///
    /// Panics if the id is not occupied.
    pub fn remove(&mut self, id: usize) -> T {
        let Some(slot) = self.slots.get_mut(id) else {
            panic!("removing id {id} that was never allocated");
        };
        let Some(value) = slot.value.take() else {
            panic!("removing already removed id {id}");
        };
        slot.generation = slot.generation.wrapping_add(1);

        self.count -= 1;
        self.outdated = true;

        self.free_ids.push(id);

        value
    }

    /// # Panics
    ///
    /// Panics if the id is not occupied.
    pub fn item(&self, id: usize) -> &T {
        match self.slots.get(id).and_then(|s| s.value.as_ref()) {
            Some(value) => value,
            None => panic!("accessing non occupied id {id}"),
        }
    }

    /// # Panics
    ///
    /// Panics if the id is not occupied.
    pub fn item_mut(&mut self, id: usize) -> &mut T {
        match self.slots.get_mut(id).and_then(|s| s.value.as_mut()) {
            Some(value) => value,
            None => panic!("accessing non occupied id {id}"),
        }
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.slots.get(id).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        self.slots.get_mut(id).and_then(|s| s.value.as_mut())
    }

    /// Whether `id` currently holds a value
    #[inline]
    pub fn used(&self, id: usize) -> bool {
        self.slots.get(id).is_some_and(|s| s.value.is_some())
    }

    /// Key for an occupied id
    ///
    /// # Panics
    ///
    /// Panics if the id is not occupied.
    pub fn key(&self, id: usize) -> Key {
        if !self.used(id) {
            panic!("taking key of non occupied id {id}");
        }
        Key {
            id,
            generation: self.slots[id].generation,
        }
    }

    /// Whether the key still names the value it was taken from
    pub fn is_live(&self, key: Key) -> bool {
        self.slots
            .get(key.id)
            .is_some_and(|s| s.value.is_some() && s.generation == key.generation)
    }

    pub fn resolve(&self, key: Key) -> Option<&T> {
        if self.is_live(key) {
            self.slots[key.id].value.as_ref()
        } else {
            None
        }
    }

    /// Number of slots, occupied or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of stored values
    pub fn count(&self) -> usize {
        self.count
    }

    /// All occupied ids in ascending order
    ///
    /// The list is rebuilt by a linear scan on the first call after any
    /// allocation or removal and cached until the next one.
    pub fn occupied(&mut self) -> &[usize] {
        if self.outdated {
            self.refresh();
        }
        &self.occupied
    }

    fn refresh(&mut self) {
        self.outdated = false;
        self.occupied.clear();
        self.occupied.extend(
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.value.is_some())
                .map(|(id, _)| id),
        );
    }

    /// Iterate occupied `(id, value)` pairs without touching the cache
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.value.as_ref().map(|v| (id, v)))
    }

    /// Drop every slot; ids start from zero again
    ///
    /// Backing capacity is kept. New slots start above every generation seen
    /// so far, so keys taken before the clear stay dead.
    pub fn clear(&mut self) {
        self.floor = self
            .slots
            .iter()
            .map(|s| s.generation.wrapping_add(1))
            .fold(self.floor, u32::max);
        self.slots.clear();
        self.occupied.clear();
        self.free_ids.clear();
        self.count = 0;
        self.outdated = false;
    }

    /// Free every occupied slot but keep the slots themselves
    ///
    /// O(n) in the slot count. Generations are bumped so keys taken before
    /// the clear stay dead.
    pub fn slow_clear(&mut self) {
        for slot in &mut self.slots {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free_ids.clear();
        self.free_ids.extend(0..self.slots.len());
        self.occupied.clear();
        self.count = 0;
        self.outdated = false;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Allocate,
        Remove(usize),
    }

    fn ops() -> impl Strategy<Value = Vec<Op>> {
        prop::collection::vec(
            prop_oneof![Just(Op::Allocate), (0usize..64).prop_map(Op::Remove)],
            0..200,
        )
    }

    proptest! {
        #[test]
        fn count_matches_occupied(ops in ops()) {
            let mut s = Storage::new();
            for op in ops {
                match op {
                    Op::Allocate => {
                        let id = s.allocate(());
                        prop_assert!(s.used(id));
                    }
                    Op::Remove(n) => {
                        let ids = s.occupied().to_vec();
                        if !ids.is_empty() {
                            let id = ids[n % ids.len()];
                            s.remove(id);
                            prop_assert!(!s.used(id));
                        }
                    }
                }
                let count = s.count();
                prop_assert_eq!(count, s.occupied().len());
                prop_assert_eq!(count, s.len() - s.free_ids.len());
            }
        }

        #[test]
        fn removed_id_is_reused_next(count in 1usize..50, pick in 0usize..50) {
            let mut s = Storage::new();
            for _ in 0..count {
                s.allocate(());
            }
            let id = pick % count;
            s.remove(id);
            prop_assert_eq!(s.allocate(()), id);
        }

        #[test]
        fn reuse_is_lifo(count in 2usize..40, picks in prop::collection::vec(0usize..40, 1..10)) {
            let mut s = Storage::new();
            for _ in 0..count {
                s.allocate(());
            }
            let mut freed = Vec::new();
            for p in picks {
                let id = p % count;
                if s.used(id) {
                    s.remove(id);
                    freed.push(id);
                }
            }
            while let Some(id) = freed.pop() {
                prop_assert_eq!(s.allocate(()), id);
            }
            prop_assert_eq!(s.allocate(()), count);
        }
    }
}
