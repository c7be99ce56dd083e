use std::collections::{HashMap, VecDeque};

/// Size-bounded identity cache for one entity type.
///
/// Least-recently-used entries are dropped once `capacity` is exceeded;
/// a capacity of zero means unbounded. Entries with a non-positive id are
/// refused, so transient entities never land here.
pub struct EntityCache<T> {
    capacity: usize,
    map: HashMap<i64, T>,
    order: VecDeque<i64>,
}

impl<T: Clone> EntityCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Fetch a clone of the cached entity and mark it recently used.
    pub fn get(&mut self, id: i64) -> Option<T> {
        let hit = self.map.get(&id).cloned();
        if hit.is_some() {
            self.touch(id);
        }
        hit
    }

    pub fn contains(&self, id: i64) -> bool {
        self.map.contains_key(&id)
    }

    /// Insert or replace, evicting the oldest entries past capacity.
    pub fn insert(&mut self, id: i64, value: T) {
        if id <= 0 {
            return;
        }
        if self.map.insert(id, value).is_some() {
            self.touch(id);
        } else {
            self.order.push_back(id);
        }
        while self.capacity > 0 && self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.order.retain(|k| *k != id);
        self.map.remove(&id)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn touch(&mut self, id: i64) {
        self.order.retain(|k| *k != id);
        self.order.push_back(id);
    }
}
