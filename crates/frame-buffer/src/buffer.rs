//! Ring Buffer Implementation

/// Default buffer capacity (30 frames = ~1 s at 30fps)
pub const DEFAULT_CAPACITY: usize = 30;

/// Single-owner ring buffer
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: Box<[Option<T>]>,
    /// Next write position
    head: usize,
    /// Number of occupied slots
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Self {
            storage: storage.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Push an item (overwrites oldest if full)
    pub fn push(&mut self, item: T) {
        let capacity = self.capacity();
        self.storage[self.head] = Some(item);
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Number of items currently held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Slot index of the oldest held item
    fn tail(&self) -> usize {
        (self.head + self.capacity() - self.len) % self.capacity()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let tail = self.tail();
        let capacity = self.capacity();
        (0..self.len).filter_map(move |i| self.storage[(tail + i) % capacity].as_ref())
    }

    /// Drop every held item
    pub fn clear(&mut self) {
        for slot in self.storage.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
