//! Fixed-capacity ring buffer
//!
//! Storage is allocated once (on first push) and reused; the write cursor
//! advances monotonically, so eviction of the oldest element is O(1).

pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Total number of pushes since creation/clear
    cursor: u64,
}

impl<T: Copy> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            slots: Vec::new(),
            capacity,
            cursor: 0,
        }
    }

    /// Append, overwriting the oldest element when full
    pub fn push(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            if self.slots.capacity() == 0 {
                self.slots.reserve_exact(self.capacity);
            }
            self.slots.push(value);
        } else {
            let index = (self.cursor % self.capacity as u64) as usize;
            self.slots[index] = value;
        }
        self.cursor += 1;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pushes, including evicted elements
    pub fn total_pushed(&self) -> u64 {
        self.cursor
    }

    /// Most recent element
    pub fn last(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        let index = ((self.cursor - 1) % self.capacity as u64) as usize;
        self.slots.get(index)
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let split = if self.slots.len() < self.capacity {
            0
        } else {
            (self.cursor % self.capacity as u64) as usize
        };
        let (newer, older) = self.slots.split_at(split);
        older.iter().chain(newer.iter())
    }

    /// Drop all elements, keeping the allocation
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity() {
        let mut ring = RingBuffer::new(4);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ring.last(), Some(&2));
    }

    #[test]
    fn test_overwrites_oldest() {
        let mut ring = RingBuffer::new(3);
        for i in 1..=7 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(ring.last(), Some(&7));
        assert_eq!(ring.total_pushed(), 7);
    }

    #[test]
    fn test_exactly_full() {
        let mut ring = RingBuffer::new(3);
        for i in 1..=3 {
            ring.push(i);
        }
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ring.iter().rev().next(), Some(&3));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut ring = RingBuffer::new(2);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        ring.clear();
        assert!(ring.is_empty());
        assert!(ring.last().is_none());
        ring.push(9);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![9]);
        assert_eq!(ring.capacity(), 2);
    }
}
