//! Growable output buffer for line assembly.
//!
//! Capacity starts at a configured baseline and is multiplied by a growth
//! factor each time it fills. Growth reallocates and keeps every byte
//! already written. Allocation failure aborts through the global allocator's
//! error handler; a line is never silently truncated.

#[derive(Debug)]
pub struct LineBuffer {
    bytes: Vec<u8>,
    /// Logical capacity, grown by `factor` when `bytes` reaches it.
    capacity: usize,
    factor: f64,
    growths: u32,
}

impl LineBuffer {
    pub fn new(initial_capacity: usize, factor: f64) -> Self {
        let capacity = initial_capacity.max(1);
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            factor,
            growths: 0,
        }
    }

    pub fn push(&mut self, byte: u8) {
        if self.bytes.len() == self.capacity {
            self.grow();
        }
        self.bytes.push(byte);
    }

    fn grow(&mut self) {
        // Always grow by at least one byte, even for factors barely above 1.
        let scaled = (self.capacity as f64 * self.factor) as usize;
        let next = scaled.max(self.capacity + 1);
        self.bytes.reserve_exact(next - self.bytes.len());
        self.capacity = next;
        self.growths += 1;
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many times the buffer has been enlarged.
    pub fn growths(&self) -> u32 {
        self.growths
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
