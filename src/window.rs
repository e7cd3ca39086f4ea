//! Bounded trailing window of raw observations
//!
//! [`Window`] never overwrites on its own: the owning engine pops the oldest
//! element, undoes its contribution, and only then pushes the new one. Both
//! a pop from an empty window and a push into a full one report a
//! [`WindowError`].

use core::fmt;
use core::num::NonZeroUsize;

use ringbuffer::{AllocRingBuffer, RingBuffer};

use crate::traits::WindowError;

/// Fixed-capacity FIFO buffer
///
/// Generic over the element so collaborators can buffer per-element state
/// (a joint observation, a handle into an index structure) rather than a
/// bare `f64`.
///
/// # Example
///
/// ```
/// use core::num::NonZeroUsize;
/// use flowmoments::Window;
///
/// let mut window = Window::new(NonZeroUsize::new(2).unwrap());
/// window.push(1.0).unwrap();
/// window.push(2.0).unwrap();
/// assert!(window.is_full());
/// assert!(window.push(3.0).is_err());
///
/// assert_eq!(window.pop().unwrap(), 1.0);
/// window.push(3.0).unwrap();
/// ```
pub struct Window<T> {
    buffer: AllocRingBuffer<T>,
}

impl<T> Window<T> {
    /// Create an empty window holding at most `capacity` elements
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            buffer: AllocRingBuffer::new(capacity.get()),
        }
    }

    /// Maximum number of elements
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Number of buffered elements
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the window holds no elements
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the next push requires a pop first
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.buffer.capacity()
    }

    /// Append the newest element
    pub fn push(&mut self, item: T) -> Result<(), WindowError> {
        if self.is_full() {
            return Err(WindowError::Overflow {
                capacity: self.capacity(),
            });
        }
        self.buffer.push(item);
        Ok(())
    }

    /// Remove and return the oldest element
    pub fn pop(&mut self) -> Result<T, WindowError> {
        self.buffer.dequeue().ok_or(WindowError::Underflow)
    }

    /// Elements from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }
}

impl<T> fmt::Debug for Window<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(capacity: usize) -> Window<f64> {
        Window::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_fifo_order() {
        let mut w = window(3);
        for x in [1.0, 2.0, 3.0] {
            w.push(x).unwrap();
        }
        assert_eq!(w.iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);

        assert_eq!(w.pop().unwrap(), 1.0);
        w.push(4.0).unwrap();
        assert_eq!(w.iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut w = window(1);
        w.push(1.0).unwrap();
        assert_eq!(w.push(2.0), Err(WindowError::Overflow { capacity: 1 }));
        // The rejected push left the buffer untouched
        assert_eq!(w.len(), 1);
        assert_eq!(w.pop().unwrap(), 1.0);
    }

    #[test]
    fn test_underflow_is_an_error() {
        let mut w = window(2);
        assert_eq!(w.pop(), Err(WindowError::Underflow));
        w.push(5.0).unwrap();
        w.pop().unwrap();
        assert_eq!(w.pop(), Err(WindowError::Underflow));
    }

    #[test]
    fn test_non_power_of_two_capacity() {
        let mut w = window(5);
        assert_eq!(w.capacity(), 5);
        for x in 0..5 {
            w.push(x as f64).unwrap();
        }
        assert!(w.is_full());
    }

    #[test]
    fn test_holds_compound_elements() {
        let mut w: Window<Vec<f64>> = Window::new(NonZeroUsize::new(2).unwrap());
        w.push(vec![1.0, 2.0]).unwrap();
        w.push(vec![3.0, 4.0]).unwrap();
        assert_eq!(w.pop().unwrap(), vec![1.0, 2.0]);
        assert_eq!(w.len(), 1);
    }
}
