//! Injectable template selection.
//!
//! Reply templates are picked at random for variety. Handlers receive a
//! [`TemplatePicker`] instead of reaching for a global RNG, so tests can pin
//! the choice.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses an index into a list of `len` templates.
pub trait TemplatePicker: Send + Sync + 'static {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice backed by a [`StdRng`].
#[derive(Debug)]
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplatePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        self.rng.lock().random_range(0..len)
    }
}

/// Always picks the same index (modulo the list length).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPicker(pub usize);

impl TemplatePicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// Picks one item from `items`, or `None` if the slice is empty.
pub fn choose<'a, T>(picker: &dyn TemplatePicker, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(picker.pick(items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_picker_is_reproducible() {
        let a = RandomPicker::seeded(7);
        let b = RandomPicker::seeded(7);
        let xs: Vec<_> = (0..16).map(|_| a.pick(10)).collect();
        let ys: Vec<_> = (0..16).map(|_| b.pick(10)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_fixed_picker_wraps() {
        let picker = FixedPicker(5);
        assert_eq!(choose(&picker, &["a", "b", "c"]), Some(&"c"));
        assert_eq!(choose::<&str>(&picker, &[]), None);
    }
}
