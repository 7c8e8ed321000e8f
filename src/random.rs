use rand::RngCore;

/// Source of uniform draws in `[0, 1)`.
///
/// Generators take one of these instead of reaching for a thread-local RNG so
/// a seeded source reproduces the same puzzle.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        let idx = (self.next_unit() * len as f64) as usize;
        idx.min(len - 1)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.pick_index(i + 1);
            items.swap(i, j);
        }
    }
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        // 53 random mantissa bits.
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Adapts a plain `FnMut() -> f64` into a [`RandomSource`].
pub struct UnitFn<F>(pub F);

impl<F: FnMut() -> f64> RandomSource for UnitFn<F> {
    fn next_unit(&mut self) -> f64 {
        let v = (self.0)();
        if v.is_nan() || v < 0.0 {
            0.0
        } else if v >= 1.0 {
            1.0 - f64::EPSILON
        } else {
            v
        }
    }
}
