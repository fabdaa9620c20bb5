//! Allocation-free shuffled traversal.
//!
//! [`shuffled_range`] walks `0..n` as `(start + i * step) mod n` with
//! `gcd(step, n) = 1`, which visits every index exactly once. The result
//! looks shuffled but is not a uniformly sampled permutation: only
//! `n * phi(n)` orders are reachable. That is good enough for "try the idle
//! candidates in some random order" and costs O(1) memory.

use rand::Rng;

use super::view::SequenceView;

pub(crate) fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Iterator over a pseudo-shuffled `0..n`.
#[derive(Debug, Clone)]
pub struct ShuffledRange {
    start: usize,
    step: usize,
    n: usize,
    emitted: usize,
}

impl ShuffledRange {
    /// The unshuffled order `0..n`.
    pub fn identity(n: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            n,
            emitted: 0,
        }
    }
}

impl Iterator for ShuffledRange {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.emitted >= self.n {
            return None;
        }
        // Reduce before multiplying so large `n` cannot overflow.
        let offset = (self.step as u128 * self.emitted as u128 % self.n as u128) as usize;
        let index = (self.start + offset) % self.n;
        self.emitted += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n - self.emitted;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ShuffledRange {}

/// Like `0..n`, but in a random-looking order.
///
/// `n <= 1` yields the identity order.
pub fn shuffled_range<R: Rng + ?Sized>(n: usize, rng: &mut R) -> ShuffledRange {
    if n <= 1 {
        return ShuffledRange::identity(n);
    }
    let start = rng.random_range(0..n);
    let mut step = rng.random_range(1..n);
    loop {
        let divisor = gcd(step, n);
        if divisor == 1 {
            break;
        }
        step /= divisor;
    }
    ShuffledRange {
        start,
        step,
        n,
        emitted: 0,
    }
}

/// Traverses `view` in [`shuffled_range`] order.
pub fn shuffled<'v, V, R>(view: &'v V, rng: &mut R) -> impl Iterator<Item = V::Item> + 'v
where
    V: SequenceView + ?Sized,
    R: Rng + ?Sized,
{
    shuffled_range(view.len(), rng).map(move |i| view.get(i))
}
