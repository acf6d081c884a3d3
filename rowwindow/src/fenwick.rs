use alloc::vec::Vec;
use core::cmp;

/// Prefix sums over row heights.
///
/// Values are expected to sit on the 1/256 px grid (see `tracker::sanitize_height`), which keeps
/// every partial sum exact and makes the descent searches below deterministic.
#[derive(Clone, Debug)]
pub(crate) struct Fenwick {
    tree: Vec<f64>, // 1-indexed
    total: f64,
    max_bit: usize,
}

impl Fenwick {
    pub(crate) fn from_heights(heights: &[f64]) -> Self {
        let n = heights.len();
        let mut tree = alloc::vec![0.0f64; n + 1];
        let mut total = 0.0f64;
        for i in 1..=n {
            let v = heights[i - 1];
            total += v;
            tree[i] += v;
            let j = i + lsb(i);
            if j <= n {
                tree[j] += tree[i];
            }
        }
        Self {
            tree,
            total,
            max_bit: highest_power_of_two_leq(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn add(&mut self, index: usize, delta: f64) {
        let n = self.len();
        if index >= n {
            return;
        }
        self.total += delta;
        let mut i = index + 1;
        while i <= n {
            let next = self.tree[i] + delta;
            debug_assert!(
                next >= 0.0,
                "Fenwick underflow (idx={i}, cur={}, delta={delta})",
                self.tree[i]
            );
            self.tree[i] = next.max(0.0);
            i += lsb(i);
        }
    }

    /// Sum of the first `count` values, i.e. the top offset of row `count`.
    pub(crate) fn prefix_sum(&self, count: usize) -> f64 {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0.0f64;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    pub(crate) fn total(&self) -> f64 {
        self.total
    }

    /// Returns the number of leading rows whose bottom edge is `<= target`.
    ///
    /// Equivalently: the index of the first row whose bottom edge is `> target`.
    pub(crate) fn count_ending_at_or_before(&self, target: f64) -> usize {
        self.descend(target, |node, remaining| node <= remaining)
    }

    /// Returns the number of leading rows whose bottom edge is `< target`.
    pub(crate) fn count_ending_before(&self, target: f64) -> usize {
        self.descend(target, |node, remaining| node < remaining)
    }

    fn descend(&self, mut target: f64, take: impl Fn(f64, f64) -> bool) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && take(self.tree[next], target) {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
