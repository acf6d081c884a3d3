use alloc::vec::Vec;

use crate::error::WindowError;
use crate::fenwick::Fenwick;
use crate::key::{KeyMap, RowId};
use crate::{RowHeight, RowWindow, VirtualRow};

/// Height differences at or below this many pixels are treated as "unchanged".
pub const DEFAULT_HEIGHT_EPSILON: f64 = 0.01;

/// Heights are stored on a 1/256 px grid so that every prefix sum is exact in `f64`.
const SUBPIXEL: f64 = 256.0;
const MAX_EXACT: f64 = (1u64 << 52) as f64;

pub(crate) fn sanitize_height(height: f64) -> f64 {
    if !height.is_finite() || height < 0.0 {
        vwarn!(height, "row height clamped to 0");
        return 0.0;
    }
    let scaled = height * SUBPIXEL + 0.5;
    if scaled >= MAX_EXACT {
        return height;
    }
    (scaled as u64) as f64 / SUBPIXEL
}

/// Single source of truth for row heights and cumulative offsets.
///
/// Rows are identified by caller-supplied ids (`K`); the order of [`Self::set_sequence`] defines
/// row order. In per-row mode, heights start at the default estimate and are refined by
/// [`Self::report_measured`]; offsets are kept in a Fenwick tree, so both updates and lookups
/// are `O(log n)`. In uniform mode every row has the same height and offsets are plain
/// arithmetic.
#[derive(Clone, Debug)]
pub struct HeightTracker<K> {
    ids: Vec<K>,
    index: KeyMap<K, usize>,
    states: Vec<RowHeight>,
    heights: Vec<f64>,
    sums: Fenwick,
    default_estimate: f64,
    uniform: Option<f64>,
    epsilon: f64,
}

impl<K: RowId> HeightTracker<K> {
    /// Creates an empty tracker whose unmeasured rows are assumed to be `default_estimate` tall.
    pub fn new(default_estimate: f64) -> Self {
        Self {
            ids: Vec::new(),
            index: KeyMap::new(),
            states: Vec::new(),
            heights: Vec::new(),
            sums: Fenwick::from_heights(&[]),
            default_estimate: sanitize_height(default_estimate),
            uniform: None,
            epsilon: DEFAULT_HEIGHT_EPSILON,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = if epsilon.is_finite() { epsilon.max(0.0) } else { 0.0 };
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    pub fn id_at(&self, index: usize) -> Option<&K> {
        self.ids.get(index)
    }

    pub fn index_of(&self, id: &K) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.index.contains_key(id)
    }

    pub fn default_estimate(&self) -> f64 {
        self.default_estimate
    }

    /// Returns the uniform row height when uniform mode is active.
    pub fn uniform_height(&self) -> Option<f64> {
        self.uniform
    }

    /// Replaces the tracked sequence.
    ///
    /// Measurements of ids present in both the old and the new sequence are kept; everything
    /// else starts as [`RowHeight::Unknown`]. On a duplicate id the tracker is left untouched.
    pub fn set_sequence(&mut self, ids: impl IntoIterator<Item = K>) -> Result<(), WindowError> {
        let ids: Vec<K> = ids.into_iter().collect();
        let mut index = KeyMap::<K, usize>::new();
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                vwarn!(index = i, "set_sequence: duplicate id");
                return Err(WindowError::DuplicateId { index: i });
            }
        }

        let mut states = Vec::with_capacity(ids.len());
        let mut heights = Vec::with_capacity(ids.len());
        for id in &ids {
            let state = match self.uniform {
                Some(h) => RowHeight::Fixed(h),
                None => match self.index.get(id).map(|&i| self.states[i]) {
                    Some(RowHeight::Measured(h)) => RowHeight::Measured(h),
                    _ => RowHeight::Unknown,
                },
            };
            heights.push(state.resolve(self.default_estimate));
            states.push(state);
        }

        self.ids = ids;
        self.index = index;
        self.states = states;
        self.heights = heights;
        self.rebuild_sums();
        vdebug!(
            rows = self.ids.len(),
            measured = self.measured_count(),
            "set_sequence"
        );
        Ok(())
    }

    /// Switches between per-row measurement (`None`) and a uniform height for every row.
    ///
    /// Either way all individual measurements are dropped.
    pub fn set_height_mode(&mut self, uniform: Option<f64>) {
        self.uniform = uniform.map(sanitize_height);
        let state = match self.uniform {
            Some(h) => RowHeight::Fixed(h),
            None => RowHeight::Unknown,
        };
        let height = state.resolve(self.default_estimate);
        self.states.iter_mut().for_each(|s| *s = state);
        self.heights.iter_mut().for_each(|h| *h = height);
        self.rebuild_sums();
        vdebug!(uniform = ?self.uniform, rows = self.ids.len(), "set_height_mode");
    }

    /// Changes the estimate used for rows that have not been measured yet.
    pub fn set_default_estimate(&mut self, estimate: f64) {
        self.default_estimate = sanitize_height(estimate);
        if self.uniform.is_some() {
            return;
        }
        for (state, height) in self.states.iter().zip(self.heights.iter_mut()) {
            if state.is_unknown() {
                *height = self.default_estimate;
            }
        }
        self.rebuild_sums();
    }

    /// Forgets every measurement; all rows fall back to the default estimate.
    pub fn reset_measurements(&mut self) {
        if self.uniform.is_some() {
            return;
        }
        self.states.iter_mut().for_each(|s| *s = RowHeight::Unknown);
        self.heights
            .iter_mut()
            .for_each(|h| *h = self.default_estimate);
        self.rebuild_sums();
    }

    /// Records an observed height for `id`.
    ///
    /// Returns `Ok(true)` when the height moved by more than the epsilon and offsets of the
    /// following rows were updated, `Ok(false)` when nothing downstream changed. In uniform
    /// mode measurements are ignored.
    pub fn report_measured(&mut self, id: &K, height: f64) -> Result<bool, WindowError> {
        let index = self.index_of(id).ok_or(WindowError::UnknownId)?;
        Ok(self.apply_measurement(index, height))
    }

    fn apply_measurement(&mut self, index: usize, height: f64) -> bool {
        if self.uniform.is_some() {
            vtrace!(index, height, "report_measured ignored in uniform mode");
            return false;
        }
        let height = sanitize_height(height);
        let cur = self.heights[index];
        let delta = height - cur;
        if delta <= self.epsilon && delta >= -self.epsilon {
            self.states[index] = RowHeight::Measured(cur);
            return false;
        }
        vtrace!(index, height, delta, "report_measured");
        self.states[index] = RowHeight::Measured(height);
        self.heights[index] = height;
        self.sums.add(index, delta);
        true
    }

    pub fn row_height(&self, id: &K) -> Result<RowHeight, WindowError> {
        let index = self.index_of(id).ok_or(WindowError::UnknownId)?;
        Ok(self.states[index])
    }

    pub fn is_measured(&self, id: &K) -> bool {
        self.index_of(id)
            .is_some_and(|i| matches!(self.states[i], RowHeight::Measured(_)))
    }

    /// Number of rows holding a real measurement.
    pub fn measured_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| matches!(s, RowHeight::Measured(_)))
            .count()
    }

    /// Top edge of the row, relative to the top of the list.
    pub fn offset(&self, id: &K) -> Result<f64, WindowError> {
        let index = self.index_of(id).ok_or(WindowError::UnknownId)?;
        Ok(self.start_of(index))
    }

    /// Current best-known height of the row.
    pub fn height(&self, id: &K) -> Result<f64, WindowError> {
        let index = self.index_of(id).ok_or(WindowError::UnknownId)?;
        Ok(self.heights[index])
    }

    pub fn offset_at(&self, index: usize) -> Option<f64> {
        (index < self.len()).then(|| self.start_of(index))
    }

    pub fn height_at(&self, index: usize) -> Option<f64> {
        self.heights.get(index).copied()
    }

    pub fn row(&self, index: usize) -> Option<VirtualRow> {
        let height = self.height_at(index)?;
        Some(VirtualRow {
            index,
            start: self.start_of(index),
            height,
        })
    }

    pub fn total_height(&self) -> f64 {
        match self.uniform {
            Some(h) => self.len() as f64 * h,
            None => self.sums.total(),
        }
    }

    /// Index of the row covering `offset`, clamped to the last row.
    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        Some(self.rows_ending_at_or_before(offset).min(self.len() - 1))
    }

    /// Calls `f` for every row in `window`, without allocating.
    pub fn for_each_row(&self, window: RowWindow, mut f: impl FnMut(VirtualRow)) {
        let end = window.end_index.min(self.len());
        if window.start_index >= end {
            return;
        }
        let mut start = self.start_of(window.start_index);
        for index in window.start_index..end {
            let height = self.heights[index];
            f(VirtualRow {
                index,
                start,
                height,
            });
            start += height;
        }
    }

    /// Measured heights keyed by id, e.g. to persist them across sessions.
    pub fn export_measurements(&self) -> Vec<(K, f64)> {
        self.ids
            .iter()
            .zip(self.states.iter())
            .filter_map(|(id, state)| match *state {
                RowHeight::Measured(h) => Some((id.clone(), h)),
                _ => None,
            })
            .collect()
    }

    /// Applies previously exported measurements; ids not in the sequence are skipped.
    ///
    /// Returns how many entries were applied.
    pub fn import_measurements(&mut self, entries: impl IntoIterator<Item = (K, f64)>) -> usize {
        if self.uniform.is_some() {
            return 0;
        }
        let mut applied = 0usize;
        for (id, height) in entries {
            let Some(index) = self.index_of(&id) else {
                continue;
            };
            let height = sanitize_height(height);
            self.states[index] = RowHeight::Measured(height);
            self.heights[index] = height;
            applied += 1;
        }
        self.rebuild_sums();
        vdebug!(applied, "import_measurements");
        applied
    }

    /// Computes the rows to mount; see [`crate::compute_window`].
    pub fn window(
        &self,
        scroll_offset: f64,
        viewport_height: f64,
        render_margin: f64,
    ) -> RowWindow {
        crate::window::compute_window(self, scroll_offset, viewport_height, render_margin)
    }

    /// Number of leading rows whose bottom edge is `<= target`, i.e. the index of the first
    /// row ending below `target` (may equal `len()`).
    pub(crate) fn rows_ending_at_or_before(&self, target: f64) -> usize {
        let n = self.len();
        if target < 0.0 {
            return 0;
        }
        match self.uniform {
            Some(h) if h <= 0.0 => n,
            Some(h) => {
                let mut q = ((target / h) as usize).min(n);
                while q > 0 && (q as f64) * h > target {
                    q -= 1;
                }
                while q < n && ((q + 1) as f64) * h <= target {
                    q += 1;
                }
                q
            }
            None => self.sums.count_ending_at_or_before(target),
        }
    }

    /// Number of rows whose top edge is `< target`.
    pub(crate) fn rows_starting_before(&self, target: f64) -> usize {
        let n = self.len();
        if n == 0 || target <= 0.0 {
            return 0;
        }
        match self.uniform {
            Some(h) if h <= 0.0 => n,
            Some(h) => {
                let mut q = ((target / h) as usize).min(n);
                while q > 0 && ((q - 1) as f64) * h >= target {
                    q -= 1;
                }
                while q < n && (q as f64) * h < target {
                    q += 1;
                }
                q
            }
            // Row i starts where row i - 1 ends; row 0 always starts at 0.
            None => (self.sums.count_ending_before(target) + 1).min(n),
        }
    }

    fn start_of(&self, index: usize) -> f64 {
        match self.uniform {
            Some(h) => index as f64 * h,
            None => self.sums.prefix_sum(index),
        }
    }

    fn rebuild_sums(&mut self) {
        self.sums = match self.uniform {
            Some(_) => Fenwick::from_heights(&[]),
            None => Fenwick::from_heights(&self.heights),
        };
    }
}
