/// Height bookkeeping state of a single row.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowHeight {
    /// Not measured yet; the default estimate is in effect.
    Unknown,
    /// Reported by the host after the row was mounted.
    Measured(f64),
    /// Uniform height asserted for every row.
    Fixed(f64),
}

impl RowHeight {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Resolves the state to a height, falling back to `estimate` for unknown rows.
    pub fn resolve(&self, estimate: f64) -> f64 {
        match *self {
            Self::Unknown => estimate,
            Self::Measured(h) | Self::Fixed(h) => h,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    /// Leaves the offset alone when the row is fully visible, otherwise scrolls the nearest edge
    /// into view.
    Auto,
}

/// A contiguous range of row indexes to mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowWindow {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl RowWindow {
    pub const EMPTY: Self = Self {
        start_index: 0,
        end_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }

    pub fn first_index(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.start_index)
    }

    /// Inclusive last index.
    pub fn last_index(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.end_index - 1)
    }
}

/// Geometry of one row in the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualRow {
    pub index: usize,
    pub start: f64,
    pub height: f64,
}

impl VirtualRow {
    pub fn end(&self) -> f64 {
        self.start + self.height
    }
}
