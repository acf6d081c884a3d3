//! Headless row windowing core for virtualized lists and data tables.
//!
//! For the scheduler-driven orchestrator (throttled scroll handling, rendering, scroll
//! anchoring), see the `rowwindow-scroller` crate.
//!
//! This crate holds the math:
//! - [`HeightTracker`]: per-row heights (unknown, measured, or uniform) and cumulative offsets,
//!   kept in a Fenwick tree so measurements and lookups are `O(log n)`.
//! - [`compute_window`]: maps a scroll offset, viewport height, and render margin to the
//!   contiguous range of rows that must be mounted.
//!
//! It is UI-agnostic. A host layer is expected to provide:
//! - the ordered row ids
//! - viewport height and scroll offset
//! - measured row heights once rows are mounted
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod fenwick;
mod key;
mod state;
mod tracker;
mod types;
mod window;


pub use error::WindowError;
pub use key::RowId;
pub use state::{FrameState, ScrollState, ViewportState};
pub use tracker::{DEFAULT_HEIGHT_EPSILON, HeightTracker};
pub use types::{Align, RowHeight, RowWindow, VirtualRow};
pub use window::{compute_window, try_compute_window};
