//! Virtual scroller orchestration for the `rowwindow` crate.
//!
//! `rowwindow` owns the math (heights, offsets, visible windows). This crate wires it to a host
//! UI without depending on any particular framework:
//!
//! - [`VirtualScroller`]: renders only the visible window through a [`RowRenderer`], keeps the
//!   scroll anchor stable as rows are measured, and answers `scroll_to_row` /
//!   `is_row_fully_visible`.
//! - [`Scheduler`]: injected timer capability used to throttle scroll and resize handling;
//!   [`ManualScheduler`] is a deterministic implementation.
//! - [`ScrollAnchor`]: capture/apply helpers to keep the viewport on the same row across
//!   sequence changes.
//! - [`ViewStore`]: key-value collaborator for persisting scroll position and learned heights.
//!
//! Everything here is single-threaded: hooks and scheduled tasks are `Rc`-based and run on the
//! host's UI thread.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod anchor;
mod options;
mod render;
mod scheduler;
mod scroller;
mod store;
mod throttle;

#[cfg(test)]
mod tests;

pub use anchor::{ScrollAnchor, anchor_target, capture_anchor};
pub use options::{RenderFailureHook, ScrollRequestHook, ScrollerOptions, WindowChangeHook};
pub use render::{RenderedRow, RenderedWindow, RowRenderer};
pub use scheduler::{CancelToken, ManualScheduler, Scheduler, Task};
pub use scroller::{ScrollerPhase, VirtualScroller};
pub use store::{MemoryViewStore, SavedView, ViewStore};

pub use rowwindow::{Align, RowWindow, WindowError};
