use alloc::string::String;

/// Errors raised by the windowing core.
///
/// Measurement and offset errors are local conditions: the scroller resolves them by clamping or
/// by doing nothing. None of them is retried.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WindowError {
    /// The id is not part of the current sequence.
    #[error("unknown row id")]
    UnknownId,

    /// The same id appears twice in a new sequence.
    #[error("duplicate row id at index {index}")]
    DuplicateId { index: usize },

    /// The viewport height is not a positive, finite number.
    #[error("invalid viewport height {height}")]
    InvalidViewport { height: f64 },

    /// A row renderer failed; the rest of the window still rendered.
    #[error("row {index} failed to render: {message}")]
    RowRenderFailure { index: usize, message: String },
}
