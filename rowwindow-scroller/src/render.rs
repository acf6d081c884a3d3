use std::fmt;

use rowwindow::RowWindow;

/// Capability that turns a row id into renderable content.
///
/// Any `FnMut(&K) -> Result<C, E>` closure implements it.
pub trait RowRenderer<K> {
    type Content;
    type Error: fmt::Display;

    fn render_row(&mut self, id: &K) -> Result<Self::Content, Self::Error>;
}

impl<K, C, E, F> RowRenderer<K> for F
where
    F: FnMut(&K) -> Result<C, E>,
    E: fmt::Display,
{
    type Content = C;
    type Error = E;

    fn render_row(&mut self, id: &K) -> Result<C, E> {
        self(id)
    }
}

/// One mounted row.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedRow<K, C> {
    pub id: K,
    pub index: usize,
    pub start: f64,
    pub height: f64,
    /// `None` when the renderer failed for this row.
    pub content: Option<C>,
}

/// Output of a render pass: a top spacer, the mounted rows, and a bottom spacer.
///
/// The spacers stand in for every unmounted row, so the scroll container still reports the full
/// content height.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedWindow<K, C> {
    pub window: RowWindow,
    pub top_spacer: f64,
    pub rows: Vec<RenderedRow<K, C>>,
    pub bottom_spacer: f64,
    pub total_height: f64,
}

impl<K, C> RenderedWindow<K, C> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = &RenderedRow<K, C>> {
        self.rows.iter().filter(|r| r.content.is_none())
    }
}
