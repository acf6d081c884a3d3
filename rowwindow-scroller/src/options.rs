use std::fmt;
use std::rc::Rc;

use rowwindow::{DEFAULT_HEIGHT_EPSILON, RowWindow, WindowError};

/// Fired after a throttled recomputation (or a measurement) changed the visible window.
///
/// The host is expected to schedule a render in response.
pub type WindowChangeHook = Rc<dyn Fn(RowWindow)>;

/// Fired when the scroller itself moves the viewport: anchor adjustment, `scroll_to_row`,
/// restored views. The host applies the offset to the real scroll container before the next
/// paint.
pub type ScrollRequestHook = Rc<dyn Fn(f64)>;

/// Receives row render failures. They are isolated per row and never abort a render pass.
pub type RenderFailureHook = Rc<dyn Fn(&WindowError)>;

/// Configuration for [`crate::VirtualScroller`].
///
/// Hooks are reference counted, so cloning options is cheap.
#[derive(Clone)]
pub struct ScrollerOptions {
    /// Estimate used for rows that have not been measured yet.
    pub default_row_height: f64,
    /// When set, every row has this height and measurements are ignored.
    pub uniform_height: Option<f64>,
    /// Extra pixels rendered above and below the viewport.
    pub render_margin: f64,
    /// Initial viewport height.
    pub viewport_height: f64,
    pub initial_scroll_offset: f64,
    /// Minimum delay between scroll-triggered recomputations (one frame by default).
    pub scroll_throttle_ms: u64,
    /// Minimum delay between resize-triggered recomputations.
    pub resize_throttle_ms: u64,
    pub height_epsilon: f64,

    pub on_window_change: Option<WindowChangeHook>,
    pub on_scroll_request: Option<ScrollRequestHook>,
    pub on_render_failure: Option<RenderFailureHook>,
}

impl ScrollerOptions {
    /// Options for rows estimated at `default_row_height`; the render margin defaults to one
    /// estimated row.
    pub fn new(default_row_height: f64) -> Self {
        Self {
            default_row_height,
            uniform_height: None,
            render_margin: default_row_height,
            viewport_height: 0.0,
            initial_scroll_offset: 0.0,
            scroll_throttle_ms: 16,
            resize_throttle_ms: 400,
            height_epsilon: DEFAULT_HEIGHT_EPSILON,
            on_window_change: None,
            on_scroll_request: None,
            on_render_failure: None,
        }
    }

    pub fn with_uniform_height(mut self, uniform_height: Option<f64>) -> Self {
        self.uniform_height = uniform_height;
        self
    }

    pub fn with_render_margin(mut self, render_margin: f64) -> Self {
        self.render_margin = render_margin;
        self
    }

    pub fn with_viewport_height(mut self, viewport_height: f64) -> Self {
        self.viewport_height = viewport_height;
        self
    }

    pub fn with_initial_scroll_offset(mut self, offset: f64) -> Self {
        self.initial_scroll_offset = offset;
        self
    }

    pub fn with_throttle_ms(mut self, scroll_ms: u64, resize_ms: u64) -> Self {
        self.scroll_throttle_ms = scroll_ms;
        self.resize_throttle_ms = resize_ms;
        self
    }

    pub fn with_height_epsilon(mut self, epsilon: f64) -> Self {
        self.height_epsilon = epsilon;
        self
    }

    pub fn with_on_window_change(mut self, f: Option<impl Fn(RowWindow) + 'static>) -> Self {
        self.on_window_change = f.map(|f| Rc::new(f) as _);
        self
    }

    pub fn with_on_scroll_request(mut self, f: Option<impl Fn(f64) + 'static>) -> Self {
        self.on_scroll_request = f.map(|f| Rc::new(f) as _);
        self
    }

    pub fn with_on_render_failure(mut self, f: Option<impl Fn(&WindowError) + 'static>) -> Self {
        self.on_render_failure = f.map(|f| Rc::new(f) as _);
        self
    }
}

impl Default for ScrollerOptions {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl fmt::Debug for ScrollerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollerOptions")
            .field("default_row_height", &self.default_row_height)
            .field("uniform_height", &self.uniform_height)
            .field("render_margin", &self.render_margin)
            .field("viewport_height", &self.viewport_height)
            .field("initial_scroll_offset", &self.initial_scroll_offset)
            .field("scroll_throttle_ms", &self.scroll_throttle_ms)
            .field("resize_throttle_ms", &self.resize_throttle_ms)
            .field("height_epsilon", &self.height_epsilon)
            .finish_non_exhaustive()
    }
}
