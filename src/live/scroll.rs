/// Content measurements supplied by the rendering layer, in scroll units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentMetrics {
    pub content_height: u32,
    pub viewport_height: u32,
}

impl ContentMetrics {
    pub fn new(content_height: u32, viewport_height: u32) -> Self {
        Self {
            content_height,
            viewport_height,
        }
    }

    /// Furthest offset that still fills the viewport. Content shorter than
    /// the viewport cannot scroll at all.
    pub fn max_scroll(&self) -> u32 {
        self.content_height.saturating_sub(self.viewport_height)
    }
}

/// Scroll offset of the current song, bounded by `0..=max_scroll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollPosition {
    offset: u32,
    max_scroll: u32,
}

impl ScrollPosition {
    pub fn new(max_scroll: u32) -> Self {
        Self {
            offset: 0,
            max_scroll,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn max_scroll(&self) -> u32 {
        self.max_scroll
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.max_scroll
    }

    /// Adopt new bounds, pulling the offset back inside them if the content
    /// shrank.
    pub fn set_metrics(&mut self, metrics: ContentMetrics) {
        self.max_scroll = metrics.max_scroll();
        self.offset = self.offset.min(self.max_scroll);
    }

    /// Move forward by `delta`, stopping at `max_scroll`. Returns `true` when
    /// the offset sits on the bound afterwards; the caller decides what
    /// reaching the end means.
    pub fn advance(&mut self, delta: u32) -> bool {
        self.offset = self.offset.saturating_add(delta).min(self.max_scroll);
        self.at_end()
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
