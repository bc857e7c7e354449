//! Paged carousel over feed items.

use super::escape_html;

/// Shown in place of cards when there is nothing to display.
pub const EMPTY_MESSAGE: &str = "Unable to load content right now.";

/// A wrap-around window over a list of items.
///
/// Card markup is supplied by the caller, so one carousel serves both
/// reviews and posts.
#[derive(Debug, Clone)]
pub struct Carousel<T> {
    items: Vec<T>,
    index: usize,
    per_page: usize,
}

impl<T> Carousel<T> {
    /// `per_page` is clamped to at least one.
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        Self { items, index: 0, per_page: per_page.max(1) }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the first visible item.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pages(&self) -> usize {
        self.items.len().div_ceil(self.per_page)
    }

    /// Jump to a zero-based page, wrapping past the end.
    pub fn go_to_page(&mut self, page: usize) {
        if self.items.is_empty() {
            return;
        }
        self.index = (page * self.per_page) % self.items.len();
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.index = (self.index + self.per_page) % self.items.len();
    }

    pub fn prev(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        self.index = (self.index + len - self.per_page % len) % len;
    }

    /// Items in the current window; wraps to the start when short.
    pub fn visible(&self) -> Vec<&T> {
        let len = self.items.len();
        (0..self.per_page.min(len))
            .map(|offset| &self.items[(self.index + offset) % len])
            .collect()
    }

    /// Render the current window with `card`.
    pub fn render<F>(&self, card: F) -> String
    where
        F: Fn(&T) -> String,
    {
        if self.items.is_empty() {
            return format!("<p class=\"carousel-empty\" role=\"status\">{}</p>", escape_html(EMPTY_MESSAGE));
        }

        let cards: String = self.visible().into_iter().map(card).collect();
        format!(
            "<div class=\"carousel\" data-index=\"{}\" data-total=\"{}\"><div class=\"carousel-track\">{}</div></div>",
            self.index,
            self.items.len(),
            cards
        )
    }
}
