//! Reading position from page and viewport geometry.
//!
//! Pages are stacked vertically. The current page is the one sharing the
//! most vertical extent with the viewport; the scroll fraction is where the
//! viewport centre sits within that page.

use serde::{Deserialize, Serialize};

use crate::types::clamp_fraction;

/// Vertical extent of an element, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub top: f64,
    pub height: f64,
}

impl Span {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height.max(0.0)
    }

    pub fn center(&self) -> f64 {
        self.top + self.height.max(0.0) / 2.0
    }

    /// Length of the vertical intersection with `other`, never negative.
    pub fn overlap(&self, other: &Span) -> f64 {
        (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0)
    }

    /// Distance from `y` to the nearest point of this span.
    fn distance_to(&self, y: f64) -> f64 {
        if y < self.top {
            self.top - y
        } else if y > self.bottom() {
            y - self.bottom()
        } else {
            0.0
        }
    }
}

/// Snapshot of the viewport and page elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport: Span,
    /// Page spans in reading order.
    pub pages: Vec<Span>,
}

/// Derived reading position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePosition {
    /// 1-based.
    pub page_number: u32,
    pub scroll_fraction: f64,
    pub total_pages: u32,
}

/// Compute the reading position, or `None` when no pages are laid out.
pub fn compute_position(layout: &Layout) -> Option<PagePosition> {
    let last = layout.pages.last()?;
    let total_pages = u32::try_from(layout.pages.len()).unwrap_or(u32::MAX);
    let center = layout.viewport.center();

    if center > last.bottom() {
        return Some(PagePosition {
            page_number: total_pages,
            scroll_fraction: 1.0,
            total_pages,
        });
    }

    let index = current_page_index(layout, center);
    let page = &layout.pages[index];
    let scroll_fraction = if page.height > 0.0 {
        clamp_fraction((center - page.top) / page.height)
    } else {
        0.0
    };

    Some(PagePosition {
        page_number: u32::try_from(index + 1).unwrap_or(u32::MAX),
        scroll_fraction,
        total_pages,
    })
}

/// Index of the page with the greatest viewport overlap. When nothing
/// overlaps, the page closest to the viewport centre. First wins ties.
fn current_page_index(layout: &Layout, center: f64) -> usize {
    let mut best = 0;
    let mut best_overlap = 0.0;
    for (i, page) in layout.pages.iter().enumerate() {
        let overlap = page.overlap(&layout.viewport);
        if overlap > best_overlap {
            best = i;
            best_overlap = overlap;
        }
    }
    if best_overlap > 0.0 {
        return best;
    }

    layout
        .pages
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.distance_to(center).total_cmp(&b.1.distance_to(center)))
        .map_or(0, |(i, _)| i)
}
