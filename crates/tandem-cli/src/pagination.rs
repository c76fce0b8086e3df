use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::ContentKind;

pub const PAGE_SIZE: usize = 4;

/// A paginated list the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Thoughts,
    Articles,
    Gallery,
}

impl View {
    pub const ALL: [View; 4] = [View::Home, View::Thoughts, View::Articles, View::Gallery];

    /// The collection behind the view; `None` for the merged home feed.
    pub fn kind(self) -> Option<ContentKind> {
        match self {
            View::Home => None,
            View::Thoughts => Some(ContentKind::Thoughts),
            View::Articles => Some(ContentKind::Articles),
            View::Gallery => Some(ContentKind::Gallery),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Thoughts => "thoughts",
            View::Articles => "articles",
            View::Gallery => "gallery",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("home") {
            return Ok(View::Home);
        }
        s.parse::<ContentKind>().map(|kind| match kind {
            ContentKind::Thoughts => View::Thoughts,
            ContentKind::Articles => View::Articles,
            ContentKind::Gallery => View::Gallery,
        })
    }
}

/// Number of pages needed for `count` items; an empty list still has one.
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// The items on 1-based `page`. Out of range pages are empty.
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if page == 0 || start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub current: usize,
    pub total: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current: 1,
            total: 1,
        }
    }
}

/// Current page and page count for every view.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    states: HashMap<View, PageState>,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, view: View) -> PageState {
        self.states.get(&view).copied().unwrap_or_default()
    }

    pub fn current_page(&self, view: View) -> usize {
        self.state(view).current
    }

    pub fn total_pages(&self, view: View) -> usize {
        self.state(view).total
    }

    /// Records the size of a freshly fetched collection. The current page
    /// is pulled back into range if the collection shrank.
    pub fn set_item_count(&mut self, view: View, count: usize) {
        let state = self.states.entry(view).or_default();
        state.total = total_pages(count);
        state.current = state.current.clamp(1, state.total);
    }

    /// Moves to page `n`. Returns false and changes nothing when `n` is
    /// outside `1..=total_pages`.
    pub fn set_page(&mut self, view: View, n: usize) -> bool {
        let state = self.states.entry(view).or_default();
        if n < 1 || n > state.total {
            return false;
        }
        state.current = n;
        true
    }

    pub fn has_prev(&self, view: View) -> bool {
        self.current_page(view) > 1
    }

    pub fn has_next(&self, view: View) -> bool {
        let state = self.state(view);
        state.current < state.total
    }

    pub fn next_page(&mut self, view: View) -> bool {
        let next = self.current_page(view) + 1;
        self.set_page(view, next)
    }

    pub fn prev_page(&mut self, view: View) -> bool {
        let prev = self.current_page(view).saturating_sub(1);
        self.set_page(view, prev)
    }

    pub fn paginate<'a, T>(&self, view: View, items: &'a [T]) -> &'a [T] {
        page_slice(items, self.current_page(view))
    }

    /// Markers for the page bar, or nothing when there is a single page.
    pub fn markers(&self, view: View) -> Vec<PageMarker> {
        let state = self.state(view);
        if state.total <= 1 {
            return Vec::new();
        }
        page_markers(state.current, state.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page { number: usize, current: bool },
    Ellipsis,
}

/// Page 1, the last page and the neighbours of `current` are shown; any
/// other run of pages collapses into one ellipsis.
pub fn page_markers(current: usize, total: usize) -> Vec<PageMarker> {
    let mut markers = Vec::new();
    for number in 1..=total {
        let shown = number == 1 || number == total || number.abs_diff(current) <= 1;
        if shown {
            markers.push(PageMarker::Page {
                number,
                current: number == current,
            });
        } else if markers.last() != Some(&PageMarker::Ellipsis) {
            markers.push(PageMarker::Ellipsis);
        }
    }
    markers
}
