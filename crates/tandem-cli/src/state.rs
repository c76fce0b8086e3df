use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::aggregate::{CalendarIndex, Snapshot, index_by_date, merge_feed};
use crate::models::ContentItem;
use crate::pagination::{Paginator, View};

/// Issued before a fetch starts; higher tickets are newer fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// What the render layer shows: the newest applied snapshot and the lists,
/// calendar and page positions derived from it.
#[derive(Debug, Default)]
pub struct ViewState {
    issued: u64,
    applied: Option<FetchTicket>,
    snapshot: Option<Arc<Snapshot>>,
    lists: HashMap<View, Vec<ContentItem>>,
    calendar: CalendarIndex,
    paginator: Paginator,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Installs the result of the fetch that got `ticket`. A result older
    /// than one already applied is dropped and `false` is returned.
    pub fn apply(&mut self, ticket: FetchTicket, snapshot: Snapshot) -> bool {
        if self.applied.is_some_and(|applied| ticket <= applied) {
            debug!(?ticket, applied = ?self.applied, "Discarding stale snapshot");
            return false;
        }

        let feed = merge_feed(&snapshot);
        self.calendar = index_by_date(feed.iter().cloned());
        self.lists.clear();
        for view in View::ALL {
            let items = match view.kind() {
                None => feed.clone(),
                Some(kind) => snapshot.collection(kind),
            };
            self.paginator.set_item_count(view, items.len());
            self.lists.insert(view, items);
        }

        self.snapshot = Some(Arc::new(snapshot));
        self.applied = Some(ticket);
        true
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.clone()
    }

    pub fn items(&self, view: View) -> &[ContentItem] {
        self.lists.get(&view).map(Vec::as_slice).unwrap_or_default()
    }

    /// The items on the view's current page.
    pub fn page(&self, view: View) -> &[ContentItem] {
        self.paginator.paginate(view, self.items(view))
    }

    pub fn calendar(&self) -> &CalendarIndex {
        &self.calendar
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator {
        &mut self.paginator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::models::Account;

    fn snapshot_with(thoughts: usize) -> Snapshot {
        let posts = (0..thoughts as i64)
            .map(|i| thought(i, Account::Male, at(2024, 1, 1, 0, i as u32), "x"))
            .collect();
        Snapshot::new(posts, vec![], vec![])
    }

    #[test]
    fn test_late_result_is_discarded() {
        let mut state = ViewState::new();
        let first = state.begin_fetch();
        let second = state.begin_fetch();

        assert!(state.apply(second, snapshot_with(2)));
        assert!(!state.apply(first, snapshot_with(9)));
        assert_eq!(state.items(View::Thoughts).len(), 2);
        assert!(!state.apply(second, snapshot_with(3)));
    }

    #[test]
    fn test_apply_updates_views_and_pages() {
        let mut state = ViewState::new();
        let ticket = state.begin_fetch();
        state.apply(ticket, snapshot_with(6));

        assert_eq!(state.paginator().total_pages(View::Thoughts), 2);
        assert_eq!(state.paginator().total_pages(View::Gallery), 1);
        assert_eq!(state.items(View::Home).len(), 6);
        // Home is newest first, so the last-minute post leads.
        assert_eq!(state.page(View::Home)[0].id(), 5);

        assert!(state.paginator_mut().set_page(View::Thoughts, 2));
        assert_eq!(state.page(View::Thoughts).len(), 2);

        let ticket = state.begin_fetch();
        state.apply(ticket, snapshot_with(3));
        assert_eq!(state.paginator().current_page(View::Thoughts), 1);
        assert!(!state.calendar().is_empty());
    }

    #[test]
    fn test_empty_state_has_no_items() {
        let state = ViewState::new();
        assert!(state.snapshot().is_none());
        assert!(state.page(View::Home).is_empty());
    }
}
