use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::models::{Account, Album, ContentItem, ContentKind, LongPost, ShortPost};

/// Calendar days are bucketed in UTC+8 regardless of where the viewer is.
pub const DISPLAY_OFFSET: FixedOffset = match FixedOffset::east_opt(8 * 3600) {
    Some(offset) => offset,
    None => panic!("display offset out of range"),
};

/// The three collections as returned by one successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub thoughts: Vec<ShortPost>,
    pub articles: Vec<LongPost>,
    pub albums: Vec<Album>,
}

impl Snapshot {
    pub fn new(thoughts: Vec<ShortPost>, articles: Vec<LongPost>, albums: Vec<Album>) -> Self {
        Self {
            thoughts,
            articles,
            albums,
        }
    }

    /// One collection as generic items, in service order.
    pub fn collection(&self, kind: ContentKind) -> Vec<ContentItem> {
        match kind {
            ContentKind::Thoughts => self.thoughts.iter().cloned().map(Into::into).collect(),
            ContentKind::Articles => self.articles.iter().cloned().map(Into::into).collect(),
            ContentKind::Gallery => self.albums.iter().cloned().map(Into::into).collect(),
        }
    }

    /// All items, thoughts then articles then albums.
    pub fn items(&self) -> impl Iterator<Item = ContentItem> + '_ {
        ContentKind::ALL
            .into_iter()
            .flat_map(|kind| self.collection(kind))
    }

    pub fn len(&self) -> usize {
        self.thoughts.len() + self.articles.len() + self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sorts items newest first. The sort is stable, so equal dates keep
/// their input order.
pub fn sort_newest_first(items: &mut [ContentItem]) {
    items.sort_by(|a, b| b.date().cmp(&a.date()));
}

/// The home feed: every item across the three collections, newest first.
pub fn merge_feed(snapshot: &Snapshot) -> Vec<ContentItem> {
    let mut items: Vec<ContentItem> = snapshot.items().collect();
    sort_newest_first(&mut items);
    items
}

pub fn display_day(date: DateTime<Utc>) -> NaiveDate {
    date.with_timezone(&DISPLAY_OFFSET).date_naive()
}

/// The UTC+8 day the journal counts from.
pub fn journal_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 1).unwrap_or(NaiveDate::MIN)
}

/// Which day of the journal `now` falls on. The start day is day 1.
pub fn days_together(now: DateTime<Utc>) -> i64 {
    (display_day(now) - journal_start()).num_days() + 1
}

/// What was posted on one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayActivity {
    pub count: usize,
    pub male: bool,
    pub female: bool,
}

impl DayActivity {
    pub fn has(&self, author: Account) -> bool {
        match author {
            Account::Male => self.male,
            Account::Female => self.female,
        }
    }
}

/// Items bucketed by their UTC+8 calendar day.
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    days: BTreeMap<NaiveDate, Vec<ContentItem>>,
}

impl CalendarIndex {
    /// Items posted on `day`, in the order they were indexed.
    pub fn items_on(&self, day: NaiveDate) -> &[ContentItem] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn activity_on(&self, day: NaiveDate) -> DayActivity {
        self.items_on(day)
            .iter()
            .fold(DayActivity::default(), |mut activity, item| {
                activity.count += 1;
                match item.author() {
                    Account::Male => activity.male = true,
                    Account::Female => activity.female = true,
                }
                activity
            })
    }

    /// Days of the month that have at least one item, ascending.
    pub fn active_days_in_month(&self, year: i32, month: u32) -> Vec<u32> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };
        let next = match first.checked_add_months(chrono::Months::new(1)) {
            Some(next) => next,
            None => return Vec::new(),
        };
        self.days
            .range(first..next)
            .map(|(day, _)| day.day())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

pub fn index_by_date<I>(items: I) -> CalendarIndex
where
    I: IntoIterator<Item = ContentItem>,
{
    let mut days: BTreeMap<NaiveDate, Vec<ContentItem>> = BTreeMap::new();
    for item in items {
        days.entry(display_day(item.date())).or_default().push(item);
    }
    CalendarIndex { days }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::Account;

    #[test]
    fn test_merge_feed_orders_across_collections() {
        let snapshot = Snapshot::new(
            vec![thought(1, Account::Male, at(2024, 3, 1, 0, 0), "one")],
            vec![article(1, Account::Female, at(2024, 3, 3, 0, 0), "three", "")],
            vec![album(1, Account::Male, at(2024, 3, 2, 0, 0), None)],
        );

        let feed = merge_feed(&snapshot);
        let days: Vec<u32> = feed.iter().map(|i| i.date().day()).collect();
        assert_eq!(days, vec![3, 2, 1]);
        assert!(feed.windows(2).all(|w| w[0].date() >= w[1].date()));
    }

    #[test]
    fn test_merge_feed_ties_keep_collection_order() {
        let same = at(2024, 5, 5, 12, 0);
        let snapshot = Snapshot::new(
            vec![thought(9, Account::Male, same, "t")],
            vec![article(9, Account::Male, same, "a", "")],
            vec![album(9, Account::Male, same, None)],
        );

        let kinds: Vec<ContentKind> = merge_feed(&snapshot).iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![ContentKind::Thoughts, ContentKind::Articles, ContentKind::Gallery]
        );
    }

    #[test]
    fn test_index_uses_utc_plus_eight() {
        // 2024-03-01 18:00 UTC and 2024-03-02 01:00 UTC are both 2 March in UTC+8.
        let late = thought(1, Account::Male, at(2024, 3, 1, 18, 0), "late");
        let early = thought(2, Account::Female, at(2024, 3, 2, 1, 0), "early");
        // 15:59 UTC is still 1 March in UTC+8.
        let before = thought(3, Account::Male, at(2024, 3, 1, 15, 59), "before");

        let index = index_by_date([late, early, before].map(ContentItem::from));
        let march_2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let ids: Vec<i64> = index.items_on(march_2).iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![1, 2]);

        let march_1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(index.items_on(march_1).len(), 1);
        assert!(index.items_on(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()).is_empty());
    }

    #[test]
    fn test_active_days_in_month() {
        let items = [
            thought(1, Account::Male, at(2024, 2, 29, 1, 0), "leap"),
            thought(2, Account::Male, at(2024, 2, 3, 1, 0), "early"),
            thought(3, Account::Male, at(2024, 2, 3, 2, 0), "same day"),
            // 2024-02-29 20:00 UTC is 1 March in UTC+8.
            thought(4, Account::Male, at(2024, 2, 29, 20, 0), "march"),
        ]
        .map(ContentItem::from);
        let index = index_by_date(items);

        assert_eq!(index.active_days_in_month(2024, 2), vec![3, 29]);
        assert_eq!(index.active_days_in_month(2024, 3), vec![1]);
        assert!(index.active_days_in_month(2024, 13).is_empty());
    }

    #[test]
    fn test_activity_on_counts_items_and_authors() {
        let items = [
            thought(1, Account::Male, at(2024, 2, 3, 1, 0), "a"),
            thought(2, Account::Male, at(2024, 2, 3, 2, 0), "b"),
            thought(3, Account::Female, at(2024, 2, 4, 2, 0), "c"),
        ]
        .map(ContentItem::from);
        let index = index_by_date(items);

        let both = index.activity_on(NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(
            both,
            DayActivity {
                count: 2,
                male: true,
                female: false
            }
        );
        let fourth = index.activity_on(NaiveDate::from_ymd_opt(2024, 2, 4).unwrap());
        assert!(fourth.has(Account::Female) && !fourth.has(Account::Male));
        assert_eq!(
            index.activity_on(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()),
            DayActivity::default()
        );
    }

    #[test]
    fn test_days_together_counts_utc_plus_eight_days() {
        // Midnight 1 December 2025 in UTC+8.
        assert_eq!(days_together(at(2025, 11, 30, 16, 0)), 1);
        assert_eq!(days_together(at(2025, 11, 30, 15, 59)), 0);
        assert_eq!(days_together(at(2025, 12, 1, 15, 59)), 1);
        assert_eq!(days_together(at(2025, 12, 1, 16, 0)), 2);
        assert_eq!(days_together(at(2026, 1, 1, 0, 0)), 32);
    }
}
