//! Unread counts for content posted by the other account since the last
//! time the notification panel was opened.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::aggregate::{Snapshot, merge_feed};
use crate::checkpoint::CheckpointStore;
use crate::client::{ContentStore, fetch_all};
use crate::errors::ClientError;
use crate::models::{Account, ContentItem};

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const PANEL_SIZE: usize = 10;
const BADGE_CAP: usize = 99;

/// `last_check` for an account that has never opened the panel.
pub fn first_login_sentinel() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(StdMutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(StdMutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Items by the other account that are strictly newer than `since`.
pub fn count_unread(snapshot: &Snapshot, viewer: Account, since: DateTime<Utc>) -> usize {
    let other = viewer.other();
    let newer = |author: Account, date: DateTime<Utc>| author == other && date > since;

    snapshot.thoughts.iter().filter(|p| newer(p.author, p.date)).count()
        + snapshot.articles.iter().filter(|p| newer(p.author, p.date)).count()
        + snapshot.albums.iter().filter(|a| newer(a.author, a.date)).count()
}

/// The newest `limit` items by `author`, in feed order.
pub fn recent_from(snapshot: &Snapshot, author: Account, limit: usize) -> Vec<ContentItem> {
    merge_feed(snapshot)
        .into_iter()
        .filter(|item| item.author() == author)
        .take(limit)
        .collect()
}

/// Badge text for an unread count; hidden when there is nothing new.
pub fn badge_label(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        n if n > BADGE_CAP => Some(format!("{BADGE_CAP}+")),
        n => Some(n.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    LoggedOut,
    LoggedIn {
        account: Account,
        last_check: DateTime<Utc>,
        unread: usize,
    },
}

pub struct NotificationTracker {
    store: Arc<dyn ContentStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    clock: Arc<dyn Clock>,
    session: Session,
}

impl NotificationTracker {
    pub fn new(
        store: Arc<dyn ContentStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            checkpoints,
            clock,
            session: Session::LoggedOut,
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.session, Session::LoggedIn { .. })
    }

    pub fn unread(&self) -> usize {
        match self.session {
            Session::LoggedIn { unread, .. } => unread,
            Session::LoggedOut => 0,
        }
    }

    pub fn badge(&self) -> Option<String> {
        badge_label(self.unread())
    }

    /// Starts a session and counts unread items right away. A failed
    /// fetch leaves the session logged in with nothing unread.
    #[instrument(skip_all, fields(account = %account))]
    pub async fn login(&mut self, account: Account) -> Result<usize, ClientError> {
        let last_check = self
            .checkpoints
            .load(account)?
            .unwrap_or_else(first_login_sentinel);
        self.session = Session::LoggedIn {
            account,
            last_check,
            unread: 0,
        };
        info!(%last_check, "Logged in");

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Initial unread count failed");
        }
        Ok(self.unread())
    }

    /// Refetches everything and recounts unread items.
    pub async fn refresh(&mut self) -> Result<usize, ClientError> {
        if !self.is_logged_in() {
            return Ok(0);
        }
        let snapshot = fetch_all(self.store.as_ref()).await?;
        Ok(self.recount(&snapshot).unwrap_or(0))
    }

    /// Recounts unread items in an already fetched snapshot against the
    /// current `last_check`. `None` when logged out.
    pub fn recount(&mut self, snapshot: &Snapshot) -> Option<usize> {
        let Session::LoggedIn {
            account,
            last_check,
            unread,
        } = &mut self.session
        else {
            return None;
        };
        *unread = count_unread(snapshot, *account, *last_check);
        Some(*unread)
    }

    pub fn store(&self) -> Arc<dyn ContentStore> {
        self.store.clone()
    }

    /// Returns the other account's latest items and marks everything up to
    /// now as seen.
    ///
    /// Opening the panel only counts as seeing its contents when they were
    /// actually fetched. On a failed fetch `last_check`, the saved checkpoint
    /// and the unread count are all left as they were, so nothing the user
    /// never saw is marked as read.
    #[instrument(skip_all)]
    pub async fn open_panel(&mut self) -> Result<Vec<ContentItem>, ClientError> {
        let Session::LoggedIn { account, .. } = self.session else {
            return Err(ClientError::NotLoggedIn);
        };

        let snapshot = fetch_all(self.store.as_ref()).await?;
        let recent = recent_from(&snapshot, account.other(), PANEL_SIZE);

        let now = self.clock.now();
        self.checkpoints.save(account, now)?;
        self.session = Session::LoggedIn {
            account,
            last_check: now,
            unread: 0,
        };
        debug!(shown = recent.len(), %now, "Opened notification panel");
        Ok(recent)
    }

    /// Drops the in-memory session. The saved checkpoint stays.
    pub fn logout(&mut self) {
        self.session = Session::LoggedOut;
        info!("Logged out");
    }
}

pub type SharedTracker = Arc<Mutex<NotificationTracker>>;

/// Background task recounting unread items on a fixed period.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(tracker: SharedTracker, period: Duration, updates: watch::Sender<usize>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately and login has just counted.
            interval.tick().await;

            loop {
                interval.tick().await;
                let (store, account) = {
                    let tracker = tracker.lock().await;
                    match tracker.session() {
                        Session::LoggedIn { account, .. } => (tracker.store(), account),
                        Session::LoggedOut => break,
                    }
                };

                // Fetched without the lock; counted against the `last_check`
                // that is current once the result lands.
                let snapshot = match fetch_all(store.as_ref()).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!(error = %e, "Polling for new content failed");
                        continue;
                    }
                };

                let mut tracker = tracker.lock().await;
                match tracker.session() {
                    Session::LoggedIn { account: current, .. } if current == account => {}
                    _ => break,
                }
                if let Some(unread) = tracker.recount(&snapshot) {
                    debug!(unread, "Polled for new content");
                    updates.send_replace(unread);
                }
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A tracker together with the poll that keeps its count fresh. Login
/// starts the poll, logout stops it.
pub struct NotificationCenter {
    tracker: SharedTracker,
    poller: Option<Poller>,
    period: Duration,
    unread_tx: watch::Sender<usize>,
}

impl NotificationCenter {
    pub fn new(tracker: NotificationTracker, period: Duration) -> Self {
        let (unread_tx, _) = watch::channel(0);
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            poller: None,
            period,
            unread_tx,
        }
    }

    /// Receives every new unread count.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.unread_tx.subscribe()
    }

    pub async fn login(&mut self, account: Account) -> Result<usize, ClientError> {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        let unread = self.tracker.lock().await.login(account).await?;
        self.unread_tx.send_replace(unread);
        self.poller = Some(Poller::spawn(
            self.tracker.clone(),
            self.period,
            self.unread_tx.clone(),
        ));
        Ok(unread)
    }

    pub async fn open_panel(&self) -> Result<Vec<ContentItem>, ClientError> {
        let items = self.tracker.lock().await.open_panel().await?;
        self.unread_tx.send_replace(0);
        Ok(items)
    }

    pub async fn unread(&self) -> usize {
        self.tracker.lock().await.unread()
    }

    pub async fn logout(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.tracker.lock().await.logout();
        self.unread_tx.send_replace(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::models::ContentKind;
    use crate::testing::InMemoryStore;
    use chrono::TimeDelta;

    fn tracker_with(
        store: Arc<InMemoryStore>,
        checkpoints: Arc<MemoryCheckpointStore>,
        now: DateTime<Utc>,
    ) -> NotificationTracker {
        NotificationTracker::new(store, checkpoints, Arc::new(FixedClock::new(now)))
    }

    #[test]
    fn test_unread_counts_strictly_newer_items_by_other_account() {
        let t = at(2024, 6, 1, 12, 0);
        let snapshot = Snapshot::new(
            vec![
                thought(1, Account::Female, t - TimeDelta::seconds(1), "before"),
                thought(2, Account::Female, t + TimeDelta::seconds(1), "after"),
                thought(3, Account::Male, t + TimeDelta::seconds(9), "mine"),
                thought(4, Account::Female, t, "exactly at"),
            ],
            vec![],
            vec![album(1, Account::Female, t + TimeDelta::seconds(5), None)],
        );
        assert_eq!(count_unread(&snapshot, Account::Male, t), 2);
        assert_eq!(count_unread(&snapshot, Account::Female, t), 1);
    }

    #[test]
    fn test_badge_label() {
        assert_eq!(badge_label(0), None);
        assert_eq!(badge_label(7).as_deref(), Some("7"));
        assert_eq!(badge_label(99).as_deref(), Some("99"));
        assert_eq!(badge_label(100).as_deref(), Some("99+"));
    }

    #[test]
    fn test_recent_from_is_capped_and_newest_first() {
        let thoughts = (0..12)
            .map(|i| thought(i, Account::Female, at(2024, 1, 1 + i as u32, 0, 0), "x"))
            .collect();
        let albums = vec![album(1, Account::Male, at(2024, 2, 1, 0, 0), None)];
        let snapshot = Snapshot::new(thoughts, vec![], albums);

        let recent = recent_from(&snapshot, Account::Female, PANEL_SIZE);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id(), 11);
        assert!(recent.iter().all(|i| i.author() == Account::Female));
    }

    #[tokio::test]
    async fn test_first_login_counts_everything_since_sentinel() {
        let store = Arc::new(InMemoryStore::new(Snapshot::new(
            vec![thought(1, Account::Female, at(2001, 1, 1, 0, 0), "old but unseen")],
            vec![article(1, Account::Female, at(2024, 1, 1, 0, 0), "t", "c")],
            vec![],
        )));
        let mut tracker = tracker_with(store, Arc::new(MemoryCheckpointStore::new()), Utc::now());

        assert_eq!(tracker.login(Account::Male).await.unwrap(), 2);
        match tracker.session() {
            Session::LoggedIn { last_check, .. } => assert_eq!(last_check, first_login_sentinel()),
            Session::LoggedOut => panic!("expected a session"),
        }
    }

    #[tokio::test]
    async fn test_open_panel_resets_and_persists() {
        let now = at(2024, 6, 2, 0, 0);
        let store = Arc::new(InMemoryStore::new(Snapshot::new(
            vec![thought(1, Account::Female, at(2024, 6, 1, 0, 0), "hi")],
            vec![],
            vec![],
        )));
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut tracker = tracker_with(store, checkpoints.clone(), now);

        assert_eq!(tracker.login(Account::Male).await.unwrap(), 1);
        assert_eq!(tracker.badge().as_deref(), Some("1"));

        let panel = tracker.open_panel().await.unwrap();
        assert_eq!(panel.len(), 1);
        assert_eq!(tracker.unread(), 0);
        assert_eq!(checkpoints.load(Account::Male).unwrap(), Some(now));

        assert_eq!(tracker.refresh().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_advance_checkpoint() {
        let store = Arc::new(InMemoryStore::new(Snapshot::default()));
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut tracker = tracker_with(store.clone(), checkpoints.clone(), Utc::now());
        tracker.login(Account::Female).await.unwrap();

        store.fail_all();
        assert!(tracker.open_panel().await.is_err());
        assert_eq!(checkpoints.load(Account::Female).unwrap(), None);
    }

    #[tokio::test]
    async fn test_one_failing_collection_changes_nothing() {
        let store = Arc::new(InMemoryStore::new(Snapshot::new(
            vec![thought(1, Account::Female, at(2024, 6, 1, 0, 0), "hi")],
            vec![],
            vec![album(1, Account::Female, at(2024, 6, 1, 1, 0), None)],
        )));
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut tracker = tracker_with(store.clone(), checkpoints.clone(), at(2024, 6, 2, 0, 0));
        assert_eq!(tracker.login(Account::Male).await.unwrap(), 2);
        let before = tracker.session();

        store.push_thought(thought(2, Account::Female, at(2024, 6, 1, 6, 0), "more"));
        store.set_failing(ContentKind::Articles, true);

        assert!(tracker.refresh().await.is_err());
        assert_eq!(tracker.session(), before);
        assert!(tracker.open_panel().await.is_err());
        assert_eq!(tracker.session(), before);
        assert_eq!(tracker.unread(), 2);
        assert_eq!(checkpoints.load(Account::Male).unwrap(), None);

        store.set_failing(ContentKind::Articles, false);
        assert_eq!(tracker.refresh().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_recount_uses_current_last_check() {
        let store = Arc::new(InMemoryStore::new(Snapshot::new(
            vec![thought(1, Account::Female, at(2024, 6, 1, 0, 0), "hi")],
            vec![],
            vec![],
        )));
        let mut tracker = tracker_with(
            store.clone(),
            Arc::new(MemoryCheckpointStore::new()),
            at(2024, 6, 2, 0, 0),
        );
        tracker.login(Account::Male).await.unwrap();

        // A snapshot taken before the panel opened must not bring the count back.
        let earlier = fetch_all(store.as_ref()).await.unwrap();
        tracker.open_panel().await.unwrap();
        assert_eq!(tracker.recount(&earlier), Some(0));

        tracker.logout();
        assert_eq!(tracker.recount(&earlier), None);
    }

    #[tokio::test]
    async fn test_logout_keeps_checkpoint_and_clears_state() {
        let now = at(2024, 6, 2, 0, 0);
        let store = Arc::new(InMemoryStore::new(Snapshot::default()));
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut tracker = tracker_with(store, checkpoints.clone(), now);

        tracker.login(Account::Female).await.unwrap();
        tracker.open_panel().await.unwrap();
        tracker.logout();

        assert_eq!(tracker.session(), Session::LoggedOut);
        assert_eq!(tracker.unread(), 0);
        assert_eq!(checkpoints.load(Account::Female).unwrap(), Some(now));
        assert!(matches!(
            tracker.open_panel().await,
            Err(ClientError::NotLoggedIn)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_picks_up_new_content() {
        let store = Arc::new(InMemoryStore::new(Snapshot::default()));
        let tracker = tracker_with(
            store.clone(),
            Arc::new(MemoryCheckpointStore::new()),
            Utc::now(),
        );
        let mut center = NotificationCenter::new(tracker, POLL_INTERVAL);
        let mut updates = center.subscribe();

        assert_eq!(center.login(Account::Male).await.unwrap(), 0);
        updates.mark_unchanged();

        store.push_thought(thought(1, Account::Female, Utc::now(), "new"));
        tokio::time::timeout(POLL_INTERVAL * 2, updates.changed())
            .await
            .expect("poll should run")
            .unwrap();
        assert_eq!(*updates.borrow(), 1);
        assert_eq!(center.unread().await, 1);

        center.logout().await;
        assert_eq!(center.unread().await, 0);
        assert_eq!(*updates.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_poll_leaves_tracker_available() {
        let store = Arc::new(InMemoryStore::new(Snapshot::new(
            vec![thought(1, Account::Female, at(2024, 6, 1, 0, 0), "hi")],
            vec![],
            vec![],
        )));
        let tracker = tracker_with(
            store.clone(),
            Arc::new(MemoryCheckpointStore::new()),
            at(2024, 6, 2, 0, 0),
        );
        let mut center = NotificationCenter::new(tracker, POLL_INTERVAL);
        assert_eq!(center.login(Account::Male).await.unwrap(), 1);

        store.set_stalled(true);
        // Past the next tick, the poll is now waiting on a fetch that never ends.
        tokio::time::sleep(POLL_INTERVAL + Duration::from_secs(1)).await;

        let unread = tokio::time::timeout(Duration::from_secs(1), center.unread())
            .await
            .expect("tracker should not be locked by an in-flight poll");
        assert_eq!(unread, 1);
        center.logout().await;
    }
}
