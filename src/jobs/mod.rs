//! Background watcher registration
//!
//! Hooks tracked items up to the scheduler: every item gets a periodic
//! reconciliation task, series additionally get a low-frequency release
//! check. Initial delays are randomized so a large library does not hit
//! the database and the search index in one burst.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::models::{Item, MediaKind};
use crate::scheduler::{wrappers, Scheduler, Task};
use crate::watcher::{WatcherService, CHECK_RELEASES_INTERVAL, WATCH_INTERVAL};

/// Upper bound of the randomized delay before an item's first
/// reconciliation run.
const WATCH_DELAY_SPREAD_SECS: u64 = 240;
/// Upper bound of the randomized delay before the first release check.
const CHECK_RELEASES_DELAY_SPREAD_SECS: u64 = 24 * 60 * 60;

/// Registers the periodic tasks for one tracked item. All tasks share the
/// item id as their group so [`stop_watchers`] can drop them together.
pub fn start_watchers(scheduler: &Scheduler, watcher: &Arc<WatcherService>, item: &Item) -> bool {
    let group = item.id.to_string();

    let svc = watcher.clone();
    let id = item.id.clone();
    let body = wrappers::periodic_wrapper("item_watch", WATCH_INTERVAL, move |_token| {
        let svc = svc.clone();
        let id = id.clone();
        async move { svc.reconcile(&id).await }
    });
    let delay = Duration::from_secs(rand::rng().random_range(0..WATCH_DELAY_SPREAD_SECS));
    if !scheduler.add(Task::new(group.clone(), body).after(delay)) {
        return false;
    }

    if item.kind == MediaKind::TvSeries {
        let svc = watcher.clone();
        let id = item.id.clone();
        let body =
            wrappers::periodic_wrapper("check_releases", CHECK_RELEASES_INTERVAL, move |_token| {
                let svc = svc.clone();
                let id = id.clone();
                async move { svc.check_releases(&id).await }
            });
        let delay =
            Duration::from_secs(rand::rng().random_range(0..CHECK_RELEASES_DELAY_SPREAD_SECS));
        if !scheduler.add(Task::new(group, body).after(delay)) {
            return false;
        }
    }

    info!(item = %item.id, title = %item.info.title, "watchers registered");
    true
}

/// Drops all scheduled tasks of an item.
pub fn stop_watchers(scheduler: &Scheduler, item: &Item) {
    scheduler.cancel(&item.id.to_string());
}
