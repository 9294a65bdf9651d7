use futures::{StreamExt, stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

/// Backoff that allows `budget` retries between resets.
struct BudgetBackoff {
    budget: usize,
    remaining: usize,
    resets: Arc<AtomicUsize>,
}

impl BudgetBackoff {
    fn new(budget: usize, resets: Arc<AtomicUsize>) -> Self {
        Self {
            budget,
            remaining: budget,
            resets,
        }
    }
}

impl Iterator for BudgetBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            None
        } else {
            self.remaining -= 1;
            Some(Duration::from_millis(1))
        }
    }
}

impl Backoff for BudgetBackoff {
    fn reset(&mut self) {
        self.remaining = self.budget;
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
}

fn describe(item: &Result<Event<String>, WatcherError>) -> &'static str {
    match item {
        Ok(Event::Init) => "init",
        Ok(Event::InitApply(_)) => "init_apply",
        Ok(Event::InitDone) => "init_done",
        Ok(Event::Apply(_)) => "apply",
        Ok(Event::Delete(_)) => "delete",
        Err(_) => "error",
    }
}

#[tokio::test]
async fn init_does_not_reset_backoff_test() {
    let resets = Arc::new(AtomicUsize::new(0));
    let events: Vec<Result<Event<String>, WatcherError>> = vec![
        Ok(Event::Init),
        Err(WatcherError::NoResourceVersion),
        Ok(Event::Init),
        Err(WatcherError::NoResourceVersion),
        Ok(Event::Apply("never seen".to_owned())),
    ];

    let items = StreamBackoff::new(stream::iter(events), BudgetBackoff::new(1, Arc::clone(&resets)))
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        vec!["init", "error", "init", "error"],
        items.iter().map(describe).collect::<Vec<_>>()
    );
    assert_eq!(0, resets.load(Ordering::Relaxed));
}

#[tokio::test]
async fn other_events_reset_backoff_test() {
    let resets = Arc::new(AtomicUsize::new(0));
    let events: Vec<Result<Event<String>, WatcherError>> = vec![
        Ok(Event::Init),
        Err(WatcherError::NoResourceVersion),
        Ok(Event::InitApply("a".to_owned())),
        Ok(Event::InitDone),
        Err(WatcherError::NoResourceVersion),
        Ok(Event::Delete("a".to_owned())),
    ];

    let items = StreamBackoff::new(stream::iter(events), BudgetBackoff::new(1, Arc::clone(&resets)))
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        vec!["init", "error", "init_apply", "init_done", "error", "delete"],
        items.iter().map(describe).collect::<Vec<_>>()
    );
    assert_eq!(3, resets.load(Ordering::Relaxed));
}
