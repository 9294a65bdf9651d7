use crmex_common::ResettableBackoff;
use kube::runtime::utils::Backoff;
use std::time::Duration;

/// Watcher [`Backoff`] policy backed by the [`ResettableBackoff`].
#[derive(Default)]
pub struct WatchBackoff(ResettableBackoff);

impl Iterator for WatchBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_backoff()
    }
}

impl Backoff for WatchBackoff {
    fn reset(&mut self) {
        self.0.reset();
    }
}
