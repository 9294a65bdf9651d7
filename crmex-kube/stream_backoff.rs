use futures::{Stream, TryStream};
use kube::runtime::utils::Backoff;
use kube::runtime::watcher::{Error as WatcherError, Event};
use pin_project::pin_project;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::time::{Sleep, sleep};

#[cfg(test)]
#[path = "./stream_backoff.tests.rs"]
mod stream_backoff_tests;

/// Applies a [`Backoff`] policy to a watcher stream.
///
/// After an error the stream is paused for [`Backoff::next`] and closed when the policy gives up.
/// The policy is reset on every successful event except [`Event::Init`], as the watcher emits it
/// also when it restarts after a failure.
#[pin_project]
pub struct StreamBackoff<S, B, K> {
    #[pin]
    stream: S,
    backoff: B,
    #[pin]
    state: State,
    _phantom: PhantomData<K>,
}

#[pin_project(project = StateProj)]
#[allow(clippy::large_enum_variant)]
enum State {
    Awake,
    Sleeping(#[pin] Sleep),
    GivenUp,
}

impl<S, B, K> StreamBackoff<S, B, K> {
    /// Creates new [`StreamBackoff`] instance.
    pub fn new(stream: S, backoff: B) -> Self {
        Self {
            stream,
            backoff,
            state: State::Awake,
            _phantom: PhantomData,
        }
    }
}

impl<S, B, K> Stream for StreamBackoff<S, B, K>
where
    S: TryStream<Ok = Event<K>, Error = WatcherError>,
    B: Backoff,
{
    type Item = Result<Event<K>, WatcherError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        match this.state.as_mut().project() {
            StateProj::Sleeping(delay) => {
                if delay.poll(cx).is_pending() {
                    return Poll::Pending;
                }

                tracing::trace!("Watcher backoff elapsed");
                this.state.set(State::Awake);
            },
            StateProj::GivenUp => return Poll::Ready(None),
            StateProj::Awake => (),
        }

        let next = this.stream.try_poll_next(cx);
        match &next {
            Poll::Ready(Some(Err(error))) => match this.backoff.next() {
                Some(duration) => {
                    tracing::debug!(?duration, "Watcher error '{}', backing off", error);
                    this.state.set(State::Sleeping(sleep(duration)));
                },
                None => {
                    tracing::debug!("Watcher error '{}', giving up", error);
                    this.state.set(State::GivenUp);
                },
            },
            Poll::Ready(Some(Ok(Event::Init))) => (),
            Poll::Ready(Some(Ok(_))) => this.backoff.reset(),
            Poll::Ready(None) | Poll::Pending => (),
        }

        next
    }
}
