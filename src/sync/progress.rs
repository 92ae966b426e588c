use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::ProgressResource;

const BUFFER: usize = 32;

/// Progress of one operation running on its own task.
///
/// The stream ends right after the terminal state. Dropping it aborts the
/// task.
pub struct ProgressStream<T> {
    rx: mpsc::Receiver<ProgressResource<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> ProgressStream<T> {
    pub fn spawn<F, Fut>(work: F) -> Self
    where
        F: FnOnce(ProgressEmitter<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(BUFFER);
        let emitter = ProgressEmitter { tx, count: 0 };
        let task = tokio::spawn(work(emitter));
        Self { rx, task }
    }
}

impl<T> Stream for ProgressStream<T> {
    type Item = ProgressResource<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for ProgressStream<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Producer side of a [`ProgressStream`].
///
/// The counter only moves forward by one. The terminal methods consume the
/// emitter so at most one terminal state is sent.
pub struct ProgressEmitter<T> {
    tx: mpsc::Sender<ProgressResource<T>>,
    count: usize,
}

impl<T> ProgressEmitter<T> {
    /// Record one more processed item. Returns `false` once nobody listens.
    pub async fn advance(&mut self) -> bool {
        self.count += 1;
        self.tx
            .send(ProgressResource::InProgress(self.count))
            .await
            .is_ok()
    }

    pub async fn success(self, value: T) {
        self.finish(ProgressResource::Success(value)).await;
    }

    pub async fn failure(self, error: impl Into<String>) {
        self.finish(ProgressResource::Failure(error.into())).await;
    }

    pub async fn message(self, message: impl Into<String>) {
        self.finish(ProgressResource::Message(message.into())).await;
    }

    async fn finish(self, state: ProgressResource<T>) {
        // Receiver may already be gone.
        let _ = self.tx.send(state).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn emits_counts_then_terminal_and_ends() {
        let stream = ProgressStream::spawn(|mut emitter| async move {
            for _ in 0..3 {
                emitter.advance().await;
            }
            emitter.success("done").await;
        });

        let states: Vec<_> = stream.collect().await;
        assert_eq!(
            states,
            [
                ProgressResource::InProgress(1),
                ProgressResource::InProgress(2),
                ProgressResource::InProgress(3),
                ProgressResource::Success("done"),
            ]
        );
    }

    #[tokio::test]
    async fn message_is_single_terminal_state() {
        let stream = ProgressStream::<()>::spawn(|emitter| async move {
            emitter.message("URL is empty").await;
        });

        let states: Vec<_> = stream.collect().await;
        assert_eq!(states, [ProgressResource::Message("URL is empty".to_string())]);
        assert!(states[0].is_terminal());
    }

    #[tokio::test]
    async fn dropping_stream_stops_producer() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let mut stream = ProgressStream::<()>::spawn(|mut emitter| async move {
            let _guard = done_tx;
            loop {
                if !emitter.advance().await {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });

        assert_eq!(stream.next().await, Some(ProgressResource::InProgress(1)));
        drop(stream);

        // The sender half is dropped with the aborted task.
        assert!(done_rx.await.is_err());
    }
}
