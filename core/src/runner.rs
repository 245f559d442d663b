//! # Worker Pool
//!
//! Every probing method runs through the same pool: a fixed number of
//! workers drain one shared queue and push what they find into an mpsc sink.
//! Each worker owns the state a factory built for it, so per-worker resources
//! such as link-layer sockets are never shared.
//!
//! Workers stop early once the receiving side of the sink is dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use assetr_common::error::DiscoveryError;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::debug;

pub type Sink<T> = mpsc::UnboundedSender<T>;

/// Processes one queued item at a time.
#[async_trait]
pub trait Worker<I, O>: Send {
    /// `None` means the item produced nothing worth reporting.
    async fn process(&mut self, item: I) -> Option<O>;
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    label: &'static str,
    workers: usize,
}

impl WorkerPool {
    pub fn new(label: &'static str, workers: usize) -> Self {
        Self {
            label,
            workers: workers.max(1),
        }
    }

    /// Runs `items` through the pool, pushing results into `sink`.
    ///
    /// The factory is called once per worker, before any item is processed.
    /// If it fails for any worker the batch is aborted and that first error is
    /// returned. Never spawns more workers than there are items.
    pub async fn run<I, O, W, F>(
        &self,
        items: Vec<I>,
        mut factory: F,
        sink: Sink<O>,
    ) -> Result<(), DiscoveryError>
    where
        I: Send + 'static,
        O: Send + 'static,
        W: Worker<I, O> + 'static,
        F: FnMut(usize) -> Result<W, DiscoveryError>,
    {
        if items.is_empty() {
            return Ok(());
        }

        let count = self.workers.min(items.len());
        let states = (0..count)
            .map(&mut factory)
            .collect::<Result<Vec<W>, _>>()?;

        debug!(
            "{} pool: {} item(s) across {} worker(s)",
            self.label,
            items.len(),
            count
        );

        let queue: Arc<Mutex<VecDeque<I>>> = Arc::new(Mutex::new(items.into()));
        let mut set: JoinSet<()> = JoinSet::new();

        for mut worker in states {
            let queue = Arc::clone(&queue);
            let sink = sink.clone();
            set.spawn(async move {
                loop {
                    if sink.is_closed() {
                        break;
                    }
                    let Some(item) = queue.lock().await.pop_front() else {
                        break;
                    };
                    if let Some(found) = worker.process(item).await {
                        if sink.send(found).is_err() {
                            break;
                        }
                    }
                }
            });
        }
        drop(sink);

        let mut first_error: Option<DiscoveryError> = None;
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                first_error.get_or_insert(DiscoveryError::WorkerPanicked {
                    label: self.label,
                    reason: e.to_string(),
                });
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Like [`WorkerPool::run`], but gathers the results instead of streaming
    /// them.
    pub async fn collect<I, O, W, F>(
        &self,
        items: Vec<I>,
        factory: F,
    ) -> Result<Vec<O>, DiscoveryError>
    where
        I: Send + 'static,
        O: Send + 'static,
        W: Worker<I, O> + 'static,
        F: FnMut(usize) -> Result<W, DiscoveryError>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.run(items, factory, tx).await?;

        let mut out = Vec::new();
        while let Ok(found) = rx.try_recv() {
            out.push(found);
        }
        Ok(out)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FnWorker<F>(F);

    #[async_trait]
    impl<I, O, F, Fut> Worker<I, O> for FnWorker<F>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: FnMut(I) -> Fut + Send,
        Fut: std::future::Future<Output = Option<O>> + Send + 'static,
    {
        async fn process(&mut self, item: I) -> Option<O> {
            (self.0)(item).await
        }
    }

    fn doubler() -> FnWorker<impl FnMut(u32) -> std::future::Ready<Option<u32>> + Send> {
        FnWorker(|n: u32| std::future::ready(Some(n * 2)))
    }

    #[tokio::test]
    async fn every_item_is_processed_once() {
        let pool = WorkerPool::new("test", 4);
        let mut out: Vec<u32> = pool
            .collect((0..100u32).collect::<Vec<_>>(), |_| Ok(doubler()))
            .await
            .unwrap();
        out.sort_unstable();
        assert_eq!(out, (0..100u32).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn none_results_are_dropped() {
        let pool = WorkerPool::new("test", 3);
        let out: Vec<u32> = pool
            .collect((0..10u32).collect::<Vec<_>>(), |_| {
                Ok(FnWorker(|n: u32| async move { (n % 2 == 0).then_some(n) }))
            })
            .await
            .unwrap();
        assert_eq!(out.len(), 5);
    }

    #[tokio::test]
    async fn factory_is_called_once_per_worker_and_capped_by_items() {
        let calls = AtomicUsize::new(0);
        let pool = WorkerPool::new("test", 10);
        let out: Vec<u32> = pool
            .collect(vec![1u32, 2, 3], |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(doubler())
            })
            .await
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn factory_error_aborts_batch() {
        let pool = WorkerPool::new("test", 2);
        let result: Result<Vec<u32>, _> = pool
            .collect(vec![1u32, 2, 3], |idx| {
                if idx == 1 {
                    Err(DiscoveryError::EmptyInterface)
                } else {
                    Ok(doubler())
                }
            })
            .await;
        assert!(matches!(result, Err(DiscoveryError::EmptyInterface)));
    }

    #[tokio::test]
    async fn empty_batch_never_calls_factory() {
        let calls = AtomicUsize::new(0);
        let pool = WorkerPool::new("test", 2);
        let out: Vec<u32> = pool
            .collect(Vec::<u32>::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(doubler())
            })
            .await
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_worker_is_reported() {
        let pool = WorkerPool::new("boom", 1);
        let result: Result<Vec<u32>, _> = pool
            .collect(vec![1u32], |_| {
                Ok(FnWorker(|n: u32| async move {
                    if n > 0 {
                        panic!("worker blew up");
                    }
                    Some(n)
                }))
            })
            .await;
        assert!(matches!(
            result,
            Err(DiscoveryError::WorkerPanicked { label: "boom", .. })
        ));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_workers() {
        let processed = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel::<u32>();
        drop(rx);

        let counter = Arc::clone(&processed);
        let pool = WorkerPool::new("test", 2);
        pool.run(
            (0..1000u32).collect(),
            move |_| {
                let counter = Arc::clone(&counter);
                Ok(FnWorker(move |n: u32| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        Some(n)
                    }
                }))
            },
            tx,
        )
        .await
        .unwrap();

        assert_eq!(processed.load(Ordering::SeqCst), 0);
    }
}
