use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use rand::Rng;
use stancemap_common::Schedule;

/// Bounded fan-out over a list of independent items.
///
/// At most `limit` tasks are in flight. Each task first sleeps a random
/// jitter in `[0, jitter]` so workers released together do not hit remote
/// hosts in lockstep. `run` returns once every task has settled, with
/// results in input order. Tasks must turn their own failures into values;
/// one task's outcome never affects another's.
#[derive(Debug, Clone)]
pub struct TaskPool {
    limit: usize,
    schedule: Schedule,
    jitter: Duration,
}

impl TaskPool {
    pub fn new(limit: usize, schedule: Schedule) -> Self {
        Self {
            limit: limit.max(1),
            schedule,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> Vec<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let total = items.len();
        let indexed = items.into_iter().enumerate();

        let mut results: Vec<(usize, T)> = match self.schedule {
            Schedule::Rolling => {
                stream::iter(indexed.map(|(idx, item)| self.start(idx, item, &task)))
                    .buffer_unordered(self.limit)
                    .collect()
                    .await
            }
            Schedule::Batched => {
                let mut done = Vec::with_capacity(total);
                let mut pending = indexed.peekable();
                while pending.peek().is_some() {
                    let chunk: Vec<_> = pending.by_ref().take(self.limit).collect();
                    let settled =
                        join_all(chunk.into_iter().map(|(idx, item)| self.start(idx, item, &task)))
                            .await;
                    done.extend(settled);
                }
                done
            }
        };

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, value)| value).collect()
    }

    async fn start<I, T, F, Fut>(&self, idx: usize, item: I, task: &F) -> (usize, T)
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let delay = self.jitter_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (idx, task(item).await)
    }

    fn jitter_delay(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}
