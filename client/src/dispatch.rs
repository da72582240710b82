use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::{Generation, RouteError, RouteRequest, RouteResult, RouteTask, TaskPhase, Transition};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, Instant, Interval, MissedTickBehavior},
};

use crate::api::RouteClient;

/// How a submitted calculation ended.
#[derive(Debug)]
pub enum Outcome {
    Completed(RouteResult),
    Failed(RouteError),
    /// Superseded by a newer submission or cancelled explicitly.
    Cancelled,
}

#[derive(Debug)]
pub struct RouteHandle {
    generation: Generation,
    outcome: oneshot::Receiver<Outcome>,
}

impl RouteHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub async fn outcome(self) -> Outcome {
        self.outcome.await.unwrap_or(Outcome::Cancelled)
    }
}

/// Runs at most one route calculation at a time. Submitting again aborts the
/// running one, whose handle then resolves to [`Outcome::Cancelled`].
#[derive(Debug)]
pub struct Dispatcher {
    client: RouteClient,
    poll_interval: Duration,
    task: Arc<Mutex<RouteTask>>,
    running: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(client: RouteClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            task: Arc::new(Mutex::new(RouteTask::new())),
            running: None,
        }
    }

    pub fn phase(&self) -> TaskPhase {
        lock(&self.task).phase().clone()
    }

    pub fn submit(&mut self, request: RouteRequest) -> RouteHandle {
        self.abort_running();
        let generation = lock(&self.task).begin();
        let (tx, rx) = oneshot::channel();

        let run = Run {
            client: self.client.clone(),
            task: Arc::clone(&self.task),
            generation,
            poll_interval: self.poll_interval,
        };
        self.running = Some(tokio::spawn(async move {
            let outcome = run.drive(request).await;
            // The caller may have dropped its handle.
            let _ = tx.send(outcome);
        }));

        RouteHandle {
            generation,
            outcome: rx,
        }
    }

    pub fn cancel(&mut self) {
        self.abort_running();
        lock(&self.task).cancel();
    }

    fn abort_running(&mut self) {
        if let Some(previous) = self.running.take() {
            previous.abort();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.abort_running();
    }
}

fn lock(task: &Mutex<RouteTask>) -> MutexGuard<'_, RouteTask> {
    task.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Run {
    client: RouteClient,
    task: Arc<Mutex<RouteTask>>,
    generation: Generation,
    poll_interval: Duration,
}

impl Run {
    async fn drive(self, request: RouteRequest) -> Outcome {
        let generation = self.generation.value();
        tracing::info!(generation, "route calculation started");

        let reply = self.client.calculate_route(&request).await;
        let mut transition = lock(&self.task).on_submitted(self.generation, reply);
        let mut ticker: Option<Interval> = None;

        loop {
            match transition {
                Transition::Ignored => return Outcome::Cancelled,
                Transition::Completed(result) => {
                    tracing::info!(generation, points = result.path.len(), "route ready");
                    return Outcome::Completed(result);
                }
                Transition::Failed(err) => {
                    tracing::warn!(generation, "route calculation failed: {err}");
                    return Outcome::Failed(err);
                }
                Transition::FetchOnce { task_id } => {
                    tracing::debug!(generation, task_id = %task_id, "cached result, fetching body");
                }
                Transition::StartPolling { task_id } => {
                    tracing::debug!(generation, task_id = %task_id, "route processing, polling");
                    self.next_tick(&mut ticker).await;
                }
                Transition::Wait => self.next_tick(&mut ticker).await,
            }

            let Some(task_id) = lock(&self.task).pending_task_id().map(str::to_owned) else {
                return Outcome::Cancelled;
            };
            let reply = self.client.route_result(&task_id).await;
            transition = lock(&self.task).on_polled(self.generation, reply);
        }
    }

    async fn next_tick(&self, ticker: &mut Option<Interval>) {
        let period = self.poll_interval;
        ticker
            .get_or_insert_with(|| {
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval
            })
            .tick()
            .await;
    }
}
