//! Lifecycle of one route calculation:
//! `Idle → Submitting → (Fetching →) Polling → Completed | Failed`.
//!
//! Every calculation gets a fresh [`Generation`]. Replies carry the generation
//! they were issued under; anything older than the current one is ignored, which
//! is what keeps a slow reply from a cancelled request off the screen.

use crate::{
    error::RouteError,
    wire::{Decoded, ReplyKind, RouteResult, ServerReply},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TaskPhase {
    #[default]
    Idle,
    Submitting,
    /// The server answered `completed` without the result body; it is fetched
    /// once by task id.
    Fetching { task_id: String },
    Polling { task_id: String },
    Completed,
    Failed(RouteError),
}

/// What the driver has to do after feeding a reply into the task.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Reply belongs to an older generation or arrived in the wrong phase.
    Ignored,
    /// Not ready yet, keep the current timer running.
    Wait,
    StartPolling { task_id: String },
    FetchOnce { task_id: String },
    Completed(RouteResult),
    Failed(RouteError),
}

#[derive(Debug, Clone, Default)]
pub struct RouteTask {
    generation: Generation,
    phase: TaskPhase,
}

impl RouteTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new calculation and invalidates everything issued before.
    pub fn begin(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.phase = TaskPhase::Submitting;
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.next();
        self.phase = TaskPhase::Idle;
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> &TaskPhase {
        &self.phase
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.phase, TaskPhase::Polling { .. })
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            TaskPhase::Submitting | TaskPhase::Fetching { .. } | TaskPhase::Polling { .. }
        )
    }

    /// Task id the next `/route-result` request should ask for.
    pub fn pending_task_id(&self) -> Option<&str> {
        match &self.phase {
            TaskPhase::Polling { task_id } | TaskPhase::Fetching { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// Feeds the answer of `POST /calculate-route`.
    pub fn on_submitted(
        &mut self,
        generation: Generation,
        reply: Result<ServerReply, RouteError>,
    ) -> Transition {
        if !self.is_current(generation) || self.phase != TaskPhase::Submitting {
            return Transition::Ignored;
        }
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => return self.fail(err),
        };
        match reply.kind() {
            ReplyKind::Processing => match reply.task_id {
                Some(task_id) => {
                    self.phase = TaskPhase::Polling {
                        task_id: task_id.clone(),
                    };
                    Transition::StartPolling { task_id }
                }
                None => self.fail(RouteError::Unrecognized),
            },
            ReplyKind::Completed if reply.has_result() => self.settle(reply),
            ReplyKind::Completed => match reply.task_id {
                Some(task_id) => {
                    self.phase = TaskPhase::Fetching {
                        task_id: task_id.clone(),
                    };
                    Transition::FetchOnce { task_id }
                }
                None => self.fail(RouteError::Incomplete),
            },
            ReplyKind::Failed(message) => self.fail(RouteError::Server(message)),
            ReplyKind::Unrecognized => self.fail(RouteError::Unrecognized),
        }
    }

    /// Feeds the answer of `GET /route-result/{task_id}`. A `404` must already
    /// have been turned into [`ServerReply::processing`] by the caller.
    pub fn on_polled(
        &mut self,
        generation: Generation,
        reply: Result<ServerReply, RouteError>,
    ) -> Transition {
        if !self.is_current(generation) {
            return Transition::Ignored;
        }
        let (task_id, fetching) = match &self.phase {
            TaskPhase::Polling { task_id } => (task_id.clone(), false),
            TaskPhase::Fetching { task_id } => (task_id.clone(), true),
            _ => return Transition::Ignored,
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(RouteError::Transport(detail)) => return self.fail(RouteError::PollFailed(detail)),
            Err(err) => return self.fail(err),
        };
        match reply.kind() {
            ReplyKind::Completed => self.settle(reply),
            ReplyKind::Failed(message) => self.fail(RouteError::Server(message)),
            ReplyKind::Processing | ReplyKind::Unrecognized if fetching => {
                self.phase = TaskPhase::Polling {
                    task_id: task_id.clone(),
                };
                Transition::StartPolling { task_id }
            }
            ReplyKind::Processing | ReplyKind::Unrecognized => Transition::Wait,
        }
    }

    fn settle(&mut self, reply: ServerReply) -> Transition {
        match reply.decode() {
            Ok(Decoded::Ready(result)) => {
                self.phase = TaskPhase::Completed;
                Transition::Completed(result)
            }
            Ok(Decoded::NotReady) => Transition::Wait,
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: RouteError) -> Transition {
        self.phase = TaskPhase::Failed(err.clone());
        Transition::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> Result<ServerReply, RouteError> {
        Ok(serde_json::from_value(value).unwrap())
    }

    fn completed() -> Result<ServerReply, RouteError> {
        reply(json!({
            "status": "completed",
            "summary": {"total_distance_km": 1.0, "total_time_minutes": 2.0, "safety_level": "Seguro"},
            "segments": [],
            "path": [[19.0, -99.0], [19.1, -99.1]]
        }))
    }

    #[test]
    fn processing_reply_starts_polling() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        let step = task.on_submitted(generation, reply(json!({"status": "processing", "task_id": "t-1"})));
        assert_eq!(step, Transition::StartPolling { task_id: "t-1".into() });
        assert!(task.is_polling());
        assert_eq!(task.pending_task_id(), Some("t-1"));
    }

    #[test]
    fn not_found_keeps_polling_until_completed() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        task.on_submitted(generation, reply(json!({"status": "processing", "task_id": "t-1"})));

        for _ in 0..3 {
            assert_eq!(task.on_polled(generation, Ok(ServerReply::processing())), Transition::Wait);
            assert!(task.is_polling());
        }

        let step = task.on_polled(generation, completed());
        assert!(matches!(step, Transition::Completed(_)));
        assert!(!task.is_polling());
        assert_eq!(task.phase(), &TaskPhase::Completed);
    }

    #[test]
    fn server_error_while_polling_is_terminal() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        task.on_submitted(generation, reply(json!({"status": "processing", "task_id": "t-1"})));
        let step = task.on_polled(generation, reply(json!({"error": "No path between nodes"})));
        assert_eq!(step, Transition::Failed(RouteError::Server("No path between nodes".into())));
        assert!(!task.is_busy());
    }

    #[test]
    fn transport_failure_while_polling_is_reported_as_poll_failure() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        task.on_submitted(generation, reply(json!({"status": "processing", "task_id": "t-1"})));
        let step = task.on_polled(generation, Err(RouteError::transport("status 500")));
        assert_eq!(step, Transition::Failed(RouteError::PollFailed("status 500".into())));
    }

    #[test]
    fn cache_hit_with_body_completes_immediately() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        let step = task.on_submitted(generation, completed());
        assert!(matches!(step, Transition::Completed(ref r) if r.path.len() == 2));
        assert!(!task.is_polling());
    }

    #[test]
    fn cache_hit_without_body_fetches_once() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        let step = task.on_submitted(
            generation,
            reply(json!({"status": "completed", "task_id": "cache-key", "message": "cached"})),
        );
        assert_eq!(step, Transition::FetchOnce { task_id: "cache-key".into() });
        assert_eq!(task.pending_task_id(), Some("cache-key"));

        let step = task.on_polled(generation, Ok(ServerReply::processing()));
        assert_eq!(step, Transition::StartPolling { task_id: "cache-key".into() });
    }

    #[test]
    fn completed_without_body_on_poll_is_incomplete() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        task.on_submitted(generation, reply(json!({"status": "processing", "task_id": "t"})));
        let step = task.on_polled(generation, reply(json!({"status": "completed"})));
        assert_eq!(step, Transition::Failed(RouteError::Incomplete));
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut task = RouteTask::new();
        let old = task.begin();
        task.on_submitted(old, reply(json!({"status": "processing", "task_id": "old"})));

        let current = task.begin();
        assert_eq!(task.on_polled(old, completed()), Transition::Ignored);
        assert_eq!(
            task.on_submitted(old, reply(json!({"status": "processing", "task_id": "old"}))),
            Transition::Ignored
        );
        assert_eq!(task.phase(), &TaskPhase::Submitting);

        let step = task.on_submitted(current, reply(json!({"status": "processing", "task_id": "new"})));
        assert_eq!(step, Transition::StartPolling { task_id: "new".into() });
    }

    #[test]
    fn cancel_invalidates_in_flight_replies() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        task.cancel();
        assert_eq!(task.phase(), &TaskPhase::Idle);
        assert_eq!(task.on_submitted(generation, completed()), Transition::Ignored);
    }

    #[test]
    fn unknown_submission_reply_fails() {
        let mut task = RouteTask::new();
        let generation = task.begin();
        let step = task.on_submitted(generation, reply(json!({"status": "queued"})));
        assert_eq!(step, Transition::Failed(RouteError::Unrecognized));
    }
}
