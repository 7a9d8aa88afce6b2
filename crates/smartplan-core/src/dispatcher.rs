//! Timed-job dispatcher.
//!
//! A single background loop owns the set of live jobs (one `start`, one
//! `due`, and one job per pending reminder for each scheduled task). Public
//! operations travel over a command channel consumed exclusively by the
//! loop, so the job map has exactly one writer. The loop sleeps until the
//! earliest due time or the next command, whichever comes first -- one timer
//! for the whole registry, keyed off a min-heap, never one per job.
//!
//! ## Job lifecycle
//!
//! ```text
//! pending -> fired      (due time elapsed, callback invoked once)
//! pending -> cancelled  (superseded by reschedule, or task removed)
//! ```
//!
//! Both transitions are terminal and remove the job from the live set. A
//! cancel processed before the due time is guaranteed to suppress the fire;
//! a cancel racing an already-dispatched callback is not.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::DispatchError;
use crate::store::{Notification, NotificationSender, TaskStore};
use crate::task::{ReminderStatus, Task, TaskStatus};

const COMMAND_BUFFER: usize = 64;

/// What a job is for. Part of the registry key: a task holds at most one
/// live job per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Fires at the task's scheduled start; also advances the task to
    /// in-progress through the store.
    Start,
    /// Fires at the task's scheduled end.
    Due,
    /// Fires at the i-th pending reminder's time.
    Reminder(u32),
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Start => write!(f, "start"),
            JobKind::Due => write!(f, "due"),
            JobKind::Reminder(i) => write!(f, "reminder[{i}]"),
        }
    }
}

/// Registry key: (task, kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub task_id: String,
    pub kind: JobKind,
}

/// Job state. `Fired` and `Cancelled` are terminal; a job is never re-armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Fired,
    Cancelled,
}

/// Minimal data the notification callback needs at fire time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub task_id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
}

/// A registered timed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub key: JobKey,
    pub due_at: DateTime<Utc>,
    pub state: JobState,
    pub payload: JobPayload,
    #[serde(skip)]
    seq: u64,
}

impl ScheduledJob {
    fn new(key: JobKey, due_at: DateTime<Utc>, payload: JobPayload) -> Self {
        Self {
            key,
            due_at,
            state: JobState::Pending,
            payload,
            seq: 0,
        }
    }
}

/// Build the jobs a scheduled task implies: a start job, a due job when the
/// end is set, and one job per pending reminder.
fn jobs_for_task(task: &Task) -> Result<Vec<ScheduledJob>, DispatchError> {
    let Some(start) = task.scheduled_start else {
        return Err(DispatchError::NotSchedulable(task.id.clone()));
    };

    let mut jobs = vec![ScheduledJob::new(
        JobKey {
            task_id: task.id.clone(),
            kind: JobKind::Start,
        },
        start,
        JobPayload {
            task_id: task.id.clone(),
            user_id: task.user_id.clone(),
            title: "Task Starting".to_string(),
            body: format!("Task \"{}\" is starting now", task.title),
        },
    )];

    if let Some(end) = task.scheduled_end {
        jobs.push(ScheduledJob::new(
            JobKey {
                task_id: task.id.clone(),
                kind: JobKind::Due,
            },
            end,
            JobPayload {
                task_id: task.id.clone(),
                user_id: task.user_id.clone(),
                title: "Task Due".to_string(),
                body: format!("Task \"{}\" is due now", task.title),
            },
        ));
    }

    for (i, reminder) in task.reminders.iter().enumerate() {
        if reminder.status != ReminderStatus::Pending {
            continue;
        }
        jobs.push(ScheduledJob::new(
            JobKey {
                task_id: task.id.clone(),
                kind: JobKind::Reminder(i as u32),
            },
            reminder.time,
            JobPayload {
                task_id: task.id.clone(),
                user_id: task.user_id.clone(),
                title: format!("Reminder: {}", task.title),
                body: reminder
                    .message
                    .clone()
                    .or_else(|| task.description.clone())
                    .unwrap_or_else(|| task.title.clone()),
            },
        ));
    }

    Ok(jobs)
}

enum Command {
    Schedule {
        jobs: Vec<ScheduledJob>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    Cancel {
        task_id: String,
        reply: oneshot::Sender<usize>,
    },
    Reschedule {
        task_id: String,
        jobs: Vec<ScheduledJob>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    LiveJobs {
        reply: oneshot::Sender<Vec<JobKey>>,
    },
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the dispatch loop.
///
/// Created with [`JobDispatcher::start`]; dropping the handle (or calling
/// [`JobDispatcher::shutdown`]) stops the loop.
pub struct JobDispatcher {
    tx: mpsc::Sender<Command>,
}

impl JobDispatcher {
    /// Spawn the dispatch loop.
    pub fn start(store: Arc<dyn TaskStore>, notifier: Arc<dyn NotificationSender>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let dispatch = DispatchLoop {
            rx,
            store,
            notifier,
            live: HashMap::new(),
            heap: BinaryHeap::new(),
            next_seq: 0,
        };
        tokio::spawn(dispatch.run());
        Self { tx }
    }

    /// Register jobs for a task's scheduled times.
    ///
    /// Errors with [`DispatchError::AlreadyScheduled`] if any key is live;
    /// callers that may be re-registering must use [`Self::reschedule`].
    pub async fn schedule(&self, task: &Task) -> Result<(), DispatchError> {
        let jobs = jobs_for_task(task)?;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Schedule { jobs, reply }).await?;
        rx.await.map_err(|_| DispatchError::NotRunning)?
    }

    /// Cancel all live jobs for a task. Returns how many were cancelled;
    /// zero when none existed (not an error).
    pub async fn cancel(&self, task_id: &str) -> Result<usize, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Cancel {
            task_id: task_id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| DispatchError::NotRunning)
    }

    /// Atomically cancel and re-register a task's jobs: from the registry's
    /// point of view there is no window where neither set is present.
    pub async fn reschedule(&self, task: &Task) -> Result<(), DispatchError> {
        let jobs = jobs_for_task(task)?;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reschedule {
            task_id: task.id.clone(),
            jobs,
            reply,
        })
        .await?;
        rx.await.map_err(|_| DispatchError::NotRunning)?
    }

    /// Register jobs for already-scheduled tasks at service start. Tasks
    /// without a scheduled start are skipped, as is a task whose jobs are
    /// somehow already registered; neither aborts the rest of the batch.
    pub async fn load_pending(&self, tasks: &[Task]) -> Result<usize, DispatchError> {
        let mut loaded = 0;
        for task in tasks {
            if task.scheduled_start.is_none() || !task.status.is_schedulable() {
                continue;
            }
            match self.schedule(task).await {
                Ok(()) => loaded += 1,
                Err(DispatchError::AlreadyScheduled { task_id, kind }) => {
                    warn!(%task_id, %kind, "already registered, skipped during warm load");
                }
                Err(err) => return Err(err),
            }
        }
        info!(count = loaded, "loaded pending tasks into dispatcher");
        Ok(loaded)
    }

    /// Keys of all live (pending) jobs.
    pub async fn live_jobs(&self) -> Result<Vec<JobKey>, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::LiveJobs { reply }).await?;
        rx.await.map_err(|_| DispatchError::NotRunning)
    }

    /// Stop the loop, cancelling every live job. Returns how many jobs were
    /// drained.
    pub async fn shutdown(&self) -> Result<usize, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply }).await?;
        rx.await.map_err(|_| DispatchError::NotRunning)
    }

    async fn send(&self, command: Command) -> Result<(), DispatchError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| DispatchError::NotRunning)
    }
}

struct DispatchLoop {
    rx: mpsc::Receiver<Command>,
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn NotificationSender>,
    live: HashMap<JobKey, ScheduledJob>,
    /// Min-heap of (wake instant, seq, key). Entries are invalidated lazily:
    /// a popped entry whose seq no longer matches the live map is stale.
    heap: BinaryHeap<Reverse<(Instant, u64, JobKey)>>,
    next_seq: u64,
}

impl DispatchLoop {
    async fn run(mut self) {
        debug!("dispatch loop started");
        loop {
            let next_wake = self.next_wake();
            tokio::select! {
                biased;
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(Command::Schedule { jobs, reply }) => {
                            let _ = reply.send(self.insert_all(jobs));
                        }
                        Some(Command::Cancel { task_id, reply }) => {
                            let _ = reply.send(self.cancel_task(&task_id));
                        }
                        Some(Command::Reschedule { task_id, jobs, reply }) => {
                            self.cancel_task(&task_id);
                            let _ = reply.send(self.insert_all(jobs));
                        }
                        Some(Command::LiveJobs { reply }) => {
                            let _ = reply.send(self.live.keys().cloned().collect());
                        }
                        Some(Command::Shutdown { reply }) => {
                            let drained = self.live.len();
                            self.live.clear();
                            self.heap.clear();
                            info!(drained, "dispatch loop shut down");
                            let _ = reply.send(drained);
                            return;
                        }
                        None => {
                            debug!("command channel closed, dispatch loop exiting");
                            return;
                        }
                    }
                }
                _ = sleep_until_or_forever(next_wake) => {
                    self.fire_elapsed();
                }
            }
        }
    }

    /// Wake instant of the earliest valid heap entry, dropping stale heads.
    fn next_wake(&mut self) -> Option<Instant> {
        while let Some(Reverse((at, seq, key))) = self.heap.peek().cloned() {
            match self.live.get(&key) {
                Some(job) if job.seq == seq => return Some(at),
                _ => {
                    self.heap.pop();
                }
            }
        }
        None
    }

    fn insert_all(&mut self, jobs: Vec<ScheduledJob>) -> Result<(), DispatchError> {
        // All-or-nothing: reject the batch before touching the map.
        for job in &jobs {
            if self.live.contains_key(&job.key) {
                return Err(DispatchError::AlreadyScheduled {
                    task_id: job.key.task_id.clone(),
                    kind: job.key.kind.to_string(),
                });
            }
        }
        for mut job in jobs {
            job.seq = self.next_seq;
            self.next_seq += 1;
            let wake = wake_instant(job.due_at);
            debug!(key = ?job.key, due_at = %job.due_at, "job registered");
            self.heap.push(Reverse((wake, job.seq, job.key.clone())));
            self.live.insert(job.key.clone(), job);
        }
        Ok(())
    }

    fn cancel_task(&mut self, task_id: &str) -> usize {
        let keys: Vec<JobKey> = self
            .live
            .keys()
            .filter(|k| k.task_id == task_id)
            .cloned()
            .collect();
        // Removal from the live set is the cancelled transition; the stale
        // heap entry is dropped lazily by `next_wake`/`fire_elapsed`.
        for key in &keys {
            self.live.remove(key);
            debug!(key = ?key, "job cancelled");
        }
        keys.len()
    }

    /// Fire every job whose wake time has elapsed.
    fn fire_elapsed(&mut self) {
        let now = Instant::now();
        while let Some(Reverse((at, seq, key))) = self.heap.peek().cloned() {
            if at > now {
                break;
            }
            self.heap.pop();
            let Some(job) = self.live.get(&key) else {
                continue; // cancelled, stale entry
            };
            if job.seq != seq {
                continue; // superseded by a reschedule
            }
            let mut job = self.live.remove(&key).expect("job checked above");
            job.state = JobState::Fired;
            self.dispatch_fire(job);
        }
    }

    /// Invoke the fire callback off the loop's critical path so a slow
    /// delivery cannot stall unrelated jobs.
    fn dispatch_fire(&self, job: ScheduledJob) {
        info!(key = ?job.key, due_at = %job.due_at, "job fired");
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let notification_type = match job.key.kind {
                JobKind::Start => "task_start",
                JobKind::Due => "task_due",
                JobKind::Reminder(_) => "task_reminder",
            };
            let notification = Notification {
                user_id: job.payload.user_id.clone(),
                title: job.payload.title.clone(),
                body: job.payload.body.clone(),
                metadata: serde_json::json!({
                    "taskId": job.payload.task_id,
                    "type": notification_type,
                }),
            };
            if let Err(err) = notifier.deliver(notification).await {
                // At-most-once: the job stays fired, delivery is not retried.
                warn!(key = ?job.key, %err, "notification delivery failed");
            }
            if job.key.kind == JobKind::Start {
                if let Err(err) = store
                    .update_status(&job.payload.task_id, TaskStatus::InProgress)
                    .await
                {
                    error!(task_id = %job.payload.task_id, %err, "status advance failed");
                }
            }
        });
    }
}

fn wake_instant(due_at: DateTime<Utc>) -> Instant {
    // Due times already in the past wake immediately.
    let delay = (due_at - Utc::now()).to_std().unwrap_or_default();
    Instant::now() + delay
}

async fn sleep_until_or_forever(wake: Option<Instant>) {
    match wake {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSender {
        delivered: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn deliver(&self, notification: Notification) -> Result<(), CoreError> {
            self.delivered.lock().unwrap().push(notification);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        status_updates: Mutex<Vec<(String, TaskStatus)>>,
    }

    #[async_trait]
    impl TaskStore for RecordingStore {
        async fn find_same_day_tasks(
            &self,
            _user_id: &str,
            _date: DateTime<Utc>,
        ) -> Result<Vec<Task>, CoreError> {
            Ok(Vec::new())
        }

        async fn find_recent_completed(
            &self,
            _user_id: &str,
            _limit: usize,
        ) -> Result<Vec<Task>, CoreError> {
            Ok(Vec::new())
        }

        async fn update_scheduled_times(
            &self,
            _task_id: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        async fn update_status(
            &self,
            task_id: &str,
            status: TaskStatus,
        ) -> Result<(), CoreError> {
            self.status_updates
                .lock()
                .unwrap()
                .push((task_id.to_string(), status));
            Ok(())
        }
    }

    struct Harness {
        dispatcher: JobDispatcher,
        sender: Arc<RecordingSender>,
        store: Arc<RecordingStore>,
    }

    fn harness() -> Harness {
        let sender = Arc::new(RecordingSender::default());
        let store = Arc::new(RecordingStore::default());
        let dispatcher = JobDispatcher::start(
            Arc::clone(&store) as Arc<dyn TaskStore>,
            Arc::clone(&sender) as Arc<dyn NotificationSender>,
        );
        Harness {
            dispatcher,
            sender,
            store,
        }
    }

    fn scheduled_task(id: &str, start_in_secs: i64, end_in_secs: Option<i64>) -> Task {
        let now = Utc::now();
        let mut task = Task::new("user-1", format!("Task {id}"));
        task.id = id.to_string();
        task.scheduled_start = Some(now + ChronoDuration::seconds(start_in_secs));
        task.scheduled_end = end_in_secs.map(|s| now + ChronoDuration::seconds(s));
        task
    }

    /// Advance virtual time and let spawned fire callbacks run.
    async fn advance(secs: u64) {
        tokio::time::advance(Duration::from_secs(secs)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_job_fires_and_advances_status() {
        let h = harness();
        let task = scheduled_task("t1", 5, None);
        h.dispatcher.schedule(&task).await.unwrap();

        advance(6).await;

        let delivered = h.sender.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, "Task Starting");
        assert_eq!(delivered[0].user_id, "user-1");
        drop(delivered);

        let updates = h.store.status_updates.lock().unwrap();
        assert_eq!(*updates, vec![("t1".to_string(), TaskStatus::InProgress)]);
        drop(updates);

        assert!(h.dispatcher.live_jobs().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn due_job_fires_after_start_job() {
        let h = harness();
        let task = scheduled_task("t1", 5, Some(60));
        h.dispatcher.schedule(&task).await.unwrap();
        assert_eq!(h.dispatcher.live_jobs().await.unwrap().len(), 2);

        advance(61).await;

        let delivered = h.sender.delivered.lock().unwrap();
        let titles: Vec<&str> = delivered.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Task Starting", "Task Due"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_due_suppresses_fire() {
        let h = harness();
        let task = scheduled_task("t1", 5, Some(10));
        h.dispatcher.schedule(&task).await.unwrap();

        let cancelled = h.dispatcher.cancel("t1").await.unwrap();
        assert_eq!(cancelled, 2);

        advance(20).await;
        assert!(h.sender.delivered.lock().unwrap().is_empty());
        assert!(h.store.status_updates.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_without_jobs_is_noop() {
        let h = harness();
        assert_eq!(h.dispatcher.cancel("missing").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_schedule_is_rejected() {
        let h = harness();
        let task = scheduled_task("t1", 60, None);
        h.dispatcher.schedule(&task).await.unwrap();

        let err = h.dispatcher.schedule(&task).await.unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyScheduled { .. }));
        // The original registration is untouched.
        assert_eq!(h.dispatcher.live_jobs().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unscheduled_task_is_rejected() {
        let h = harness();
        let task = Task::new("user-1", "no times");
        let err = h.dispatcher.schedule(&task).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotSchedulable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_fires_only_at_new_time() {
        let h = harness();
        let task = scheduled_task("t1", 5, None);
        h.dispatcher.schedule(&task).await.unwrap();

        let moved = scheduled_task("t1", 120, None);
        h.dispatcher.reschedule(&moved).await.unwrap();

        // Old due time passes: nothing fires.
        advance(6).await;
        assert!(h.sender.delivered.lock().unwrap().is_empty());

        // New due time: exactly one fire.
        advance(120).await;
        assert_eq!(h.sender.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reminder_jobs_fire_with_message() {
        use crate::task::{Reminder, ReminderStatus};

        let h = harness();
        let mut task = scheduled_task("t1", 600, None);
        task.reminders.push(Reminder {
            time: Utc::now() + ChronoDuration::seconds(5),
            message: Some("leave now".to_string()),
            status: ReminderStatus::Pending,
        });
        task.reminders.push(Reminder {
            time: Utc::now() + ChronoDuration::seconds(7),
            message: None,
            status: ReminderStatus::Cancelled,
        });
        h.dispatcher.schedule(&task).await.unwrap();

        advance(10).await;

        let delivered = h.sender.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, "Reminder: Task t1");
        assert_eq!(delivered[0].body, "leave now");
        drop(delivered);

        // Start job still pending.
        assert_eq!(h.dispatcher.live_jobs().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn past_due_time_fires_immediately() {
        let h = harness();
        let task = scheduled_task("t1", -30, None);
        h.dispatcher.schedule(&task).await.unwrap();

        advance(1).await;
        assert_eq!(h.sender.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drains_live_jobs() {
        let h = harness();
        h.dispatcher
            .schedule(&scheduled_task("t1", 60, Some(120)))
            .await
            .unwrap();
        h.dispatcher
            .schedule(&scheduled_task("t2", 60, None))
            .await
            .unwrap();

        assert_eq!(h.dispatcher.shutdown().await.unwrap(), 3);

        advance(200).await;
        assert!(h.sender.delivered.lock().unwrap().is_empty());
        assert!(matches!(
            h.dispatcher.cancel("t1").await,
            Err(DispatchError::NotRunning)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn load_pending_skips_unscheduled_tasks() {
        let h = harness();
        let scheduled = scheduled_task("t1", 60, None);
        let unscheduled = Task::new("user-1", "no times");
        let mut done = scheduled_task("t2", 60, None);
        done.status = TaskStatus::Completed;

        let loaded = h
            .dispatcher
            .load_pending(&[scheduled, unscheduled, done])
            .await
            .unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(h.dispatcher.live_jobs().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn load_pending_tolerates_an_already_registered_task() {
        let h = harness();
        let first = scheduled_task("t1", 60, None);
        h.dispatcher.schedule(&first).await.unwrap();

        let rest = scheduled_task("t2", 90, None);
        let loaded = h.dispatcher.load_pending(&[first, rest]).await.unwrap();

        // The conflicting task is skipped, the rest still register.
        assert_eq!(loaded, 1);
        assert_eq!(h.dispatcher.live_jobs().await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_does_not_rearm_job() {
        struct FailingSender;

        #[async_trait]
        impl NotificationSender for FailingSender {
            async fn deliver(&self, _notification: Notification) -> Result<(), CoreError> {
                Err(CoreError::Custom("transport unreachable".to_string()))
            }
        }

        let store = Arc::new(RecordingStore::default());
        let dispatcher = JobDispatcher::start(
            Arc::clone(&store) as Arc<dyn TaskStore>,
            Arc::new(FailingSender),
        );
        dispatcher
            .schedule(&scheduled_task("t1", 5, None))
            .await
            .unwrap();

        advance(6).await;

        // Fired despite the delivery failure, and gone from the live set.
        assert!(dispatcher.live_jobs().await.unwrap().is_empty());
        // The status advance still happened.
        assert_eq!(store.status_updates.lock().unwrap().len(), 1);
    }
}
