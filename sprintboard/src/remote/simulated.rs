//! In-process task service with failure injection.
//!
//! [`SimulatedRemote`] keeps the authoritative record list in memory and
//! answers the four service calls the way the mock API does: creates are
//! prepended with a short random id, patches stamp `updated_at`, unknown ids
//! yield [`RemoteError::NotFound`]. Before touching the records every request
//! consults a [`FailureInjector`], which by default fails about one request
//! in ten with a 500.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sprintboard_proto::task::{NewTask, Priority, Task, TaskId, TaskStatus};

use super::{RemoteError, RemoteTaskService};

/// Failure rate of the mock API.
pub const DEFAULT_FAILURE_RATE: f64 = 0.1;

/// Length of ids assigned by the service.
const SERVER_ID_LEN: usize = 7;

/// How the injector decides whether a request fails.
#[derive(Debug, Clone, PartialEq)]
pub enum FailurePolicy {
    /// Every request succeeds.
    Never,
    /// Every request fails.
    Always,
    /// Each request independently fails with the given probability.
    Random {
        /// Probability in `0.0..=1.0`.
        rate: f64,
    },
    /// Outcomes are taken in order (`true` = fail); once exhausted every
    /// request succeeds.
    Script(VecDeque<bool>),
}

impl FailurePolicy {
    /// Builds a scripted policy from a list of outcomes.
    pub fn script(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self::Script(outcomes.into_iter().collect())
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Random {
            rate: DEFAULT_FAILURE_RATE,
        }
    }
}

/// Per-request failure decision with an injectable RNG.
#[derive(Debug)]
pub struct FailureInjector {
    policy: FailurePolicy,
    rng: StdRng,
}

impl FailureInjector {
    /// Creates an injector. A `seed` makes random outcomes reproducible.
    #[must_use]
    pub fn new(policy: FailurePolicy, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { policy, rng }
    }

    /// Replaces the active policy.
    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
    }

    /// Decides the outcome of the next request.
    pub fn should_fail(&mut self) -> bool {
        match &mut self.policy {
            FailurePolicy::Never => false,
            FailurePolicy::Always => true,
            FailurePolicy::Random { rate } => self.rng.random_bool(rate.clamp(0.0, 1.0)),
            FailurePolicy::Script(outcomes) => outcomes.pop_front().unwrap_or(false),
        }
    }

    fn server_id(&mut self) -> TaskId {
        let id: String = (0..SERVER_ID_LEN)
            .map(|_| char::from_digit(self.rng.random_range(0..36), 36).unwrap_or('0'))
            .collect();
        TaskId::new(id)
    }
}

/// A request as received by the simulated service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `GET /api/tasks`
    List,
    /// `POST /api/tasks`
    Create(NewTask),
    /// `PATCH /api/tasks/{id}`
    UpdateStatus {
        /// Target task.
        id: TaskId,
        /// Requested column.
        status: TaskStatus,
    },
    /// `DELETE /api/tasks/{id}`
    Delete(TaskId),
}

/// In-memory [`RemoteTaskService`] with simulated failures and latency.
pub struct SimulatedRemote {
    records: Mutex<Vec<Task>>,
    injector: Mutex<FailureInjector>,
    latency: Duration,
    calls: Mutex<Vec<RemoteCall>>,
}

impl SimulatedRemote {
    /// Creates a service holding `tasks`, failing with the default policy.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            records: Mutex::new(tasks),
            injector: Mutex::new(FailureInjector::new(FailurePolicy::default(), None)),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a service seeded with the three demo tasks.
    #[must_use]
    pub fn demo() -> Self {
        Self::with_tasks(demo_tasks())
    }

    /// Replaces the failure injector.
    #[must_use]
    pub fn with_injector(self, injector: FailureInjector) -> Self {
        *self.injector.lock() = injector;
        self
    }

    /// Replaces the failure policy, keeping the current RNG.
    #[must_use]
    pub fn with_failures(self, policy: FailurePolicy) -> Self {
        self.injector.lock().set_policy(policy);
        self
    }

    /// Delays every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Changes the failure policy of a running service.
    pub fn set_failure_policy(&self, policy: FailurePolicy) {
        self.injector.lock().set_policy(policy);
    }

    /// Current server-side records.
    #[must_use]
    pub fn records(&self) -> Vec<Task> {
        self.records.lock().clone()
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Records the call, waits out the latency, then rolls for failure.
    async fn accept(&self, call: RemoteCall) -> Result<(), RemoteError> {
        self.calls.lock().push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.injector.lock().should_fail() {
            tracing::debug!("simulated service failure");
            return Err(RemoteError::Server {
                status: 500,
                message: "Simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SimulatedRemote {
    fn default() -> Self {
        Self::with_tasks(Vec::new())
    }
}

impl RemoteTaskService for SimulatedRemote {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        self.accept(RemoteCall::List).await?;
        Ok(self.records())
    }

    async fn create(&self, new: &NewTask) -> Result<Task, RemoteError> {
        self.accept(RemoteCall::Create(new.clone())).await?;
        let mut records = self.records.lock();
        let id = {
            let mut injector = self.injector.lock();
            loop {
                let candidate = injector.server_id();
                if !records.iter().any(|t| t.id == candidate) {
                    break candidate;
                }
            }
        };
        let task = Task::from_new(id, new);
        records.insert(0, task.clone());
        drop(records);
        Ok(task)
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, RemoteError> {
        self.accept(RemoteCall::UpdateStatus {
            id: id.clone(),
            status,
        })
        .await?;
        let mut records = self.records.lock();
        let task = records
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        task.status = status;
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<Task, RemoteError> {
        self.accept(RemoteCall::Delete(id.clone())).await?;
        let mut records = self.records.lock();
        let idx = records
            .iter()
            .position(|t| t.id == *id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        Ok(records.remove(idx))
    }
}

/// The records the mock API starts with.
#[must_use]
pub fn demo_tasks() -> Vec<Task> {
    vec![
        demo_task("t1", "Setup project repo", TaskStatus::Todo, Priority::Medium),
        demo_task(
            "t2",
            "Design landing page",
            TaskStatus::InProgress,
            Priority::High,
        ),
        demo_task("t3", "Release v1.0", TaskStatus::Done, Priority::Low),
    ]
}

fn demo_task(id: &str, title: &str, status: TaskStatus, priority: Priority) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.to_string(),
        description: String::new(),
        priority,
        status,
        updated_at: None,
    }
}
