//! In-memory fakes shared by the handler tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use paperjet_core::error::AppError;
use paperjet_core::result::AppResult;
use paperjet_entity::plan::Plan;
use paperjet_entity::subscription::Subscription;
use paperjet_entity::subscription::status::SubscriptionStatus;

use chrono::{DateTime, Duration};

use paperjet_entity::job::model::{CreateJob, Job};
use paperjet_entity::job::status::JobStatus;

use crate::jobs::{PlanDirectory, SubscriptionStore};
use crate::queue::JobStore;

/// In-memory subscription store enforcing the same transition table as
/// the real repository.
#[derive(Debug, Default)]
pub(crate) struct FakeSubscriptions {
    pub rows: Mutex<HashMap<Uuid, Subscription>>,
}

impl FakeSubscriptions {
    pub fn with(subscription: Subscription) -> Arc<Self> {
        let store = Self::default();
        store
            .rows
            .lock()
            .unwrap()
            .insert(subscription.user_id, subscription);
        Arc::new(store)
    }

    pub fn status_of(&self, user_id: Uuid) -> SubscriptionStatus {
        self.rows.lock().unwrap()[&user_id].status
    }

    pub fn plan_of(&self, user_id: Uuid) -> Uuid {
        self.rows.lock().unwrap()[&user_id].plan_id
    }
}

#[async_trait]
impl SubscriptionStore for FakeSubscriptions {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }

    async fn transition(
        &self,
        user_id: Uuid,
        next: SubscriptionStatus,
        plan_id: Uuid,
    ) -> AppResult<Subscription> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("No subscription for {user_id}")))?;

        if !row.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Illegal transition {} -> {}",
                row.status, next
            )));
        }

        row.status = next;
        row.plan_id = plan_id;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

/// In-memory plan directory.
#[derive(Debug, Default)]
pub(crate) struct FakePlans {
    pub plans: Vec<Plan>,
}

impl FakePlans {
    pub fn with_free_plan(id: Uuid) -> Arc<Self> {
        Arc::new(Self {
            plans: vec![Plan {
                id,
                name: "Free".into(),
                created_at: Utc::now(),
            }],
        })
    }
}

#[async_trait]
impl PlanDirectory for FakePlans {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        Ok(self
            .plans
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }
}

/// In-memory job store mirroring the repository's row semantics
/// (status guards included).
#[derive(Debug, Default)]
pub(crate) struct FakeJobStore {
    pub jobs: Mutex<HashMap<Uuid, Job>>,
}

impl FakeJobStore {
    pub fn seed(&self, job: Job) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }

    pub fn get(&self, id: Uuid) -> Job {
        self.jobs.lock().unwrap()[&id].clone()
    }
}

#[async_trait]
impl JobStore for FakeJobStore {
    async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            job_type: data.job_type.clone(),
            queue: data.queue.clone(),
            payload: data.payload.clone(),
            result: None,
            error_message: None,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: data.max_attempts,
            scheduled_at: data.scheduled_at,
            started_at: None,
            completed_at: None,
            lease_expires_at: None,
            worker_id: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(job)
    }

    async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        lease_seconds: u64,
    ) -> AppResult<Option<Job>> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().unwrap();

        let mut due: Vec<&mut Job> = jobs
            .values_mut()
            .filter(|j| {
                j.queue == queue
                    && j.status == JobStatus::Pending
                    && j.scheduled_at.is_none_or(|at| at <= now)
            })
            .collect();
        due.sort_by_key(|j| j.created_at);

        let Some(job) = due.into_iter().next() else {
            return Ok(None);
        };
        job.status = JobStatus::Running;
        job.attempts += 1;
        job.started_at = Some(now);
        job.lease_expires_at = Some(now + Duration::seconds(lease_seconds as i64));
        job.worker_id = Some(worker_id.to_string());
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn mark_completed(
        &self,
        job_id: Uuid,
        result: Option<&serde_json::Value>,
    ) -> AppResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            job.status = JobStatus::Completed;
            job.result = result.cloned();
            job.lease_expires_at = None;
            job.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_dead(&self, job_id: Uuid, error_message: &str) -> AppResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Dead;
                job.error_message = Some(error_message.to_string());
                job.lease_expires_at = None;
                job.completed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn retry_at(
        &self,
        job_id: Uuid,
        error_message: &str,
        retry_at: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Pending;
                job.error_message = Some(error_message.to_string());
                job.scheduled_at = Some(retry_at);
                job.lease_expires_at = None;
                job.worker_id = None;
            }
        }
        Ok(())
    }

    async fn defer(&self, job_id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Pending;
                job.scheduled_at = Some(until);
                job.attempts = (job.attempts - 1).max(0);
                job.lease_expires_at = None;
                job.worker_id = None;
            }
        }
        Ok(())
    }

    async fn mark_cancelled(&self, job_id: Uuid) -> AppResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&job_id) {
            None => Err(AppError::not_found(format!("No job with id {job_id}"))),
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
                Ok(())
            }
            Some(job) => Err(AppError::conflict(format!(
                "Job {job_id} is {} and cannot be cancelled",
                job.status
            ))),
        }
    }

    async fn find_expired_leases(&self) -> AppResult<Vec<Job>> {
        let now = Utc::now();
        let mut expired: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| {
                j.status == JobStatus::Running
                    && j.lease_expires_at.is_some_and(|at| at < now)
            })
            .cloned()
            .collect();
        expired.sort_by_key(|j| j.created_at);
        Ok(expired)
    }

    async fn release_lease(&self, job_id: Uuid) -> AppResult<bool> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Pending;
                job.lease_expires_at = None;
                job.worker_id = None;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn cleanup_old(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let doomed: Vec<Uuid> = jobs
            .values()
            .filter(|j| j.status.is_terminal() && j.updated_at < before)
            .map(|j| j.id)
            .collect();
        for id in &doomed {
            jobs.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == status)
            .count() as i64)
    }
}

/// A claimed job row with the given attempt counts and lease expiry.
pub(crate) fn running_job(
    queue: &str,
    attempts: i32,
    max_attempts: i32,
    lease_expires_at: DateTime<Utc>,
) -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::new_v4(),
        job_type: "job_sweep".to_string(),
        queue: queue.to_string(),
        payload: serde_json::json!({ "job_type": "job_sweep" }),
        result: None,
        error_message: None,
        status: JobStatus::Running,
        attempts,
        max_attempts,
        scheduled_at: None,
        started_at: Some(now),
        completed_at: None,
        lease_expires_at: Some(lease_expires_at),
        worker_id: Some("worker-test".to_string()),
        created_at: now,
        updated_at: now,
    }
}

/// A subscription row with the given status and a random paid plan.
pub(crate) fn subscription(user_id: Uuid, status: SubscriptionStatus) -> Subscription {
    let now = Utc::now();
    Subscription {
        user_id,
        plan_id: Uuid::new_v4(),
        status,
        payment_platform: None,
        provider_code: None,
        email_token: None,
        cancellation_date: None,
        created_at: now,
        updated_at: now,
    }
}
