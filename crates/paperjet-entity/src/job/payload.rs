//! Typed job payload definitions.
//!
//! Payloads form a closed set: producers construct a variant, workers
//! deserialize it back, and nothing in between touches loose JSON fields.
//! The variant determines both the `job_type` tag and the queue the job
//! lands on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue names, one logical consumer role per queue.
pub mod queues {
    /// Staged document uploads to the object store.
    pub const DOCUMENT_UPLOAD: &str = "document-upload";
    /// Subscriptions whose paid period ran out.
    pub const SUBSCRIPTION_EXPIRATION: &str = "subscription-expiration";
    /// Scheduled subscription cancellations.
    pub const SUBSCRIPTION_CANCELLATION: &str = "subscription-cancellation";
    /// Internal queue/lease maintenance.
    pub const MAINTENANCE: &str = "maintenance";
}

/// Typed payloads for known job types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum JobPayload {
    /// Move a staged file to the object store and record its public URL.
    #[serde(rename = "document_upload")]
    DocumentUpload {
        /// Document row to update with the public URL.
        document_id: Uuid,
        /// Staged file path, relative to the staging root.
        staged_path: String,
    },
    /// Transition an expired subscription to the free plan.
    #[serde(rename = "subscription_expiration")]
    SubscriptionExpiration {
        /// Subscription owner.
        user_id: Uuid,
        /// Carried for notification purposes only.
        email: String,
    },
    /// Finalize a scheduled subscription cancellation once due.
    #[serde(rename = "subscription_cancellation")]
    SubscriptionCancellation {
        /// Subscription owner.
        user_id: Uuid,
        /// When the cancellation becomes effective.
        end_date: DateTime<Utc>,
    },
    /// Release expired leases and prune old terminal jobs.
    #[serde(rename = "job_sweep")]
    JobSweep,
}

impl JobPayload {
    /// The `job_type` tag this payload serializes under.
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::DocumentUpload { .. } => "document_upload",
            Self::SubscriptionExpiration { .. } => "subscription_expiration",
            Self::SubscriptionCancellation { .. } => "subscription_cancellation",
            Self::JobSweep => "job_sweep",
        }
    }

    /// The queue this payload belongs to.
    pub fn queue(&self) -> &'static str {
        match self {
            Self::DocumentUpload { .. } => queues::DOCUMENT_UPLOAD,
            Self::SubscriptionExpiration { .. } => queues::SUBSCRIPTION_EXPIRATION,
            Self::SubscriptionCancellation { .. } => queues::SUBSCRIPTION_CANCELLATION,
            Self::JobSweep => queues::MAINTENANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let payload = JobPayload::SubscriptionCancellation {
            user_id: Uuid::new_v4(),
            end_date: Utc::now(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["job_type"], "subscription_cancellation");
        let back: JobPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_queue_mapping() {
        let upload = JobPayload::DocumentUpload {
            document_id: Uuid::new_v4(),
            staged_path: "abc.pdf".into(),
        };
        assert_eq!(upload.queue(), queues::DOCUMENT_UPLOAD);
        assert_eq!(upload.job_type(), "document_upload");
        assert_eq!(JobPayload::JobSweep.queue(), queues::MAINTENANCE);
    }

    #[test]
    fn test_unknown_job_type_rejected() {
        let value = serde_json::json!({"job_type": "mystery", "user_id": Uuid::new_v4()});
        assert!(serde_json::from_value::<JobPayload>(value).is_err());
    }
}
