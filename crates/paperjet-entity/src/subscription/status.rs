//! Subscription status enumeration and transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a subscription.
///
/// The lifecycle is monotonic: `active → cancelling → cancelled`, or
/// `active → expired`. A record is never moved backward; the transition
/// table is enforced at write time by the subscription repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Paid and in good standing.
    Active,
    /// Cancellation requested, still active until the end date.
    Cancelling,
    /// Cancellation finalized; on the free plan.
    Cancelled,
    /// Paid period ran out; on the free plan.
    Expired,
}

impl SubscriptionStatus {
    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }

    /// Whether a write moving the record from `self` to `next` is legal.
    ///
    /// Re-asserting the current status is always allowed so that
    /// redelivered jobs can repeat their terminal write. The two terminal
    /// states may overwrite each other: racing expiration and cancellation
    /// jobs for the same user are last-write-wins by design.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use SubscriptionStatus::*;
        match (*self, next) {
            (a, b) if a == b => true,
            (Active, Cancelling | Cancelled | Expired) => true,
            (Cancelling, Cancelled | Expired) => true,
            (Cancelled, Expired) | (Expired, Cancelled) => true,
            _ => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment platform a subscription is billed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_platform", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentPlatform {
    /// Billed through Stripe.
    Stripe,
    /// Billed through Paystack.
    Paystack,
}

impl PaymentPlatform {
    /// Return the platform as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Paystack => "paystack",
        }
    }
}

impl fmt::Display for PaymentPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
