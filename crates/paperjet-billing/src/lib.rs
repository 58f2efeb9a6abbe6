//! # paperjet-billing
//!
//! Payment-provider clients behind the
//! [`BillingGateway`](paperjet_core::traits::BillingGateway) trait.
//! All calls are best-effort: workers log a failed cancellation and move
//! on, the owning job never fails because of one.

pub mod dispatch;
pub mod paystack;
pub mod stripe;

pub use dispatch::BillingDispatch;
pub use paystack::PaystackGateway;
pub use stripe::StripeGateway;
