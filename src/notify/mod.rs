//! Change notifications for applied configuration snapshots.

mod subscriber;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
