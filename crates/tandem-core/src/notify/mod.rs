//! Notification rendering and delivery.

pub mod delivery;

pub use delivery::{NotificationDelivery, truncate_body};
