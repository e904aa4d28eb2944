//! `replan-middleware` – Message Routing
//!
//! Moves odometry, goal triggers and planner output between producers and
//! consumers without caring about their meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.

pub mod bus;

pub use bus::{EventBus, Topic, TopicReceiver};
