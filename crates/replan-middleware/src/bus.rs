//! Topic-routed event bus.
//!
//! One [`tokio::sync::broadcast`] channel per topic: every subscriber sees
//! every event of its topic, and a slow subscriber only loses its own
//! backlog.
//!
//! | Topic | Traffic |
//! |---|---|
//! | [`Topic::Odometry`] | Vehicle odometry, high rate |
//! | [`Topic::Goals`] | Goal triggers from an operator or waypoint source |
//! | [`Topic::Trajectory`] | Committed trajectories for the tracking controller |
//! | [`Topic::DataDisplay`] | Per-tick state machine debug records |
//! | [`Topic::Visualization`] | Best-effort previews and markers |

use replan_types::{Event, PlannerError};
use tokio::sync::broadcast;
use tracing::warn;

/// Events buffered per topic before a lagging subscriber starts losing them.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Odometry,
    Goals,
    Trajectory,
    DataDisplay,
    Visualization,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Odometry,
        Topic::Goals,
        Topic::Trajectory,
        Topic::DataDisplay,
        Topic::Visualization,
    ];

    fn lane(self) -> usize {
        self as usize
    }
}

/// Cloning is cheap; clones publish into and subscribe from the same
/// channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    lanes: [broadcast::Sender<Event>; Topic::ALL.len()],
}

impl EventBus {
    /// `capacity` applies to each topic separately and is at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lanes: std::array::from_fn(|_| broadcast::channel(capacity).0),
        }
    }

    /// Hand `event` to every current subscriber of `topic`.
    ///
    /// Returns how many subscribers received it, or
    /// [`PlannerError::Channel`] when the topic has none.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, PlannerError> {
        self.lanes[topic.lane()]
            .send(event)
            .map_err(|_| PlannerError::Channel(format!("no subscribers on {topic:?}")))
    }

    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.lanes[topic.lane()].subscribe(),
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lanes[topic.lane()].receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiving end of one topic, from [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Raw receive.  `Lagged(n)` means `n` events were overwritten before
    /// this subscriber read them; `Closed` means every bus clone is gone.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Next event, logging and skipping over lag.  `None` once the bus is
    /// dropped.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, skipped = n, "subscriber lagging, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}
