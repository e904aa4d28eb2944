//! [`PlanningOutput`] sink backed by the event bus.

use replan_kernel::PlanningOutput;
use replan_middleware::{EventBus, Topic};
use replan_types::{DataDisplay, Event, EventPayload, TrajectoryMessage, VisualizationMarker};

/// Publishes everything the planner produces.  Publishing is best-effort:
/// a topic without subscribers is not an error for the planner.
#[derive(Clone, Debug)]
pub struct BusOutput {
    bus: EventBus,
    source: String,
}

impl BusOutput {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            source: "replan-runtime::output".to_string(),
        }
    }

    fn publish(&self, topic: Topic, payload: EventPayload) {
        if let Err(e) = self.bus.publish_to(topic, Event::new(self.source.clone(), payload)) {
            tracing::trace!(?topic, error = %e, "planner output dropped");
        }
    }
}

impl PlanningOutput for BusOutput {
    fn publish_trajectory(&self, msg: TrajectoryMessage) {
        self.publish(Topic::Trajectory, EventPayload::Trajectory(msg));
    }

    fn publish_data_display(&self, msg: DataDisplay) {
        self.publish(Topic::DataDisplay, EventPayload::DataDisplay(msg));
    }

    fn visualize(&self, marker: VisualizationMarker) {
        self.publish(Topic::Visualization, EventPayload::Visualization(marker));
    }
}
