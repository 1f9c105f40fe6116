use crate::core::events::ActivityEvent;

// EventPublisher is the publishing side of the activity log. Publishing never
// fails the caller; it reports how many subscribers the event reached.
pub trait EventPublisher: Sync + Send {
    fn publish(&self, event: ActivityEvent) -> usize;
    fn close(&self);
    fn is_closed(&self) -> bool;
}
