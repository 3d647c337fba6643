//! Domain events published by the checkout workflow. Delivery is
//! fire-and-forget; notification collaborators consume them on their own
//! schedule.

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{OrderId, UserId};

/// Emitted once per committed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderPlaced {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub total_cost: u64,
}

/// Publisher handle held by the checkout workflow.
#[derive(Clone)]
pub struct OrderEvents {
    sender: mpsc::UnboundedSender<NewOrderPlaced>,
}

impl OrderEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NewOrderPlaced>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Publishes without waiting for or observing the subscriber.
    pub fn order_placed(&self, event: NewOrderPlaced) {
        if self.sender.send(event).is_err() {
            debug!("No event subscriber, dropping NewOrderPlaced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_events_to_the_subscriber() {
        let (events, mut receiver) = OrderEvents::channel();

        events.order_placed(NewOrderPlaced {
            order_id: 7,
            customer_id: 2,
            total_cost: 7_700_000,
        });

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.order_id, 7);
        assert_eq!(event.total_cost, 7_700_000);
    }

    #[tokio::test]
    async fn publishing_without_a_subscriber_is_not_an_error() {
        let (events, receiver) = OrderEvents::channel();
        drop(receiver);

        events.order_placed(NewOrderPlaced {
            order_id: 1,
            customer_id: 1,
            total_cost: 0,
        });
    }
}
