use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use super::cart::DeliveryDetails;
use super::product::ProductId;
use super::user::UserId;

pub type OrderId = u64;

/// Lifecycle state of an order.
///
/// `Delivered` and `Cancelled` are terminal. `Cancelled` is reachable only
/// through the customer cancellation path, never through the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the wire value used by the order-status endpoints.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "approved" => Some(OrderStatus::Approved),
            "rejected" => Some(OrderStatus::Rejected),
            "delivering" => Some(OrderStatus::Delivering),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// The admin transition table. Rejected orders keep their state;
    /// terminal states have no outbound transitions.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Approved, OrderStatus::Rejected],
            OrderStatus::Approved => &[OrderStatus::Delivering],
            OrderStatus::Delivering => &[OrderStatus::Delivered],
            OrderStatus::Rejected | OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// User-facing reason shown when a transition out of this state is
    /// rejected.
    pub fn rejection_reason(self) -> &'static str {
        match self {
            OrderStatus::Pending => {
                "From Pending status, you can only approve or reject the order."
            }
            OrderStatus::Approved => "From Approved status, you can only change to Delivering.",
            OrderStatus::Rejected => "Rejected orders cannot be changed.",
            OrderStatus::Delivering => "From Delivering status, you can only mark as Delivered.",
            OrderStatus::Delivered | OrderStatus::Cancelled => {
                "Cannot change status of delivered or cancelled orders."
            }
        }
    }

    /// Confirmation message shown after the status is applied.
    pub fn confirmation_message(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order status changed to Pending",
            OrderStatus::Approved => "Order has been approved",
            OrderStatus::Rejected => "Order has been rejected",
            OrderStatus::Delivering => "Order is now being delivered",
            OrderStatus::Delivered => "Order has been marked as delivered",
            OrderStatus::Cancelled => "Order has been cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer order. Created only through checkout; the status is mutated
/// only through the status machine or the customer cancellation path.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub order_date: NaiveDate,
    /// Grand total including the shipping fee.
    pub total_cost: u64,
    pub shipping_fee: u64,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// One order line. `price` is the unit price captured at purchase time and
/// never changes afterward, regardless of the live product price.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: u64,
}

/// Recipient address recorded once per order from the session-captured
/// details. Independent of the customer's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryInfo {
    pub order_id: OrderId,
    pub details: DeliveryDetails,
}

/// Append-only audit entry, one per accepted status change. `actor_id` is
/// the admin for back-office transitions and the customer for cancellations.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub order_id: OrderId,
    pub actor_id: UserId,
    pub action_type: OrderStatus,
    pub date: DateTime<Utc>,
}

/// Result of a status-change request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The order already had the requested status; no audit row is written.
    NoChange,
}

/// Fully resolved order ready to be committed in one unit of work.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub order_date: NaiveDate,
    pub total_cost: u64,
    pub shipping_fee: u64,
    pub lines: Vec<NewOrderLine>,
    pub delivery: DeliveryDetails,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: u64,
}

/// Back-office order listing filter. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_transition_table() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Delivering));
        assert!(!Pending.can_transition_to(Delivered));

        assert!(Approved.can_transition_to(Delivering));
        assert!(!Approved.can_transition_to(Delivered));

        assert!(Delivering.can_transition_to(Delivered));

        for status in [Rejected, Delivered, Cancelled] {
            assert!(status.allowed_next().is_empty());
        }
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn rejection_reason_names_the_current_state() {
        assert!(OrderStatus::Pending.rejection_reason().contains("Pending"));
        assert!(OrderStatus::Approved.rejection_reason().contains("Approved"));
        assert!(OrderStatus::Delivering.rejection_reason().contains("Delivering"));
    }

    #[test]
    fn status_round_trips_through_wire_values() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Rejected,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}
