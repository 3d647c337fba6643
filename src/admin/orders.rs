//! Admin order management: the status machine and the order screens'
//! queries.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{
    Order, OrderFilter, OrderId, OrderItem, OrderStatus, StatusEntry, TransitionOutcome, User,
};
use crate::store::{StoreClient, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderStatusError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    /// The requested status is not one the admin surface may assign.
    #[error("Invalid status transition.")]
    NotAdminAssignable,
    #[error("{}", .from.rejection_reason())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Enforces the legal order-status transitions and records one audit entry
/// per accepted change.
#[derive(Clone)]
pub struct OrderStatusMachine {
    store: StoreClient,
}

impl OrderStatusMachine {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Applies an admin status change.
    ///
    /// Requesting the status the order already has is accepted as a no-op
    /// with no audit entry. Anything outside the transition table is
    /// rejected with a reason keyed by the order's current state. The store
    /// re-validates the transition when it writes, so a concurrent change
    /// cannot slip an illegal hop through.
    #[instrument(skip(self, admin), fields(admin_id = admin.id))]
    pub async fn update_status(
        &self,
        admin: &User,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<TransitionOutcome, OrderStatusError> {
        if new_status == OrderStatus::Cancelled {
            // Only customers cancel, through their own path.
            return Err(OrderStatusError::NotAdminAssignable);
        }

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderStatusError::NotFound(order_id))?;

        // Terminal orders reject everything, including their own status.
        if order.status.is_terminal() {
            return Err(OrderStatusError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }
        if order.status == new_status {
            info!(order_id = %order_id, status = %new_status, "Status unchanged");
            return Ok(TransitionOutcome::NoChange);
        }
        if !order.status.can_transition_to(new_status) {
            warn!(
                order_id = %order_id,
                from = %order.status,
                to = %new_status,
                "Rejected status transition"
            );
            return Err(OrderStatusError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        match self.store.transition_order(order_id, new_status, admin.id).await {
            Ok(outcome) => {
                info!(order_id = %order_id, status = %new_status, "Order status updated");
                Ok(outcome)
            }
            Err(StoreError::TransitionRejected { from, to }) => {
                Err(OrderStatusError::InvalidTransition { from, to })
            }
            Err(StoreError::NotFound { .. }) => Err(OrderStatusError::NotFound(order_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Filtered order list for the back-office screen, newest first.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, OrderStatusError> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// The order's lines for the detail dialog.
    pub async fn order_details(
        &self,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderItem>), OrderStatusError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderStatusError::NotFound(order_id))?;
        let items = self.store.order_items(order_id).await?;
        Ok((order, items))
    }

    pub async fn history(&self, order_id: OrderId) -> Result<Vec<StatusEntry>, OrderStatusError> {
        Ok(self.store.status_history(order_id).await?)
    }
}
