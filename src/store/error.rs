use thiserror::Error;

use crate::domain::OrderStatus;

/// Errors surfaced by the store actor. Workflows translate these into their
/// own user-facing errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: u64 },
    /// A guarded stock decrement found fewer units than requested at write
    /// time.
    #[error("insufficient stock for product: {name}")]
    StockConflict { name: String },
    /// The order's status changed between the workflow's check and the
    /// write, and the requested transition is no longer legal.
    #[error("{}", .from.rejection_reason())]
    TransitionRejected { from: OrderStatus, to: OrderStatus },
    #[error("Only pending orders can be cancelled.")]
    CancelRejected { status: OrderStatus },
    #[error("category name already taken: {0}")]
    NameTaken(String),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("category has associated products")]
    CategoryInUse,
    #[error("store actor closed")]
    ChannelClosed,
}
