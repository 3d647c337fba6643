//! The customer-facing order flows: delivery-info capture, checkout, and
//! cancellation of a not-yet-approved order.

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::domain::{CartSession, DeliveryDetails, NewOrder, NewOrderLine, OrderId, User};
use crate::events::{NewOrderPlaced, OrderEvents};
use crate::shipping;
use crate::store::{StoreClient, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error("Please provide delivery information first.")]
    MissingDeliveryInfo,
    #[error("The {0} field is invalid.")]
    InvalidDeliveryField(&'static str),
    #[error("A product in your cart is no longer available.")]
    ProductUnavailable,
    #[error("Invalid item quantity in cart.")]
    InvalidQuantity,
    #[error("Insufficient stock for product: {0}")]
    InsufficientStock(String),
    /// A concurrent checkout consumed the stock between the pre-check and
    /// the write. Not retried automatically.
    #[error("Insufficient stock during checkout. Please try again.")]
    StockRaceLost,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CancelError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Only pending orders can be cancelled.")]
    NotCancellable,
    #[error("store error: {0}")]
    Store(StoreError),
}

/// Orchestrates validation of the session cart against live products,
/// shipping-fee calculation, and the atomic order commit.
#[derive(Clone)]
pub struct CheckoutWorkflow {
    store: StoreClient,
    events: OrderEvents,
}

impl CheckoutWorkflow {
    pub fn new(store: StoreClient, events: OrderEvents) -> Self {
        Self { store, events }
    }

    /// Validates and records delivery details in the session. The
    /// customer's profile is never updated from here.
    pub fn capture_delivery(
        &self,
        cart: &mut CartSession,
        details: DeliveryDetails,
    ) -> Result<(), CheckoutError> {
        validate_delivery(&details)?;
        cart.set_delivery(details);
        Ok(())
    }

    /// Places an order from the session cart.
    ///
    /// Every cart line is re-validated against the live product (existence,
    /// quantity, stock) and priced at the *current* product price; the
    /// session-cached price is display-only. The store commits the order,
    /// its items, the delivery info and the guarded stock decrements in one
    /// unit of work. On success the session is cleared and a
    /// `NewOrderPlaced` event goes out.
    #[instrument(skip(self, customer, cart), fields(customer_id = customer.id))]
    pub async fn place_order(
        &self,
        customer: &User,
        cart: &mut CartSession,
    ) -> Result<OrderId, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let delivery = cart
            .delivery()
            .cloned()
            .ok_or(CheckoutError::MissingDeliveryInfo)?;

        // Pre-check each line against the live product and price the order.
        let mut lines = Vec::new();
        let mut subtotal: u64 = 0;
        for (product_id, line) in cart.lines() {
            let product = self
                .store
                .get_product(product_id)
                .await?
                .ok_or(CheckoutError::ProductUnavailable)?;

            if line.quantity == 0 {
                return Err(CheckoutError::InvalidQuantity);
            }
            if let Some(stock) = product.stock {
                if stock < line.quantity {
                    error!(product = %product.name, "Insufficient stock at pre-check");
                    return Err(CheckoutError::InsufficientStock(product.name));
                }
            }

            subtotal += u64::from(line.quantity) * product.price;
            lines.push(NewOrderLine {
                product_id,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        let shipping = shipping::shipping_info(subtotal);
        info!(
            subtotal = shipping.subtotal,
            shipping_fee = shipping.shipping_fee,
            "Cart validated"
        );

        let order = NewOrder {
            customer_id: customer.id,
            order_date: Utc::now().date_naive(),
            total_cost: shipping.total,
            shipping_fee: shipping.shipping_fee,
            lines,
            delivery,
        };

        let order_id = match self.store.place_order(order).await {
            Ok(id) => id,
            // The guard lost a race that the pre-check could not see.
            Err(StoreError::StockConflict { name }) => {
                error!(product = %name, "Stock race lost during commit");
                return Err(CheckoutError::StockRaceLost);
            }
            Err(StoreError::NotFound {
                entity: "product", ..
            }) => return Err(CheckoutError::ProductUnavailable),
            Err(e) => return Err(e.into()),
        };

        cart.clear();
        self.events.order_placed(NewOrderPlaced {
            order_id,
            customer_id: customer.id,
            total_cost: shipping.total,
        });
        info!(order_id = %order_id, "Order placed successfully");
        Ok(order_id)
    }

    /// Customer-initiated cancellation, the only path into `Cancelled`.
    /// Owner-only and pending-only; the store enforces both atomically
    /// with the audit row.
    #[instrument(skip(self, customer), fields(customer_id = customer.id))]
    pub async fn cancel_order(
        &self,
        customer: &User,
        order_id: OrderId,
    ) -> Result<(), CancelError> {
        match self.store.cancel_order(order_id, customer.id).await {
            Ok(()) => {
                info!(order_id = %order_id, "Order cancelled");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(CancelError::NotFound(order_id)),
            Err(StoreError::CancelRejected { status }) => {
                info!(order_id = %order_id, %status, "Cancellation rejected");
                Err(CancelError::NotCancellable)
            }
            Err(e) => Err(CancelError::Store(e)),
        }
    }
}

fn validate_delivery(details: &DeliveryDetails) -> Result<(), CheckoutError> {
    let required = [
        ("user_name", &details.user_name),
        ("email", &details.email),
        ("phone_number", &details.phone_number),
        ("country", &details.country),
        ("city", &details.city),
        ("district", &details.district),
    ];
    for (field, value) in required {
        if value.trim().is_empty() || value.len() > 255 {
            return Err(CheckoutError::InvalidDeliveryField(field));
        }
    }
    if !details.email.contains('@') {
        return Err(CheckoutError::InvalidDeliveryField("email"));
    }
    if details.phone_number.len() > 20 {
        return Err(CheckoutError::InvalidDeliveryField("phone_number"));
    }
    Ok(())
}
