use std::collections::BTreeMap;

use super::product::{Product, ProductId};

/// One cart entry. `price`, `name` and `image` are display snapshots taken
/// when the line was added; checkout re-reads the live product and ignores
/// the cached price.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub quantity: u32,
    pub price: u64,
    pub name: String,
    #[allow(dead_code)]
    pub image: Option<String>,
}

/// Recipient details captured during the delivery-info step. Held in the
/// session only; never written back to the customer's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryDetails {
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
    pub city: String,
    pub district: String,
    pub ward: Option<String>,
}

/// The session-held shopping cart: product id to line, plus the delivery
/// details once captured. Cleared as a whole when checkout commits.
#[derive(Debug, Clone, Default)]
pub struct CartSession {
    lines: BTreeMap<ProductId, CartLine>,
    delivery: Option<DeliveryDetails>,
}

impl CartSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` of `product`, merging with an existing line.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        let line = self
            .lines
            .entry(product.product_id)
            .or_insert_with(|| CartLine {
                quantity: 0,
                price: product.price,
                name: product.name.clone(),
                image: product.image.clone(),
            });
        line.quantity += quantity;
    }

    /// Sets an existing line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.lines.remove(&product_id);
        } else if let Some(line) = self.lines.get_mut(&product_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.remove(&product_id);
    }

    /// Lines in product-id order.
    pub fn lines(&self) -> impl Iterator<Item = (ProductId, &CartLine)> {
        self.lines.iter().map(|(id, line)| (*id, line))
    }

    pub fn total_quantity(&self) -> u32 {
        self.lines.values().map(|line| line.quantity).sum()
    }

    /// Display subtotal from the cached line prices.
    pub fn subtotal(&self) -> u64 {
        self.lines
            .values()
            .map(|line| u64::from(line.quantity) * line.price)
            .sum()
    }

    pub fn set_delivery(&mut self, details: DeliveryDetails) {
        self.delivery = Some(details);
    }

    pub fn delivery(&self) -> Option<&DeliveryDetails> {
        self.delivery.as_ref()
    }

    /// Drops both the lines and the captured delivery details.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.delivery = None;
    }
}
