//! In-memory relational tables plus the unit-of-work used by every
//! multi-row command. The owning actor serializes access, so a unit of
//! work can never interleave with another writer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{
    Category, CategoryId, CategoryUpdate, DeliveryInfo, Feedback, FeedbackId, NewCategory,
    NewFeedback, NewOrder, NewProduct, NewUser, Order, OrderFilter, OrderId, OrderItem,
    OrderStatus, Product, ProductId, ProductUpdate, Role, RoleId, StatusEntry, TransitionOutcome,
    User, UserId, UserPatch, ADMIN_ROLE, CUSTOMER_ROLE,
};

use super::error::StoreError;

/// Back-office dashboard counters, computed in one round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_categories: usize,
    pub total_products: usize,
    pub total_orders: usize,
    /// Orders currently in `Pending` status.
    pub pending_orders: usize,
    pub total_feedbacks: usize,
}

/// All tables and id sequences. Sequences start at 1 and are never reused;
/// a rolled-back unit of work may leave a gap.
pub struct Database {
    products: BTreeMap<ProductId, Product>,
    categories: BTreeMap<CategoryId, Category>,
    roles: BTreeMap<RoleId, Role>,
    users: BTreeMap<UserId, User>,
    orders: BTreeMap<OrderId, Order>,
    order_items: Vec<OrderItem>,
    delivery_info: BTreeMap<OrderId, DeliveryInfo>,
    status_log: Vec<StatusEntry>,
    feedbacks: BTreeMap<FeedbackId, Feedback>,
    next_product_id: ProductId,
    next_category_id: CategoryId,
    next_user_id: UserId,
    next_order_id: OrderId,
    next_feedback_id: FeedbackId,
}

impl Database {
    /// An empty database with the two fixed roles seeded.
    pub fn new() -> Self {
        let mut roles = BTreeMap::new();
        roles.insert(
            ADMIN_ROLE,
            Role {
                role_id: ADMIN_ROLE,
                name: "admin".to_string(),
            },
        );
        roles.insert(
            CUSTOMER_ROLE,
            Role {
                role_id: CUSTOMER_ROLE,
                name: "customer".to_string(),
            },
        );

        Self {
            products: BTreeMap::new(),
            categories: BTreeMap::new(),
            roles,
            users: BTreeMap::new(),
            orders: BTreeMap::new(),
            order_items: Vec::new(),
            delivery_info: BTreeMap::new(),
            status_log: Vec::new(),
            feedbacks: BTreeMap::new(),
            next_product_id: 1,
            next_category_id: 1,
            next_user_id: 1,
            next_order_id: 1,
            next_feedback_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub fn insert_product(&mut self, new: NewProduct) -> Result<ProductId, StoreError> {
        if !self.categories.contains_key(&new.category_id) {
            return Err(StoreError::NotFound {
                entity: "category",
                id: new.category_id,
            });
        }

        let product_id = self.next_product_id;
        self.next_product_id += 1;
        self.products.insert(
            product_id,
            Product {
                product_id,
                name: new.name,
                price: new.price,
                stock: new.stock,
                category_id: new.category_id,
                image: new.image,
            },
        );
        Ok(product_id)
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    pub fn update_product(
        &mut self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, StoreError> {
        if !self.categories.contains_key(&update.category_id) {
            return Err(StoreError::NotFound {
                entity: "category",
                id: update.category_id,
            });
        }
        let product = self.products.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "product",
            id,
        })?;

        product.name = update.name;
        product.price = update.price;
        product.stock = update.stock;
        product.category_id = update.category_id;
        if let Some(image) = update.image {
            product.image = Some(image);
        }
        Ok(product.clone())
    }

    pub fn delete_product(&mut self, id: ProductId) -> Result<Product, StoreError> {
        self.products.remove(&id).ok_or(StoreError::NotFound {
            entity: "product",
            id,
        })
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub fn insert_category(&mut self, new: NewCategory) -> Result<CategoryId, StoreError> {
        if self.find_category_by_name(&new.name).is_some() {
            return Err(StoreError::NameTaken(new.name));
        }

        let category_id = self.next_category_id;
        self.next_category_id += 1;
        self.categories.insert(
            category_id,
            Category {
                category_id,
                name: new.name,
                image: new.image,
            },
        );
        Ok(category_id)
    }

    pub fn category(&self, id: CategoryId) -> Option<Category> {
        self.categories.get(&id).cloned()
    }

    pub fn find_category_by_name(&self, name: &str) -> Option<Category> {
        self.categories
            .values()
            .find(|category| category.name == name)
            .cloned()
    }

    pub fn update_category(
        &mut self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, StoreError> {
        if let Some(other) = self.find_category_by_name(&update.name) {
            if other.category_id != id {
                return Err(StoreError::NameTaken(update.name));
            }
        }
        let category = self.categories.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "category",
            id,
        })?;

        category.name = update.name;
        if let Some(image) = update.image {
            category.image = Some(image);
        }
        Ok(category.clone())
    }

    /// Re-checks the product reference at write time; a category that
    /// gained a product since the caller's check stays put.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Category, StoreError> {
        if self.category_product_count(id) > 0 {
            return Err(StoreError::CategoryInUse);
        }
        self.categories.remove(&id).ok_or(StoreError::NotFound {
            entity: "category",
            id,
        })
    }

    pub fn category_product_count(&self, id: CategoryId) -> usize {
        self.products
            .values()
            .filter(|product| product.category_id == id)
            .count()
    }

    pub fn categories_with_product_count(&self) -> Vec<(Category, usize)> {
        self.categories
            .values()
            .map(|category| {
                (
                    category.clone(),
                    self.category_product_count(category.category_id),
                )
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn insert_user(&mut self, new: NewUser) -> Result<UserId, StoreError> {
        if !self.roles.contains_key(&new.role_id) {
            return Err(StoreError::NotFound {
                entity: "role",
                id: new.role_id,
            });
        }
        if self.find_user_by_email(&new.email).is_some() {
            return Err(StoreError::EmailTaken(new.email));
        }

        let id = self.next_user_id;
        self.next_user_id += 1;
        self.users.insert(
            id,
            User {
                id,
                name: new.name,
                email: new.email,
                role_id: new.role_id,
                is_activate: new.is_activate,
            },
        );
        Ok(id)
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users.values().find(|user| user.email == email).cloned()
    }

    pub fn users(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    /// The fixed role table, for the user screens' filters.
    pub fn roles(&self) -> Vec<Role> {
        self.roles.values().cloned().collect()
    }

    pub fn update_user(&mut self, id: UserId, patch: UserPatch) -> Result<User, StoreError> {
        if let Some(email) = &patch.email {
            if let Some(other) = self.find_user_by_email(email) {
                if other.id != id {
                    return Err(StoreError::EmailTaken(email.clone()));
                }
            }
        }
        if let Some(role_id) = patch.role_id {
            if !self.roles.contains_key(&role_id) {
                return Err(StoreError::NotFound {
                    entity: "role",
                    id: role_id,
                });
            }
        }
        let user = self
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "user", id })?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(role_id) = patch.role_id {
            user.role_id = role_id;
        }
        Ok(user.clone())
    }

    pub fn delete_user(&mut self, id: UserId) -> Result<(), StoreError> {
        self.users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { entity: "user", id })
    }

    /// Flips the activation flag and returns the new state.
    pub fn toggle_user_activation(&mut self, id: UserId) -> Result<bool, StoreError> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "user", id })?;
        user.is_activate = !user.is_activate;
        Ok(user.is_activate)
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Creates the order, its items, its delivery info, and the guarded
    /// stock decrements in one unit of work. A failed guard aborts with
    /// nothing applied.
    pub fn place_order(
        &mut self,
        new: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<OrderId, StoreError> {
        let mut unit = UnitOfWork::new(self);

        let order_id = unit.insert_order(Order {
            order_id: 0, // assigned by the unit
            customer_id: new.customer_id,
            order_date: new.order_date,
            total_cost: new.total_cost,
            shipping_fee: new.shipping_fee,
            status: OrderStatus::Pending,
            updated_at: now,
        });

        for line in &new.lines {
            unit.decrement_stock(line.product_id, line.quantity)?;
            unit.insert_order_item(OrderItem {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.unit_price,
            });
        }

        unit.insert_delivery(DeliveryInfo {
            order_id,
            details: new.delivery,
        });

        unit.commit();
        Ok(order_id)
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).cloned()
    }

    /// Filtered order list, newest order date first.
    pub fn orders(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|order| match filter.status {
                Some(status) => order.status == status,
                None => true,
            })
            .filter(|order| match filter.from {
                Some(from) => order.order_date >= from,
                None => true,
            })
            .filter(|order| match filter.to {
                Some(to) => order.order_date <= to,
                None => true,
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.order_id.cmp(&a.order_id)));
        orders
    }

    pub fn order_items(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect()
    }

    pub fn delivery_for(&self, order_id: OrderId) -> Option<DeliveryInfo> {
        self.delivery_info.get(&order_id).cloned()
    }

    /// Applies an admin status change and its audit row atomically. The
    /// transition table is re-evaluated here so a concurrent change between
    /// the workflow's check and this write cannot slip through.
    pub fn transition_order(
        &mut self,
        order_id: OrderId,
        new_status: OrderStatus,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError> {
        let current = self
            .orders
            .get(&order_id)
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: order_id,
            })?
            .status;

        // Terminal states reject everything, including their own status.
        if current.is_terminal() {
            return Err(StoreError::TransitionRejected {
                from: current,
                to: new_status,
            });
        }
        if current == new_status {
            return Ok(TransitionOutcome::NoChange);
        }
        if !current.can_transition_to(new_status) {
            return Err(StoreError::TransitionRejected {
                from: current,
                to: new_status,
            });
        }

        let mut unit = UnitOfWork::new(self);
        unit.set_order_status(order_id, new_status, now);
        unit.append_status(StatusEntry {
            order_id,
            actor_id,
            action_type: new_status,
            date: now,
        });
        unit.commit();
        Ok(TransitionOutcome::Applied)
    }

    /// Customer cancellation: owner-only, pending-only. A foreign order is
    /// reported as not found rather than revealing its existence.
    pub fn cancel_order(
        &mut self,
        order_id: OrderId,
        customer_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let order = self.orders.get(&order_id).ok_or(StoreError::NotFound {
            entity: "order",
            id: order_id,
        })?;
        if order.customer_id != customer_id {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order_id,
            });
        }
        if order.status != OrderStatus::Pending {
            return Err(StoreError::CancelRejected {
                status: order.status,
            });
        }

        let mut unit = UnitOfWork::new(self);
        unit.set_order_status(order_id, OrderStatus::Cancelled, now);
        unit.append_status(StatusEntry {
            order_id,
            actor_id: customer_id,
            action_type: OrderStatus::Cancelled,
            date: now,
        });
        unit.commit();
        Ok(())
    }

    pub fn status_history(&self, order_id: OrderId) -> Vec<StatusEntry> {
        self.status_log
            .iter()
            .filter(|entry| entry.order_id == order_id)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Feedback
    // ------------------------------------------------------------------

    pub fn insert_feedback(&mut self, new: NewFeedback) -> Result<FeedbackId, StoreError> {
        if !self.users.contains_key(&new.user_id) {
            return Err(StoreError::NotFound {
                entity: "user",
                id: new.user_id,
            });
        }
        if !self.products.contains_key(&new.product_id) {
            return Err(StoreError::NotFound {
                entity: "product",
                id: new.product_id,
            });
        }

        let feedback_id = self.next_feedback_id;
        self.next_feedback_id += 1;
        self.feedbacks.insert(
            feedback_id,
            Feedback {
                feedback_id,
                user_id: new.user_id,
                product_id: new.product_id,
                rating: new.rating,
                comment: new.comment,
            },
        );
        Ok(feedback_id)
    }

    pub fn feedback(&self, id: FeedbackId) -> Option<Feedback> {
        self.feedbacks.get(&id).cloned()
    }

    pub fn feedbacks(&self) -> Vec<Feedback> {
        self.feedbacks.values().cloned().collect()
    }

    pub fn delete_feedback(&mut self, id: FeedbackId) -> Result<(), StoreError> {
        self.feedbacks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                entity: "feedback",
                id,
            })
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            total_users: self.users.len(),
            total_categories: self.categories.len(),
            total_products: self.products.len(),
            total_orders: self.orders.len(),
            pending_orders: self
                .orders
                .values()
                .filter(|order| order.status == OrderStatus::Pending)
                .count(),
            total_feedbacks: self.feedbacks.len(),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

/// Stages the writes of one multi-row command. Nothing touches the tables
/// until `commit`; dropping the unit uncommitted discards every staged
/// write. Guards (the conditional stock decrement) are evaluated against
/// the table state plus the unit's own staged writes.
pub struct UnitOfWork<'a> {
    db: &'a mut Database,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    delivery: Vec<DeliveryInfo>,
    status_entries: Vec<StatusEntry>,
    status_updates: Vec<(OrderId, OrderStatus, DateTime<Utc>)>,
    decrements: BTreeMap<ProductId, u32>,
}

impl<'a> UnitOfWork<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self {
            db,
            orders: Vec::new(),
            order_items: Vec::new(),
            delivery: Vec::new(),
            status_entries: Vec::new(),
            status_updates: Vec::new(),
            decrements: BTreeMap::new(),
        }
    }

    /// Assigns the next order id and stages the row. The sequence advances
    /// even if the unit later rolls back.
    pub fn insert_order(&mut self, mut order: Order) -> OrderId {
        let order_id = self.db.next_order_id;
        self.db.next_order_id += 1;
        order.order_id = order_id;
        self.orders.push(order);
        order_id
    }

    pub fn insert_order_item(&mut self, item: OrderItem) {
        self.order_items.push(item);
    }

    pub fn insert_delivery(&mut self, info: DeliveryInfo) {
        self.delivery.push(info);
    }

    /// The guarded decrement: stages `quantity` off the product's stock
    /// only if the stock still covers it, counting decrements already
    /// staged in this unit. Untracked stock passes through untouched.
    pub fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let product = self
            .db
            .products
            .get(&product_id)
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: product_id,
            })?;
        let Some(stock) = product.stock else {
            return Ok(());
        };

        let staged = self.decrements.get(&product_id).copied().unwrap_or(0);
        if stock.saturating_sub(staged) < quantity {
            return Err(StoreError::StockConflict {
                name: product.name.clone(),
            });
        }
        *self.decrements.entry(product_id).or_insert(0) += quantity;
        Ok(())
    }

    pub fn set_order_status(&mut self, order_id: OrderId, status: OrderStatus, at: DateTime<Utc>) {
        self.status_updates.push((order_id, status, at));
    }

    pub fn append_status(&mut self, entry: StatusEntry) {
        self.status_entries.push(entry);
    }

    /// Applies every staged write. All guards were checked at staging time
    /// and no other writer can have interleaved, so this cannot fail.
    pub fn commit(self) {
        for (product_id, quantity) in self.decrements {
            if let Some(product) = self.db.products.get_mut(&product_id) {
                if let Some(stock) = product.stock.as_mut() {
                    *stock -= quantity;
                }
            }
        }
        for order in self.orders {
            self.db.orders.insert(order.order_id, order);
        }
        self.db.order_items.extend(self.order_items);
        for info in self.delivery {
            self.db.delivery_info.insert(info.order_id, info);
        }
        for (order_id, status, at) in self.status_updates {
            if let Some(order) = self.db.orders.get_mut(&order_id) {
                order.status = status;
                order.updated_at = at;
            }
        }
        self.db.status_log.extend(self.status_entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryDetails, NewOrderLine};

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            user_name: "Nguyen Van An".to_string(),
            email: "an@example.com".to_string(),
            phone_number: "0901234567".to_string(),
            country: "Vietnam".to_string(),
            city: "Ha Noi".to_string(),
            district: "Dong Da".to_string(),
            ward: None,
        }
    }

    fn seeded() -> (Database, UserId, ProductId) {
        let mut db = Database::new();
        let customer = db
            .insert_user(NewUser {
                name: "An".to_string(),
                email: "an@example.com".to_string(),
                role_id: CUSTOMER_ROLE,
                is_activate: true,
            })
            .unwrap();
        let category = db
            .insert_category(NewCategory {
                name: "Sofa".to_string(),
                image: None,
            })
            .unwrap();
        let product = db
            .insert_product(NewProduct {
                name: "Leather Sofa".to_string(),
                price: 2_500_000,
                stock: Some(5),
                category_id: category,
                image: None,
            })
            .unwrap();
        (db, customer, product)
    }

    fn order_for(customer: UserId, product: ProductId, quantity: u32) -> NewOrder {
        NewOrder {
            customer_id: customer,
            order_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            total_cost: u64::from(quantity) * 2_500_000,
            shipping_fee: 0,
            lines: vec![NewOrderLine {
                product_id: product,
                quantity,
                unit_price: 2_500_000,
            }],
            delivery: delivery(),
        }
    }

    #[test]
    fn place_order_writes_order_items_delivery_and_stock_together() {
        let (mut db, customer, product) = seeded();

        let order_id = db.place_order(order_for(customer, product, 2), Utc::now()).unwrap();

        let order = db.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(db.order_items(order_id).len(), 1);
        assert!(db.delivery_for(order_id).is_some());
        assert_eq!(db.product(product).unwrap().stock, Some(3));
    }

    #[test]
    fn failed_stock_guard_rolls_back_the_entire_order() {
        let (mut db, customer, product) = seeded();

        let result = db.place_order(order_for(customer, product, 6), Utc::now());

        assert!(matches!(result, Err(StoreError::StockConflict { .. })));
        assert_eq!(db.orders(&OrderFilter::default()).len(), 0);
        assert!(db.order_items.is_empty());
        assert!(db.delivery_info.is_empty());
        assert_eq!(db.product(product).unwrap().stock, Some(5));
    }

    #[test]
    fn contention_for_the_last_units_admits_exactly_one_order() {
        let (mut db, customer, product) = seeded();

        // Both commands were pre-validated against the same stock read of 5.
        let first = db.place_order(order_for(customer, product, 5), Utc::now());
        let second = db.place_order(order_for(customer, product, 5), Utc::now());

        assert!(first.is_ok());
        assert_eq!(
            second,
            Err(StoreError::StockConflict {
                name: "Leather Sofa".to_string()
            })
        );
        assert_eq!(db.orders(&OrderFilter::default()).len(), 1);
        assert_eq!(db.product(product).unwrap().stock, Some(0));
    }

    #[test]
    fn untracked_stock_is_never_decremented() {
        let (mut db, customer, _) = seeded();
        let untracked = db
            .insert_product(NewProduct {
                name: "Custom Table".to_string(),
                price: 1_000_000,
                stock: None,
                category_id: 1,
                image: None,
            })
            .unwrap();

        db.place_order(order_for(customer, untracked, 100), Utc::now())
            .unwrap();

        assert_eq!(db.product(untracked).unwrap().stock, None);
    }

    #[test]
    fn transition_updates_status_and_appends_one_audit_row() {
        let (mut db, customer, product) = seeded();
        let admin = db
            .insert_user(NewUser {
                name: "Admin".to_string(),
                email: "admin1@gmail.com".to_string(),
                role_id: ADMIN_ROLE,
                is_activate: true,
            })
            .unwrap();
        let order_id = db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();

        let outcome = db
            .transition_order(order_id, OrderStatus::Approved, admin, Utc::now())
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::Applied);
        assert_eq!(db.order(order_id).unwrap().status, OrderStatus::Approved);
        let history = db.status_history(order_id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actor_id, admin);
        assert_eq!(history[0].action_type, OrderStatus::Approved);
    }

    #[test]
    fn same_status_transition_is_a_no_op_without_audit() {
        let (mut db, customer, product) = seeded();
        let order_id = db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();

        let outcome = db
            .transition_order(order_id, OrderStatus::Pending, 99, Utc::now())
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::NoChange);
        assert!(db.status_history(order_id).is_empty());
    }

    #[test]
    fn illegal_transition_is_rejected_without_writing() {
        let (mut db, customer, product) = seeded();
        let order_id = db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();

        let result = db.transition_order(order_id, OrderStatus::Delivering, 99, Utc::now());

        assert_eq!(
            result,
            Err(StoreError::TransitionRejected {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivering,
            })
        );
        assert_eq!(db.order(order_id).unwrap().status, OrderStatus::Pending);
        assert!(db.status_history(order_id).is_empty());
    }

    #[test]
    fn terminal_orders_reject_even_their_own_status() {
        let (mut db, customer, product) = seeded();
        let order_id = db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();
        db.transition_order(order_id, OrderStatus::Approved, 9, Utc::now())
            .unwrap();
        db.transition_order(order_id, OrderStatus::Delivering, 9, Utc::now())
            .unwrap();
        db.transition_order(order_id, OrderStatus::Delivered, 9, Utc::now())
            .unwrap();

        let result = db.transition_order(order_id, OrderStatus::Delivered, 9, Utc::now());
        assert!(matches!(
            result,
            Err(StoreError::TransitionRejected {
                from: OrderStatus::Delivered,
                ..
            })
        ));
    }

    #[test]
    fn cancel_is_owner_only_and_pending_only() {
        let (mut db, customer, product) = seeded();
        let order_id = db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();

        let foreign = db.cancel_order(order_id, customer + 1, Utc::now());
        assert!(matches!(foreign, Err(StoreError::NotFound { .. })));

        db.cancel_order(order_id, customer, Utc::now()).unwrap();
        assert_eq!(db.order(order_id).unwrap().status, OrderStatus::Cancelled);

        let again = db.cancel_order(order_id, customer, Utc::now());
        assert_eq!(
            again,
            Err(StoreError::CancelRejected {
                status: OrderStatus::Cancelled
            })
        );
        // One audit row from the successful cancellation, actor = customer.
        let history = db.status_history(order_id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actor_id, customer);
    }

    #[test]
    fn category_with_products_cannot_be_deleted() {
        let (mut db, _, product) = seeded();
        let category_id = db.product(product).unwrap().category_id;

        assert_eq!(db.delete_category(category_id), Err(StoreError::CategoryInUse));
        assert!(db.category(category_id).is_some());

        db.delete_product(product).unwrap();
        assert!(db.delete_category(category_id).is_ok());
    }

    #[test]
    fn category_names_are_unique_excluding_self() {
        let mut db = Database::new();
        let sofa = db
            .insert_category(NewCategory {
                name: "Sofa".to_string(),
                image: None,
            })
            .unwrap();
        db.insert_category(NewCategory {
            name: "Table".to_string(),
            image: None,
        })
        .unwrap();

        assert!(matches!(
            db.insert_category(NewCategory {
                name: "Sofa".to_string(),
                image: None
            }),
            Err(StoreError::NameTaken(_))
        ));

        // Renaming a category to its own name is fine.
        assert!(db
            .update_category(
                sofa,
                CategoryUpdate {
                    name: "Sofa".to_string(),
                    image: None
                }
            )
            .is_ok());

        assert!(matches!(
            db.update_category(
                sofa,
                CategoryUpdate {
                    name: "Table".to_string(),
                    image: None
                }
            ),
            Err(StoreError::NameTaken(_))
        ));
    }

    #[test]
    fn pending_orders_stat_counts_only_pending() {
        let (mut db, customer, product) = seeded();
        let admin = db
            .insert_user(NewUser {
                name: "Admin".to_string(),
                email: "admin1@gmail.com".to_string(),
                role_id: ADMIN_ROLE,
                is_activate: true,
            })
            .unwrap();

        let first = db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();
        db.place_order(order_for(customer, product, 1), Utc::now()).unwrap();
        db.transition_order(first, OrderStatus::Approved, admin, Utc::now())
            .unwrap();

        let stats = db.stats();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 1);
    }
}
