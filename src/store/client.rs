//! Typed client for the store actor. Each method is one request/response
//! round-trip over the actor's channel.

use tokio::sync::{mpsc, oneshot};

use crate::domain::{
    Category, CategoryId, CategoryUpdate, DeliveryInfo, Feedback, FeedbackId, NewCategory,
    NewFeedback, NewOrder, NewProduct, NewUser, Order, OrderFilter, OrderId, OrderItem,
    OrderStatus, Product, ProductId, ProductUpdate, Role, StatusEntry, TransitionOutcome, User,
    UserId, UserPatch,
};

use super::actor::StoreRequest;
use super::database::DashboardStats;
use super::error::StoreError;

#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }
}

macro_rules! store_method {
    (fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $variant:ident) => {
        impl StoreClient {
            #[tracing::instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, StoreError> {
                tracing::debug!("Sending request");
                let (respond_to, response) = oneshot::channel();
                self.sender
                    .send(StoreRequest::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| StoreError::ChannelClosed)?;

                response.await.map_err(|_| StoreError::ChannelClosed)?
            }
        }
    };
}

store_method!(fn create_product(product: NewProduct) -> ProductId as CreateProduct);
store_method!(fn get_product(id: ProductId) -> Option<Product> as GetProduct);
store_method!(fn list_products() -> Vec<Product> as ListProducts);
store_method!(fn update_product(id: ProductId, update: ProductUpdate) -> Product as UpdateProduct);
store_method!(fn delete_product(id: ProductId) -> Product as DeleteProduct);

store_method!(fn create_category(category: NewCategory) -> CategoryId as CreateCategory);
store_method!(fn get_category(id: CategoryId) -> Option<Category> as GetCategory);
store_method!(fn find_category_by_name(name: String) -> Option<Category> as FindCategoryByName);
store_method!(fn list_categories() -> Vec<(Category, usize)> as ListCategories);
store_method!(fn update_category(id: CategoryId, update: CategoryUpdate) -> Category as UpdateCategory);
store_method!(fn delete_category(id: CategoryId) -> Category as DeleteCategory);
store_method!(fn category_product_count(id: CategoryId) -> usize as CategoryProductCount);

store_method!(fn create_user(user: NewUser) -> UserId as CreateUser);
store_method!(fn get_user(id: UserId) -> Option<User> as GetUser);
store_method!(fn find_user_by_email(email: String) -> Option<User> as FindUserByEmail);
store_method!(fn list_users() -> Vec<User> as ListUsers);
store_method!(fn list_roles() -> Vec<Role> as ListRoles);
store_method!(fn update_user(id: UserId, patch: UserPatch) -> User as UpdateUser);
store_method!(fn delete_user(id: UserId) -> () as DeleteUser);
store_method!(fn toggle_user_activation(id: UserId) -> bool as ToggleUserActivation);

store_method!(fn place_order(order: NewOrder) -> OrderId as PlaceOrder);
store_method!(fn get_order(id: OrderId) -> Option<Order> as GetOrder);
store_method!(fn list_orders(filter: OrderFilter) -> Vec<Order> as ListOrders);
store_method!(fn order_items(id: OrderId) -> Vec<OrderItem> as OrderItems);
store_method!(fn order_delivery(id: OrderId) -> Option<DeliveryInfo> as OrderDelivery);
store_method!(fn transition_order(id: OrderId, status: OrderStatus, actor_id: UserId) -> TransitionOutcome as TransitionOrder);
store_method!(fn cancel_order(id: OrderId, customer_id: UserId) -> () as CancelOrder);
store_method!(fn status_history(id: OrderId) -> Vec<StatusEntry> as StatusHistory);

store_method!(fn create_feedback(feedback: NewFeedback) -> FeedbackId as CreateFeedback);
store_method!(fn get_feedback(id: FeedbackId) -> Option<Feedback> as GetFeedback);
store_method!(fn list_feedbacks() -> Vec<Feedback> as ListFeedbacks);
store_method!(fn delete_feedback(id: FeedbackId) -> () as DeleteFeedback);

store_method!(fn dashboard_stats() -> DashboardStats as Stats);
