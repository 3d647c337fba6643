//! The store actor: a single task owning the [`Database`], serializing all
//! reads and writes. Multi-row commands are handled inside one message, so
//! their unit of work can never interleave with another writer.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument};

use crate::domain::{
    Category, CategoryId, CategoryUpdate, DeliveryInfo, Feedback, FeedbackId, NewCategory,
    NewFeedback, NewOrder, NewProduct, NewUser, Order, OrderFilter, OrderId, OrderItem,
    OrderStatus, Product, ProductId, ProductUpdate, Role, StatusEntry, TransitionOutcome, User,
    UserId, UserPatch,
};

use super::client::StoreClient;
use super::database::{Database, DashboardStats};
use super::error::StoreError;

pub type StoreResponse<T> = oneshot::Sender<Result<T, StoreError>>;

/// One request per store operation. Every variant carries its reply
/// channel; senders that dropped their receiver are ignored.
#[derive(Debug)]
pub enum StoreRequest {
    CreateProduct {
        product: NewProduct,
        respond_to: StoreResponse<ProductId>,
    },
    GetProduct {
        id: ProductId,
        respond_to: StoreResponse<Option<Product>>,
    },
    ListProducts {
        respond_to: StoreResponse<Vec<Product>>,
    },
    UpdateProduct {
        id: ProductId,
        update: ProductUpdate,
        respond_to: StoreResponse<Product>,
    },
    DeleteProduct {
        id: ProductId,
        respond_to: StoreResponse<Product>,
    },
    CreateCategory {
        category: NewCategory,
        respond_to: StoreResponse<CategoryId>,
    },
    GetCategory {
        id: CategoryId,
        respond_to: StoreResponse<Option<Category>>,
    },
    FindCategoryByName {
        name: String,
        respond_to: StoreResponse<Option<Category>>,
    },
    ListCategories {
        respond_to: StoreResponse<Vec<(Category, usize)>>,
    },
    UpdateCategory {
        id: CategoryId,
        update: CategoryUpdate,
        respond_to: StoreResponse<Category>,
    },
    DeleteCategory {
        id: CategoryId,
        respond_to: StoreResponse<Category>,
    },
    CategoryProductCount {
        id: CategoryId,
        respond_to: StoreResponse<usize>,
    },
    CreateUser {
        user: NewUser,
        respond_to: StoreResponse<UserId>,
    },
    GetUser {
        id: UserId,
        respond_to: StoreResponse<Option<User>>,
    },
    FindUserByEmail {
        email: String,
        respond_to: StoreResponse<Option<User>>,
    },
    ListUsers {
        respond_to: StoreResponse<Vec<User>>,
    },
    ListRoles {
        respond_to: StoreResponse<Vec<Role>>,
    },
    UpdateUser {
        id: UserId,
        patch: UserPatch,
        respond_to: StoreResponse<User>,
    },
    DeleteUser {
        id: UserId,
        respond_to: StoreResponse<()>,
    },
    ToggleUserActivation {
        id: UserId,
        respond_to: StoreResponse<bool>,
    },
    PlaceOrder {
        order: NewOrder,
        respond_to: StoreResponse<OrderId>,
    },
    GetOrder {
        id: OrderId,
        respond_to: StoreResponse<Option<Order>>,
    },
    ListOrders {
        filter: OrderFilter,
        respond_to: StoreResponse<Vec<Order>>,
    },
    OrderItems {
        id: OrderId,
        respond_to: StoreResponse<Vec<OrderItem>>,
    },
    OrderDelivery {
        id: OrderId,
        respond_to: StoreResponse<Option<DeliveryInfo>>,
    },
    TransitionOrder {
        id: OrderId,
        status: OrderStatus,
        actor_id: UserId,
        respond_to: StoreResponse<TransitionOutcome>,
    },
    CancelOrder {
        id: OrderId,
        customer_id: UserId,
        respond_to: StoreResponse<()>,
    },
    StatusHistory {
        id: OrderId,
        respond_to: StoreResponse<Vec<StatusEntry>>,
    },
    CreateFeedback {
        feedback: NewFeedback,
        respond_to: StoreResponse<FeedbackId>,
    },
    GetFeedback {
        id: FeedbackId,
        respond_to: StoreResponse<Option<Feedback>>,
    },
    ListFeedbacks {
        respond_to: StoreResponse<Vec<Feedback>>,
    },
    DeleteFeedback {
        id: FeedbackId,
        respond_to: StoreResponse<()>,
    },
    Stats {
        respond_to: StoreResponse<DashboardStats>,
    },
}

pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    db: Database,
}

impl StoreActor {
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            db: Database::new(),
        };
        (actor, StoreClient::new(sender))
    }

    /// Runs until every client handle is dropped.
    #[instrument(name = "store", skip(self))]
    pub async fn run(mut self) {
        info!("Store actor starting");
        while let Some(msg) = self.receiver.recv().await {
            self.handle(msg);
        }
        info!("Store actor stopped");
    }

    fn handle(&mut self, msg: StoreRequest) {
        match msg {
            StoreRequest::CreateProduct {
                product,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.insert_product(product));
            }
            StoreRequest::GetProduct { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.product(id)));
            }
            StoreRequest::ListProducts { respond_to } => {
                let _ = respond_to.send(Ok(self.db.products()));
            }
            StoreRequest::UpdateProduct {
                id,
                update,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.update_product(id, update));
            }
            StoreRequest::DeleteProduct { id, respond_to } => {
                let _ = respond_to.send(self.db.delete_product(id));
            }
            StoreRequest::CreateCategory {
                category,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.insert_category(category));
            }
            StoreRequest::GetCategory { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.category(id)));
            }
            StoreRequest::FindCategoryByName { name, respond_to } => {
                let _ = respond_to.send(Ok(self.db.find_category_by_name(&name)));
            }
            StoreRequest::ListCategories { respond_to } => {
                let _ = respond_to.send(Ok(self.db.categories_with_product_count()));
            }
            StoreRequest::UpdateCategory {
                id,
                update,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.update_category(id, update));
            }
            StoreRequest::DeleteCategory { id, respond_to } => {
                let _ = respond_to.send(self.db.delete_category(id));
            }
            StoreRequest::CategoryProductCount { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.category_product_count(id)));
            }
            StoreRequest::CreateUser { user, respond_to } => {
                let _ = respond_to.send(self.db.insert_user(user));
            }
            StoreRequest::GetUser { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.user(id)));
            }
            StoreRequest::FindUserByEmail { email, respond_to } => {
                let _ = respond_to.send(Ok(self.db.find_user_by_email(&email)));
            }
            StoreRequest::ListUsers { respond_to } => {
                let _ = respond_to.send(Ok(self.db.users()));
            }
            StoreRequest::ListRoles { respond_to } => {
                let _ = respond_to.send(Ok(self.db.roles()));
            }
            StoreRequest::UpdateUser {
                id,
                patch,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.update_user(id, patch));
            }
            StoreRequest::DeleteUser { id, respond_to } => {
                let _ = respond_to.send(self.db.delete_user(id));
            }
            StoreRequest::ToggleUserActivation { id, respond_to } => {
                let _ = respond_to.send(self.db.toggle_user_activation(id));
            }
            StoreRequest::PlaceOrder { order, respond_to } => {
                let _ = respond_to.send(self.db.place_order(order, Utc::now()));
            }
            StoreRequest::GetOrder { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.order(id)));
            }
            StoreRequest::ListOrders { filter, respond_to } => {
                let _ = respond_to.send(Ok(self.db.orders(&filter)));
            }
            StoreRequest::OrderItems { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.order_items(id)));
            }
            StoreRequest::OrderDelivery { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.delivery_for(id)));
            }
            StoreRequest::TransitionOrder {
                id,
                status,
                actor_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.transition_order(id, status, actor_id, Utc::now()));
            }
            StoreRequest::CancelOrder {
                id,
                customer_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.cancel_order(id, customer_id, Utc::now()));
            }
            StoreRequest::StatusHistory { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.status_history(id)));
            }
            StoreRequest::CreateFeedback {
                feedback,
                respond_to,
            } => {
                let _ = respond_to.send(self.db.insert_feedback(feedback));
            }
            StoreRequest::GetFeedback { id, respond_to } => {
                let _ = respond_to.send(Ok(self.db.feedback(id)));
            }
            StoreRequest::ListFeedbacks { respond_to } => {
                let _ = respond_to.send(Ok(self.db.feedbacks()));
            }
            StoreRequest::DeleteFeedback { id, respond_to } => {
                let _ = respond_to.send(self.db.delete_feedback(id));
            }
            StoreRequest::Stats { respond_to } => {
                let _ = respond_to.send(Ok(self.db.stats()));
            }
        }
    }
}
