use std::sync::Arc;

use tracing::{error, info};

use crate::admin::{
    CategoryLifecycleManager, FeedbackDesk, OrderStatusMachine, ProductCatalogManager, UserAdmin,
};
use crate::checkout::CheckoutWorkflow;
use crate::events::OrderEvents;
use crate::images::ImageStore;
use crate::store::{StoreActor, StoreClient};

/// The assembled application: the store actor, the order-event subscriber,
/// and every workflow wired to them.
///
/// Responsible for starting the background tasks, handing out the
/// workflows, and shutting everything down.
pub struct ShopSystem {
    pub store: StoreClient,
    pub checkout: CheckoutWorkflow,
    pub order_status: OrderStatusMachine,
    pub categories: CategoryLifecycleManager,
    pub products: ProductCatalogManager,
    pub users: UserAdmin,
    pub feedbacks: FeedbackDesk,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ShopSystem {
    pub fn new(images: Arc<dyn ImageStore>) -> Self {
        let (actor, store) = StoreActor::new(32);
        let store_handle = tokio::spawn(actor.run());

        // Order events are consumed off the workflow's critical path; this
        // subscriber stands in for the notification senders.
        let (events, mut event_rx) = OrderEvents::channel();
        let notifier_handle = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                info!(
                    order_id = %event.order_id,
                    customer_id = %event.customer_id,
                    total_cost = %event.total_cost,
                    "New order placed"
                );
            }
        });

        Self {
            checkout: CheckoutWorkflow::new(store.clone(), events),
            order_status: OrderStatusMachine::new(store.clone()),
            categories: CategoryLifecycleManager::new(store.clone(), images.clone()),
            products: ProductCatalogManager::new(store.clone(), images),
            users: UserAdmin::new(store.clone()),
            feedbacks: FeedbackDesk::new(store.clone()),
            store,
            handles: vec![store_handle, notifier_handle],
        }
    }

    /// Drops every client handle (closing the actors' channels) and waits
    /// for the background tasks to drain.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let ShopSystem {
            store,
            checkout,
            order_status,
            categories,
            products,
            users,
            feedbacks,
            handles,
        } = self;

        drop(checkout);
        drop(order_status);
        drop(categories);
        drop(products);
        drop(users);
        drop(feedbacks);
        drop(store);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Background task failed: {:?}", e);
                return Err(format!("Background task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
