//! # Mock Framework
//!
//! Utilities for testing workflows in isolation.
//!
//! Use [`create_mock_store`] to get a client and a receiver, then helpers
//! like [`expect_get_product`] or [`expect_place_order`] to assert the
//! requests a workflow issues.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use tokio::sync::{mpsc, oneshot};

use crate::domain::{NewOrder, OrderId, Product, ProductId};
use crate::images::ImageStore;
use crate::store::{StoreClient, StoreError, StoreRequest};

/// Creates a mock store client and a receiver for asserting requests.
///
/// # Testing Strategy
/// In workflow tests we often don't want a full `StoreActor` if we are just
/// testing the *workflow* logic (e.g., `CheckoutWorkflow`).
///
/// Instead, we create a "Mock Client". This client sends messages to a
/// channel we control (`receiver`). We can then inspect the messages
/// arriving on that channel, assert they are correct, and answer them with
/// whatever success, failure or delay the scenario calls for.
pub fn create_mock_store(
    buffer_size: usize,
) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a GetProduct request.
pub async fn expect_get_product(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(
    ProductId,
    oneshot::Sender<Result<Option<Product>, StoreError>>,
)> {
    match receiver.recv().await {
        Some(StoreRequest::GetProduct { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a PlaceOrder request.
pub async fn expect_place_order(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(NewOrder, oneshot::Sender<Result<OrderId, StoreError>>)> {
    match receiver.recv().await {
        Some(StoreRequest::PlaceOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

/// In-memory [`ImageStore`] for manager tests.
#[derive(Default)]
pub struct MemoryImageStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

impl ImageStore for MemoryImageStore {
    fn save(&self, path: &str, data: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> io::Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_store_round_trips_a_request() {
        let (client, mut receiver) = create_mock_store(10);

        let get_task = tokio::spawn(async move { client.get_product(7).await });

        let (id, responder) = expect_get_product(&mut receiver)
            .await
            .expect("Expected GetProduct request");
        assert_eq!(id, 7);
        responder.send(Ok(None)).unwrap();

        let result = get_task.await.unwrap();
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn dropped_receiver_maps_to_channel_closed() {
        let (client, receiver) = create_mock_store(10);
        drop(receiver);

        assert_eq!(client.get_product(1).await, Err(StoreError::ChannelClosed));
    }
}
