//! Feedback: customer submission and back-office moderation.

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{Feedback, FeedbackId, NewFeedback, Product, ProductId, User};
use crate::store::{StoreClient, StoreError};

/// Feedback with its author and product resolved, for the detail dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDetail {
    pub feedback: Feedback,
    pub user: Option<User>,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedbackError {
    #[error("The rating must be between 1 and 5.")]
    InvalidRating,
    #[error("The selected product is invalid.")]
    UnknownProduct,
    #[error("Feedback not found: {0}")]
    NotFound(FeedbackId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct FeedbackDesk {
    store: StoreClient,
}

impl FeedbackDesk {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Customer-side submission.
    #[instrument(skip(self, user, comment), fields(user_id = user.id))]
    pub async fn submit(
        &self,
        user: &User,
        product_id: ProductId,
        rating: u8,
        comment: String,
    ) -> Result<FeedbackId, FeedbackError> {
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating);
        }
        if self.store.get_product(product_id).await?.is_none() {
            return Err(FeedbackError::UnknownProduct);
        }

        let id = self
            .store
            .create_feedback(NewFeedback {
                user_id: user.id,
                product_id,
                rating,
                comment,
            })
            .await?;
        info!(feedback_id = %id, "Feedback submitted");
        Ok(id)
    }

    pub async fn detail(&self, id: FeedbackId) -> Result<FeedbackDetail, FeedbackError> {
        let feedback = self
            .store
            .get_feedback(id)
            .await?
            .ok_or(FeedbackError::NotFound(id))?;
        let user = self.store.get_user(feedback.user_id).await?;
        let product = self.store.get_product(feedback.product_id).await?;
        Ok(FeedbackDetail {
            feedback,
            user,
            product,
        })
    }

    pub async fn list(&self) -> Result<Vec<Feedback>, FeedbackError> {
        Ok(self.store.list_feedbacks().await?)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: FeedbackId) -> Result<(), FeedbackError> {
        match self.store.delete_feedback(id).await {
            Ok(()) => {
                info!(feedback_id = %id, "Feedback deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(FeedbackError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}
