use super::product::ProductId;
use super::user::UserId;

pub type FeedbackId = u64;

/// Customer feedback on a product. Ratings run 1 to 5.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub feedback_id: FeedbackId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: u8,
    pub comment: String,
}
