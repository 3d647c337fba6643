pub type CategoryId = u64;

/// A product category. `name` is unique across categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub image: Option<String>,
}

/// Payload for creating a new category. `image` is the stored file path.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub image: Option<String>,
}

/// Update for an existing category. `image: None` keeps the current file.
#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    pub name: String,
    pub image: Option<String>,
}
