//! Product catalog administration. Unlike categories, product uploads are
//! screened by file extension, matching the storefront's original rules.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{CategoryId, NewProduct, Product, ProductId, ProductUpdate};
use crate::images::{unique_image_name, ImageStore, ImageUpload};
use crate::store::{StoreClient, StoreError};

pub const PRODUCT_IMAGE_DIR: &str = "images/products";

/// File extensions accepted for product images.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "svg"];

/// Admin input for both create and update.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub price: u64,
    pub stock: Option<u32>,
    pub category_id: CategoryId,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductAdminError {
    #[error("The name field is required.")]
    NameRequired,
    #[error("The name may not be greater than 255 characters.")]
    NameTooLong,
    #[error("Invalid image extension.")]
    InvalidImage,
    #[error("The selected category is invalid.")]
    UnknownCategory,
    #[error("Product not found: {0}")]
    NotFound(ProductId),
    #[error("image storage failure: {0}")]
    Storage(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ProductCatalogManager {
    store: StoreClient,
    images: Arc<dyn ImageStore>,
}

impl ProductCatalogManager {
    pub fn new(store: StoreClient, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: ProductDraft) -> Result<ProductId, ProductAdminError> {
        validate_name(&draft.name)?;
        if self.store.get_category(draft.category_id).await?.is_none() {
            return Err(ProductAdminError::UnknownCategory);
        }

        let image_path = match &draft.image {
            Some(upload) => Some(self.store_image(upload)?),
            None => None,
        };

        match self
            .store
            .create_product(NewProduct {
                name: draft.name,
                price: draft.price,
                stock: draft.stock,
                category_id: draft.category_id,
                image: image_path.clone(),
            })
            .await
        {
            Ok(id) => {
                info!(product_id = %id, "Product created");
                Ok(id)
            }
            Err(e) => {
                if let Some(path) = image_path {
                    self.discard_image(&path);
                }
                Err(e.into())
            }
        }
    }

    /// Full-field update. A replacement image is validated and written
    /// first; the old file goes away only after the record change sticks.
    #[instrument(skip(self, draft), fields(product_id = %id, name = %draft.name))]
    pub async fn update(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product, ProductAdminError> {
        validate_name(&draft.name)?;
        let existing = self
            .store
            .get_product(id)
            .await?
            .ok_or(ProductAdminError::NotFound(id))?;
        if self.store.get_category(draft.category_id).await?.is_none() {
            return Err(ProductAdminError::UnknownCategory);
        }

        let new_image = match &draft.image {
            Some(upload) => Some(self.store_image(upload)?),
            None => None,
        };

        match self
            .store
            .update_product(
                id,
                ProductUpdate {
                    name: draft.name,
                    price: draft.price,
                    stock: draft.stock,
                    category_id: draft.category_id,
                    image: new_image.clone(),
                },
            )
            .await
        {
            Ok(updated) => {
                if new_image.is_some() {
                    if let Some(old) = &existing.image {
                        self.discard_image(old);
                    }
                }
                info!("Product updated");
                Ok(updated)
            }
            Err(e) => {
                if let Some(path) = new_image {
                    self.discard_image(&path);
                }
                Err(match e {
                    StoreError::NotFound {
                        entity: "product", ..
                    } => ProductAdminError::NotFound(id),
                    other => other.into(),
                })
            }
        }
    }

    /// Removes the product and, best effort, its image file.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductAdminError> {
        let removed = match self.store.delete_product(id).await {
            Ok(product) => product,
            Err(StoreError::NotFound { .. }) => return Err(ProductAdminError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };
        if let Some(image) = &removed.image {
            self.discard_image(image);
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Product>, ProductAdminError> {
        Ok(self.store.list_products().await?)
    }

    fn discard_image(&self, path: &str) {
        if self.images.exists(path) {
            let _ = self.images.delete(path);
        }
    }

    fn store_image(&self, upload: &ImageUpload) -> Result<String, ProductAdminError> {
        if !ALLOWED_IMAGE_EXTENSIONS.contains(&upload.extension.as_str()) {
            return Err(ProductAdminError::InvalidImage);
        }
        let path = unique_image_name(PRODUCT_IMAGE_DIR, &upload.extension);
        self.images
            .save(&path, &upload.data)
            .map_err(|e| ProductAdminError::Storage(e.to_string()))?;
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<(), ProductAdminError> {
    if name.trim().is_empty() {
        return Err(ProductAdminError::NameRequired);
    }
    if name.len() > 255 {
        return Err(ProductAdminError::NameTooLong);
    }
    Ok(())
}
