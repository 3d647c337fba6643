//! Category lifecycle: create/update with image handling, and the
//! products-block-deletion rule.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{Category, CategoryId, CategoryUpdate, NewCategory};
use crate::images::{unique_image_name, ImageStore, ImageUpload};
use crate::store::{StoreClient, StoreError};

pub const CATEGORY_IMAGE_DIR: &str = "images/categories";

/// Admin input for both create and update.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CategoryError {
    #[error("The name field is required.")]
    NameRequired,
    #[error("The name may not be greater than 255 characters.")]
    NameTooLong,
    #[error("The name has already been taken.")]
    NameTaken,
    #[error("Invalid image file type or size.")]
    InvalidImage,
    #[error("Category not found: {0}")]
    NotFound(CategoryId),
    #[error("image storage failure: {0}")]
    Storage(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Manages categories and their image assets.
#[derive(Clone)]
pub struct CategoryLifecycleManager {
    store: StoreClient,
    images: Arc<dyn ImageStore>,
}

impl CategoryLifecycleManager {
    pub fn new(store: StoreClient, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    /// Creates a category. An invalid image fails before any file or
    /// record is written.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: CategoryDraft) -> Result<CategoryId, CategoryError> {
        validate_name(&draft.name)?;
        if self
            .store
            .find_category_by_name(draft.name.clone())
            .await?
            .is_some()
        {
            return Err(CategoryError::NameTaken);
        }

        let image_path = match &draft.image {
            Some(upload) => Some(self.store_image(upload)?),
            None => None,
        };

        match self
            .store
            .create_category(NewCategory {
                name: draft.name,
                image: image_path.clone(),
            })
            .await
        {
            Ok(id) => {
                info!(category_id = %id, "Category created");
                Ok(id)
            }
            Err(e) => {
                // The record never existed, so the fresh file must go too.
                if let Some(path) = image_path {
                    self.discard_image(&path);
                }
                Err(match e {
                    StoreError::NameTaken(_) => CategoryError::NameTaken,
                    other => other.into(),
                })
            }
        }
    }

    /// Updates a category. A replacement image is validated and written
    /// before the old file is deleted, so a failure never leaves the
    /// category pointing at a missing file.
    #[instrument(skip(self, draft), fields(category_id = %id, name = %draft.name))]
    pub async fn update(
        &self,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Category, CategoryError> {
        validate_name(&draft.name)?;
        let existing = self
            .store
            .get_category(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;
        if let Some(other) = self.store.find_category_by_name(draft.name.clone()).await? {
            if other.category_id != id {
                return Err(CategoryError::NameTaken);
            }
        }

        let new_image = match &draft.image {
            Some(upload) => Some(self.store_image(upload)?),
            None => None,
        };

        match self
            .store
            .update_category(
                id,
                CategoryUpdate {
                    name: draft.name,
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
                info!("Category updated");
                Ok(updated)
            }
            Err(e) => {
                if let Some(path) = new_image {
                    self.discard_image(&path);
                }
                Err(match e {
                    StoreError::NameTaken(_) => CategoryError::NameTaken,
                    StoreError::NotFound { .. } => CategoryError::NotFound(id),
                    other => other.into(),
                })
            }
        }
    }

    /// Deletes a category unless products still reference it. Returns
    /// `Ok(false)` rather than an error when the category is missing or in
    /// use, the non-fatal failure the admin screen expects.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<bool, CategoryError> {
        let Some(category) = self.store.get_category(id).await? else {
            return Ok(false);
        };
        if self.store.category_product_count(id).await? > 0 {
            warn!(category_id = %id, "Refusing to delete category with products");
            return Ok(false);
        }

        // Best effort: a missing file is not a reason to keep the record.
        if let Some(image) = &category.image {
            self.discard_image(image);
        }

        match self.store.delete_category(id).await {
            Ok(_) => {
                info!(category_id = %id, "Category deleted");
                Ok(true)
            }
            // A product appeared between the check and the write.
            Err(StoreError::CategoryInUse) | Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Categories with their product counts for the listing screen.
    pub async fn list(&self) -> Result<Vec<(Category, usize)>, CategoryError> {
        Ok(self.store.list_categories().await?)
    }

    /// Best-effort removal of a stored file; a missing file is fine.
    fn discard_image(&self, path: &str) {
        if self.images.exists(path) {
            let _ = self.images.delete(path);
        }
    }

    fn store_image(&self, upload: &ImageUpload) -> Result<String, CategoryError> {
        if !upload.is_allowed() {
            return Err(CategoryError::InvalidImage);
        }
        let path = unique_image_name(CATEGORY_IMAGE_DIR, &upload.extension);
        self.images
            .save(&path, &upload.data)
            .map_err(|e| CategoryError::Storage(e.to_string()))?;
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<(), CategoryError> {
    if name.trim().is_empty() {
        return Err(CategoryError::NameRequired);
    }
    if name.len() > 255 {
        return Err(CategoryError::NameTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewProduct, ProductId};
    use crate::mock_framework::MemoryImageStore;
    use crate::store::StoreActor;

    struct Harness {
        manager: CategoryLifecycleManager,
        store: StoreClient,
        images: Arc<MemoryImageStore>,
    }

    fn png(size: usize) -> ImageUpload {
        ImageUpload {
            data: vec![0u8; size],
            mime_type: "image/png".to_string(),
            extension: "png".to_string(),
        }
    }

    async fn harness() -> Harness {
        let (actor, store) = StoreActor::new(32);
        tokio::spawn(actor.run());
        let images = Arc::new(MemoryImageStore::new());

        Harness {
            manager: CategoryLifecycleManager::new(store.clone(), images.clone()),
            store,
            images,
        }
    }

    async fn seed_product(h: &Harness, category_id: CategoryId) -> ProductId {
        h.store
            .create_product(NewProduct {
                name: "Leather Sofa".to_string(),
                price: 2_500_000,
                stock: Some(5),
                category_id,
                image: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_persists_the_image_under_a_random_name() {
        let h = harness().await;

        let id = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: Some(png(1024)),
            })
            .await
            .unwrap();

        let category = h.store.get_category(id).await.unwrap().unwrap();
        let path = category.image.unwrap();
        assert!(path.starts_with("images/categories/"));
        assert!(h.images.contains(&path));
    }

    #[tokio::test]
    async fn invalid_image_fails_before_any_write() {
        let h = harness().await;

        let oversized = ImageUpload {
            data: vec![0u8; crate::images::MAX_IMAGE_SIZE + 1],
            mime_type: "image/png".to_string(),
            extension: "png".to_string(),
        };
        let result = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: Some(oversized),
            })
            .await;
        assert_eq!(result, Err(CategoryError::InvalidImage));

        let pdf = ImageUpload {
            data: vec![0u8; 100],
            mime_type: "application/pdf".to_string(),
            extension: "pdf".to_string(),
        };
        let result = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: Some(pdf),
            })
            .await;
        assert_eq!(result, Err(CategoryError::InvalidImage));

        assert!(h.manager.list().await.unwrap().is_empty());
        assert_eq!(h.images.len(), 0);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_excluding_self() {
        let h = harness().await;
        let sofa = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: None,
            })
            .await
            .unwrap();
        h.manager
            .create(CategoryDraft {
                name: "Table".to_string(),
                image: None,
            })
            .await
            .unwrap();

        assert_eq!(
            h.manager
                .create(CategoryDraft {
                    name: "Sofa".to_string(),
                    image: None
                })
                .await,
            Err(CategoryError::NameTaken)
        );

        // Keeping its own name on update is fine; stealing another's is not.
        assert!(h
            .manager
            .update(
                sofa,
                CategoryDraft {
                    name: "Sofa".to_string(),
                    image: None
                }
            )
            .await
            .is_ok());
        assert_eq!(
            h.manager
                .update(
                    sofa,
                    CategoryDraft {
                        name: "Table".to_string(),
                        image: None
                    }
                )
                .await,
            Err(CategoryError::NameTaken)
        );
    }

    #[tokio::test]
    async fn update_replaces_the_image_and_removes_the_old_file() {
        let h = harness().await;
        let id = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: Some(png(512)),
            })
            .await
            .unwrap();
        let old_path = h
            .store
            .get_category(id)
            .await
            .unwrap()
            .unwrap()
            .image
            .unwrap();

        let updated = h
            .manager
            .update(
                id,
                CategoryDraft {
                    name: "Sofa & Armchair".to_string(),
                    image: Some(png(2048)),
                },
            )
            .await
            .unwrap();

        let new_path = updated.image.unwrap();
        assert_ne!(new_path, old_path);
        assert!(h.images.contains(&new_path));
        assert!(!h.images.contains(&old_path));
    }

    #[tokio::test]
    async fn invalid_replacement_image_keeps_the_old_file() {
        let h = harness().await;
        let id = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: Some(png(512)),
            })
            .await
            .unwrap();
        let old_path = h
            .store
            .get_category(id)
            .await
            .unwrap()
            .unwrap()
            .image
            .unwrap();

        let result = h
            .manager
            .update(
                id,
                CategoryDraft {
                    name: "Sofa".to_string(),
                    image: Some(ImageUpload {
                        data: vec![0u8; 100],
                        mime_type: "text/plain".to_string(),
                        extension: "txt".to_string(),
                    }),
                },
            )
            .await;

        assert_eq!(result, Err(CategoryError::InvalidImage));
        assert!(h.images.contains(&old_path));
    }

    #[tokio::test]
    async fn delete_is_blocked_while_products_reference_the_category() {
        let h = harness().await;
        let id = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: None,
            })
            .await
            .unwrap();
        let product = seed_product(&h, id).await;

        assert!(!h.manager.delete(id).await.unwrap());
        assert!(h.store.get_category(id).await.unwrap().is_some());
        assert!(h.store.get_product(product).await.unwrap().is_some());

        h.store.delete_product(product).await.unwrap();
        assert!(h.manager.delete(id).await.unwrap());
        assert!(h.store.get_category(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_image_file() {
        let h = harness().await;
        let id = h
            .manager
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: Some(png(512)),
            })
            .await
            .unwrap();
        let path = h
            .store
            .get_category(id)
            .await
            .unwrap()
            .unwrap()
            .image
            .unwrap();

        assert!(h.manager.delete(id).await.unwrap());
        assert!(!h.images.contains(&path));
    }

    #[tokio::test]
    async fn deleting_a_missing_category_reports_false() {
        let h = harness().await;
        assert!(!h.manager.delete(404).await.unwrap());
    }
}
