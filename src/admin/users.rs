//! Account administration. Every mutating operation is gated on the
//! super-admin identity and refuses to touch the actor's own account.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{NewUser, User, UserId, UserPatch};
use crate::store::{StoreClient, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserAdminError {
    /// `{0}` is the blocked operation, e.g. "delete".
    #[error("Only the super admin can {0} users.")]
    SuperAdminOnly(&'static str),
    #[error("You cannot edit your own account.")]
    EditOwnAccount,
    #[error("Cannot delete your own account.")]
    DeleteOwnAccount,
    #[error("Cannot deactivate your own account.")]
    DeactivateOwnAccount,
    #[error("Cannot delete active users. Please deactivate the user first.")]
    UserStillActive,
    #[error("The email has already been taken.")]
    EmailTaken,
    #[error("The email must be a valid email address.")]
    InvalidEmail,
    #[error("The name field is required.")]
    NameRequired,
    #[error("User not found: {0}")]
    NotFound(UserId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct UserAdmin {
    store: StoreClient,
}

impl UserAdmin {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    #[instrument(skip(self, actor, new), fields(actor_id = actor.id, email = %new.email))]
    pub async fn create_user(&self, actor: &User, new: NewUser) -> Result<UserId, UserAdminError> {
        if !actor.is_super_admin() {
            return Err(UserAdminError::SuperAdminOnly("create new"));
        }
        if new.name.trim().is_empty() {
            return Err(UserAdminError::NameRequired);
        }
        if !new.email.contains('@') {
            return Err(UserAdminError::InvalidEmail);
        }

        match self.store.create_user(new).await {
            Ok(id) => {
                info!(user_id = %id, "User created");
                Ok(id)
            }
            Err(StoreError::EmailTaken(_)) => Err(UserAdminError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn update_user(
        &self,
        actor: &User,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, UserAdminError> {
        if !actor.is_super_admin() {
            return Err(UserAdminError::SuperAdminOnly("edit"));
        }
        if id == actor.id {
            return Err(UserAdminError::EditOwnAccount);
        }
        if let Some(email) = &patch.email {
            if !email.contains('@') {
                return Err(UserAdminError::InvalidEmail);
            }
        }

        match self.store.update_user(id, patch).await {
            Ok(user) => {
                info!(user_id = %id, "User updated");
                Ok(user)
            }
            Err(StoreError::EmailTaken(_)) => Err(UserAdminError::EmailTaken),
            Err(StoreError::NotFound { entity: "user", .. }) => Err(UserAdminError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an account. Active accounts must be deactivated first.
    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn delete_user(&self, actor: &User, id: UserId) -> Result<(), UserAdminError> {
        if !actor.is_super_admin() {
            return Err(UserAdminError::SuperAdminOnly("delete"));
        }
        if id == actor.id {
            return Err(UserAdminError::DeleteOwnAccount);
        }
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or(UserAdminError::NotFound(id))?;
        if user.is_activate {
            warn!(user_id = %id, "Refusing to delete an active user");
            return Err(UserAdminError::UserStillActive);
        }

        match self.store.delete_user(id).await {
            Ok(()) => {
                info!(user_id = %id, "User deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(UserAdminError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Flips the activation flag and returns the new state.
    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn toggle_activation(
        &self,
        actor: &User,
        id: UserId,
    ) -> Result<bool, UserAdminError> {
        if !actor.is_super_admin() {
            return Err(UserAdminError::SuperAdminOnly("activate/deactivate"));
        }
        if id == actor.id {
            return Err(UserAdminError::DeactivateOwnAccount);
        }

        match self.store.toggle_user_activation(id).await {
            Ok(active) => {
                info!(user_id = %id, active, "User activation toggled");
                Ok(active)
            }
            Err(StoreError::NotFound { .. }) => Err(UserAdminError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserAdminError> {
        Ok(self.store.list_users().await?)
    }
}
