//! User endpoints.
//!
//! Collection operations are admin-only on the backend; the client issues
//! them through the secure client and lets the backend reject unauthorized
//! callers. User creation goes through the public client because it happens
//! during registration, before a session necessarily exists.

use tracing::instrument;

use crate::backend::Backend;
use crate::backend::models::users::{ModeratorAssignment, RoleUpdate, UserCreate, UserRecord};
use crate::errors::RequestError;
use crate::types::UserRecordId;

pub struct Users<'a> {
    pub(crate) backend: &'a Backend,
}

impl Users<'_> {
    /// All user records (admin view).
    pub async fn list(&self) -> Result<Vec<UserRecord>, RequestError> {
        self.backend.secure.get_json("/users", &[]).await
    }

    /// The record matching an email, or `None` if the backend has no such
    /// user. This is the query the role resolver issues per navigation.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, RequestError> {
        match self.backend.secure.get_json(&format!("/users/{email}"), &[]).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a user record. The backend enforces email uniqueness; a
    /// conflict response means the record already exists.
    pub async fn create(&self, record: &UserCreate) -> Result<(), RequestError> {
        self.backend.public.post_unit("/users", record).await
    }

    /// Admin action: change a user's role.
    pub async fn update_role(&self, id: &UserRecordId, update: &RoleUpdate) -> Result<(), RequestError> {
        self.backend.secure.put_unit(&format!("/users/{id}/role"), update).await
    }

    /// Admin action: deputize a moderator under the given admin.
    pub async fn assign_moderator(&self, moderator_email: &str, assignment: &ModeratorAssignment) -> Result<(), RequestError> {
        self.backend
            .secure
            .put_unit(&format!("/users/assign/{moderator_email}"), assignment)
            .await
    }

    /// Admin action: delete a user record.
    pub async fn delete(&self, id: &UserRecordId) -> Result<(), RequestError> {
        self.backend.secure.delete(&format!("/users/{id}")).await
    }
}
