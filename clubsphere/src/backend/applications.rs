//! Membership application endpoints.
//!
//! All application operations go through the secure client: they belong to
//! the applicant (member routes) or to moderation (moderator routes), and
//! the backend decides which.

use crate::backend::Backend;
use crate::backend::models::applications::{Application, ApplicationCreate, ApplicationUpdate, StatusUpdate};
use crate::errors::RequestError;
use crate::types::ApplicationId;

pub struct Applications<'a> {
    pub(crate) backend: &'a Backend,
}

impl Applications<'_> {
    /// Submit an application, typically right after the payment settles.
    pub async fn submit(&self, application: &ApplicationCreate) -> Result<(), RequestError> {
        self.backend.secure.post_unit("/applications", application).await
    }

    /// Applications submitted by one member.
    pub async fn for_user(&self, email: &str) -> Result<Vec<Application>, RequestError> {
        self.backend
            .secure
            .get_json("/applications/user", &[("email", email.to_string())])
            .await
    }

    /// Every application, for the moderation queue.
    pub async fn list_all(&self) -> Result<Vec<Application>, RequestError> {
        self.backend.secure.get_json("/applications", &[]).await
    }

    /// One application in full.
    pub async fn detail(&self, id: &ApplicationId) -> Result<Application, RequestError> {
        self.backend.secure.get_json(&format!("/applications/details/{id}"), &[]).await
    }

    /// Member edit of their own pending application.
    pub async fn update(&self, id: &ApplicationId, update: &ApplicationUpdate) -> Result<(), RequestError> {
        self.backend.secure.put_unit(&format!("/applications/{id}"), update).await
    }

    /// Moderator decision: approve/reject, optionally with feedback.
    pub async fn set_status(&self, id: &ApplicationId, update: &StatusUpdate) -> Result<(), RequestError> {
        self.backend
            .secure
            .put_unit(&format!("/applications/{id}/status"), update)
            .await
    }

    /// Withdraw/delete an application.
    pub async fn delete(&self, id: &ApplicationId) -> Result<(), RequestError> {
        self.backend.secure.delete(&format!("/applications/{id}")).await
    }
}
