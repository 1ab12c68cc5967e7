//! Review endpoints.

use crate::backend::Backend;
use crate::backend::models::reviews::{Review, ReviewUpsert};
use crate::errors::RequestError;
use crate::types::{ClubId, ReviewId};

pub struct Reviews<'a> {
    pub(crate) backend: &'a Backend,
}

impl Reviews<'_> {
    /// Reviews for one club (public, shown on the club detail page).
    pub async fn for_club(&self, club_id: &ClubId) -> Result<Vec<Review>, RequestError> {
        self.backend
            .public
            .get_json("/reviews", &[("clubId", club_id.clone())])
            .await
    }

    /// Reviews written by one member.
    pub async fn by_user(&self, email: &str) -> Result<Vec<Review>, RequestError> {
        self.backend
            .secure
            .get_json("/reviews", &[("userEmail", email.to_string())])
            .await
    }

    /// Every review, for the moderation view.
    pub async fn list_all(&self) -> Result<Vec<Review>, RequestError> {
        self.backend.secure.get_json("/reviews", &[]).await
    }

    /// Member action: write a review.
    pub async fn create(&self, review: &ReviewUpsert) -> Result<(), RequestError> {
        self.backend.secure.post_unit("/reviews", review).await
    }

    /// Member action: edit an own review.
    pub async fn update(&self, id: &ReviewId, review: &ReviewUpsert) -> Result<(), RequestError> {
        self.backend.secure.put_unit(&format!("/reviews/{id}"), review).await
    }

    /// Member or moderator action: delete a review.
    pub async fn delete(&self, id: &ReviewId) -> Result<(), RequestError> {
        self.backend.secure.delete(&format!("/reviews/{id}")).await
    }
}
