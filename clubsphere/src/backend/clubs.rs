//! Club endpoints.

use crate::backend::Backend;
use crate::backend::models::clubs::{Club, ClubFilter, ClubUpsert};
use crate::backend::models::pagination::{PageQuery, Paginated};
use crate::errors::RequestError;
use crate::types::ClubId;

pub struct Clubs<'a> {
    pub(crate) backend: &'a Backend,
}

impl Clubs<'_> {
    /// Filtered, sorted, paginated club listing (public).
    pub async fn list(&self, filter: &ClubFilter, page: PageQuery) -> Result<Paginated<Club>, RequestError> {
        let mut query = filter.to_query();
        query.extend(page.to_query());
        self.backend.public.get_json("/clubs", &query).await
    }

    /// Featured clubs for the home page (public).
    pub async fn featured(&self) -> Result<Vec<Club>, RequestError> {
        self.backend.public.get_json("/home/clubs", &[]).await
    }

    /// Single club detail (public).
    pub async fn detail(&self, id: &ClubId) -> Result<Club, RequestError> {
        self.backend.public.get_json(&format!("/club/data/{id}"), &[]).await
    }

    /// Clubs managed by a moderator.
    pub async fn managed_by(&self, manager_email: &str) -> Result<Vec<Club>, RequestError> {
        self.backend.secure.get_json(&format!("/clubs/{manager_email}"), &[]).await
    }

    /// Moderator action: create a club (enters moderation as pending).
    pub async fn create(&self, club: &ClubUpsert) -> Result<(), RequestError> {
        self.backend.secure.post_unit("/clubs", club).await
    }

    /// Moderator action: update a club.
    pub async fn update(&self, id: &ClubId, club: &ClubUpsert) -> Result<(), RequestError> {
        self.backend.secure.put_unit(&format!("/club/update/{id}"), club).await
    }

    /// Admin/moderator action: delete a club.
    pub async fn delete(&self, id: &ClubId) -> Result<(), RequestError> {
        self.backend.secure.delete(&format!("/clubs/delete/{id}")).await
    }
}
