use std::collections::BTreeMap;

use super::types::{Profile, ProfileUpdate};
use crate::client::{ApiClient, ApiError, ApiRequest, ApiResult};

impl ApiClient {
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn profile(&self) -> ApiResult<Profile> {
        self.send_json(ApiRequest::get("/profile/")).await
    }

    /// Applies a partial update and returns the updated profile.
    ///
    /// # Errors
    /// Returns a validation error for an empty update, otherwise the API
    /// failure unchanged.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        if update.is_empty() {
            return Err(ApiError::validation("Nothing to update", BTreeMap::new()));
        }

        let body = serde_json::to_value(update)
            .map_err(|e| ApiError::parse(format!("Failed to encode profile update: {e}")))?;
        let updated: Option<Profile> = self
            .send_json(ApiRequest::patch("/profile/", body))
            .await?;

        match updated {
            Some(profile) => Ok(profile),
            None => self.profile().await,
        }
    }
}
