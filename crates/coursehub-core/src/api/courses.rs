use super::types::{Course, Instructor, Page, UserSummary};
use crate::client::{ApiClient, ApiError, ApiRequest, ApiResult};

impl ApiClient {
    /// Lists every course visible to the caller.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        let page: Page<Course> = self.send_json(ApiRequest::get("/courses/")).await?;
        Ok(page.into_results())
    }

    /// Finds a course by id in the course listing.
    ///
    /// # Errors
    /// Returns a not-found error when the listing has no such course.
    pub async fn course(&self, id: u64) -> ApiResult<Course> {
        self.list_courses()
            .await?
            .into_iter()
            .find(|course| course.id == id)
            .ok_or_else(|| ApiError::not_found("Course not found"))
    }

    /// Fetches a user's public profile.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn user(&self, id: u64) -> ApiResult<UserSummary> {
        self.send_json(ApiRequest::get(format!("/users/{id}/")))
            .await
    }

    /// Display name of a course's instructor. A bare instructor id is looked
    /// up; if that fails the name falls back to `Instructor {id}`.
    pub async fn resolve_instructor(&self, course: &Course) -> Option<String> {
        match course.instructor.as_ref()? {
            Instructor::Expanded(user) => Some(user.display_name()),
            instructor @ Instructor::Id(id) => match self.user(*id).await {
                Ok(user) => Some(user.display_name()),
                Err(e) => {
                    tracing::debug!(instructor = id, "instructor lookup failed: {e}");
                    Some(instructor.display_name())
                }
            },
        }
    }
}
