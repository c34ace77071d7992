use serde_json::json;

use super::types::{Course, Enrollment, Page};
use crate::claims::AccessClaims;
use crate::client::{ApiClient, ApiError, ApiRequest, ApiResult};

/// Result of an enrollment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    /// A new enrollment was created; the record when the server returned one
    Enrolled(Option<Enrollment>),
    /// The caller was already enrolled; no request was made
    AlreadyEnrolled(Enrollment),
}

impl ApiClient {
    /// Lists the caller's enrollments.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn list_enrollments(&self) -> ApiResult<Vec<Enrollment>> {
        let page: Page<Enrollment> = self.send_json(ApiRequest::get("/enrollments/")).await?;
        Ok(page.into_results())
    }

    /// The caller's enrollment in a course, if any.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn enrollment_for(&self, course_id: u64) -> ApiResult<Option<Enrollment>> {
        Ok(self
            .list_enrollments()
            .await?
            .into_iter()
            .find(|e| e.course.id() == course_id))
    }

    /// Enrolls the current user in a course unless already enrolled.
    ///
    /// # Errors
    /// Returns an unauthorized error when the access token carries no user
    /// id, otherwise the API failure unchanged.
    pub async fn enroll(&self, course: &Course) -> ApiResult<EnrollOutcome> {
        let user_id = self
            .session()
            .access_token()
            .as_deref()
            .and_then(AccessClaims::decode)
            .and_then(|claims| claims.user_id)
            .ok_or_else(|| {
                ApiError::unauthorized("Unable to get user information. Please log in again.")
            })?;

        // An enrollment without a student belongs to the caller: the listing
        // is already scoped to them.
        let existing = self.list_enrollments().await?.into_iter().find(|e| {
            e.course.id() == course.id
                && e.student
                    .as_ref()
                    .is_none_or(|student| student.id() == Some(user_id))
        });
        if let Some(enrollment) = existing {
            tracing::debug!(course = course.id, "already enrolled");
            return Ok(EnrollOutcome::AlreadyEnrolled(enrollment));
        }

        let request = ApiRequest::post(
            "/enrollments/",
            json!({
                "user": user_id,
                "course_id": course.id,
                "price": course.price,
            }),
        );
        let response = self.execute(request).await?;
        tracing::info!(course = course.id, "enrolled");

        Ok(EnrollOutcome::Enrolled(
            serde_json::from_str(&response.body).ok(),
        ))
    }
}
