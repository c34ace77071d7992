use reqwest::Method;

use super::types::{Lesson, Page};
use crate::client::{ApiClient, ApiRequest, ApiResult};

impl ApiClient {
    /// Lists the lessons of a course, with the caller's completion state.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn list_lessons(&self, course_id: u64) -> ApiResult<Vec<Lesson>> {
        let request = ApiRequest::get("/lessons/").query("course", course_id);
        let page: Page<Lesson> = self.send_json(request).await?;
        Ok(page.into_results())
    }

    /// Marks a lesson complete for the caller. The response body is ignored.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn complete_lesson(&self, lesson_id: u64) -> ApiResult<()> {
        let request = ApiRequest::new(Method::POST, format!("/lessons/{lesson_id}/complete/"));
        self.execute(request).await?;
        tracing::debug!(lesson = lesson_id, "lesson completed");
        Ok(())
    }
}
