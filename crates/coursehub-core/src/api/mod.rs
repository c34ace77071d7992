//! Typed operations on the platform API.
//!
//! Each module adds methods to [`crate::client::ApiClient`]; every call goes
//! through the client's middleware pipeline.

mod auth;
mod courses;
mod enrollments;
mod lessons;
mod profile;
mod types;

pub use auth::{DEFAULT_ROLE, SignupForm};
pub use enrollments::EnrollOutcome;
pub use types::{
    Category, Course, CourseRef, Enrollment, Instructor, Lesson, Material, Page, Price, Profile,
    ProfileUpdate, StudentRef, UserSummary,
};
