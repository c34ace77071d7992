//! Enrollment command handlers.

use anyhow::Result;
use comfy_table::Table;
use coursehub_core::api::EnrollOutcome;
use coursehub_core::client::ApiClient;

use super::{api_error, require_session};

pub async fn enroll(client: &ApiClient, course_id: u64) -> Result<()> {
    require_session(client)?;

    let course = client.course(course_id).await.map_err(api_error)?;
    match client.enroll(&course).await.map_err(api_error)? {
        EnrollOutcome::Enrolled(_) => println!("✓ Enrolled in {}", course.title),
        EnrollOutcome::AlreadyEnrolled(_) => println!("You are already enrolled in this course"),
    }
    Ok(())
}

pub async fn list(client: &ApiClient) -> Result<()> {
    require_session(client)?;

    let enrollments = client.list_enrollments().await.map_err(api_error)?;
    if enrollments.is_empty() {
        println!("You are not enrolled in any courses yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Course ID", "Course", "Progress", "Lessons"]);
    for enrollment in &enrollments {
        let lessons = match (enrollment.completed_lessons, enrollment.total_lessons) {
            (Some(done), Some(total)) => format!("{done}/{total}"),
            (None, Some(total)) => format!("-/{total}"),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            enrollment.course.id().to_string(),
            enrollment.course.title().unwrap_or("-").to_string(),
            format!("{:.0}%", enrollment.progress_percent()),
            lessons,
        ]);
    }
    println!("{table}");

    let completed = enrollments.iter().filter(|e| e.is_complete()).count();
    println!("Enrolled: {}, Completed: {completed}", enrollments.len());
    Ok(())
}
