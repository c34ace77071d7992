//! Course command handlers.

use anyhow::Result;
use comfy_table::Table;
use coursehub_core::api::{Course, Instructor};
use coursehub_core::client::ApiClient;

use super::{api_error, lessons};

fn price_label(course: &Course) -> String {
    course
        .price
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

pub async fn list(client: &ApiClient) -> Result<()> {
    let courses = client.list_courses().await.map_err(api_error)?;
    if courses.is_empty() {
        println!("No courses found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Instructor", "Category", "Price"]);
    for course in &courses {
        table.add_row(vec![
            course.id.to_string(),
            course.title.clone(),
            course
                .instructor
                .as_ref()
                .map_or_else(|| "-".to_string(), Instructor::display_name),
            course.category_title().to_string(),
            price_label(course),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn show(client: &ApiClient, id: u64) -> Result<()> {
    let course = client.course(id).await.map_err(api_error)?;
    let instructor = client
        .resolve_instructor(&course)
        .await
        .unwrap_or_else(|| "Unknown".to_string());

    println!("{}", course.title);
    if !course.description.is_empty() {
        println!();
        println!("{}", course.description);
    }
    println!();
    println!("Instructor: {instructor}");
    println!("Category:   {}", course.category_title());
    if let Some(duration) = course.duration {
        println!("Duration:   {duration} hours");
    }
    println!("Price:      {}", price_label(&course));
    if let Some(total) = course.total_lessons {
        println!("Lessons:    {total}");
    }

    if !client.session().is_authenticated() {
        println!();
        println!("Log in to enroll in this course.");
        return Ok(());
    }

    println!();
    match client.enrollment_for(course.id).await.map_err(api_error)? {
        Some(enrollment) => {
            println!(
                "Enrolled ({:.0}% complete)",
                enrollment.progress_percent()
            );
            let lessons = client.list_lessons(course.id).await.map_err(api_error)?;
            if !lessons.is_empty() {
                println!();
                lessons::print_lessons(&lessons);
            }
        }
        None => println!("Not enrolled. Run `coursehub enroll {}` to enroll.", course.id),
    }
    Ok(())
}
