//! Lesson command handlers.

use anyhow::Result;
use coursehub_core::api::Lesson;
use coursehub_core::client::ApiClient;

use super::api_error;

pub fn print_lessons(lessons: &[Lesson]) {
    for (index, lesson) in lessons.iter().enumerate() {
        let mark = if lesson.completed { "✓" } else { " " };
        println!("[{mark}] {}. {} (id {})", index + 1, lesson.title, lesson.id);
        if !lesson.description.is_empty() {
            println!("      {}", lesson.description);
        }
        if let Some(url) = lesson.embed_url() {
            println!("      Video: {url}");
        }
        for material in &lesson.materials {
            println!("      Material: {} ({})", material.title, material.file);
        }
    }
}

pub async fn list(client: &ApiClient, course_id: u64) -> Result<()> {
    let lessons = client.list_lessons(course_id).await.map_err(api_error)?;
    if lessons.is_empty() {
        println!("No lessons available for this course yet.");
    } else {
        print_lessons(&lessons);
    }
    Ok(())
}

pub async fn complete(client: &ApiClient, lesson_id: u64, course_id: Option<u64>) -> Result<()> {
    client.complete_lesson(lesson_id).await.map_err(api_error)?;
    println!("✓ Lesson {lesson_id} marked complete");

    let Some(course_id) = course_id else {
        return Ok(());
    };
    let lessons = client.list_lessons(course_id).await.map_err(api_error)?;
    let done = lessons.iter().filter(|l| l.completed).count();
    println!("Progress: {done}/{} lessons complete", lessons.len());
    Ok(())
}
