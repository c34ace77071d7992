//! Platform records as returned by the REST API.
//!
//! Decoding is lenient: optional fields may be missing or null, and
//! references to other records may arrive either expanded or as bare ids.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static YOUTUBE_WATCH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([^&]+)").ok()
});
static YOUTUBE_SHORT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([^?&]+)").ok());

/// A list response, either DRF-paginated or a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Listing<T>")]
pub struct Page<T> {
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Envelope {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Bare(results) => Page {
                count: None,
                next: None,
                previous: None,
                results,
            },
            Listing::Envelope {
                count,
                next,
                previous,
                results,
            } => Page {
                count,
                next,
                previous,
                results,
            },
        }
    }
}

/// Course price. DRF renders decimals as strings; some deployments send
/// plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Number(n) => write!(f, "{n}"),
            Price::Text(s) => f.write_str(s),
        }
    }
}

/// Instructor as embedded in a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructor {
    /// Only the user id; resolve with [`crate::client::ApiClient::resolve_instructor`]
    Id(u64),
    Expanded(UserSummary),
}

impl Instructor {
    pub fn id(&self) -> Option<u64> {
        match self {
            Instructor::Id(id) => Some(*id),
            Instructor::Expanded(user) => user.id,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Instructor::Id(id) => format!("Instructor {id}"),
            Instructor::Expanded(user) => user.display_name(),
        }
    }
}

/// Public fields of a platform user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSummary {
    pub id: Option<u64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
}

impl UserSummary {
    /// First and last name, else `name`, else `username`, else "Unknown".
    pub fn display_name(&self) -> String {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.trim().is_empty())
        }

        if let Some(first) = non_empty(&self.first_name) {
            return match non_empty(&self.last_name) {
                Some(last) => format!("{first} {last}"),
                None => first.to_string(),
            };
        }
        non_empty(&self.name)
            .or_else(|| non_empty(&self.username))
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: Option<u64>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub instructor: Option<Instructor>,
    #[serde(default)]
    pub category: Option<Category>,
    /// Hours
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub total_lessons: Option<u64>,
}

impl Course {
    pub fn category_title(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or("Uncategorized")
    }
}

/// Course as referenced from an enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseRef {
    Id(u64),
    Summary {
        id: u64,
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
    },
}

impl CourseRef {
    pub fn id(&self) -> u64 {
        match self {
            CourseRef::Id(id) | CourseRef::Summary { id, .. } => *id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            CourseRef::Id(_) => None,
            CourseRef::Summary { title, .. } => Some(title),
        }
    }
}

/// Student as referenced from an enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentRef {
    Id(u64),
    Expanded(UserSummary),
}

impl StudentRef {
    pub fn id(&self) -> Option<u64> {
        match self {
            StudentRef::Id(id) => Some(*id),
            StudentRef::Expanded(user) => user.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: u64,
    pub course: CourseRef,
    #[serde(default)]
    pub student: Option<StudentRef>,
    /// Percent complete, 0 to 100
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub completed_lessons: Option<u64>,
    #[serde(default)]
    pub total_lessons: Option<u64>,
    #[serde(default)]
    pub enrolled_at: Option<String>,
}

impl Enrollment {
    /// Reported progress, else the rounded share of completed lessons.
    /// Zero when neither is known or the course has no lessons.
    pub fn progress_percent(&self) -> f64 {
        let percent = match (self.progress, self.completed_lessons, self.total_lessons) {
            (Some(progress), _, _) => progress,
            (None, Some(done), Some(total)) if total > 0 => {
                (done as f64 / total as f64 * 100.0).round()
            }
            _ => 0.0,
        };
        percent.clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percent() >= 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl Lesson {
    /// Playable URL for the lesson video. YouTube watch and short links
    /// become embed links; anything else is returned unchanged.
    pub fn embed_url(&self) -> Option<String> {
        self.video
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(youtube_embed_url)
    }
}

fn youtube_embed_url(url: &str) -> String {
    [&*YOUTUBE_WATCH, &*YOUTUBE_SHORT]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map_or_else(
            || url.to_string(),
            |id| format!("https://www.youtube.com/embed/{}", id.as_str()),
        )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Option<u64>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
    pub mobile_no: Option<String>,
}

/// Partial profile update. Only fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_no: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.mobile_no.is_none()
    }
}
