use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result};

mod page;

pub use page::{PageRequest, TaskPage, UserPage};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_NAME_LEN: usize = 50;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Todo,
    Ongoing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Ongoing, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::Ongoing => "ONGOING",
            Status::Done => "DONE",
        }
    }

    /// Parse the wire form. Matching is exact: `todo` is not a status.
    pub fn parse(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                Error::validation("Invalid status. Allowed values: TODO, ONGOING, DONE")
            })
    }

    /// Position in the workflow, used when sorting by status.
    pub fn rank(&self) -> u8 {
        match self {
            Status::Todo => 0,
            Status::Ongoing => 1,
            Status::Done => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a task that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn new(title: &str, description: Option<&str>) -> Result<Self> {
        Ok(NewTask {
            title: validate_title(title)?,
            description: validate_description(description.unwrap_or(""))?,
        })
    }
}

/// Title/description edits. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskChanges {
    pub fn new(title: Option<&str>, description: Option<&str>) -> Result<Self> {
        Ok(TaskChanges {
            title: title.map(validate_title).transpose()?,
            description: description.map(validate_description).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(name: &str, email: &str) -> Result<Self> {
        Ok(NewUser {
            name: validate_name(name)?,
            email: validate_email(email)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn new(name: Option<&str>, email: Option<&str>) -> Result<Self> {
        Ok(UserChanges {
            name: name.map(validate_name).transpose()?,
            email: email.map(validate_email).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Field a task listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    #[default]
    CreatedAt,
    Title,
    Status,
}

impl TaskSort {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "created_at" => Ok(TaskSort::CreatedAt),
            "title" => Ok(TaskSort::Title),
            "status" => Ok(TaskSort::Status),
            _ => Err(Error::validation(
                "Invalid sort_by. Allowed values: created_at, title, status",
            )),
        }
    }
}

/// Filter and ordering for `Database::list_tasks`. Descending unless `ascending`.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub status: Option<Status>,
    pub sort: TaskSort,
    pub ascending: bool,
}

pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::validation(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

pub fn validate_description(raw: &str) -> Result<String> {
    let description = raw.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::validation(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description.to_string())
}

pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Trim and lowercase an email, then check its shape.
pub fn validate_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(Error::validation("Invalid email format"));
    }
    Ok(email)
}
