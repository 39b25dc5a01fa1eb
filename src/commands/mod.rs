pub mod init;
pub mod serve;
pub mod task;
pub mod user;

use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use taskdesk::db::Database;
use taskdesk::error::{Error, Result};
use taskdesk::models::{Status, Task, TaskPage, User, UserPage};

/// Open an existing database, bringing its schema up to date.
pub fn open(db_path: &Path) -> Result<Database> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "no database at {}; run `taskdesk init` first",
            db_path.display()
        )));
    }
    let db = Database::open(db_path)?;
    db.migrate()?;
    Ok(db)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a status as a colored, padded string.
pub fn format_status(s: Status) -> String {
    let padded = format!("{:<8}", s.as_str());
    match s {
        Status::Todo => padded.green().to_string(),
        Status::Ongoing => padded.cyan().to_string(),
        Status::Done => padded.bright_black().to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Print a list of tasks as a table.
pub fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    println!("{:<6} {:<8} {:<9} TITLE", "ID", "STATUS", "ASSIGNEE");
    println!("{}", "-".repeat(72));
    for t in tasks {
        let assignee = t
            .assignee_id
            .map(|id| format!("#{id}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {} {:<9} {}",
            t.id,
            format_status(t.status),
            assignee,
            truncate(&t.title, 48),
        );
    }
}

pub fn print_task_page(page: &TaskPage, json: bool) -> Result<()> {
    if json {
        return print_json(page);
    }
    print_tasks(&page.tasks);
    if page.total_tasks > 0 {
        println!(
            "\nPage {}/{} ({} tasks)",
            page.current_page, page.total_pages, page.total_tasks
        );
    }
    Ok(())
}

pub fn print_task(task: &Task, json: bool) -> Result<()> {
    if json {
        return print_json(task);
    }
    println!("ID:          {}", task.id);
    println!("Title:       {}", task.title);
    println!("Status:      {}", format_status(task.status));
    if !task.description.is_empty() {
        println!("Description: {}", task.description);
    }
    if let Some(assignee) = task.assignee_id {
        println!("Assignee:    #{assignee}");
    }
    println!("Created:     {}", task.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated:     {}", task.updated_at.format("%Y-%m-%d %H:%M"));
    Ok(())
}

pub fn print_user_page(page: &UserPage, json: bool) -> Result<()> {
    if json {
        return print_json(page);
    }
    if page.users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    println!("{:<6} {:<30} EMAIL", "ID", "NAME");
    println!("{}", "-".repeat(72));
    for u in &page.users {
        println!("{:<6} {:<30} {}", u.id, truncate(&u.name, 30), u.email);
    }
    println!(
        "\nPage {}/{} ({} users)",
        page.current_page, page.total_pages, page.total_users
    );
    Ok(())
}

pub fn print_user(user: &User, json: bool) -> Result<()> {
    if json {
        return print_json(user);
    }
    println!("ID:          {}", user.id);
    println!("Name:        {}", user.name.bold());
    println!("Email:       {}", user.email);
    println!("Created:     {}", user.created_at.format("%Y-%m-%d %H:%M"));
    Ok(())
}
