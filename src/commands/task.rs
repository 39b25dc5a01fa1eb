use std::path::Path;

use taskdesk::error::{Error, Result};
use taskdesk::models::{NewTask, PageRequest, Status, TaskChanges, TaskQuery, TaskSort};

use super::{open, print_task, print_task_page};

/// CLI statuses are case-insensitive; the API's are not.
fn parse_status(raw: &str) -> Result<Status> {
    Status::parse(&raw.trim().to_uppercase())
}

pub fn add(db_path: &Path, title: &str, description: Option<&str>, json: bool) -> Result<()> {
    let db = open(db_path)?;
    let task = db.insert_task(&NewTask::new(title, description)?)?;
    if json {
        return print_task(&task, true);
    }
    println!("Created task {}: {}", task.id, task.title);
    Ok(())
}

pub fn list(
    db_path: &Path,
    status: Option<&str>,
    sort: &str,
    ascending: bool,
    page: i64,
    page_size: i64,
    json: bool,
) -> Result<()> {
    let query = TaskQuery {
        status: status.map(parse_status).transpose()?,
        sort: TaskSort::parse(sort)?,
        ascending,
    };
    let page = PageRequest::new(page, page_size)?;
    let db = open(db_path)?;
    print_task_page(&db.list_tasks(&query, page)?, json)
}

pub fn search(db_path: &Path, keyword: &str, page: i64, page_size: i64, json: bool) -> Result<()> {
    let page = PageRequest::new(page, page_size)?;
    let db = open(db_path)?;
    print_task_page(&db.search_tasks(keyword, page)?, json)
}

pub fn show(db_path: &Path, id: i64, json: bool) -> Result<()> {
    let db = open(db_path)?;
    print_task(&db.require_task(id)?, json)
}

pub fn edit(
    db_path: &Path,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    json: bool,
) -> Result<()> {
    let db = open(db_path)?;
    db.require_task(id)?;
    let changes = TaskChanges::new(title, description)?;
    if changes.is_empty() {
        return Err(Error::validation(
            "nothing to update: pass --title and/or --description",
        ));
    }
    let task = db.update_task(id, &changes)?;
    if json {
        return print_task(&task, true);
    }
    println!("Updated task {id}");
    Ok(())
}

pub fn status(db_path: &Path, id: i64, status: &str, json: bool) -> Result<()> {
    let db = open(db_path)?;
    db.require_task(id)?;
    let task = db.set_task_status(id, parse_status(status)?)?;
    if json {
        return print_task(&task, true);
    }
    println!("Task {id} is now {}", task.status);
    Ok(())
}

pub fn assign(db_path: &Path, id: i64, user: Option<i64>, json: bool) -> Result<()> {
    let db = open(db_path)?;
    let task = db.assign_task(id, user)?;
    if json {
        return print_task(&task, true);
    }
    match user {
        Some(uid) => println!("Assigned task {id} to user {uid}"),
        None => println!("Unassigned task {id}"),
    }
    Ok(())
}

pub fn delete(db_path: &Path, id: i64) -> Result<()> {
    let db = open(db_path)?;
    db.delete_task(id)?;
    println!("Deleted task {id}");
    Ok(())
}
