use std::path::Path;

use taskdesk::error::{Error, Result};
use taskdesk::models::{NewUser, PageRequest, UserChanges};

use super::{open, print_user, print_user_page};

pub fn add(db_path: &Path, name: &str, email: &str, json: bool) -> Result<()> {
    let db = open(db_path)?;
    let user = db.insert_user(&NewUser::new(name, email)?)?;
    if json {
        return print_user(&user, true);
    }
    println!("Created user {}: {} <{}>", user.id, user.name, user.email);
    Ok(())
}

pub fn list(db_path: &Path, page: i64, page_size: i64, json: bool) -> Result<()> {
    let page = PageRequest::new(page, page_size)?;
    let db = open(db_path)?;
    print_user_page(&db.list_users(page)?, json)
}

pub fn show(db_path: &Path, id: i64, json: bool) -> Result<()> {
    let db = open(db_path)?;
    let user = db.require_user(id)?;
    print_user(&user, json)?;
    if !json {
        let tasks = db.tasks_for_user(id)?;
        if !tasks.is_empty() {
            println!("\nAssigned tasks:");
            for t in &tasks {
                println!("  - {} [{}] {}", t.id, t.status, t.title);
            }
        }
    }
    Ok(())
}

pub fn edit(
    db_path: &Path,
    id: i64,
    name: Option<&str>,
    email: Option<&str>,
    json: bool,
) -> Result<()> {
    let db = open(db_path)?;
    db.require_user(id)?;
    let changes = UserChanges::new(name, email)?;
    if changes.is_empty() {
        return Err(Error::validation("nothing to update: pass --name and/or --email"));
    }
    let user = db.update_user(id, &changes)?;
    if json {
        return print_user(&user, true);
    }
    println!("Updated user {id}");
    Ok(())
}

pub fn delete(db_path: &Path, id: i64) -> Result<()> {
    let db = open(db_path)?;
    db.delete_user(id)?;
    println!("Deleted user {id}");
    Ok(())
}
