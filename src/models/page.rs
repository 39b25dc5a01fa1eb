use serde::Serialize;

use super::{Task, User};
use crate::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// A 1-based page window over a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        if page < 1 {
            return Err(Error::validation("Page must be >= 1"));
        }
        if page_size < 1 {
            return Err(Error::validation("Page size must be >= 1"));
        }
        Ok(PageRequest {
            page: page.unsigned_abs(),
            page_size: page_size.unsigned_abs(),
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total: usize) -> usize {
        usize::try_from((total as u64).div_ceil(self.page_size)).unwrap_or(usize::MAX)
    }

    /// Keep only the items that fall on this page. Past the end this is empty.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(self.page_size).unwrap_or(usize::MAX))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total_tasks: usize,
    pub total_pages: usize,
    pub current_page: u64,
    pub page_size: u64,
}

impl TaskPage {
    pub fn new(tasks: Vec<Task>, total: usize, req: PageRequest) -> Self {
        TaskPage {
            tasks,
            total_tasks: total,
            total_pages: req.total_pages(total),
            current_page: req.page,
            page_size: req.page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total_users: usize,
    pub total_pages: usize,
    pub current_page: u64,
    pub page_size: u64,
}

impl UserPage {
    pub fn new(users: Vec<User>, total: usize, req: PageRequest) -> Self {
        UserPage {
            users,
            total_users: total,
            total_pages: req.total_pages(total),
            current_page: req.page,
            page_size: req.page_size,
        }
    }
}
