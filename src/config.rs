use std::path::PathBuf;

use clap::Args;

/// Directory (under the working directory) holding the default database.
pub const DATA_DIR: &str = ".taskdesk";
pub const DB_FILE: &str = "taskdesk.db";

/// Where the HTTP server binds.
#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    /// Host or IP address to listen on
    #[arg(long, default_value = "localhost", env = "TASKDESK_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000, env = "TASKDESK_PORT")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            host: "localhost".to_string(),
            port: 5000,
        }
    }
}

impl ServeConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `.taskdesk/taskdesk.db` under the current directory.
pub fn default_db_path() -> std::io::Result<PathBuf> {
    let mut p = std::env::current_dir()?;
    p.push(DATA_DIR);
    p.push(DB_FILE);
    Ok(p)
}
