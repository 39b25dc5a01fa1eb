use std::path::Path;

use taskdesk::config::ServeConfig;
use taskdesk::error::Result;

pub fn run(db_path: &Path, config: &ServeConfig) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(taskdesk::web::serve(db_path, config))
}
