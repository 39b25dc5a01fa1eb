use std::path::Path;

use taskdesk::db::Database;
use taskdesk::error::Result;

pub fn run(db_path: &Path, seed: bool) -> Result<()> {
    let db = Database::open_and_migrate(db_path)?;
    db.set_config("version", env!("CARGO_PKG_VERSION"))?;

    println!("Initialized taskdesk database at {}", db_path.display());
    if seed {
        let added = db.seed_sample_tasks()?;
        println!("Seeded {added} sample task(s)");
    }
    Ok(())
}
