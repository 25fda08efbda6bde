use anyhow::Result;
use std::path::PathBuf;

use consonance_core::{FingerprintCache, MappingStore};

pub fn show_status(cache_path: PathBuf) -> Result<()> {
    let mut cache = FingerprintCache::new();
    cache.set_handle(&cache_path);
    let entries = cache.load()?;

    println!("\n📊 Consonance Status\n");
    println!("  Cache:   {}", cache_path.display());
    println!("  Entries: {}", entries.len());

    match MappingStore::default_location().load()? {
        Some(mapping) => {
            println!(
                "  Mapping: {} → {}",
                mapping.root_folder_name, mapping.new_root_path
            );
        }
        None => println!("  Mapping: none"),
    }

    if entries.is_empty() {
        println!("\n  Run `consonance index <dir>` to fingerprint a corpus");
    }

    Ok(())
}
