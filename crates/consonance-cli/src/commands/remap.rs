use anyhow::{bail, Result};

use consonance_core::{remap_path, MappingStore, PathMapping};

pub fn remap_set(root_folder_name: String, new_root_path: String) -> Result<()> {
    let mapping = PathMapping::new(root_folder_name, new_root_path);
    if !mapping.is_complete() {
        bail!("both the root folder name and the new root path are required");
    }

    let store = MappingStore::default_location();
    store.save(&mapping)?;

    println!("Path mapping saved to {}", store.path().display());
    println!("  Root folder name: {}", mapping.root_folder_name);
    println!("  New root path:    {}", mapping.new_root_path);
    Ok(())
}

pub fn remap_show() -> Result<()> {
    let store = MappingStore::default_location();
    match store.load()? {
        Some(mapping) => {
            println!("Active path mapping ({}):", store.path().display());
            println!("  Root folder name: {}", mapping.root_folder_name);
            println!("  New root path:    {}", mapping.new_root_path);
        }
        None => {
            println!("No path mapping set.");
            println!("\nSet one with `consonance remap set <root_folder_name> <new_root_path>`");
        }
    }
    Ok(())
}

pub fn remap_try(path: &str) -> Result<()> {
    let store = MappingStore::default_location();
    let Some(mapping) = store.load()? else {
        bail!("no path mapping set; run `consonance remap set` first");
    };

    let remapped = remap_path(path, &mapping);
    if remapped == path {
        println!(
            "Unchanged (root folder name \"{}\" not found in the path):",
            mapping.root_folder_name
        );
        println!("  {path}");
    } else {
        println!("Original: {path}");
        println!("Remapped: {remapped}");
    }
    Ok(())
}
