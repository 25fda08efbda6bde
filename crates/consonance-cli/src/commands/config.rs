use anyhow::Result;

use consonance_engine::{config, Config};

/// Create the config file with documented defaults.
pub fn config_init() -> Result<()> {
    if config::ensure_config_file()? {
        println!("Created {}", config::config_file_path().display());
    } else {
        println!(
            "Config file already exists: {}",
            config::config_file_path().display()
        );
    }
    Ok(())
}

/// Show the current effective configuration.
pub fn config_show() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  cache_path: {}", config.cache_path.display());
    println!("  workers:    {}", config.workers);
    println!("  top_n:      {}", config.top_n);

    println!("\nPriority: CLI args > ENV vars (CONSONANCE_*) > Config file > Defaults");

    Ok(())
}

/// Print the config file location.
pub fn config_path() {
    println!("{}", config::config_file_path().display());
}
