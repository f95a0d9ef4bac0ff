use crate::obs;
use aion_application::config::load_config;
use aion_application::validation::validate_config;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<(), String> {
    let (config, _) = load_config(config_path)?;
    obs::init_tracing(&config.log.level, &config.log.format)?;

    let warnings = validate_config(&config)?;
    if warnings.is_empty() {
        println!("config ok: {}", config_path.display());
    } else {
        println!(
            "config ok with {} warning(s): {}",
            warnings.len(),
            config_path.display()
        );
        for warning in warnings {
            println!("  warning: {warning}");
        }
    }
    Ok(())
}
