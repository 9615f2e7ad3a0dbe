use anyhow::Result;
use meeting_core::config::MeetingConfig;
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = MeetingConfig::config_path()?;

    if !config_path.exists() {
        MeetingConfig::create_default_config(&config_path)?;
        println!("{} {}", "Created".green(), config_path.display());
    }

    let config = MeetingConfig::load_from(&config_path)?;

    println!("{}", "Paths".bold());
    println!("  Config:      {}", config_path.display());

    println!("{}", "Free/busy".bold());
    println!(
        "  Template:    {}",
        config.free_busy_template.as_deref().unwrap_or("(none)")
    );
    println!("  Timezone:    {}", config.timezone);
    println!("  Timeout:     {}s", config.fetch_timeout_secs);

    if !config.identities.is_empty() {
        println!("{}", "Identities".bold());
        for identity in &config.identities {
            println!("  {}", identity);
        }
    }

    Ok(())
}
