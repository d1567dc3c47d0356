//! Config command - show and change settings.

use anyhow::Result;
use portreaper_core::ConfigStore;

pub async fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let settings = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!("Config file:     {}", store.config_path().display());
    println!("Settle delay:    {} ms", settings.settle_delay_ms);
    println!("Max chase depth: {}", settings.max_chase_depth);
    println!("Output limit:    {} bytes", settings.output_limit_bytes);
    match &settings.system_root {
        Some(root) => println!("System root:     {}", root.display()),
        None => println!("System root:     %SystemRoot%"),
    }
    Ok(())
}

pub async fn set_settle_delay(millis: u64) -> Result<()> {
    let store = ConfigStore::new()?;
    store.set_settle_delay_ms(millis).await?;
    println!("Settle delay set to {} ms", millis);
    Ok(())
}

pub async fn set_max_depth(depth: usize) -> Result<()> {
    let store = ConfigStore::new()?;
    store.set_max_chase_depth(depth).await?;
    println!("Max chase depth set to {}", depth);
    Ok(())
}
