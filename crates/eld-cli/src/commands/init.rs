//! Init command for establishing driver identity.

use anyhow::Result;

use crate::driver;

/// Runs the init command.
pub fn run(driver_id: &str, label: Option<&str>) -> Result<()> {
    let identity = driver::init_driver(driver_id, label)?;

    println!("Driver ID: {}", identity.driver_id);
    println!("Label:     {}", identity.label);
    println!("Saved to:  {}", driver::driver_json_path()?.display());

    Ok(())
}
