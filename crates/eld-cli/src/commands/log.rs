//! Log command: print the driver's timeline.

use std::io::Write;

use anyhow::Result;

use eld_core::DriverId;
use eld_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, driver: &DriverId, json: bool) -> Result<()> {
    let timeline = db.duty_timeline(driver)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&timeline)?)?;
        return Ok(());
    }

    if timeline.is_empty() {
        writeln!(writer, "No duty events recorded.")?;
        return Ok(());
    }

    for event in &timeline {
        writeln!(
            writer,
            "{}  {:<9}  {:<12}  {}",
            event.datetime.format("%Y-%m-%d %H:%M"),
            event.status.as_str(),
            event.origin.as_str(),
            event.location.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}
