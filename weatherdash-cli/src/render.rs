//! Plain-text rendering of dashboard view models.

use std::fmt::{self, Write};

use weatherdash_core::{DashboardView, HistoricalView};

/// Signature shared by the text renderers.
pub type Renderer<T> = fn(&mut dyn Write, &T) -> fmt::Result;

pub fn dashboard(out: &mut dyn Write, view: &DashboardView) -> fmt::Result {
    let c = &view.current;

    writeln!(out, "{}", c.location)?;
    writeln!(out, "  {}  {}", c.temperature, c.description)?;
    writeln!(out, "  Feels like {}", c.feels_like)?;
    writeln!(out, "  Humidity   {}", c.humidity)?;
    writeln!(out, "  Wind       {}", c.wind)?;
    writeln!(out, "  Pressure   {}", c.pressure)?;

    writeln!(out, "\nAlerts")?;
    match &view.alerts_notice {
        Some(notice) => writeln!(out, "  {notice}")?,
        None => {
            for alert in &view.alerts {
                writeln!(out, "  {} ({})", alert.event, alert.sender)?;
                writeln!(out, "    {}", alert.window)?;
                writeln!(out, "    {}", alert.description)?;
            }
        }
    }

    writeln!(out, "\nHourly")?;
    for hour in &view.hourly {
        writeln!(
            out,
            "  {:<6} {:>5}  {:>4}  {}",
            hour.time, hour.temperature, hour.precipitation, hour.description
        )?;
    }

    writeln!(out, "\nDaily")?;
    for day in &view.daily {
        writeln!(
            out,
            "  {:<4} {:>5} / {:<5} {:>4}  {}",
            day.day, day.high, day.low, day.precipitation, day.description
        )?;
    }

    writeln!(out, "\nUnits: {}", view.unit)
}

pub fn historical(out: &mut dyn Write, view: &HistoricalView) -> fmt::Result {
    writeln!(out, "{}", view.title)?;
    writeln!(out, "  Temperature {}", view.temperature)?;
    writeln!(out, "  Feels like  {}", view.feels_like)?;
    writeln!(out, "  Humidity    {}", view.humidity)?;
    writeln!(out, "  Wind        {}", view.wind)?;
    writeln!(out, "  Pressure    {}", view.pressure)?;
    writeln!(out, "  Conditions  {}", view.conditions)?;
    writeln!(out, "  UV index    {}", view.uv_index)
}
