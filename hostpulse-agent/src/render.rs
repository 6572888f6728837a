//! Operator console rendering.

use std::io::Write;

use chrono::{Local, TimeZone, Utc};
use colored::Colorize;

use hostpulse_common::snapshot::MetricsSnapshot;

/// Four-phase spinner shown once per cycle so an operator can tell at a
/// glance that the loop is alive.
pub struct Progress {
    phase: usize,
}

const GLYPHS: [char; 4] = ['-', '/', '|', '\\'];

impl Progress {
    pub fn new() -> Self {
        Self { phase: 0 }
    }

    /// Print the current glyph in place and advance to the next phase.
    /// Returns the glyph that was shown.
    pub fn tick(&mut self) -> char {
        let glyph = GLYPHS[self.phase];
        print!("\r{glyph} ");
        let _ = std::io::stdout().flush();
        self.phase = (self.phase + 1) % GLYPHS.len();
        glyph
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one snapshot as a sectioned console report.
pub fn render_snapshot(snapshot: &MetricsSnapshot) {
    let now = Utc::now().timestamp().max(0) as u64;

    println!();
    println!("{}", "== system ==".bold());
    println!("  os        {}", snapshot.os.name);
    println!("  machine   {}", snapshot.os.machine);
    println!("  hostname  {}", snapshot.os.hostname);
    println!(
        "  booted    {}  (up {})",
        format_boot_time(snapshot.os.boot_time),
        format_uptime(snapshot.uptime_seconds(now))
    );

    println!("{}", "== cpu ==".bold());
    println!(
        "  {} ({} cores, {})",
        snapshot.cpu.model, snapshot.cpu.core_count, snapshot.cpu.frequency
    );
    println!("  load      {}", format_percent(snapshot.cpu.load_avg));
    let per_core: Vec<String> = snapshot
        .cpu
        .load_per_core
        .iter()
        .map(|load| format!("{load:.1}"))
        .collect();
    println!("  per-core  [{}]", per_core.join(", "));

    println!("{}", "== memory ==".bold());
    println!(
        "  ram       {} free of {}",
        format_bytes(snapshot.memory.free),
        format_bytes(snapshot.memory.total)
    );
    println!(
        "  swap      {} free of {}",
        format_bytes(snapshot.memory.swap_free),
        format_bytes(snapshot.memory.swap_total)
    );

    println!("{}", "== disk ==".bold());
    println!("  mounts    {}", snapshot.disk.mounts.join(", "));
    println!(
        "  space     {} free of {}",
        format_bytes(snapshot.disk.free),
        format_bytes(snapshot.disk.total)
    );
    println!(
        "  io        {} read, {} written",
        format_bytes(snapshot.disk.read_bytes),
        format_bytes(snapshot.disk.written_bytes)
    );

    println!("{}", "== network ==".bold());
    println!(
        "  traffic   {} in, {} out",
        format_bytes(snapshot.network.received),
        format_bytes(snapshot.network.transmitted)
    );

    println!("{}", "== sensors ==".bold());
    match &snapshot.sensors.battery {
        Some(battery) => {
            let state = if battery.charging {
                "charging".green()
            } else {
                "discharging".yellow()
            };
            println!("  battery   {:.0}% ({})", battery.percent, state);
        }
        None => println!("  battery   none"),
    }
    for (source, readings) in &snapshot.sensors.temperatures {
        for reading in readings {
            println!(
                "  temp      {source}/{}  {}",
                reading.label,
                format_celsius(reading.celsius, reading.max)
            );
        }
    }
    for (source, readings) in &snapshot.sensors.fans {
        for reading in readings {
            println!("  fan       {source}/{}  {} rpm", reading.label, reading.rpm);
        }
    }

    println!("{}", "== processes ==".bold());
    println!("  total     {}", snapshot.processes.total);
}

/// Render the per-process table, highest CPU first.
pub fn render_processes(snapshot: &MetricsSnapshot) {
    if snapshot.processes.list.is_empty() {
        return;
    }

    println!("{}", "== process table ==".bold());
    println!("  {:>7}  {:>6}  {:>6}  name", "pid", "cpu%", "mem%");

    let mut rows: Vec<_> = snapshot.processes.list.iter().collect();
    rows.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));

    for process in rows {
        println!(
            "  {:>7}  {:>6.1}  {:>6.2}  {}",
            process.pid, process.cpu_percent, process.memory_percent, process.name
        );
    }
}

/// Echo the encoded wire payload.
pub fn render_payload(payload: &[u8]) {
    println!("{}", "== payload ==".bold());
    println!("{}", String::from_utf8_lossy(payload));
}

fn format_percent(value: f64) -> colored::ColoredString {
    let text = format!("{value:.1}%");
    if value >= 90.0 {
        text.red()
    } else if value >= 70.0 {
        text.yellow()
    } else {
        text.normal()
    }
}

fn format_celsius(celsius: f64, max: Option<f64>) -> colored::ColoredString {
    let text = format!("{celsius:.1} C");
    match max {
        Some(max) if celsius >= max => text.red(),
        _ => text.normal(),
    }
}

fn format_boot_time(epoch: u64) -> String {
    match Local.timestamp_opt(epoch as i64, 0).single() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("epoch {epoch}"),
    }
}

/// Human-readable duration, e.g. "3d 4h 12m".
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Binary-unit byte formatting, e.g. "16.0 GiB".
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(17_179_869_184), "16.0 GiB");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(273_120), "3d 3h 52m");
    }

    #[test]
    fn test_progress_cycles_through_four_phases() {
        let mut progress = Progress::new();
        let seen: Vec<char> = (0..5).map(|_| progress.tick()).collect();
        assert_eq!(seen, vec!['-', '/', '|', '\\', '-']);
    }
}
