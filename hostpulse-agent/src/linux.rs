//! Linux-specific metric sources.
//!
//! Covers what `sysinfo` does not expose in the shape the agent needs:
//! - cumulative disk I/O counters (`/proc/diskstats` via procfs)
//! - temperature and fan readings grouped by hwmon chip
//! - battery charge state (`/sys/class/power_supply`)

use std::collections::BTreeMap;
use std::path::Path;

use hostpulse_common::snapshot::{BatteryReading, FanReading, TempReading};

/// Cumulative (read, written) bytes across physical disks since boot.
///
/// An unreadable `/proc/diskstats` is a hard error for the cycle; zeros
/// would look like a counter reset to the receiver.
pub fn disk_io_totals() -> Result<(u64, u64), procfs::ProcError> {
    let diskstats = procfs::diskstats()?;
    Ok(sum_sectors(
        diskstats
            .iter()
            .map(|d| (d.name.as_str(), d.sectors_read, d.sectors_written)),
    ))
}

/// Sum (read, written) sector counts over whole-disk devices only.
///
/// Loop devices, ram disks, device-mapper entries and partitions are
/// skipped so that the same I/O is not counted twice.
fn sum_sectors<'a>(devices: impl Iterator<Item = (&'a str, u64, u64)>) -> (u64, u64) {
    // /proc/diskstats reports sectors of a fixed 512 bytes.
    let sector_size: u64 = 512;
    let mut read_bytes = 0u64;
    let mut written_bytes = 0u64;

    for (name, sectors_read, sectors_written) in devices {
        if name.starts_with("loop")
            || name.starts_with("ram")
            || name.starts_with("dm-")
            || is_partition(name)
        {
            continue;
        }

        read_bytes = read_bytes.saturating_add(sectors_read * sector_size);
        written_bytes = written_bytes.saturating_add(sectors_written * sector_size);
    }

    (read_bytes, written_bytes)
}

/// Whether a `/proc/diskstats` device name is a partition rather than a
/// whole disk. Partitions are contained in their parent's counters.
fn is_partition(name: &str) -> bool {
    // Disks whose names themselves end in digits (nvme0n1, mmcblk0, md0)
    // append `p<digits>` for their partitions.
    for family in ["nvme", "mmcblk", "md"] {
        if name.starts_with(family) {
            return match name.rsplit_once('p') {
                Some((parent, digits)) => {
                    parent.len() > family.len()
                        && !digits.is_empty()
                        && digits.chars().all(|c| c.is_ascii_digit())
                }
                None => false,
            };
        }
    }

    // `sda1`-style: trailing digits directly after an alphabetic base.
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    base.len() < name.len() && base.chars().last().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Temperature readings from `/sys/class/hwmon`, grouped by chip name.
pub fn collect_temperatures() -> BTreeMap<String, Vec<TempReading>> {
    collect_temperatures_from(Path::new("/sys/class/hwmon"))
}

fn collect_temperatures_from(root: &Path) -> BTreeMap<String, Vec<TempReading>> {
    let mut groups: BTreeMap<String, Vec<TempReading>> = BTreeMap::new();

    let Ok(entries) = std::fs::read_dir(root) else {
        return groups;
    };

    for entry in entries.flatten() {
        let hwmon_path = entry.path();
        let chip_name = read_trimmed(&hwmon_path.join("name")).unwrap_or_else(|| "unknown".into());

        let Ok(files) = std::fs::read_dir(&hwmon_path) else {
            continue;
        };

        for file in files.flatten() {
            let file_name = file.file_name().to_string_lossy().to_string();
            let Some(sensor_num) = sensor_number(&file_name, "temp") else {
                continue;
            };

            // Values are reported in millidegrees Celsius.
            let Some(milli) = read_parsed::<i64>(&hwmon_path.join(&file_name)) else {
                continue;
            };

            let label = read_trimmed(&hwmon_path.join(format!("temp{sensor_num}_label")))
                .unwrap_or_else(|| format!("temp{sensor_num}"));
            let max = read_parsed::<i64>(&hwmon_path.join(format!("temp{sensor_num}_max")))
                .map(|v| v as f64 / 1000.0);
            let critical = read_parsed::<i64>(&hwmon_path.join(format!("temp{sensor_num}_crit")))
                .map(|v| v as f64 / 1000.0);

            groups.entry(chip_name.clone()).or_default().push(TempReading {
                label,
                celsius: milli as f64 / 1000.0,
                max,
                critical,
            });
        }
    }

    groups
}

/// Fan speed readings from `/sys/class/hwmon`, grouped by chip name.
pub fn collect_fans() -> BTreeMap<String, Vec<FanReading>> {
    collect_fans_from(Path::new("/sys/class/hwmon"))
}

fn collect_fans_from(root: &Path) -> BTreeMap<String, Vec<FanReading>> {
    let mut groups: BTreeMap<String, Vec<FanReading>> = BTreeMap::new();

    let Ok(entries) = std::fs::read_dir(root) else {
        return groups;
    };

    for entry in entries.flatten() {
        let hwmon_path = entry.path();
        let chip_name = read_trimmed(&hwmon_path.join("name")).unwrap_or_else(|| "unknown".into());

        let Ok(files) = std::fs::read_dir(&hwmon_path) else {
            continue;
        };

        for file in files.flatten() {
            let file_name = file.file_name().to_string_lossy().to_string();
            let Some(sensor_num) = sensor_number(&file_name, "fan") else {
                continue;
            };

            let Some(rpm) = read_parsed::<u64>(&hwmon_path.join(&file_name)) else {
                continue;
            };

            let label = read_trimmed(&hwmon_path.join(format!("fan{sensor_num}_label")))
                .unwrap_or_else(|| format!("fan{sensor_num}"));

            groups
                .entry(chip_name.clone())
                .or_default()
                .push(FanReading { label, rpm });
        }
    }

    groups
}

/// Battery charge state from the first `BAT*` power supply, or `None` on
/// hosts without a battery.
pub fn read_battery() -> Option<BatteryReading> {
    read_battery_from(Path::new("/sys/class/power_supply"))
}

fn read_battery_from(root: &Path) -> Option<BatteryReading> {
    let entries = std::fs::read_dir(root).ok()?;

    let mut batteries: Vec<_> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("BAT"))
        .map(|e| e.path())
        .collect();
    batteries.sort();

    let battery = batteries.first()?;
    let percent = read_parsed::<f64>(&battery.join("capacity"))?;
    // "Charging" and "Full" both mean external power is connected.
    let charging = matches!(
        read_trimmed(&battery.join("status")).as_deref(),
        Some("Charging") | Some("Full")
    );

    Some(BatteryReading { percent, charging })
}

/// Extract the sensor number from names like `temp1_input` or `fan2_input`.
fn sensor_number(file_name: &str, prefix: &str) -> Option<String> {
    let num = file_name.strip_prefix(prefix)?.strip_suffix("_input")?;
    if num.is_empty() || !num.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(num.to_string())
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_parsed<T: std::str::FromStr>(path: &Path) -> Option<T> {
    read_trimmed(path)?.parse().ok()
}
