//! macOS-specific metric sources.

use std::process::Command;

use tracing::debug;

use hostpulse_common::snapshot::BatteryReading;

/// Battery charge state via `pmset -g batt`, or `None` on hosts without a
/// battery (desktops report no `InternalBattery` line).
pub fn read_battery() -> Option<BatteryReading> {
    let output = Command::new("pmset").args(["-g", "batt"]).output().ok()?;
    if !output.status.success() {
        debug!("pmset exited with failure");
        return None;
    }
    parse_pmset(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `pmset -g batt` output:
///
/// ```text
/// Now drawing from 'AC Power'
///  -InternalBattery-0 (id=1234567)    72%; charging; 0:42 remaining present: true
/// ```
fn parse_pmset(output: &str) -> Option<BatteryReading> {
    let line = output.lines().find(|l| l.contains("InternalBattery"))?;

    let percent_token = line.split_whitespace().find(|t| t.ends_with("%;"))?;
    let percent: f64 = percent_token.trim_end_matches("%;").parse().ok()?;

    let charging = line.contains("charging") && !line.contains("discharging")
        || line.contains("charged");

    Some(BatteryReading { percent, charging })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pmset_charging() {
        let output = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1234567)\t72%; charging; 0:42 remaining present: true\n";
        let reading = parse_pmset(output).unwrap();
        assert_eq!(reading.percent, 72.0);
        assert!(reading.charging);
    }

    #[test]
    fn test_parse_pmset_discharging() {
        let output = "Now drawing from 'Battery Power'\n -InternalBattery-0 (id=1234567)\t41%; discharging; 3:10 remaining present: true\n";
        let reading = parse_pmset(output).unwrap();
        assert_eq!(reading.percent, 41.0);
        assert!(!reading.charging);
    }

    #[test]
    fn test_parse_pmset_fully_charged() {
        let output = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=1234567)\t100%; charged; 0:00 remaining present: true\n";
        let reading = parse_pmset(output).unwrap();
        assert_eq!(reading.percent, 100.0);
        assert!(reading.charging);
    }

    #[test]
    fn test_parse_pmset_no_battery() {
        assert_eq!(parse_pmset("Now drawing from 'AC Power'\n"), None);
    }
}
