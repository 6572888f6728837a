//! Best-effort stable host identity.
//!
//! Each platform exposes a machine identifier through a different channel:
//! the IOKit registry on macOS, WMI on Windows, the D-Bus/systemd machine-id
//! files on Linux, and the host-id file or kernel environment on the BSDs.
//! Resolution is attempted exactly once at startup; every failure path
//! (missing file, missing binary, non-zero exit, unexpected output shape)
//! collapses into `None` and is never an error.

#[cfg(any(
    target_os = "macos",
    target_os = "windows",
    target_os = "freebsd",
    target_os = "openbsd",
    test
))]
use std::process::Command;

use tracing::debug;

/// Resolve a stable machine identifier for this host.
///
/// The token distinguishes one physical or virtual machine from another
/// across restarts; nothing more is guaranteed. Unknown platforms yield
/// `None`.
pub fn resolve() -> Option<String> {
    let id = platform_machine_id()?;
    let id = id.trim();
    if id.is_empty() {
        debug!("platform reported an empty machine id");
        return None;
    }
    Some(id.to_string())
}

#[cfg(target_os = "linux")]
fn platform_machine_id() -> Option<String> {
    read_first(&["/var/lib/dbus/machine-id", "/etc/machine-id"])
}

#[cfg(target_os = "macos")]
fn platform_machine_id() -> Option<String> {
    let output = run("ioreg", &["-d2", "-c", "IOPlatformExpertDevice"])?;
    parse_ioreg_uuid(&output)
}

#[cfg(target_os = "windows")]
fn platform_machine_id() -> Option<String> {
    let output = run("wmic", &["csproduct", "get", "uuid"])?;
    parse_wmic_uuid(&output)
}

#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
fn platform_machine_id() -> Option<String> {
    read_first(&["/etc/hostid"]).or_else(|| run("kenv", &["-q", "smbios.system.uuid"]))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "windows",
    target_os = "freebsd",
    target_os = "openbsd"
)))]
fn platform_machine_id() -> Option<String> {
    None
}

/// Return the first readable, non-empty file among `paths`.
#[cfg(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    test
))]
fn read_first(paths: &[&str]) -> Option<String> {
    for path in paths {
        if let Ok(contents) = std::fs::read_to_string(path) {
            let contents = contents.trim();
            if !contents.is_empty() {
                return Some(contents.to_string());
            }
        }
    }
    None
}

/// Run a short-lived probe command, returning its trimmed stdout on success.
#[cfg(any(
    target_os = "macos",
    target_os = "windows",
    target_os = "freebsd",
    target_os = "openbsd",
    test
))]
fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        debug!(program, "identity probe exited with failure");
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}

/// `ioreg -d2 -c IOPlatformExpertDevice` prints the UUID as
/// `"IOPlatformUUID" = "xxxxxxxx-..."`; take the last quoted token of that
/// line.
#[cfg(any(target_os = "macos", test))]
fn parse_ioreg_uuid(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("IOPlatformUUID"))?;
    let uuid = line.rsplit('"').nth(1)?.trim();
    if uuid.is_empty() {
        return None;
    }
    Some(uuid.to_string())
}

/// `wmic csproduct get uuid` prints a header, a separator line, then the
/// value on the third line.
#[cfg(any(target_os = "windows", test))]
fn parse_wmic_uuid(output: &str) -> Option<String> {
    let value = output.lines().nth(2)?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_never_panics() {
        // Whatever the platform reports, resolution must complete.
        let _ = resolve();
    }

    #[test]
    fn test_missing_probe_command_yields_none() {
        assert_eq!(run("hostpulse-no-such-binary", &[]), None);
    }

    #[test]
    fn test_read_first_skips_missing_files() {
        assert_eq!(read_first(&["/nonexistent/a", "/nonexistent/b"]), None);
    }

    #[test]
    fn test_parse_ioreg_uuid() {
        let output = r#"
    | {
    |   "IOPlatformSerialNumber" = "C02XXXXXXXXX"
    |   "IOPlatformUUID" = "6F3C2A1B-0D9E-4B5A-8C7D-1E2F3A4B5C6D"
    | }
"#;
        assert_eq!(
            parse_ioreg_uuid(output).as_deref(),
            Some("6F3C2A1B-0D9E-4B5A-8C7D-1E2F3A4B5C6D")
        );
    }

    #[test]
    fn test_parse_ioreg_uuid_missing_line() {
        assert_eq!(parse_ioreg_uuid("no uuid here"), None);
    }

    #[test]
    fn test_parse_wmic_uuid_third_line() {
        let output = "UUID\r\n\r\n4C4C4544-0042-3510-804D-B2C04F4A3932\r\n";
        assert_eq!(
            parse_wmic_uuid(output).as_deref(),
            Some("4C4C4544-0042-3510-804D-B2C04F4A3932")
        );
    }

    #[test]
    fn test_parse_wmic_uuid_truncated_output() {
        assert_eq!(parse_wmic_uuid("UUID\n"), None);
    }
}
