use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One complete sampling of all monitored host metrics at a point in time.
///
/// A snapshot is built fresh by the collector on every cycle, handed by
/// reference to the renderer and the encoder, then dropped. The agent keeps
/// no snapshot history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub os: OsInfo,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub network: NetworkInfo,
    pub sensors: SensorInfo,
    pub processes: ProcessInfo,
}

/// Operating system facts. Everything except `boot_time` is static for the
/// lifetime of the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsInfo {
    /// OS name and version, e.g. "Ubuntu 24.04".
    pub name: String,

    /// Machine architecture, e.g. "x86_64".
    pub machine: String,

    /// Host name as reported by the OS.
    pub hostname: String,

    /// Boot timestamp in Unix epoch seconds, re-read each cycle so the
    /// receiver can derive uptime.
    pub boot_time: u64,
}

/// CPU description and load. The descriptive fields are resolved once at
/// startup; the load fields come from a blocking interval sample each cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuInfo {
    pub model: String,
    pub arch: String,

    /// Advertised frequency as a display string, e.g. "3600 MHz".
    pub frequency: String,

    /// Logical core count, resolved once at startup.
    pub core_count: usize,

    /// Aggregate load in percent.
    pub load_avg: f64,

    /// Per-core load in percent; length equals `core_count`.
    pub load_per_core: Vec<f64>,
}

/// Memory and swap counters in bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    /// Memory available for new allocations without swapping.
    pub free: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Mounted volumes and disk usage for the reference mount.
///
/// The cumulative read/write counters are monotonically non-decreasing
/// within one boot session; counter wraps and reboots are not detected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskInfo {
    /// Device identifiers of mounted non-pseudo volumes, in mount order.
    pub mounts: Vec<String>,

    /// Total bytes of the reference mount.
    pub total: u64,

    /// Free bytes of the reference mount.
    pub free: u64,

    /// Bytes read across physical disks since boot.
    pub read_bytes: u64,

    /// Bytes written across physical disks since boot.
    pub written_bytes: u64,
}

/// Cumulative traffic across all interfaces combined, in bytes since boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub received: u64,
    pub transmitted: u64,
}

/// Sensor readings. Shape is host-dependent: hosts without a battery, or
/// without exposed sensors, yield `None`/empty maps rather than errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorInfo {
    pub battery: Option<BatteryReading>,

    /// Temperature readings grouped by sensor source (chip name).
    pub temperatures: BTreeMap<String, Vec<TempReading>>,

    /// Fan speed readings grouped by sensor source.
    pub fans: BTreeMap<String, Vec<FanReading>>,
}

/// Battery charge state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Charge in percent (0-100).
    pub percent: f64,

    /// True while connected to external power.
    pub charging: bool,
}

/// One temperature sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempReading {
    pub label: String,
    pub celsius: f64,
    pub max: Option<f64>,
    pub critical: Option<f64>,
}

/// One fan speed reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanReading {
    pub label: String,
    pub rpm: u64,
}

/// Live process information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Total live process count.
    pub total: usize,

    /// Per-process samples; populated only when the process list is enabled
    /// in the collection config. Unbounded in size, so opt-in.
    pub list: Vec<ProcessSample>,
}

/// One entry of the per-process walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl MetricsSnapshot {
    /// Uptime in seconds derived from the boot timestamp, or zero when the
    /// clock reads earlier than boot.
    pub fn uptime_seconds(&self, now_epoch: u64) -> u64 {
        now_epoch.saturating_sub(self.os.boot_time)
    }
}
