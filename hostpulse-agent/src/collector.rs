//! Metrics collection from the local system.

use std::time::Duration;

use sysinfo::{Disks, Networks, ProcessesToUpdate, System};
use thiserror::Error;
use tracing::debug;

use hostpulse_common::snapshot::{
    CpuInfo, DiskInfo, MemoryInfo, MetricsSnapshot, NetworkInfo, OsInfo, ProcessInfo,
    ProcessSample, SensorInfo,
};

use crate::config::CollectConfig;

/// Collection errors.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Reference mount '{0}' not found among mounted volumes")]
    ReferenceMount(String),
    #[error("Failed to read disk I/O counters: {0}")]
    DiskCounters(String),
}

/// Pseudo-filesystems excluded from the mounted-volume list.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "proc",
    "sysfs",
    "devtmpfs",
    "devpts",
    "tmpfs",
    "cgroup",
    "cgroup2",
    "pstore",
    "bpf",
    "tracefs",
    "debugfs",
    "securityfs",
    "fusectl",
    "configfs",
    "overlay",
    "squashfs",
    "autofs",
    "mqueue",
    "hugetlbfs",
    "binfmt_misc",
];

/// Host facts that do not change while the agent runs, resolved once.
#[derive(Debug, Clone)]
struct StaticInfo {
    os_name: String,
    machine: String,
    hostname: String,
    cpu_model: String,
    cpu_frequency: String,
    core_count: usize,
}

/// Samples the local system into a [`MetricsSnapshot`].
///
/// Holds the `sysinfo` handles across cycles so that CPU and network deltas
/// are computed against the previous refresh. [`collect`](Self::collect)
/// blocks for two CPU sampling windows, which bounds the agent's cycle
/// period from below.
pub struct SnapshotCollector {
    system: System,
    disks: Disks,
    networks: Networks,
    statics: StaticInfo,
    options: CollectConfig,
}

impl SnapshotCollector {
    pub fn new(options: CollectConfig) -> Self {
        let system = System::new_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();

        let os_name = match (System::name(), System::os_version()) {
            (Some(name), Some(version)) => format!("{name} {version}"),
            (Some(name), None) => name,
            _ => "unknown".to_string(),
        };

        let hostname = System::host_name()
            .or_else(|| {
                hostname::get()
                    .ok()
                    .map(|h| h.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let (cpu_model, cpu_frequency) = match system.cpus().first() {
            Some(cpu) => (
                cpu.brand().trim().to_string(),
                format!("{} MHz", cpu.frequency()),
            ),
            None => ("unknown".to_string(), "0 MHz".to_string()),
        };

        let statics = StaticInfo {
            os_name,
            machine: std::env::consts::ARCH.to_string(),
            hostname,
            cpu_model,
            cpu_frequency,
            core_count: system.cpus().len(),
        };

        debug!(
            os = %statics.os_name,
            host = %statics.hostname,
            cores = statics.core_count,
            "collector initialized"
        );

        Self {
            system,
            disks,
            networks,
            statics,
            options,
        }
    }

    /// Take one complete snapshot of the host.
    pub async fn collect(&mut self) -> Result<MetricsSnapshot, CollectError> {
        let cpu = self.sample_cpu_load().await;
        let memory = self.collect_memory();
        let disk = self.collect_disk()?;
        let network = self.collect_network();
        let sensors = collect_sensors();
        let processes = self.collect_processes();

        Ok(MetricsSnapshot {
            os: OsInfo {
                name: self.statics.os_name.clone(),
                machine: self.statics.machine.clone(),
                hostname: self.statics.hostname.clone(),
                boot_time: System::boot_time(),
            },
            cpu,
            memory,
            disk,
            network,
            sensors,
            processes,
        })
    }

    /// Sample CPU load over two consecutive windows: one for the aggregate
    /// figure, one for the per-core figures.
    async fn sample_cpu_load(&mut self) -> CpuInfo {
        let window = Duration::from_millis(self.options.sample_window_ms);

        self.system.refresh_cpu_usage();
        tokio::time::sleep(window).await;
        self.system.refresh_cpu_usage();
        let load_avg = f64::from(self.system.global_cpu_usage());

        tokio::time::sleep(window).await;
        self.system.refresh_cpu_usage();
        let load_per_core: Vec<f64> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| f64::from(cpu.cpu_usage()))
            .collect();

        CpuInfo {
            model: self.statics.cpu_model.clone(),
            arch: self.statics.machine.clone(),
            frequency: self.statics.cpu_frequency.clone(),
            core_count: self.statics.core_count,
            load_avg,
            load_per_core,
        }
    }

    fn collect_memory(&mut self) -> MemoryInfo {
        self.system.refresh_memory();

        MemoryInfo {
            total: self.system.total_memory(),
            free: self.system.available_memory(),
            swap_total: self.system.total_swap(),
            swap_free: self.system.free_swap(),
        }
    }

    fn collect_disk(&mut self) -> Result<DiskInfo, CollectError> {
        self.disks.refresh(true);

        let mut mounts = Vec::new();
        let mut reference = None;

        for disk in self.disks.list() {
            // The reference mount counts whatever backs it, even a
            // filesystem the device list filters out.
            if disk.mount_point().to_string_lossy() == self.options.reference_mount {
                reference = Some((disk.total_space(), disk.available_space()));
            }

            let fs = disk.file_system().to_string_lossy();
            if PSEUDO_FILESYSTEMS.contains(&fs.as_ref()) {
                continue;
            }
            mounts.push(disk.name().to_string_lossy().into_owned());
        }

        let (total, free) = reference
            .ok_or_else(|| CollectError::ReferenceMount(self.options.reference_mount.clone()))?;

        let (read_bytes, written_bytes) = disk_io_totals()?;

        Ok(DiskInfo {
            mounts,
            total,
            free,
            read_bytes,
            written_bytes,
        })
    }

    fn collect_network(&mut self) -> NetworkInfo {
        self.networks.refresh(true);

        let mut received = 0u64;
        let mut transmitted = 0u64;
        for (_, data) in self.networks.iter() {
            received = received.saturating_add(data.total_received());
            transmitted = transmitted.saturating_add(data.total_transmitted());
        }

        NetworkInfo {
            received,
            transmitted,
        }
    }

    fn collect_processes(&mut self) -> ProcessInfo {
        self.system
            .refresh_processes(ProcessesToUpdate::All, true);

        let total = self.system.processes().len();

        let list = if self.options.process_list {
            let total_memory = self.system.total_memory();
            let mut list: Vec<ProcessSample> = self
                .system
                .processes()
                .iter()
                .map(|(pid, process)| ProcessSample {
                    pid: pid.as_u32(),
                    name: process.name().to_string_lossy().into_owned(),
                    cpu_percent: f64::from(process.cpu_usage()),
                    memory_percent: if total_memory > 0 {
                        process.memory() as f64 * 100.0 / total_memory as f64
                    } else {
                        0.0
                    },
                })
                .collect();
            list.sort_by_key(|sample| sample.pid);
            list
        } else {
            Vec::new()
        };

        ProcessInfo { total, list }
    }
}

/// An unreadable /proc/diskstats aborts the cycle; the loop carries on.
#[cfg(target_os = "linux")]
fn disk_io_totals() -> Result<(u64, u64), CollectError> {
    crate::linux::disk_io_totals().map_err(|e| CollectError::DiskCounters(e.to_string()))
}

/// Cumulative disk I/O is only wired up on Linux; other platforms report
/// zeros.
#[cfg(not(target_os = "linux"))]
fn disk_io_totals() -> Result<(u64, u64), CollectError> {
    Ok((0, 0))
}

#[cfg(target_os = "linux")]
fn collect_sensors() -> SensorInfo {
    SensorInfo {
        battery: crate::linux::read_battery(),
        temperatures: crate::linux::collect_temperatures(),
        fans: crate::linux::collect_fans(),
    }
}

#[cfg(target_os = "macos")]
fn collect_sensors() -> SensorInfo {
    SensorInfo {
        battery: crate::macos::read_battery(),
        ..SensorInfo::default()
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn collect_sensors() -> SensorInfo {
    SensorInfo::default()
}
