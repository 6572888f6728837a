//! HostPulse workstation telemetry agent.
//!
//! Samples the local host each cycle (OS facts, CPU load, memory, disks,
//! network totals, sensors, processes), flattens the snapshot into a
//! namespaced JSON record and fire-and-forgets it over UDP to a collector.
//!
//! - [`identity`] - Stable host identity resolution
//! - [`collector`] - System sampling via `sysinfo` (plus platform sources)
//! - [`render`] - Operator console output
//! - [`sender`] - Best-effort UDP transmission
//! - [`agent`] - The endless collect-render-send loop
//! - [`config`] - Agent configuration

pub mod agent;
pub mod collector;
pub mod config;
pub mod identity;
pub mod render;
pub mod sender;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;
