use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::snapshot::MetricsSnapshot;

/// A flat, namespaced key/value record representing one snapshot.
///
/// Keys follow a fixed two-level `category/field` convention
/// (e.g. `"cpu/load-avg"`). Building a record is a pure function of the host
/// identity, the agent name and the snapshot: equal inputs always produce
/// equal records, and no timestamps are added beyond what the snapshot
/// already carries.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

impl FlatRecord {
    /// Flatten one snapshot into the wire record.
    ///
    /// An absent identity serializes as an empty `head/uuid`; an absent
    /// battery serializes as `null` for both `sns/battery` and `sns/bat-cs`.
    pub fn build(identity: Option<&str>, agent_name: &str, snapshot: &MetricsSnapshot) -> Self {
        let mut fields = Map::new();

        fields.insert("head/name".into(), json!(agent_name));
        fields.insert("head/uuid".into(), json!(identity.unwrap_or("")));

        fields.insert("os/name".into(), json!(snapshot.os.name));
        fields.insert("os/machine".into(), json!(snapshot.os.machine));
        fields.insert("os/hostname".into(), json!(snapshot.os.hostname));
        fields.insert("os/boottime".into(), json!(snapshot.os.boot_time));

        fields.insert("cpu/model".into(), json!(snapshot.cpu.model));
        fields.insert("cpu/arch".into(), json!(snapshot.cpu.arch));
        fields.insert("cpu/frequency".into(), json!(snapshot.cpu.frequency));
        fields.insert("cpu/core-count".into(), json!(snapshot.cpu.core_count));
        fields.insert("cpu/load-avg".into(), json!(snapshot.cpu.load_avg));
        fields.insert(
            "cpu/load-per-core".into(),
            json!(snapshot.cpu.load_per_core),
        );

        fields.insert("ram/total".into(), json!(snapshot.memory.total));
        fields.insert("ram/free".into(), json!(snapshot.memory.free));
        fields.insert("ram/swap-total".into(), json!(snapshot.memory.swap_total));
        fields.insert("ram/swap-free".into(), json!(snapshot.memory.swap_free));

        fields.insert("disk/mounts".into(), json!(snapshot.disk.mounts));
        fields.insert("disk/total".into(), json!(snapshot.disk.total));
        fields.insert("disk/free".into(), json!(snapshot.disk.free));
        fields.insert("disk/r".into(), json!(snapshot.disk.read_bytes));
        fields.insert("disk/w".into(), json!(snapshot.disk.written_bytes));

        fields.insert("net/r".into(), json!(snapshot.network.received));
        fields.insert("net/w".into(), json!(snapshot.network.transmitted));

        let battery = snapshot.sensors.battery.as_ref();
        fields.insert("sns/battery".into(), json!(battery.map(|b| b.percent)));
        fields.insert("sns/bat-cs".into(), json!(battery.map(|b| b.charging)));

        let temps: Map<String, Value> = snapshot
            .sensors
            .temperatures
            .iter()
            .map(|(source, readings)| {
                let rows: Vec<Value> = readings
                    .iter()
                    .map(|r| json!([r.label, r.celsius, r.max, r.critical]))
                    .collect();
                (source.clone(), Value::Array(rows))
            })
            .collect();
        fields.insert("sns/temp".into(), Value::Object(temps));

        let fans: Map<String, Value> = snapshot
            .sensors
            .fans
            .iter()
            .map(|(source, readings)| {
                let rows: Vec<Value> = readings.iter().map(|r| json!([r.label, r.rpm])).collect();
                (source.clone(), Value::Array(rows))
            })
            .collect();
        fields.insert("sns/fans".into(), Value::Object(fans));

        fields.insert("proc/ttl".into(), json!(snapshot.processes.total));
        let processes: Vec<Value> = snapshot
            .processes
            .list
            .iter()
            .map(|p| json!([p.pid, p.name, p.cpu_percent, p.memory_percent]))
            .collect();
        fields.insert("proc/ls".into(), Value::Array(processes));

        Self { fields }
    }

    /// Serialize to a transport-ready UTF-8 JSON payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }

    /// Look up a field by its namespaced key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        BatteryReading, CpuInfo, DiskInfo, FanReading, MemoryInfo, MetricsSnapshot, NetworkInfo,
        OsInfo, ProcessInfo, ProcessSample, SensorInfo, TempReading,
    };
    use std::collections::BTreeMap;

    /// Fixed mock host: 4 cores, 16 GiB RAM with 8 GiB free.
    fn mock_snapshot() -> MetricsSnapshot {
        let mut temperatures = BTreeMap::new();
        temperatures.insert(
            "coretemp".to_string(),
            vec![TempReading {
                label: "Core 0".to_string(),
                celsius: 48.5,
                max: Some(80.0),
                critical: Some(100.0),
            }],
        );
        let mut fans = BTreeMap::new();
        fans.insert(
            "thinkpad".to_string(),
            vec![FanReading {
                label: "fan1".to_string(),
                rpm: 2800,
            }],
        );

        MetricsSnapshot {
            os: OsInfo {
                name: "Linux 6.8".to_string(),
                machine: "x86_64".to_string(),
                hostname: "testbox".to_string(),
                boot_time: 1_700_000_000,
            },
            cpu: CpuInfo {
                model: "Mock CPU".to_string(),
                arch: "x86_64".to_string(),
                frequency: "3600 MHz".to_string(),
                core_count: 4,
                load_avg: 12.5,
                load_per_core: vec![10.0, 15.0, 12.5, 12.5],
            },
            memory: MemoryInfo {
                total: 17_179_869_184,
                free: 8_589_934_592,
                swap_total: 2_147_483_648,
                swap_free: 2_147_483_648,
            },
            disk: DiskInfo {
                mounts: vec!["/dev/sda1".to_string(), "/dev/sda2".to_string()],
                total: 512_000_000_000,
                free: 256_000_000_000,
                read_bytes: 1_000_000,
                written_bytes: 2_000_000,
            },
            network: NetworkInfo {
                received: 3_000_000,
                transmitted: 4_000_000,
            },
            sensors: SensorInfo {
                battery: Some(BatteryReading {
                    percent: 72.0,
                    charging: true,
                }),
                temperatures,
                fans,
            },
            processes: ProcessInfo {
                total: 137,
                list: vec![ProcessSample {
                    pid: 42,
                    name: "init".to_string(),
                    cpu_percent: 0.5,
                    memory_percent: 1.2,
                }],
            },
        }
    }

    #[test]
    fn test_mock_host_cycle_fields() {
        let record = FlatRecord::build(Some("fixed-uuid"), "ws01", &mock_snapshot());

        assert_eq!(record.get("head/name").unwrap(), "ws01");
        assert_eq!(record.get("head/uuid").unwrap(), "fixed-uuid");
        assert_eq!(record.get("cpu/core-count").unwrap(), 4);
        assert_eq!(record.get("ram/total").unwrap(), 17_179_869_184_u64);

        let per_core = record.get("cpu/load-per-core").unwrap().as_array().unwrap();
        assert_eq!(per_core.len(), 4);
        assert!(per_core.iter().all(|v| v.as_f64().is_some()));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let record = FlatRecord::build(Some("fixed-uuid"), "ws01", &mock_snapshot());
        let bytes = record.to_bytes().unwrap();

        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        let object = parsed.as_object().unwrap();

        assert_eq!(object.len(), record.len());
        for (key, value) in object {
            assert_eq!(record.get(key), Some(value), "field '{key}' changed");
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let snapshot = mock_snapshot();
        let a = FlatRecord::build(Some("u"), "ws01", &snapshot);
        let b = FlatRecord::build(Some("u"), "ws01", &snapshot);

        assert_eq!(a, b);
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn test_absent_identity_is_empty_string() {
        let record = FlatRecord::build(None, "ws01", &mock_snapshot());

        assert_eq!(record.get("head/uuid").unwrap(), "");
    }

    #[test]
    fn test_absent_battery_is_null() {
        let mut snapshot = mock_snapshot();
        snapshot.sensors.battery = None;

        let record = FlatRecord::build(None, "ws01", &snapshot);

        assert!(record.get("sns/battery").unwrap().is_null());
        assert!(record.get("sns/bat-cs").unwrap().is_null());
    }

    #[test]
    fn test_sensor_groups_keep_their_source() {
        let record = FlatRecord::build(None, "ws01", &mock_snapshot());

        let temps = record.get("sns/temp").unwrap().as_object().unwrap();
        let core = temps["coretemp"].as_array().unwrap();
        assert_eq!(core[0][0], "Core 0");
        assert_eq!(core[0][1], 48.5);

        let fans = record.get("sns/fans").unwrap().as_object().unwrap();
        let thinkpad = fans["thinkpad"].as_array().unwrap();
        assert_eq!(thinkpad[0], json!(["fan1", 2800]));
    }

    #[test]
    fn test_process_list_serializes_as_four_tuples() {
        let record = FlatRecord::build(None, "ws01", &mock_snapshot());

        let list = record.get("proc/ls").unwrap().as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], json!([42, "init", 0.5, 1.2]));
        assert_eq!(record.get("proc/ttl").unwrap(), 137);
    }

    #[test]
    fn test_empty_process_list_stays_an_array() {
        let mut snapshot = mock_snapshot();
        snapshot.processes.list.clear();

        let record = FlatRecord::build(None, "ws01", &snapshot);

        assert_eq!(record.get("proc/ls").unwrap(), &json!([]));
    }
}
