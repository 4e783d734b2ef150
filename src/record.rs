//! Processor records and loosely-typed property values

use crate::codes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A property value as returned by the management service
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_u16(&self) -> Option<u16> {
        self.as_u64().and_then(|v| u16::try_from(v).ok())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Named properties of one management object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    properties: HashMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a property. Property names are case-insensitive in WMI, so an
    /// exact match is tried first and then a case-insensitive one.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).or_else(|| {
            self.properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Like [`get`](Self::get) but treats `Null` as absent
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn string(&self, name: &str) -> Option<String> {
        self.value(name).and_then(Value::as_str).map(str::to_string)
    }

    fn u32(&self, name: &str) -> Option<u32> {
        self.value(name).and_then(Value::as_u32)
    }

    fn u16(&self, name: &str) -> Option<u16> {
        self.value(name).and_then(Value::as_u16)
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    /// Decode a coded property through a translation table
    fn coded<T>(&self, name: &str, translate: fn(u32) -> Option<T>) -> Option<T> {
        self.u32(name).and_then(translate)
    }
}

impl FromIterator<(String, Value)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

/// Snapshot of one `Win32_Processor` instance.
///
/// Every field is optional. The service omits properties that the firmware
/// does not report; commonly absent ones are `install_date`, `error_cleared`,
/// `error_description`, `last_error_code`, `config_manager_error_code`,
/// `config_manager_user_config`, `other_family_description`,
/// `power_management_capabilities`, `unique_id`, `voltage_caps` and
/// `l2_cache_speed`. Coded properties are stored already translated; a code
/// without a table entry is stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorRecord {
    pub address_width: Option<u16>,
    pub architecture: Option<String>,
    pub availability: Option<String>,
    pub caption: Option<String>,
    pub config_manager_error_code: Option<String>,
    pub config_manager_user_config: Option<bool>,
    pub cpu_status: Option<String>,
    pub creation_class_name: Option<String>,
    /// Current clock speed in MHz
    pub freq: Option<u32>,
    /// Current voltage, in tenths of a volt
    pub voltage: Option<u16>,
    pub data_width: Option<u16>,
    pub description: Option<String>,
    pub device_id: Option<String>,
    pub error_cleared: Option<bool>,
    pub error_description: Option<String>,
    /// External clock in MHz
    pub ext_clock: Option<u32>,
    pub family: Option<String>,
    pub install_date: Option<String>,
    /// L2 cache size in KB
    pub l2_cache_size: Option<u32>,
    pub l2_cache_speed: Option<u32>,
    pub last_error_code: Option<u32>,
    pub level: Option<u16>,
    /// Load percentage averaged over the last second
    pub load_avg: Option<u16>,
    pub manufacturer: Option<String>,
    pub max_clock_speed: Option<u32>,
    pub name: Option<String>,
    pub other_family_description: Option<String>,
    pub pnp_device_id: Option<String>,
    pub power_management_supported: Option<bool>,
    /// One entry per reported code, in order; `None` where a code has no
    /// table entry
    pub power_management_capabilities: Option<Vec<Option<String>>>,
    pub processor_id: Option<String>,
    pub processor_type: Option<String>,
    pub revision: Option<u16>,
    pub role: Option<String>,
    pub socket_designation: Option<String>,
    pub status: Option<String>,
    pub status_info: Option<String>,
    pub stepping: Option<String>,
    pub system_creation_class_name: Option<String>,
    pub system_name: Option<String>,
    pub unique_id: Option<String>,
    pub upgrade_method: Option<String>,
    pub version: Option<String>,
    /// Supported voltage in volts
    pub voltage_caps: Option<f32>,
}

impl ProcessorRecord {
    /// Build a record from the raw properties of a `Win32_Processor` object
    pub fn from_properties(props: &PropertyBag) -> Self {
        let power_management_capabilities = props
            .value("PowerManagementCapabilities")
            .and_then(Value::as_array)
            .map(|raw| {
                raw.iter()
                    .map(|code| {
                        code.as_u32()
                            .and_then(codes::power_management_capability)
                            .map(str::to_string)
                    })
                    .collect()
            });

        Self {
            address_width: props.u16("AddressWidth"),
            architecture: props
                .coded("Architecture", codes::architecture)
                .map(str::to_string),
            availability: props
                .coded("Availability", codes::availability)
                .map(str::to_string),
            caption: props.string("Caption"),
            config_manager_error_code: props
                .coded("ConfigManagerErrorCode", codes::config_manager_error_code)
                .map(str::to_string),
            config_manager_user_config: props.bool("ConfigManagerUserConfig"),
            cpu_status: props
                .coded("CpuStatus", codes::cpu_status)
                .map(str::to_string),
            creation_class_name: props.string("CreationClassName"),
            freq: props.u32("CurrentClockSpeed"),
            voltage: props.u16("CurrentVoltage"),
            data_width: props.u16("DataWidth"),
            description: props.string("Description"),
            device_id: props.string("DeviceID"),
            error_cleared: props.bool("ErrorCleared"),
            error_description: props.string("ErrorDescription"),
            ext_clock: props.u32("ExtClock"),
            family: props.coded("Family", codes::family).map(str::to_string),
            install_date: props.string("InstallDate"),
            l2_cache_size: props.u32("L2CacheSize"),
            l2_cache_speed: props.u32("L2CacheSpeed"),
            last_error_code: props.u32("LastErrorCode"),
            level: props.u16("Level"),
            load_avg: props.u16("LoadPercentage"),
            manufacturer: props.string("Manufacturer"),
            max_clock_speed: props.u32("MaxClockSpeed"),
            name: props.string("Name"),
            other_family_description: props.string("OtherFamilyDescription"),
            pnp_device_id: props.string("PNPDeviceID"),
            power_management_supported: props.bool("PowerManagementSupported"),
            power_management_capabilities,
            processor_id: props.string("ProcessorId"),
            processor_type: props
                .coded("ProcessorType", codes::processor_type)
                .map(str::to_string),
            revision: props.u16("Revision"),
            role: props.string("Role"),
            socket_designation: props.string("SocketDesignation"),
            status: props.string("Status"),
            status_info: props
                .coded("StatusInfo", codes::status_info)
                .map(str::to_string),
            stepping: props.string("Stepping"),
            system_creation_class_name: props.string("SystemCreationClassName"),
            system_name: props.string("SystemName"),
            unique_id: props.string("UniqueId"),
            upgrade_method: props
                .coded("UpgradeMethod", codes::upgrade_method)
                .map(str::to_string),
            version: props.string("Version"),
            voltage_caps: props.coded("VoltageCaps", codes::voltage_caps),
        }
    }
}

/// Processor load, shaped by the backend that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LoadSample {
    /// Load percentage of one processor (management backend)
    Percentage(u16),
    /// 1, 5 and 15 minute load averages (kernel backend)
    Averages([f64; 3]),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_processor() -> PropertyBag {
        PropertyBag::new()
            .with("AddressWidth", 64u32)
            .with("Architecture", 9u32)
            .with("Availability", 3u32)
            .with("Caption", "Intel64 Family 6 Model 158 Stepping 10")
            .with("CpuStatus", 1u32)
            .with("CurrentClockSpeed", 3696u32)
            .with("DeviceID", "CPU0")
            .with("Family", 198u32)
            .with("L2CacheSize", 1536u32)
            .with("LoadPercentage", 12u32)
            .with("Manufacturer", "GenuineIntel")
            .with("Name", "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz")
            .with("PowerManagementSupported", false)
            .with(
                "PowerManagementCapabilities",
                Value::Array(vec![Value::UInt(1), Value::UInt(99), Value::UInt(5)]),
            )
            .with("ProcessorType", 3u32)
            .with("StatusInfo", 3u32)
            .with("UpgradeMethod", 1u32)
            .with("VoltageCaps", 4u32)
            .with("InstallDate", Value::Null)
    }

    #[test]
    fn test_record_translates_codes() {
        let record = ProcessorRecord::from_properties(&sample_processor());
        assert_eq!(record.address_width, Some(64));
        assert_eq!(record.architecture.as_deref(), Some("x64"));
        assert_eq!(record.availability.as_deref(), Some("Running"));
        assert_eq!(record.cpu_status.as_deref(), Some("Enabled"));
        assert_eq!(record.processor_type.as_deref(), Some("Central Processor"));
        assert_eq!(record.status_info.as_deref(), Some("Enabled"));
        assert_eq!(record.upgrade_method.as_deref(), Some("Other"));
        assert_eq!(record.voltage_caps, Some(2.9));
        assert_eq!(record.freq, Some(3696));
        assert_eq!(record.load_avg, Some(12));
        assert_eq!(record.power_management_supported, Some(false));
        assert_eq!(
            record.power_management_capabilities,
            Some(vec![
                Some("Not Supported".to_string()),
                None,
                Some("Power State Settable".to_string())
            ])
        );
    }

    #[test]
    fn test_record_unmapped_and_missing_fields() {
        let record = ProcessorRecord::from_properties(&sample_processor());
        // 198 is a valid family on newer hardware but has no table entry
        assert_eq!(record.family, None);
        assert_eq!(record.install_date, None);
        assert_eq!(record.unique_id, None);
        assert_eq!(record.config_manager_error_code, None);
    }

    #[test]
    fn test_empty_bag_gives_empty_record() {
        let record = ProcessorRecord::from_properties(&PropertyBag::new());
        assert_eq!(record, ProcessorRecord::default());
    }

    #[test]
    fn test_property_lookup_ignores_case() {
        let props = PropertyBag::new().with("DeviceID", "CPU1");
        assert_eq!(props.get("DeviceId").and_then(Value::as_str), Some("CPU1"));
        assert!(props.get("Name").is_none());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Int(-1).as_u32(), None);
        assert_eq!(Value::UInt(70_000).as_u16(), None);
        assert_eq!(Value::String(" 42 ".into()).as_u32(), Some(42));
        assert_eq!(Value::Bool(true).as_u32(), None);
    }

    #[test]
    fn test_record_serializes() {
        let record = ProcessorRecord::from_properties(&sample_processor());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["architecture"], "x64");
        assert_eq!(json["manufacturer"], "GenuineIntel");
        assert!(json["install_date"].is_null());
        assert!(json["power_management_capabilities"][1].is_null());
    }
}
