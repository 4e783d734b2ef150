//! WMI service for the management backend
//!
//! Each [`WmiService::connect`] initialises COM on the calling thread and
//! opens a fresh `WMIConnection` to the requested namespace path, which may
//! name a remote host (`\\host\root\cimv2`).

use crate::management::{Instances, ManagementService, Namespace, ServiceFault};
use crate::record::{PropertyBag, Value};
use log::debug;
use std::collections::HashMap;
use wmi::{COMLibrary, Variant, WMIConnection, WMIError};

type ComInit = fn() -> Result<COMLibrary, WMIError>;

/// Run `strategies` in order and keep the first library that initialises,
/// falling back to `fallback` when none does
fn first_initialized<C, E: std::fmt::Display>(
    strategies: impl IntoIterator<Item = fn() -> Result<C, E>>,
    fallback: impl FnOnce() -> C,
) -> C {
    for init in strategies {
        match init() {
            Ok(com) => return com,
            Err(e) => debug!("COM initialization failed: {}", e),
        }
    }
    fallback()
}

/// Initialise COM on the calling thread
fn initialize_com() -> COMLibrary {
    let strategies: [ComInit; 2] = [
        // Fresh COM initialization
        COMLibrary::new,
        // COM without security init
        COMLibrary::without_security,
    ];
    // Assume COM is already initialized by the caller.
    // SAFETY: both initialisation attempts failed, which on this thread means
    // COM was set up earlier with a different concurrency model.
    first_initialized(strategies, || unsafe { COMLibrary::assume_initialized() })
}

/// Initialise COM and connect to `namespace_path`. The connection is
/// attempted exactly once; its error is returned as is.
fn create_wmi_connection(namespace_path: &str) -> Result<WMIConnection, ServiceFault> {
    let com = initialize_com();
    WMIConnection::with_namespace_path(namespace_path, com.into())
        .map_err(|e| ServiceFault::new(e.to_string()))
}

fn to_value(variant: Variant) -> Value {
    match variant {
        Variant::String(s) => Value::String(s),
        Variant::Bool(b) => Value::Bool(b),
        Variant::I1(v) => Value::Int(v.into()),
        Variant::I2(v) => Value::Int(v.into()),
        Variant::I4(v) => Value::Int(v.into()),
        Variant::I8(v) => Value::Int(v),
        Variant::UI1(v) => Value::UInt(v.into()),
        Variant::UI2(v) => Value::UInt(v.into()),
        Variant::UI4(v) => Value::UInt(v.into()),
        Variant::UI8(v) => Value::UInt(v),
        Variant::R4(v) => Value::Float(v.into()),
        Variant::R8(v) => Value::Float(v),
        Variant::Array(items) => Value::Array(items.into_iter().map(to_value).collect()),
        _ => Value::Null,
    }
}

fn to_bag(raw: HashMap<String, Variant>) -> PropertyBag {
    raw.into_iter()
        .map(|(name, variant)| (name, to_value(variant)))
        .collect()
}

/// The local WMI service
#[derive(Debug, Clone, Copy, Default)]
pub struct WmiService;

impl WmiService {
    pub fn new() -> Self {
        Self
    }
}

impl ManagementService for WmiService {
    type Namespace = WmiNamespace;

    fn connect(&self, namespace_path: &str) -> Result<WmiNamespace, ServiceFault> {
        let connection = create_wmi_connection(namespace_path)?;
        Ok(WmiNamespace { connection })
    }
}

/// An open WMI namespace
pub struct WmiNamespace {
    connection: WMIConnection,
}

impl Namespace for WmiNamespace {
    fn get_object(&self, object_path: &str) -> Result<PropertyBag, ServiceFault> {
        debug!("WMI get {}", object_path);
        self.connection
            .get_by_path::<HashMap<String, Variant>>(object_path)
            .map(to_bag)
            .map_err(|e| ServiceFault::new(e.to_string()))
    }

    fn instances_of(&self, class: &str) -> Result<Instances<'_>, ServiceFault> {
        let query = format!("SELECT * FROM {}", class);
        debug!("WMI query {}", query);
        let results = self
            .connection
            .exec_query_native_wrapper(query)
            .map_err(|e| ServiceFault::new(e.to_string()))?;

        Ok(Box::new(results.map(|item| {
            item.and_then(|object| object.into_desr::<HashMap<String, Variant>>())
                .map(to_bag)
                .map_err(|e| ServiceFault::new(e.to_string()))
        })))
    }
}
