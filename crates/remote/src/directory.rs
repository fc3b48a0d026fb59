//! Per-device function lookup built from the hub configuration.

use std::collections::HashMap;

use harmony_protocol::{ActionDescriptor, Function, HubConfiguration};

use crate::error::{Lookup, NotFound};

/// Functions of one device, indexed by label and by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub device_id: String,
    pub label: String,
    functions: Vec<Function>,
    by_label: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl DirectoryEntry {
    fn new(device_id: String, label: String, functions: Vec<Function>) -> Self {
        let mut by_label = HashMap::new();
        let mut by_name = HashMap::new();
        // First occurrence wins on duplicate labels or names.
        for (idx, f) in functions.iter().enumerate() {
            by_label.entry(f.label.clone()).or_insert(idx);
            by_name.entry(f.name.clone()).or_insert(idx);
        }
        Self {
            device_id,
            label,
            functions,
            by_label,
            by_name,
        }
    }

    /// Every function label in hub order, used as the source list.
    pub fn source_list(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.label.clone()).collect()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn by_label(&self, label: &str) -> Option<&ActionDescriptor> {
        self.by_label.get(label).map(|&i| &self.functions[i].action)
    }

    fn by_name(&self, name: &str) -> Option<&ActionDescriptor> {
        self.by_name.get(name).map(|&i| &self.functions[i].action)
    }
}

/// Lookup of action descriptors for every device the hub knows.
///
/// Rebuilt wholesale from each configuration fetch; never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDirectory {
    entries: Vec<DirectoryEntry>,
    index: HashMap<String, usize>,
}

impl DeviceDirectory {
    pub fn build(config: &HubConfiguration) -> Self {
        let mut entries = Vec::with_capacity(config.devices.len());
        let mut index = HashMap::new();
        for device in &config.devices {
            if index.contains_key(&device.id) {
                continue;
            }
            index.insert(device.id.clone(), entries.len());
            entries.push(DirectoryEntry::new(
                device.id.clone(),
                device.label.clone(),
                device.functions().cloned().collect(),
            ));
        }
        Self { entries, index }
    }

    /// Devices in hub order.
    pub fn devices(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn entry(&self, device_id: &str) -> Option<&DirectoryEntry> {
        self.index.get(device_id).map(|&i| &self.entries[i])
    }

    /// Exact, case-sensitive match on the function label.
    pub fn resolve_by_label(&self, device_id: &str, label: &str) -> Result<&ActionDescriptor, NotFound> {
        self.entry(device_id)
            .and_then(|e| e.by_label(label))
            .ok_or_else(|| NotFound::new(device_id, Lookup::Label, label))
    }

    /// Exact, case-sensitive match on the function name.
    pub fn resolve_by_name(&self, device_id: &str, name: &str) -> Result<&ActionDescriptor, NotFound> {
        self.entry(device_id)
            .and_then(|e| e.by_name(name))
            .ok_or_else(|| NotFound::new(device_id, Lookup::Name, name))
    }
}
