//! Hub configuration model (`engine?config` reply body).
//!
//! Only the fields the bridge needs are modelled; everything else in the
//! (large) document is ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Full configuration document returned by the hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubConfiguration {
    #[serde(default, rename = "activity")]
    pub activities: Vec<Activity>,
    #[serde(default, rename = "device")]
    pub devices: Vec<Device>,
}

/// A hub activity such as "Watch TV".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub label: String,
}

/// A physical device known to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub control_group: Vec<ControlGroup>,
}

/// A named group of device functions ("Power", "Volume", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub function: Vec<Function>,
}

/// One button of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub label: String,
    #[serde(deserialize_with = "encoded_action")]
    pub action: ActionDescriptor,
}

/// The opaque command a hold-action request replays.
///
/// The hub ships it as a JSON document encoded inside a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type", default = "default_action_kind")]
    pub kind: String,
    #[serde(rename = "deviceId", deserialize_with = "string_or_number")]
    pub device_id: String,
    pub command: String,
}

impl ActionDescriptor {
    /// Creates an IR command descriptor.
    pub fn ir_command(device_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: default_action_kind(),
            device_id: device_id.into(),
            command: command.into(),
        }
    }

    /// Parses the JSON-in-a-string form used by the hub.
    pub fn parse(encoded: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(encoded)
    }
}

impl HubConfiguration {
    /// Parses the reply body of a config request.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

impl Device {
    /// All functions of every control group, in hub order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.control_group.iter().flat_map(|g| g.function.iter())
    }
}

fn default_action_kind() -> String {
    "IRCommand".into()
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn encoded_action<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ActionDescriptor, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => ActionDescriptor::parse(&s).map_err(serde::de::Error::custom),
        value @ serde_json::Value::Object(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        other => Err(serde::de::Error::custom(format!(
            "expected action object or string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "activity": [
            {"id": "-1", "label": "PowerOff", "isTuningDefault": false},
            {"id": "20157061", "label": "Watch TV"}
        ],
        "device": [
            {
                "id": "29611288",
                "label": "Living Room TV",
                "manufacturer": "Samsung",
                "controlGroup": [
                    {
                        "name": "Power",
                        "function": [
                            {
                                "action": "{\"command\":\"PowerOff\",\"type\":\"IRCommand\",\"deviceId\":\"29611288\"}",
                                "name": "PowerOff",
                                "label": "Power Off"
                            }
                        ]
                    },
                    {
                        "name": "TransportBasic",
                        "function": [
                            {
                                "action": "{\"command\":\"Play\",\"type\":\"IRCommand\",\"deviceId\":\"29611288\"}",
                                "name": "Play",
                                "label": "Play"
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_activities_and_devices() {
        let cfg = HubConfiguration::from_json(SAMPLE).unwrap();
        assert_eq!(cfg.activities.len(), 2);
        assert_eq!(cfg.activities[1].label, "Watch TV");
        assert_eq!(cfg.devices.len(), 1);
        assert_eq!(cfg.devices[0].control_group.len(), 2);
    }

    #[test]
    fn decodes_string_encoded_action() {
        let cfg = HubConfiguration::from_json(SAMPLE).unwrap();
        let play = cfg.devices[0].functions().find(|f| f.name == "Play").unwrap();
        assert_eq!(play.action, ActionDescriptor::ir_command("29611288", "Play"));
    }

    #[test]
    fn accepts_inline_action_object() {
        let json = r#"{"name": "Play", "label": "Play", "action": {"deviceId": "1", "command": "Play"}}"#;
        let f: Function = serde_json::from_str(json).unwrap();
        assert_eq!(f.action.device_id, "1");
        assert_eq!(f.action.kind, "IRCommand");
    }

    #[test]
    fn numeric_ids_become_strings() {
        let json = r#"{"activity": [{"id": 42, "label": "Music"}]}"#;
        let cfg = HubConfiguration::from_json(json).unwrap();
        assert_eq!(cfg.activities[0].id, "42");
        assert!(cfg.devices.is_empty());
    }

    #[test]
    fn flattens_functions_in_hub_order() {
        let cfg = HubConfiguration::from_json(SAMPLE).unwrap();
        let names: Vec<&str> = cfg.devices[0].functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["PowerOff", "Play"]);
    }

    #[test]
    fn rejects_malformed_action() {
        let json = r#"{"name": "X", "label": "X", "action": "not json"}"#;
        assert!(serde_json::from_str::<Function>(json).is_err());
    }
}
