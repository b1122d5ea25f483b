use serde::{Deserialize, Serialize};

/// Reserved field carrying the decomposed topic levels in expanded source
/// templates. Must never appear in a persisted template.
pub const TOKEN_TOPIC_LEVEL: &str = "_TOPIC_LEVEL_";

/// Reserved field carrying the synthetic device identifier in expanded
/// INVENTORY-bound templates. Must never appear in a persisted template.
pub const TOKEN_DEVICE_IDENT: &str = "_DEVICE_IDENT_";

/// Sample value injected for the synthetic device identifier.
pub const SAMPLE_DEVICE_IDENT: &str = "909090";

/// Target field the executor stamps with the current time when no
/// substitution provides one.
pub const TIME: &str = "time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetApi {
    Alarm,
    Event,
    Measurement,
    Inventory,
    Operation,
    /// Fallback for target API kinds this engine does not know. Mappings
    /// carrying it deserialize fine but are rejected by the executor.
    #[serde(other)]
    Unknown,
}

impl TargetApi {
    /// Identifier field the target API requires, or `None` when the kind is
    /// unrecognized.
    pub fn identifier(&self) -> Option<&'static str> {
        match self {
            TargetApi::Alarm | TargetApi::Event | TargetApi::Measurement => Some("source.id"),
            TargetApi::Inventory => Some(TOKEN_DEVICE_IDENT),
            TargetApi::Operation => Some("deviceId"),
            TargetApi::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingType {
    #[default]
    Json,
    FlatFile,
    GenericBinary,
    ProtobufStatic,
    ProcessorExtension,
}

impl MappingType {
    /// Types whose payload transform is an opaque external codec. Template
    /// and identifier checks do not apply to them.
    pub fn is_opaque(&self) -> bool {
        matches!(
            self,
            MappingType::ProtobufStatic | MappingType::ProcessorExtension
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Qos {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnoopStatus {
    #[default]
    None,
    Enabled,
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStrategy {
    #[default]
    Default,
    UseFirstValueOfArray,
    UseLastValueOfArray,
    Ignore,
    RemoveIfMissing,
}

/// One path-to-path copy rule inside a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSubstitution {
    pub path_source: String,
    pub path_target: String,
    #[serde(default)]
    pub repair_strategy: RepairStrategy,
    #[serde(default)]
    pub expand_array: bool,
}

impl MappingSubstitution {
    pub fn new(path_source: impl Into<String>, path_target: impl Into<String>) -> Self {
        Self {
            path_source: path_source.into(),
            path_target: path_target.into(),
            repair_strategy: RepairStrategy::Default,
            expand_array: false,
        }
    }

    /// True iff this substitution writes the device identifier required by
    /// the target API. Outbound mappings address the external system, so
    /// nothing defines a device identifier there.
    pub fn defines_device_identifier(&self, target_api: TargetApi, direction: Direction) -> bool {
        direction == Direction::Inbound
            && target_api.identifier() == Some(self.path_target.as_str())
    }
}

/// A configured rule set translating between a topic-addressed payload and a
/// target API payload. The persisted copy is the source of truth between
/// edit sessions; the runtime message path reads an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub subscription_topic: String,
    #[serde(default)]
    pub publish_topic: Option<String>,
    #[serde(default)]
    pub template_topic: String,
    #[serde(default)]
    pub template_topic_sample: String,
    #[serde(rename = "targetAPI")]
    pub target_api: TargetApi,
    /// Serialized source template (JSON text).
    #[serde(default)]
    pub source: String,
    /// Serialized target template (JSON text).
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub tested: bool,
    #[serde(default)]
    pub qos: Qos,
    #[serde(default)]
    pub substitutions: Vec<MappingSubstitution>,
    #[serde(default)]
    pub map_device_identifier: bool,
    #[serde(default)]
    pub create_non_existing_device: bool,
    #[serde(default)]
    pub update_existing_device: bool,
    #[serde(default)]
    pub external_id_type: String,
    #[serde(default)]
    pub snoop_status: SnoopStatus,
    #[serde(default)]
    pub snooped_templates: Vec<String>,
    #[serde(default)]
    pub mapping_type: MappingType,
    #[serde(default)]
    pub filter_outbound: Option<String>,
    #[serde(default)]
    pub last_update: i64,
}

impl Mapping {
    /// Topic the mapping is attached to on the broker side: subscription
    /// topic for inbound, publish topic for outbound.
    pub fn broker_topic(&self) -> &str {
        match self.direction {
            Direction::Inbound => &self.subscription_topic,
            Direction::Outbound => self.publish_topic.as_deref().unwrap_or(""),
        }
    }
}
