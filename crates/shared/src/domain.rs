use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RecordId);
id_newtype!(FileId);

/// Backend collections the admin UI manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ItemGroup,
    Vehicle,
    InventoryItem,
}

impl EntityKind {
    /// Path segment of the collection on the REST API.
    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::ItemGroup => "item-groups",
            EntityKind::Vehicle => "vehicles",
            EntityKind::InventoryItem => "items",
        }
    }

    pub fn default_sort_field(self) -> &'static str {
        match self {
            EntityKind::ItemGroup | EntityKind::InventoryItem => "name",
            EntityKind::Vehicle => "plateNumber",
        }
    }

    /// Fields that must be present and non-blank before a create/update is sent.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::ItemGroup => &["name"],
            EntityKind::Vehicle => &["plateNumber", "model"],
            EntityKind::InventoryItem => &["name", "sku", "groupId"],
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "item-groups" | "item_groups" | "groups" | "item_group" => Some(EntityKind::ItemGroup),
            "vehicles" | "vehicle" => Some(EntityKind::Vehicle),
            "items" | "item" | "inventory" | "inventory_item" => Some(EntityKind::InventoryItem),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Anything listed in a collection view exposes a stable record id.
pub trait Identified {
    fn record_id(&self) -> RecordId;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGroup {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub item_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: RecordId,
    pub plate_number: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub status: VehicleStatus,
    #[serde(default)]
    pub is_cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: RecordId,
    pub name: String,
    pub sku: String,
    pub group_id: RecordId,
    #[serde(default)]
    pub quantity: i64,
}

/// Kind-agnostic view of a record: the id plus whatever fields the backend returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Identified for ItemGroup {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

impl Identified for Vehicle {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

impl Identified for InventoryItem {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

impl Identified for RecordSummary {
    fn record_id(&self) -> RecordId {
        self.id
    }
}
