use serde::{Deserialize, Serialize};

use crate::catalog::r#type::FieldType;

/// Identity column of every main table row.
pub const ID: &str = "_ID";
/// Column of a field table pointing back at the main table row.
pub const ROW_ID: &str = "_rowID";
/// Column of a field table holding one single value of the list.
pub const VALUE: &str = "_value";
/// Latitude/longitude columns of a coordinates field table.
pub const LAT: &str = "_lat";
pub const LON: &str = "_lon";

pub const PAGE_NAME: &str = "_pageName";
pub const PAGE_TITLE: &str = "_pageTitle";
pub const PAGE_NAMESPACE: &str = "_pageNamespace";
pub const PAGE_ID: &str = "_pageID";

/// Prefix reserved for the system fields above.
pub const SYSTEM_FIELD_PREFIX: char = '_';

/// Separator between a main table name and the list field name of its
/// field tables. Nobody may declare a table containing it.
pub const FIELD_TABLE_SEPARATOR: &str = "__";

const FULL_SUFFIX: &str = "__full";
const LAT_SUFFIX: &str = "__lat";
const LON_SUFFIX: &str = "__lon";

/// Describes a declared field of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub is_list: bool,
}

impl FieldDescription {
    pub fn new(ty: FieldType) -> FieldDescription {
        FieldDescription { ty, size: None, is_list: false }
    }

    pub fn list(ty: FieldType) -> FieldDescription {
        FieldDescription { ty, size: None, is_list: true }
    }

    pub fn with_size(mut self, size: u32) -> FieldDescription {
        self.size = Some(size);
        self
    }

    /// Whether the field has no 1:1 physical column, i.e. it is either a
    /// list or a coordinate pair.
    pub fn is_virtual(&self) -> bool {
        self.is_list || self.ty == FieldType::Coordinates
    }
}

/// Name of the table holding every value of the list field `field`.
pub fn field_table_name(table: &str, field: &str) -> String {
    format!("{table}{FIELD_TABLE_SEPARATOR}{field}")
}

/// Splits a field table name back into its main table and field names.
pub fn split_field_table_name(name: &str) -> Option<(&str, &str)> {
    name.split_once(FIELD_TABLE_SEPARATOR)
}

pub fn is_field_table_name(name: &str) -> bool {
    name.contains(FIELD_TABLE_SEPARATOR)
}

/// Column holding the serialized representation of all the values.
pub fn full_column(field: &str) -> String {
    format!("{field}{FULL_SUFFIX}")
}

pub fn lat_column(field: &str) -> String {
    format!("{field}{LAT_SUFFIX}")
}

pub fn lon_column(field: &str) -> String {
    format!("{field}{LON_SUFFIX}")
}

/// Strips the `__full` suffix of a column name, if any.
pub fn strip_full_suffix(column: &str) -> Option<&str> {
    column.strip_suffix(FULL_SUFFIX).filter(|it| !it.is_empty())
}
