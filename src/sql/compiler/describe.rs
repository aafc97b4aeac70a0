use indexmap::IndexMap;
use log::debug;

use crate::catalog::field::{self, FieldDescription};
use crate::catalog::r#type::FieldType;
use crate::catalog::schema::Schemas;

/// What is known about an output column: its type, when it could be
/// inferred, and the table owning it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInfo {
    pub ty: Option<FieldType>,
    pub size: Option<u32>,
    pub is_list: bool,
    pub table: Option<String>,
}

impl FieldInfo {
    fn typed(ty: FieldType, table: Option<String>) -> FieldInfo {
        FieldInfo { ty: Some(ty), table, ..Default::default() }
    }

    fn declared(desc: &FieldDescription, table: Option<String>) -> FieldInfo {
        FieldInfo { ty: Some(desc.ty), size: desc.size, is_list: desc.is_list, table }
    }
}

/// Infers the description of every aliased field. Inference is best
/// effort: whatever can't be resolved stays untyped.
pub fn describe_fields(
    aliased_fields: &IndexMap<String, String>,
    schemas: &Schemas,
    table_names: &[String],
) -> IndexMap<String, FieldInfo> {
    aliased_fields
        .iter()
        .map(|(alias, expr)| {
            let info = describe_field(expr, schemas, table_names);
            debug!("field {} = {} described as {:?}", alias, expr, info);
            (alias.trim().to_string(), info)
        })
        .collect()
}

pub fn describe_field(expr: &str, schemas: &Schemas, table_names: &[String]) -> FieldInfo {
    let expr = expr.trim();
    if let Some(pos) = expr.find('(') {
        return FieldInfo { ty: function_type(&expr[..pos]), ..Default::default() };
    }

    let (table, field) = match expr.split_once('.') {
        Some((table, field)) => (Some(table.trim()), field.trim()),
        None => (None, expr),
    };
    let owner = table.map(String::from);
    match field {
        field::ID | field::ROW_ID | field::PAGE_ID | field::PAGE_NAMESPACE => {
            return FieldInfo::typed(FieldType::Integer, owner)
        }
        field::PAGE_NAME => return FieldInfo::typed(FieldType::Page, owner),
        field::PAGE_TITLE => return FieldInfo::typed(FieldType::Text, owner),
        _ => {}
    }

    // A field table value, or the serialized form of a virtual field, has
    // the type of the declared field.
    let (table, field) = if field == field::VALUE {
        let field_table = match table {
            Some(table) => Some(table),
            None => table_names
                .iter()
                .map(String::as_str)
                .find(|it| field::is_field_table_name(it)),
        };
        match field_table.and_then(field::split_field_table_name) {
            Some((table, field)) => (Some(table), field),
            None => return FieldInfo::default(),
        }
    } else {
        (table, field::strip_full_suffix(field).unwrap_or(field))
    };

    match table {
        Some(table) => match schemas.field(table, field) {
            Some(desc) => FieldInfo::declared(desc, Some(table.to_string())),
            None => FieldInfo { table: Some(table.to_string()), ..Default::default() },
        },
        None => match schemas.find_field(field) {
            Some((table, desc)) => FieldInfo::declared(desc, Some(table.to_string())),
            None => FieldInfo::default(),
        },
    }
}

/// The result type of a SQL function, by name.
fn function_type(name: &str) -> Option<FieldType> {
    match name.trim().to_lowercase().as_str() {
        "count" | "max" | "min" | "avg" | "sum" | "sqrt" => Some(FieldType::Integer),
        "date" | "date_format" | "date_add" | "date_sub" | "date_diff" => Some(FieldType::Date),
        // concat, lower, upper and the like pass their argument through
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema::TableSchema;

    fn schemas() -> Schemas {
        let events = TableSchema::new("Events")
            .field("Title", FieldDescription::new(FieldType::String).with_size(80))
            .field("Tags", FieldDescription::list(FieldType::String))
            .field("Start", FieldDescription::new(FieldType::Date));
        let cities = TableSchema::new("Cities")
            .field("Title", FieldDescription::new(FieldType::Text))
            .field("Population", FieldDescription::new(FieldType::Integer));
        [events, cities].into_iter().collect()
    }

    fn describe(expr: &str) -> FieldInfo {
        let tables = vec!["Events".to_string(), "Events__Tags".to_string(), "Cities".to_string()];
        describe_field(expr, &schemas(), &tables)
    }

    #[test]
    fn test_system_fields() {
        assert_eq!(Some(FieldType::Integer), describe("_ID").ty);
        assert_eq!(Some(FieldType::Integer), describe("Events__Tags._rowID").ty);
        assert_eq!(Some(FieldType::Page), describe("_pageName").ty);
        assert_eq!(Some("Cities".to_string()), describe("Cities._pageName").table);
    }

    #[test]
    fn test_functions() {
        assert_eq!(Some(FieldType::Integer), describe("COUNT(*)").ty);
        assert_eq!(Some(FieldType::Integer), describe("max(Cities.Population)").ty);
        assert_eq!(Some(FieldType::Date), describe("DATE_FORMAT(Start, '%Y')").ty);
        assert_eq!(None, describe("CONCAT(Title, '!')").ty);
        assert_eq!(FieldInfo::default(), describe("FROBNICATE(Title)"));
    }

    #[test]
    fn test_declared_fields() {
        let info = describe("Cities.Title");
        assert_eq!(Some(FieldType::Text), info.ty);
        assert_eq!(Some("Cities".to_string()), info.table);

        // First table in request order wins.
        let info = describe("Title");
        assert_eq!(Some(FieldType::String), info.ty);
        assert_eq!(Some(80), info.size);
        assert_eq!(Some("Events".to_string()), info.table);
    }

    #[test]
    fn test_virtual_field_columns() {
        let info = describe("Tags__full");
        assert_eq!(Some(FieldType::String), info.ty);
        assert!(info.is_list);

        let info = describe("Events__Tags._value");
        assert_eq!(Some(FieldType::String), info.ty);
        assert_eq!(Some("Events".to_string()), info.table);

        assert_eq!(Some(FieldType::String), describe("_value").ty);
    }

    #[test]
    fn test_unresolved_fields_are_untyped() {
        assert_eq!(None, describe("Mayor").ty);
        let info = describe("Nowhere.Mayor");
        assert_eq!(None, info.ty);
        assert_eq!(Some("Nowhere".to_string()), info.table);
    }
}
