use std::fmt::Display;
use std::fmt::Formatter;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::catalog::field::FieldDescription;
use crate::catalog::field::FIELD_TABLE_SEPARATOR;
use crate::error::Result;
use crate::value_err;

/// The declared fields of a single table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    pub fields: IndexMap<String, FieldDescription>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> TableSchema {
        TableSchema { name: name.into(), fields: IndexMap::new() }
    }

    /// Appends a field, builder style.
    pub fn field(mut self, name: impl Into<String>, description: FieldDescription) -> TableSchema {
        self.fields.insert(name.into(), description);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldDescription> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDescription)> {
        self.fields.iter()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(value_err!("Table name can't be empty"));
        }
        if self.name.contains(FIELD_TABLE_SEPARATOR) {
            return Err(value_err!(
                "Table name {} can't contain '{}'",
                self.name,
                FIELD_TABLE_SEPARATOR
            ));
        }
        for name in self.fields.keys() {
            if name.is_empty() {
                return Err(value_err!("Table {} has a field with empty name", self.name));
            }
        }
        Ok(())
    }
}

impl Display for TableSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TABLE {}(", self.name)?;
        for (i, (name, desc)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if desc.is_list {
                write!(f, "{} LIST OF {}", name, desc.ty)?;
            } else {
                write!(f, "{} {}", name, desc.ty)?;
            }
        }
        write!(f, ")")
    }
}

/// The schemas of every table taking part in one query, in the order the
/// tables were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schemas(IndexMap<String, TableSchema>);

impl Schemas {
    pub fn new() -> Schemas {
        Schemas(IndexMap::new())
    }

    pub fn insert(&mut self, schema: TableSchema) {
        self.0.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.0.get(table)
    }

    pub fn field(&self, table: &str, field: &str) -> Option<&FieldDescription> {
        self.get(table).and_then(|it| it.get(field))
    }

    /// Finds the first table, in request order, declaring `field`.
    pub fn find_field(&self, field: &str) -> Option<(&str, &FieldDescription)> {
        self.0
            .values()
            .find_map(|schema| schema.get(field).map(|desc| (schema.name.as_str(), desc)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TableSchema> for Schemas {
    fn from_iter<T: IntoIterator<Item = TableSchema>>(iter: T) -> Self {
        let mut schemas = Schemas::new();
        for schema in iter {
            schemas.insert(schema);
        }
        schemas
    }
}

/// On-disk form of a table schema: the field order has to survive
/// formats whose maps are unordered, hence the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub description: FieldDescription,
}

impl From<TableDef> for TableSchema {
    fn from(def: TableDef) -> Self {
        let fields = def.fields.into_iter().map(|it| (it.name, it.description)).collect();
        TableSchema { name: def.name, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::r#type::FieldType;

    fn schemas() -> Schemas {
        let cities = TableSchema::new("Cities")
            .field("Name", FieldDescription::new(FieldType::String))
            .field("Population", FieldDescription::new(FieldType::Integer));
        let countries = TableSchema::new("Countries")
            .field("Name", FieldDescription::new(FieldType::Text))
            .field("Languages", FieldDescription::list(FieldType::String));
        [cities, countries].into_iter().collect()
    }

    #[test]
    fn test_find_field_in_request_order() {
        let schemas = schemas();
        let (table, desc) = schemas.find_field("Name").unwrap();
        assert_eq!("Cities", table);
        assert_eq!(FieldType::String, desc.ty);
        assert_eq!("Countries", schemas.find_field("Languages").unwrap().0);
        assert!(schemas.find_field("Mayor").is_none());
    }

    #[test]
    fn test_validate() {
        assert!(TableSchema::new("Events__Tags").validate().is_err());
        assert!(TableSchema::new("").validate().is_err());
        assert!(schemas().iter().all(|it| it.validate().is_ok()));
    }

    #[test]
    fn test_display() {
        let schemas = schemas();
        assert_eq!(
            "TABLE Countries(Name Text, Languages LIST OF String)",
            schemas.get("Countries").unwrap().to_string()
        );
    }
}
