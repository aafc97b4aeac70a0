use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::value_err;

/// The declared type of a field. Schema files name it case
/// insensitively.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldType {
    Page,
    String,
    Text,
    Wikitext,
    Integer,
    Float,
    Boolean,
    Date,
    #[serde(rename = "URL")]
    Url,
    Email,
    File,
    Coordinates,
}

impl FieldType {
    fn to_str(&self) -> &str {
        match self {
            FieldType::Page => "Page",
            FieldType::String => "String",
            FieldType::Text => "Text",
            FieldType::Wikitext => "Wikitext",
            FieldType::Integer => "Integer",
            FieldType::Float => "Float",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Url => "URL",
            FieldType::Email => "Email",
            FieldType::File => "File",
            FieldType::Coordinates => "Coordinates",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ans = match s.to_lowercase().as_ref() {
            "page" => FieldType::Page,
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "wikitext" => FieldType::Wikitext,
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "url" => FieldType::Url,
            "email" => FieldType::Email,
            "file" => FieldType::File,
            "coordinates" => FieldType::Coordinates,
            _ => return Err(value_err!("Unknown field type {}", s)),
        };
        Ok(ans)
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single value as handed back by the storage layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Renders the value as display text, using `decimal_mark` as the
    /// separator of float values. NULL renders as an empty string.
    pub fn format(&self, decimal_mark: &str) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string().replacen('.', decimal_mark, 1),
            Value::String(s) => s.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}
