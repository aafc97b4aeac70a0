use cargoql::catalog::field::FieldDescription;
use cargoql::catalog::memory::MemoryCatalog;
use cargoql::catalog::r#type::FieldType;
use cargoql::catalog::schema::TableSchema;
use cargoql::error::Result;
use cargoql::sql::compiler::QueryParams;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Cities with their countries, and events tagged and located.
pub fn catalog() -> Result<MemoryCatalog> {
    MemoryCatalog::new()
        .with_table(
            TableSchema::new("Cities")
                .field("Name", FieldDescription::new(FieldType::String).with_size(100))
                .field("Country", FieldDescription::new(FieldType::Page))
                .field("Population", FieldDescription::new(FieldType::Integer))
                .field("Area", FieldDescription::new(FieldType::Float))
                .field("Location", FieldDescription::new(FieldType::Coordinates)),
        )?
        .with_table(
            TableSchema::new("Countries")
                .field("Capital", FieldDescription::new(FieldType::Page))
                .field("Languages", FieldDescription::list(FieldType::String)),
        )?
        .with_table(
            TableSchema::new("Events")
                .field("Title", FieldDescription::new(FieldType::String))
                .field("City", FieldDescription::new(FieldType::Page))
                .field("Tags", FieldDescription::list(FieldType::String))
                .field("Start", FieldDescription::new(FieldType::Date)),
        )
}

pub fn params(tables: &str, fields: &str) -> QueryParams {
    QueryParams { tables: tables.to_string(), fields: fields.to_string(), ..Default::default() }
}
