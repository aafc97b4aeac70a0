use indexmap::IndexMap;
use log::debug;

use crate::catalog::catalog::Catalog;
use crate::catalog::field::{self, FieldDescription};
use crate::catalog::schema::Schemas;
use crate::config::Config;
use crate::error::Result;
use crate::parse_err;
use crate::sql::compiler::describe::FieldInfo;
use crate::sql::compiler::join::JoinCondition;
use crate::sql::execution::query::{SelectField, SelectOptions, SelectQuery};
use crate::sql::parser::ColumnRef;
use crate::value_err;

pub mod coordinates;
pub mod describe;
pub mod fields;
pub mod join;
pub mod list;
pub mod prefix;

/// The raw, user supplied parts of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub tables: String,
    pub fields: String,
    pub where_clause: String,
    pub join_on: String,
    pub group_by: String,
    pub order_by: String,
    pub limit: String,
}

/// The state shared by the compilation stages. Every stage reads what
/// the previous ones left and refines it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Tables in declared order, field tables right after their main table
    pub table_names: Vec<String>,
    pub aliased_fields: IndexMap<String, String>,
    pub field_descriptions: IndexMap<String, FieldInfo>,
    pub join_conditions: Vec<JoinCondition>,
    pub schemas: Schemas,
    pub where_clause: String,
    pub group_by: String,
    pub order_by: String,
}

/// A list or coordinates field, i.e. one without a plain column.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualField {
    pub table: String,
    pub field: String,
    pub description: FieldDescription,
}

impl VirtualField {
    pub fn field_table(&self) -> String {
        field::field_table_name(&self.table, &self.field)
    }
}

impl Context {
    /// Resolves a column reference to the virtual field it names, if any.
    /// Bare names bind to the first declared table having the field.
    pub fn virtual_field(&self, column: &ColumnRef) -> Option<VirtualField> {
        let (table, description) = match &column.table {
            Some(table) => (table.as_str(), self.schemas.field(table, &column.field)?),
            None => self.schemas.find_field(&column.field)?,
        };
        if !description.is_virtual() || !self.table_names.iter().any(|it| it == table) {
            return None;
        }
        Some(VirtualField {
            table: table.to_string(),
            field: column.field.clone(),
            description: description.clone(),
        })
    }

    /// Inserts a field table right after its main table, unless it is
    /// already there or the main table is not part of the query.
    pub fn add_field_table(&mut self, field_table: &str, table: &str) {
        if self.table_names.iter().any(|it| it == field_table) {
            return;
        }
        if let Some(pos) = self.table_names.iter().position(|it| it == table) {
            self.table_names.insert(pos + 1, field_table.to_string());
        }
    }

    pub fn add_join_condition(&mut self, cond: JoinCondition) {
        if self.join_conditions.iter().any(|it| it.same_columns(&cond)) {
            return;
        }
        debug!("adding join condition {}", cond);
        self.join_conditions.push(cond);
    }

    pub fn is_joined(&self, table: &str) -> bool {
        self.join_conditions.iter().any(|it| it.involves(table))
    }

    /// Joins the field table of a virtual field to its main table and
    /// returns its name.
    pub fn join_field_table(&mut self, vf: &VirtualField) -> String {
        let field_table = vf.field_table();
        self.add_field_table(&field_table, &vf.table);
        self.add_join_condition(JoinCondition::new(
            &vf.table,
            field::ID,
            &field_table,
            field::ROW_ID,
        ));
        field_table
    }
}

/// Compiles query parameters into a select query against the storage
/// tables.
pub struct Compiler<'a> {
    catalog: &'a dyn Catalog,
    config: &'a Config,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a dyn Catalog, config: &'a Config) -> Compiler<'a> {
        Compiler { catalog, config }
    }

    pub fn compile(&self, params: &QueryParams) -> Result<SelectQuery> {
        let table_names = parse_tables(&params.tables)?;
        let join_conditions = join::parse_join_on(&params.join_on, &table_names)?;
        let aliased_fields = fields::parse_fields(&params.fields)?;
        debug!("tables {:?}, fields {:?}", table_names, aliased_fields);

        let schemas = self.catalog.get_schemas(&table_names)?;
        let field_descriptions = describe::describe_fields(&aliased_fields, &schemas, &table_names);
        let mut ctx = Context {
            table_names,
            aliased_fields,
            field_descriptions,
            join_conditions,
            schemas,
            where_clause: params.where_clause.trim().to_string(),
            group_by: params.group_by.trim().to_string(),
            order_by: params.order_by.trim().to_string(),
        };

        list::rewrite_where(&mut ctx)?;
        coordinates::rewrite_where(&mut ctx)?;
        list::rewrite_join_on(&mut ctx)?;
        list::rewrite_fields(&mut ctx)?;
        prefix::prefix_context(&mut ctx, &self.config.table_prefix)?;

        let limit = self.parse_limit(&params.limit)?;
        self.build_query(ctx, limit)
    }

    /// The requested limit, or the default one, capped by the maximum.
    fn parse_limit(&self, limit: &str) -> Result<u64> {
        let limit = limit.trim();
        let requested = if limit.is_empty() {
            self.config.default_query_limit
        } else {
            match limit.parse::<u64>() {
                Ok(requested) => requested,
                // Too large for a u64, so above any maximum.
                Err(_) if limit.bytes().all(|b| b.is_ascii_digit()) => self.config.max_query_limit,
                Err(_) => return Err(parse_err!("Limit '{}' is not a number", limit)),
            }
        };
        Ok(requested.min(self.config.max_query_limit))
    }

    fn build_query(&self, ctx: Context, limit: u64) -> Result<SelectQuery> {
        let fields = ctx
            .aliased_fields
            .iter()
            .map(|(alias, expr)| SelectField {
                alias: alias.clone(),
                expr: expr.clone(),
                info: ctx.field_descriptions.get(alias).cloned().unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        let order_by = match (ctx.order_by.is_empty(), fields.first()) {
            (false, _) => ctx.order_by,
            (true, Some(first)) => first.expr.clone(),
            (true, None) => String::new(),
        };
        let options = SelectOptions {
            group_by: Some(ctx.group_by).filter(|it| !it.is_empty()),
            order_by,
            limit,
        };
        let where_clause = Some(ctx.where_clause).filter(|it| !it.is_empty());
        let query = SelectQuery::try_new(
            &self.config.table_prefix,
            ctx.table_names,
            fields,
            where_clause,
            ctx.join_conditions,
            options,
        )?;
        debug!("compiled query: {}", query);
        Ok(query)
    }
}

fn parse_tables(tables: &str) -> Result<Vec<String>> {
    let mut table_names: Vec<String> = vec![];
    for table in tables.split(',').map(str::trim).filter(|it| !it.is_empty()) {
        if table_names.iter().any(|it| it == table) {
            return Err(value_err!("Table \"{}\" is listed more than once", table));
        }
        table_names.push(table.to_string());
    }
    if table_names.is_empty() {
        return Err(value_err!("At least one table must be specified"));
    }
    Ok(table_names)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use goldenfile::Mint;

    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::catalog::r#type::FieldType;
    use crate::catalog::schema::TableSchema;
    use crate::error::Error;

    const GOLDEN_DIR: &str = "src/sql/compiler/golden";

    fn catalog() -> Result<MemoryCatalog> {
        MemoryCatalog::new()
            .with_table(
                TableSchema::new("Cities")
                    .field("Name", FieldDescription::new(FieldType::String))
                    .field("Country", FieldDescription::new(FieldType::Page))
                    .field("Population", FieldDescription::new(FieldType::Integer))
                    .field("Location", FieldDescription::new(FieldType::Coordinates)),
            )?
            .with_table(
                TableSchema::new("Countries")
                    .field("Name", FieldDescription::new(FieldType::String))
                    .field("Languages", FieldDescription::list(FieldType::String)),
            )?
            .with_table(
                TableSchema::new("Events")
                    .field("Title", FieldDescription::new(FieldType::String))
                    .field("Tags", FieldDescription::list(FieldType::String))
                    .field("Venues", FieldDescription::list(FieldType::Coordinates)),
            )
    }

    fn params(tables: &str, fields: &str) -> QueryParams {
        QueryParams { tables: tables.to_string(), fields: fields.to_string(), ..Default::default() }
    }

    fn compile(params: &QueryParams) -> Result<SelectQuery> {
        let catalog = catalog()?;
        let config = Config::default();
        Compiler::new(&catalog, &config).compile(params)
    }

    macro_rules! test_compile {
        ($($name:ident: $params:expr,)*) => {
        $(
            #[test]
            fn $name() -> Result<()> {
                let mut mint = Mint::new(GOLDEN_DIR);
                let mut f = mint.new_goldenfile(stringify!($name))?;
                let params: QueryParams = $params;
                let query = compile(&params)?;
                write!(f, "Params: \n{:#?}\n\n", params)?;
                write!(f, "SQL: \n{}\n", query)?;
                Ok(())
            }
        )*
        }
    }

    test_compile! {
        single_table: QueryParams {
            where_clause: "Population > 1000000".to_string(),
            ..params("Cities", "Name, Country, Population=People")
        },
        join_with_list_field: QueryParams {
            join_on: "Cities.Country=Countries._pageName".to_string(),
            where_clause: "Countries.Languages HOLDS 'French'".to_string(),
            order_by: "Cities.Name".to_string(),
            ..params("Cities, Countries", "Cities.Name, Countries.Languages")
        },
        near_list_coordinates: QueryParams {
            where_clause: "Venues NEAR (0, 0, 111 km)".to_string(),
            limit: "20".to_string(),
            ..params("Events", "Title, Venues")
        },
    }

    #[test]
    fn test_limit() -> Result<()> {
        let query = compile(&params("Cities", ""))?;
        assert_eq!(100, query.options().limit);

        let query = compile(&QueryParams { limit: "999999".to_string(), ..params("Cities", "") })?;
        assert_eq!(5000, query.options().limit);

        let query =
            compile(&QueryParams { limit: "100000000000000000000".to_string(), ..params("Cities", "") })?;
        assert_eq!(5000, query.options().limit);

        let err = compile(&QueryParams { limit: "ten".to_string(), ..params("Cities", "") });
        assert_eq!(Err(Error::parse("Limit 'ten' is not a number")), err.map(|_| ()));
        Ok(())
    }

    #[test]
    fn test_default_order_by() -> Result<()> {
        let query = compile(&params("Cities", "Cities.Name=City, Population"))?;
        assert_eq!("cargo__Cities.Name", query.options().order_by);
        assert_eq!(None, query.options().group_by);
        Ok(())
    }

    #[test]
    fn test_tables() {
        assert!(matches!(compile(&params(" , ", "")), Err(Error::Value(_))));
        assert!(matches!(compile(&params("Cities, Cities", "")), Err(Error::Value(_))));
        assert_eq!(
            Err(Error::value("Table Mayors does not exist")),
            compile(&params("Mayors", "")).map(|_| ())
        );
    }

    #[test]
    fn test_near_on_plain_coordinates() -> Result<()> {
        let query = compile(&QueryParams {
            where_clause: "Location NEAR (0, 0, 111 km) AND Population > 10".to_string(),
            ..params("Cities", "Name, Location")
        })?;
        assert_eq!(
            Some("(cargo__Cities.Location__lat >= -1 AND cargo__Cities.Location__lat <= 1 AND \
                  cargo__Cities.Location__lon >= -0.9971164470315574 AND \
                  cargo__Cities.Location__lon <= 0.9971164470315574) AND Population > 10"),
            query.where_clause()
        );
        assert_eq!(vec!["Cities".to_string()], query.tables());
        assert_eq!("Location__full", query.fields()[1].expr);
        Ok(())
    }

    #[test]
    fn test_coordinates_require_near() {
        let err = compile(&QueryParams {
            where_clause: "Location = 'x'".to_string(),
            ..params("Cities", "Name")
        });
        assert_eq!(
            Err(Error::value("Operator for the virtual field 'Location' must be 'NEAR'")),
            err.map(|_| ())
        );
    }

    #[test]
    fn test_group_by_rewrite() -> Result<()> {
        let query = compile(&QueryParams {
            group_by: "Tags".to_string(),
            ..params("Events", "Tags, COUNT(*)=Num")
        })?;
        assert_eq!(Some("Tags__full".to_string()), query.options().group_by);
        assert_eq!(Some(FieldType::Integer), query.fields()[1].info.ty);
        assert!(query.fields()[0].info.is_list);
        Ok(())
    }
}
