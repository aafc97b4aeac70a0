use cargoql::catalog::memory::MemoryCatalog;
use cargoql::config::Config;
use cargoql::error::Result;
use cargoql::sql::compiler::{Compiler, QueryParams};

fn main() -> Result<()> {
    let args = clap::command!()
        .name("cargoql")
        .about("Compiles a query over the declared tables into SQL")
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .default_value(""),
        )
        .arg(
            clap::Arg::new("schema")
                .short('s')
                .long("schema")
                .help("File declaring the table schemas")
                .required(true),
        )
        .arg(clap::Arg::new("tables").long("tables").help("Comma separated table names").required(true))
        .arg(clap::Arg::new("fields").long("fields").help("Comma separated fields, `expr=alias`"))
        .arg(clap::Arg::new("where").long("where").help("Where clause"))
        .arg(clap::Arg::new("join-on").long("join-on").help("Join conditions"))
        .arg(clap::Arg::new("group-by").long("group-by").help("Group by clause"))
        .arg(clap::Arg::new("order-by").long("order-by").help("Order by clause"))
        .arg(clap::Arg::new("limit").long("limit").help("Maximum number of rows"))
        .get_matches();
    let arg = |name: &str| args.get_one::<String>(name).cloned().unwrap_or_default();

    let cfg = Config::new(&arg("config"))?;
    env_logger::Builder::new().parse_filters(&cfg.log_level).init();

    let catalog = MemoryCatalog::from_file(&arg("schema"))?;
    let params = QueryParams {
        tables: arg("tables"),
        fields: arg("fields"),
        where_clause: arg("where"),
        join_on: arg("join-on"),
        group_by: arg("group-by"),
        order_by: arg("order-by"),
        limit: arg("limit"),
    };
    let query = Compiler::new(&catalog, &cfg).compile(&params)?;
    println!("{}", query);
    Ok(())
}
