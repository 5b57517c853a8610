//! The commands of the `odata-sql` tool.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use odata_sql_configuration::environment::Environment;
use odata_sql_configuration::{Configuration, ParsedConfiguration};
use query_engine_execution::{cursor::VecCursor, materializer, metrics, query};
use query_engine_sql::sql::string::SQL;
use query_engine_translation::translation::{self, helpers::Env, paging, request::Request, Plan};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the SQL and parameters of a request
    Translate {
        #[arg(long, env = "ODATA_SQL_CONFIGURATION", value_name = "DIRECTORY")]
        configuration: PathBuf,
        /// A JSON request, tagged by its `operation`
        #[arg(long, value_name = "FILE")]
        request: PathBuf,
        /// The URL the request was made with; prints the link to the next page of a
        /// server-paged read
        #[arg(long)]
        url: Option<String>,
        /// Format the SQL
        #[arg(long)]
        pretty: bool,
    },
    /// Print the count query of a read
    Count {
        #[arg(long, env = "ODATA_SQL_CONFIGURATION", value_name = "DIRECTORY")]
        configuration: PathBuf,
        #[arg(long, value_name = "FILE")]
        request: PathBuf,
    },
    /// Fold the rows a read returned into entities, printed as JSON
    Materialize {
        #[arg(long, env = "ODATA_SQL_CONFIGURATION", value_name = "DIRECTORY")]
        configuration: PathBuf,
        #[arg(long, value_name = "FILE")]
        request: PathBuf,
        /// A JSON array of rows, keyed by column alias
        #[arg(long, value_name = "FILE")]
        rows: PathBuf,
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the JSON schema of the configuration
    PrintSchema,
}

/// Run a command and return what it prints.
pub async fn run(command: Command, environment: impl Environment) -> anyhow::Result<String> {
    match command {
        Command::Translate {
            configuration,
            request,
            url,
            pretty,
        } => {
            let configuration = load_configuration(&configuration, environment).await?;
            let request = read_json(&request).await?;
            translate(&configuration, &request, url.as_deref(), pretty)
        }
        Command::Count {
            configuration,
            request,
        } => {
            let configuration = load_configuration(&configuration, environment).await?;
            let request = read_json(&request).await?;
            count(&configuration, &request)
        }
        Command::Materialize {
            configuration,
            request,
            rows,
            url,
        } => {
            let configuration = load_configuration(&configuration, environment).await?;
            let request = read_json(&request).await?;
            let rows = read_json(&rows).await?;
            materialize(&configuration, &request, rows, url.as_deref())
        }
        Command::PrintSchema => {
            let schema = schemars::schema_for!(ParsedConfiguration);
            Ok(serde_json::to_string_pretty(&schema)?)
        }
    }
}

/// The SQL of any request, followed by its numbered parameters.
pub fn translate(
    configuration: &Configuration,
    request: &Request,
    url: Option<&str>,
    pretty: bool,
) -> anyhow::Result<String> {
    let env = env(configuration);
    let plan = translation::translate(&env, request)?;
    let dialect = &configuration.dialect;
    let query = match &plan {
        Plan::Read(plan) => query::prepare(&plan.root_entity, plan.query.query_sql(dialect)),
        Plan::Count(plan) => query::prepare(&plan.root_entity, plan.query.query_sql(dialect)),
        Plan::Mutation(plan) => query::prepare(&plan.root_entity, plan.query.query_sql(dialect)),
    };
    let mut output = render(&query, pretty);

    if let (Plan::Read(plan), Some(url)) = (&plan, url) {
        if plan.query.paging.server_side {
            let link = paging::next_link(url, &plan.query.paging)?;
            output.push_str(&format!("\n\nnext link (when the page is full): {link}"));
        }
    }
    Ok(output)
}

/// The count query of a read.
pub fn count(configuration: &Configuration, request: &Request) -> anyhow::Result<String> {
    let env = env(configuration);
    let query_request = match request {
        Request::Query(query_request) | Request::Count(query_request) => query_request,
        _ => anyhow::bail!("only reads can be counted"),
    };
    let plan = translation::query::build_select_count(&env, query_request)?;
    let query = query::prepare(&plan.root_entity, plan.query.query_sql(&configuration.dialect));
    Ok(render(&query, false))
}

/// Fold rows into the entities of a read. With a URL, a full server page also carries
/// the link to the next one.
pub fn materialize(
    configuration: &Configuration,
    request: &Request,
    rows: serde_json::Value,
    url: Option<&str>,
) -> anyhow::Result<String> {
    let env = env(configuration);
    let Request::Query(query_request) = request else {
        anyhow::bail!("only reads return rows")
    };
    let plan = translation::query::build_select(&env, query_request)?;

    let mut registry = prometheus::Registry::new();
    let metrics = metrics::initialise_metrics(&mut registry)?;
    let entities = materializer::materialize(
        VecCursor::from_json(rows)?,
        &plan.query.shape,
        &metrics,
    )?;

    let mut result = serde_json::Map::new();
    if let Some(url) = url {
        if paging::needs_next_link(&plan.query.paging, entities.len()) {
            result.insert(
                "@odata.nextLink".to_string(),
                paging::next_link(url, &plan.query.paging)?.into(),
            );
        }
    }
    result.insert("value".to_string(), serde_json::to_value(entities)?);
    Ok(serde_json::to_string_pretty(&result)?)
}

fn env(configuration: &Configuration) -> Env<'_> {
    Env::new(
        &configuration.metadata,
        &configuration.dialect,
        configuration.server_page_size,
    )
}

fn render(query: &SQL, pretty: bool) -> String {
    let sql = if pretty {
        sqlformat::format(
            &query.sql,
            &sqlformat::QueryParams::None,
            sqlformat::FormatOptions::default(),
        )
    } else {
        query.sql.clone()
    };
    let params = query
        .params
        .iter()
        .enumerate()
        .map(|(i, param)| format!("{}: {}", i + 1, param))
        .collect::<Vec<_>>();
    if params.is_empty() {
        sql
    } else {
        format!("{sql}\n\n{}", params.join("\n"))
    }
}

async fn load_configuration(
    directory: &Path,
    environment: impl Environment,
) -> anyhow::Result<Configuration> {
    let parsed = odata_sql_configuration::parse_configuration(directory).await?;
    Ok(odata_sql_configuration::make_runtime_configuration(
        parsed,
        environment,
    )?)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}
