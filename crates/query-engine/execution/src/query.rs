//! Render execution plans for the driver, and interpret what it reports back.

use query_engine_sql::sql::execution_plan::{ExecutionPlan, MutationQuery};
use query_engine_sql::sql::string::SQL;

use crate::cursor::RowCursor;
use crate::error::Error;

/// Log a rendered statement and hand it on to the driver. `query` is the plan's
/// `query_sql` for the configured dialect.
pub fn prepare(root_entity: &str, query: SQL) -> SQL {
    tracing::info!(
        generated_sql = %query.sql,
        params = ?&query.params,
        entity = %root_entity,
    );
    query
}

/// Read the single integer a count query returns.
pub fn read_count(cursor: &mut impl RowCursor) -> Result<u64, Error> {
    let row = cursor
        .next_row()?
        .ok_or_else(|| Error::Cursor("a count query returned no rows".to_string()))?;
    let value = row
        .values()
        .next()
        .ok_or_else(|| Error::MissingColumn("COUNT(*)".to_string()))?;
    let count = match value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    count.ok_or_else(|| Error::Cursor(format!("'{value}' is not a count")))
}

/// Check the affected-row count of an update or delete. Zero rows means the
/// addressed entity does not exist.
pub fn expect_affected_rows(
    plan: &ExecutionPlan<MutationQuery>,
    affected_rows: u64,
) -> Result<u64, Error> {
    if plan.query.expects_affected_rows && affected_rows == 0 {
        return Err(Error::NotFound {
            entity: plan.root_entity.clone(),
        });
    }
    Ok(affected_rows)
}
