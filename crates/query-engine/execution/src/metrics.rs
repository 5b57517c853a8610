//! Metrics setup for materialization.

use prometheus::core::{AtomicU64, GenericCounter};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub rows_read_total: GenericCounter<AtomicU64>,
    pub entities_materialized_total: GenericCounter<AtomicU64>,
    pub expand_entities_total: GenericCounter<AtomicU64>,
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Setup the counters used to produce Prometheus metrics
pub fn initialise_metrics(metrics_registry: &mut prometheus::Registry) -> Result<Metrics, Error> {
    let rows_read_total = add_int_counter_metric(
        metrics_registry,
        "odata_sql_rows_read_total",
        "Total result rows read from cursors.",
    )?;
    let entities_materialized_total = add_int_counter_metric(
        metrics_registry,
        "odata_sql_entities_materialized_total",
        "Total top-level entities materialized from result rows.",
    )?;
    let expand_entities_total = add_int_counter_metric(
        metrics_registry,
        "odata_sql_expand_entities_total",
        "Total expanded entities nested under their owners.",
    )?;

    Ok(Metrics {
        rows_read_total,
        entities_materialized_total,
        expand_entities_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_once_per_registry() {
        let mut registry = prometheus::Registry::new();
        let metrics = initialise_metrics(&mut registry).unwrap();
        metrics.rows_read_total.inc();
        assert_eq!(registry.gather().len(), 3);
        assert!(matches!(
            initialise_metrics(&mut registry),
            Err(Error::Metrics(_))
        ));
    }
}
