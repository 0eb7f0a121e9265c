//! Plan execution
//!
//! Planning and validation only depend on `PlanExecutor`. The shipped
//! implementation fabricates a result table; a real query engine replaces
//! it without touching the rest of the pipeline.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::plan::PlanStep;

/// Tabular execution result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TablePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl TablePayload {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Runs validated plan steps
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn execute(&self, steps: &[PlanStep]) -> Result<TablePayload>;
}

/// Random table: 8-10 columns, 10-20 rows of mixed scalar values
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderExecutor;

const PLACEHOLDER_TITLE: &str = "Results";

fn random_value<R: Rng>(rng: &mut R) -> Value {
    match rng.gen_range(0..4) {
        0 => Value::from(rng.gen_range(0..=1000)),
        1 => Value::from((rng.gen_range(0.0..1000.0_f64) * 100.0).round() / 100.0),
        2 => Value::from(format!("value_{}", rng.gen_range(1000..=9999))),
        _ => Value::from(rng.gen_bool(0.5)),
    }
}

/// Build a placeholder table
pub fn random_table<R: Rng>(rng: &mut R) -> TablePayload {
    let columns: Vec<String> = (1..=rng.gen_range(8..=10))
        .map(|i| format!("column{i}"))
        .collect();
    let rows = (0..rng.gen_range(10..=20))
        .map(|_| {
            columns
                .iter()
                .map(|c| (c.clone(), random_value(rng)))
                .collect::<Map<String, Value>>()
        })
        .collect();

    TablePayload {
        title: Some(PLACEHOLDER_TITLE.to_string()),
        columns,
        rows,
    }
}

#[async_trait]
impl PlanExecutor for PlaceholderExecutor {
    async fn execute(&self, steps: &[PlanStep]) -> Result<TablePayload> {
        let table = random_table(&mut rand::thread_rng());
        debug!(
            steps = steps.len(),
            columns = table.columns.len(),
            rows = table.rows.len(),
            "Placeholder execution"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_table_dimensions() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let table = random_table(&mut rng);
            assert!((8..=10).contains(&table.columns.len()));
            assert!((10..=20).contains(&table.rows.len()));
            assert_eq!(table.columns[0], "column1");
            for row in &table.rows {
                assert_eq!(row.len(), table.columns.len());
                assert!(row.values().all(|v| v.is_number() || v.is_string() || v.is_boolean()));
            }
        }
    }

    #[tokio::test]
    async fn test_placeholder_executor_titles_results() {
        let table = PlaceholderExecutor.execute(&[]).await.unwrap();
        assert_eq!(table.title.as_deref(), Some("Results"));
    }
}
