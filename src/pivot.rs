use std::collections::{BTreeMap, BTreeSet};

use crate::{DerivedRecord, Quarter};

/// Row key of the pivot: reporting quarter, then technology.
pub type PivotKey = (Quarter, String);

/// Local-currency total profit cross-tabulated by (quarter, technology) rows
/// and client columns. Rows are the observed keys in ascending order, columns
/// are the distinct clients in ascending order, and a cell with no matching
/// record holds 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSummary {
    clients: Vec<String>,
    rows: BTreeMap<PivotKey, Vec<f64>>,
}

impl PivotSummary {
    pub fn build(records: &[DerivedRecord]) -> Self {
        let clients: Vec<String> = records
            .iter()
            .map(|r| r.base.client.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut rows: BTreeMap<PivotKey, Vec<f64>> = BTreeMap::new();
        for r in records {
            // clients was built from these same records
            let Ok(col) = clients.binary_search(&r.base.client) else {
                continue;
            };
            let cells = rows
                .entry((r.quarter, r.base.technology.clone()))
                .or_insert_with(|| vec![0.; clients.len()]);
            cells[col] += r.total_profit_local;
        }
        Self { clients, rows }
    }

    pub fn clients(&self) -> &[String] {
        &self.clients
    }

    pub fn rows(&self) -> impl Iterator<Item = (&PivotKey, &[f64])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Cell value, or `None` when the row key or the client is unknown.
    pub fn value(&self, quarter: Quarter, technology: &str, client: &str) -> Option<f64> {
        let col = self.clients.iter().position(|c| c == client)?;
        self.row(quarter, technology).map(|cells| cells[col])
    }

    /// Sum over all client columns of one row.
    pub fn row_total(&self, quarter: Quarter, technology: &str) -> Option<f64> {
        self.row(quarter, technology)
            .map(|cells| cells.iter().sum())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, quarter: Quarter, technology: &str) -> Option<&[f64]> {
        self.rows
            .get(&(quarter, technology.to_string()))
            .map(Vec::as_slice)
    }
}
