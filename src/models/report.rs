//! Dashboard Report Models
//!
//! DTOs for the document dashboard: a list of named counters, each with a
//! drill-down key resolving to a detail table of rows.

use std::collections::HashSet;

use serde::Deserialize;

// == Dashboard Counter ==
/// One named counter on the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardCounter {
    pub name: String,
    pub value: i64,
    #[serde(rename = "drillkey")]
    pub drill_key: String,
}

// == Detail Report ==
/// Drill-down detail table. The first column of each row is the document
/// number.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailReport {
    #[serde(rename = "colNames")]
    pub col_names: Vec<ColumnHeader>,
    pub data: Vec<Vec<String>>,
}

/// Column header of a detail table.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnHeader {
    pub name: String,
    pub width: i64,
}

impl DetailReport {
    // == Doc Numbers ==
    /// Extracts the document numbers (first column), de-duplicated while
    /// preserving row order. Rows without cells are skipped.
    pub fn doc_numbers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut doc_numbers = Vec::new();
        for row in &self.data {
            if let Some(doc_no) = row.first() {
                if seen.insert(doc_no.clone()) {
                    doc_numbers.push(doc_no.clone());
                }
            }
        }
        doc_numbers
    }

    /// Row pairs `(doc_no, detail)` for summary formatting; rows with fewer
    /// than two cells are skipped.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().filter_map(|row| match row.as_slice() {
            [doc_no, detail, ..] => Some((doc_no.as_str(), detail.as_str())),
            _ => None,
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DetailReport {
        serde_json::from_str(
            r#"{
                "colNames": [{"name": "doc", "width": 12}, {"name": "owner", "width": 8}],
                "data": [
                    ["RMA-1001", "alice"],
                    ["RMA-1002", "bob"],
                    ["RMA-1001", "alice"],
                    []
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_counter_deserialize() {
        let counter: DashboardCounter = serde_json::from_str(
            r#"{"name": "returned", "value": 3, "drillkey": "dashboard:returned"}"#,
        )
        .unwrap();
        assert_eq!(counter.name, "returned");
        assert_eq!(counter.value, 3);
        assert_eq!(counter.drill_key, "dashboard:returned");
    }

    #[test]
    fn test_doc_numbers_dedupe_preserves_order() {
        let report = sample();
        assert_eq!(report.doc_numbers(), vec!["RMA-1001", "RMA-1002"]);
    }

    #[test]
    fn test_rows_skip_short_rows() {
        let report = sample();
        let rows: Vec<_> = report.rows().collect();
        assert_eq!(
            rows,
            vec![
                ("RMA-1001", "alice"),
                ("RMA-1002", "bob"),
                ("RMA-1001", "alice")
            ]
        );
    }

    #[test]
    fn test_empty_report() {
        let report: DetailReport =
            serde_json::from_str(r#"{"colNames": [], "data": []}"#).unwrap();
        assert!(report.doc_numbers().is_empty());
    }
}
