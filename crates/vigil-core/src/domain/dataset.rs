//! Dataset metadata used to seed the column walker.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    #[serde(default, alias = "rows")]
    pub row_count: u64,
    #[serde(default, alias = "columns")]
    pub column_count: u64,
    /// Accepts either `columnNames: ["a", ..]` or `columnsInfo: [{"name": "a", ..}]`.
    #[serde(default, alias = "columnsInfo", deserialize_with = "column_names")]
    pub column_names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnRef {
    Name(String),
    Info { name: String },
}

fn column_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<ColumnRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            ColumnRef::Name(name) | ColumnRef::Info { name } => name,
        })
        .collect())
}

impl DatasetInfo {
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self {
            row_count: 0,
            column_count: column_names.len() as u64,
            column_names,
        }
    }

    pub fn with_rows(mut self, rows: u64) -> Self {
        self.row_count = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_column_names() {
        let info: DatasetInfo = serde_json::from_value(json!({
            "rowCount": 120,
            "columnCount": 3,
            "columnNames": ["age", "income", "label"]
        }))
        .unwrap();
        assert_eq!(info.row_count, 120);
        assert_eq!(info.column_names, vec!["age", "income", "label"]);
    }

    #[test]
    fn reads_dataset_endpoint_shape() {
        let info: DatasetInfo = serde_json::from_value(json!({
            "id": "7",
            "name": "titanic",
            "rows": 891,
            "columns": 2,
            "columnsInfo": [{"name": "Age", "type": "unknown"}, {"name": "Fare", "type": "unknown"}]
        }))
        .unwrap();
        assert_eq!(info.row_count, 891);
        assert_eq!(info.column_count, 2);
        assert_eq!(info.column_names, vec!["Age", "Fare"]);
    }

    #[test]
    fn missing_columns_is_empty() {
        let info: DatasetInfo = serde_json::from_value(json!({"rows": 5})).unwrap();
        assert!(info.column_names.is_empty());
    }

    #[test]
    fn null_columns_is_empty() {
        let info: DatasetInfo = serde_json::from_value(json!({"columnNames": null})).unwrap();
        assert!(info.column_names.is_empty());
    }
}
