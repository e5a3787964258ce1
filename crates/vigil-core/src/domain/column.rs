//! Per-column cosmetic status.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Status of one dataset column as shown while a run is in flight.
///
/// Pending -> Checking -> Done, never backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStatus {
    #[default]
    Pending,
    Checking,
    Done,
}

impl ColumnStatus {
    fn rank(self) -> u8 {
        match self {
            ColumnStatus::Pending => 0,
            ColumnStatus::Checking => 1,
            ColumnStatus::Done => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    pub status: ColumnStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<String>,
}

/// Ordered set of unique column names, each with a status.
///
/// Keys are fixed at construction; only statuses change afterwards.
/// On the wire it is the plain entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnEntry>", into = "Vec<ColumnEntry>")]
pub struct ColumnSet {
    entries: Vec<ColumnEntry>,
    /// name -> position in `entries`
    index: HashMap<String, usize>,
}

impl ColumnSet {
    /// Build from declared names. Duplicates keep their first position.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| ColumnEntry {
                name: name.into(),
                status: ColumnStatus::Pending,
                sub_status: None,
            })
            .collect::<Vec<_>>()
            .into()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnEntry> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnEntry> {
        self.index.get(name).and_then(|&i| self.entries.get(i))
    }

    pub fn status_of(&self, name: &str) -> Option<ColumnStatus> {
        self.get(name).map(|e| e.status)
    }

    /// Move a column forward. Returns false for unknown names or backwards moves.
    pub fn advance(&mut self, name: &str, status: ColumnStatus, sub_status: Option<String>) -> bool {
        let Some(entry) = self.index.get(name).and_then(|&i| self.entries.get_mut(i)) else {
            return false;
        };
        if status.rank() < entry.status.rank() {
            return false;
        }
        entry.status = status;
        entry.sub_status = sub_status;
        true
    }

    /// Mark every column that is not yet done as done. Returns how many moved.
    pub fn force_complete(&mut self) -> usize {
        let mut forced = 0;
        for entry in self.entries.iter_mut().filter(|e| e.status != ColumnStatus::Done) {
            entry.status = ColumnStatus::Done;
            entry.sub_status = None;
            forced += 1;
        }
        forced
    }

    pub fn all_done(&self) -> bool {
        self.entries.iter().all(|e| e.status == ColumnStatus::Done)
    }

    pub fn count(&self, status: ColumnStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

impl From<Vec<ColumnEntry>> for ColumnSet {
    fn from(declared: Vec<ColumnEntry>) -> Self {
        let mut entries = Vec::with_capacity(declared.len());
        let mut index = HashMap::with_capacity(declared.len());
        for entry in declared {
            if index.contains_key(&entry.name) {
                tracing::debug!(column = %entry.name, "duplicate column name ignored");
                continue;
            }
            index.insert(entry.name.clone(), entries.len());
            entries.push(entry);
        }
        Self { entries, index }
    }
}

impl From<ColumnSet> for Vec<ColumnEntry> {
    fn from(set: ColumnSet) -> Self {
        set.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order_and_drops_duplicates() {
        let set = ColumnSet::from_names(["age", "income", "age", "label"]);
        assert_eq!(set.names(), vec!["age", "income", "label"]);
        assert_eq!(set.count(ColumnStatus::Pending), 3);
    }

    #[test]
    fn advance_is_forward_only() {
        let mut set = ColumnSet::from_names(["age"]);
        assert!(set.advance("age", ColumnStatus::Checking, Some("scanning".into())));
        assert!(set.advance("age", ColumnStatus::Done, None));
        assert!(!set.advance("age", ColumnStatus::Checking, None));
        assert_eq!(set.status_of("age"), Some(ColumnStatus::Done));
    }

    #[test]
    fn advance_unknown_column_is_rejected() {
        let mut set = ColumnSet::from_names(["age"]);
        assert!(!set.advance("nope", ColumnStatus::Done, None));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn force_complete_counts_only_unfinished() {
        let mut set = ColumnSet::from_names(["a", "b", "c"]);
        set.advance("a", ColumnStatus::Done, None);
        set.advance("b", ColumnStatus::Checking, Some("x".into()));
        assert_eq!(set.force_complete(), 2);
        assert!(set.all_done());
        assert_eq!(set.get("b").and_then(|e| e.sub_status.clone()), None);
    }

    #[test]
    fn wide_set_dedups_and_finds_by_name() {
        let names: Vec<String> = (0..5000).chain(0..5000).map(|i| format!("col_{i}")).collect();
        let mut set = ColumnSet::from_names(names);
        assert_eq!(set.len(), 5000);
        assert_eq!(set.names()[4999], "col_4999");
        assert!(set.advance("col_4321", ColumnStatus::Checking, None));
        assert_eq!(set.status_of("col_4321"), Some(ColumnStatus::Checking));
        assert_eq!(set.count(ColumnStatus::Checking), 1);
    }

    #[test]
    fn wire_form_is_the_entry_list() {
        let mut set = ColumnSet::from_names(["age", "label"]);
        set.advance("age", ColumnStatus::Done, None);
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"name": "age", "status": "done"},
                {"name": "label", "status": "pending"}
            ])
        );

        let back: ColumnSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, set);
        assert_eq!(back.status_of("label"), Some(ColumnStatus::Pending));
    }

    #[test]
    fn empty_set_is_trivially_done() {
        let mut set = ColumnSet::default();
        assert!(set.all_done());
        assert_eq!(set.force_complete(), 0);
    }
}
