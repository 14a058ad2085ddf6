use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::error::DatasetError;
use crate::matching::normalize;

/// One event code with its location in the tree and its option strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    /// Normalized code (the index key)
    pub code: String,
    pub category: String,
    pub subcategory: String,
    pub options: Vec<String>,
}

/// Two raw codes that normalized to the same key. The later one won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub key: String,
    pub displaced: String,
    pub winner: String,
}

/// Flattened, read-only view of the reference tree.
///
/// Records keep the order in which their keys first appeared in the file.
/// When two raw codes collide, the later record replaces the earlier one in
/// place and the collision is recorded.
#[derive(Debug, Default)]
pub struct DatasetIndex {
    records: Vec<Arc<ReferenceRecord>>,
    raw_codes: Vec<String>,
    by_code: HashMap<String, usize>,
    collisions: Vec<Collision>,
}

impl DatasetIndex {
    /// Reads and flattens the dataset file at `path`.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tree: Value = serde_json::from_str(&contents)?;

        Self::build(&tree)
    }

    /// Flattens a category → subcategory → code → options tree.
    pub fn build(tree: &Value) -> Result<Self, DatasetError> {
        let mut index = DatasetIndex::default();

        for (category, subcategories) in as_object(tree, String::new(), "an object of categories")? {
            let category_path = category.clone();
            for (subcategory, codes) in
                as_object(subcategories, category_path.clone(), "an object of subcategories")?
            {
                let subcategory_path = format!("{}.{}", category_path, subcategory);
                for (raw_code, options) in
                    as_object(codes, subcategory_path.clone(), "an object of event codes")?
                {
                    let code_path = format!("{}.{}", subcategory_path, raw_code);
                    let options = as_options(options, code_path)?;
                    index.insert(raw_code, category, subcategory, options);
                }
            }
        }

        Ok(index)
    }

    fn insert(&mut self, raw_code: &str, category: &str, subcategory: &str, options: Vec<String>) {
        let code = normalize(raw_code);
        let record = Arc::new(ReferenceRecord {
            code: code.clone(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            options,
        });

        match self.by_code.get(&code) {
            Some(&slot) => {
                self.collisions.push(Collision {
                    key: code,
                    displaced: std::mem::replace(&mut self.raw_codes[slot], raw_code.to_string()),
                    winner: raw_code.to_string(),
                });
                self.records[slot] = record;
            }
            None => {
                self.by_code.insert(code, self.records.len());
                self.records.push(record);
                self.raw_codes.push(raw_code.to_string());
            }
        }
    }

    /// Number of distinct normalized codes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by its normalized code.
    pub fn get(&self, code: &str) -> Option<&Arc<ReferenceRecord>> {
        self.by_code.get(code).map(|&slot| &self.records[slot])
    }

    pub fn options(&self, code: &str) -> Option<&[String]> {
        self.get(code).map(|r| r.options.as_slice())
    }

    /// Returns `(category, subcategory)` for a normalized code.
    pub fn path(&self, code: &str) -> Option<(&str, &str)> {
        self.get(code)
            .map(|r| (r.category.as_str(), r.subcategory.as_str()))
    }

    /// All records in index order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<ReferenceRecord>> {
        self.records.iter()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

fn as_object<'a>(
    value: &'a Value,
    path: String,
    expected: &'static str,
) -> Result<&'a Map<String, Value>, DatasetError> {
    value.as_object().ok_or_else(|| DatasetError::Malformed {
        path: if path.is_empty() { "<root>".to_string() } else { path },
        expected,
    })
}

fn as_options(value: &Value, path: String) -> Result<Vec<String>, DatasetError> {
    let malformed = || DatasetError::Malformed {
        path: path.clone(),
        expected: "a list of option strings",
    };

    value
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|option| option.as_str().map(str::to_string).ok_or_else(malformed))
        .collect()
}
