//! Ground-truth store: `<code>.nutriments.json` files under a data directory

use super::{numeric, SourceError, SourceResult};
use crate::config::NutrientTable;
use crate::models::{present, NutrientValues};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File name suffix of a ground-truth document
pub const GROUND_TRUTH_SUFFIX: &str = ".nutriments.json";

/// Index of ground-truth files, keyed by product code (sorted)
#[derive(Debug, Clone)]
pub struct GroundTruthStore {
    files: BTreeMap<String, PathBuf>,
}

impl GroundTruthStore {
    /// Walk `data_dir` recursively and index every ground-truth file.
    pub fn open(data_dir: &Path) -> SourceResult<Self> {
        if !data_dir.is_dir() {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("data directory not found: {}", data_dir.display()),
            )));
        }

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(data_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(code) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(GROUND_TRUTH_SUFFIX))
                .filter(|code| !code.is_empty())
            else {
                continue;
            };
            files.insert(code.to_string(), entry.path().to_path_buf());
        }

        debug!(
            "Indexed {} ground-truth files under {}",
            files.len(),
            data_dir.display()
        );

        Ok(Self { files })
    }

    /// Product codes in ascending order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.files.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Read and normalize the ground truth of one product.
    pub fn load(&self, code: &str, table: &NutrientTable) -> SourceResult<NutrientValues> {
        let path = self.files.get(code).ok_or_else(|| SourceError::MissingField {
            code: code.to_string(),
            field: format!("{}{}", code, GROUND_TRUTH_SUFFIX),
        })?;
        let content = std::fs::read_to_string(path)?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| SourceError::MalformedResponse {
                code: code.to_string(),
                reason: e.to_string(),
            })?;
        parse_ground_truth(code, &document, table)
    }
}

/// Extract ground-truth values from a flat nutriments document.
///
/// Missing or non-numeric fields are absent values; only a non-object
/// document is an error.
pub fn parse_ground_truth(
    code: &str,
    document: &Value,
    table: &NutrientTable,
) -> SourceResult<NutrientValues> {
    let fields = document
        .as_object()
        .ok_or_else(|| SourceError::MalformedResponse {
            code: code.to_string(),
            reason: "ground truth is not a JSON object".to_string(),
        })?;

    let values = table
        .iter()
        .map(|spec| {
            let unit = spec
                .ground_truth_unit_key
                .as_deref()
                .and_then(|key| fields.get(key))
                .and_then(Value::as_str);
            let value = present(fields.get(&spec.ground_truth_key).and_then(numeric))
                .map(|v| spec.unit.normalize(v, unit));
            (spec.nutrient, value)
        })
        .collect();

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrient;
    use serde_json::json;

    #[test]
    fn test_parse_ground_truth_fields() {
        let doc = json!({
            "energy_value": 1100,
            "energy_unit": "kJ",
            "proteins_100g": 8.2,
            "sugars_100g": "4.5",
            "sodium_100g": 0.4,
            "fat_100g": -1,
            "unrelated": "x"
        });
        let values = parse_ground_truth("1", &doc, &NutrientTable::default()).unwrap();
        assert_eq!(values[&Nutrient::Energy], Some(262.0));
        assert_eq!(values[&Nutrient::Protein], Some(8.2));
        assert_eq!(values[&Nutrient::Sugar], Some(4.5));
        assert_eq!(values[&Nutrient::Salt], Some(0.4));
        assert_eq!(values[&Nutrient::Fat], None);
        assert_eq!(values[&Nutrient::Fiber], None);
        assert_eq!(values.len(), Nutrient::COUNT);
    }

    #[test]
    fn test_parse_ground_truth_kcal_energy_untouched() {
        let doc = json!({"energy_value": 250.0, "energy_unit": "kcal"});
        let values = parse_ground_truth("1", &doc, &NutrientTable::default()).unwrap();
        assert_eq!(values[&Nutrient::Energy], Some(250.0));
    }

    #[test]
    fn test_parse_ground_truth_rejects_non_object() {
        let err = parse_ground_truth("1", &json!([1, 2]), &NutrientTable::default()).unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_store_indexes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("200.nutriments.json"), "{}").unwrap();
        std::fs::write(nested.join("100.nutriments.json"), r#"{"fat_100g": 2}"#).unwrap();
        std::fs::write(dir.path().join("300.json"), "{}").unwrap();

        let store = GroundTruthStore::open(dir.path()).unwrap();
        assert_eq!(store.codes().collect::<Vec<_>>(), ["100", "200"]);
        assert!(store.contains("100"));
        assert!(!store.contains("300"));

        let values = store.load("100", &NutrientTable::default()).unwrap();
        assert_eq!(values[&Nutrient::Fat], Some(2.0));
    }

    #[test]
    fn test_store_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.nutriments.json"), "{not json").unwrap();
        let store = GroundTruthStore::open(dir.path()).unwrap();
        let err = store.load("1", &NutrientTable::default()).unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_store_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GroundTruthStore::open(&dir.path().join("nope")).is_err());
    }
}
