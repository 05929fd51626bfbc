//! Catalog Record Structures
//!
//! Defines the two-level hierarchy the editor works on: `LabelRecord` parents
//! owning `ValueRecord` children.
//!
//! # Examples
//!
//! ```rust
//! use catalog_core::models::{LabelFields, LabelRecord, RecordStatus, ValueFields, ValueRecord};
//!
//! let label = LabelRecord::with_values(
//!     LabelFields {
//!         label_id: "COLORS".to_string(),
//!         name: "Colors".to_string(),
//!         index: "COLOR".to_string(),
//!         ..Default::default()
//!     },
//!     vec![ValueRecord::new(ValueFields {
//!         value_id: "RED".to_string(),
//!         value: "Red".to_string(),
//!         ..Default::default()
//!     })],
//! );
//!
//! // Values are normalized against their owner on construction
//! assert_eq!(label.values[0].fields.label_id, "COLORS");
//! assert_eq!(label.values[0].inherited.index, "COLOR");
//! assert_eq!(label.status, RecordStatus::None);
//! ```

use serde::{Deserialize, Serialize};

/// Transient UI highlighting tag for a record with staged changes
///
/// Never sent to the backend. Cleared by `CatalogStaging::clear_statuses`
/// after a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    #[default]
    None,
    PendingCreate,
    PendingUpdate,
    PendingDelete,
}

impl RecordStatus {
    pub fn is_pending(&self) -> bool {
        !matches!(self, RecordStatus::None)
    }
}

/// Attributes of a label, as persisted by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelFields {
    /// Label identifier, unique among labels
    #[serde(rename = "IDETIQUETA")]
    pub label_id: String,

    #[serde(rename = "IDSOCIEDAD", default)]
    pub company_id: i64,

    #[serde(rename = "IDCEDI", default)]
    pub cedi_id: i64,

    /// Display name of the label
    #[serde(rename = "ETIQUETA", default)]
    pub name: String,

    #[serde(rename = "INDICE", default)]
    pub index: String,

    #[serde(rename = "COLECCION", default)]
    pub collection: String,

    #[serde(rename = "SECCION", default)]
    pub section: String,

    #[serde(rename = "SECUENCIA", default)]
    pub sequence: i64,

    #[serde(rename = "IMAGEN", default)]
    pub image: Option<String>,

    #[serde(rename = "ROUTE", default)]
    pub route: Option<String>,

    #[serde(rename = "DESCRIPCION", default)]
    pub description: String,
}

/// Attributes of a value, as persisted by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueFields {
    /// Value identifier, unique across all values of all labels
    #[serde(rename = "IDVALOR")]
    pub value_id: String,

    /// Owning label. Always equal to the owner's `label_id` inside a hierarchy.
    #[serde(rename = "IDETIQUETA", default)]
    pub label_id: String,

    #[serde(rename = "IDSOCIEDAD", default)]
    pub company_id: i64,

    #[serde(rename = "IDCEDI", default)]
    pub cedi_id: i64,

    /// Logical parent value (value-level hierarchy). Data only, never ownership.
    #[serde(rename = "IDVALORPA", default)]
    pub parent_value_id: Option<String>,

    #[serde(rename = "VALOR", default)]
    pub value: String,

    #[serde(rename = "ALIAS", default)]
    pub alias: String,

    #[serde(rename = "SECUENCIA", default)]
    pub sequence: i64,

    #[serde(rename = "IDVALORSAP", default)]
    pub sap_id: String,

    #[serde(rename = "DESCRIPCION", default)]
    pub description: String,

    #[serde(rename = "IMAGEN", default)]
    pub image: Option<String>,

    #[serde(rename = "ROUTE", default)]
    pub route: Option<String>,
}

/// Display attributes a value copies from its owning label
///
/// Kept in sync by [`LabelRecord::propagate_to_values`]; not part of the
/// value's persisted attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InheritedFields {
    #[serde(rename = "INDICE", default)]
    pub index: String,

    #[serde(rename = "COLECCION", default)]
    pub collection: String,

    #[serde(rename = "SECCION", default)]
    pub section: String,
}

/// A label together with its values and its transient status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(flatten)]
    pub fields: LabelFields,

    #[serde(default)]
    pub status: RecordStatus,

    /// Owned values. Order is not significant.
    #[serde(default)]
    pub values: Vec<ValueRecord>,
}

/// A value owned by exactly one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    #[serde(flatten)]
    pub fields: ValueFields,

    #[serde(flatten)]
    pub inherited: InheritedFields,

    #[serde(default)]
    pub status: RecordStatus,
}

impl ValueRecord {
    pub fn new(fields: ValueFields) -> Self {
        Self {
            fields,
            inherited: InheritedFields::default(),
            status: RecordStatus::None,
        }
    }

    pub fn id(&self) -> &str {
        &self.fields.value_id
    }
}

impl LabelRecord {
    /// Create a label without values
    pub fn new(fields: LabelFields) -> Self {
        Self {
            fields,
            status: RecordStatus::None,
            values: Vec::new(),
        }
    }

    /// Create a label owning `values`, normalizing them against the label
    pub fn with_values(fields: LabelFields, values: Vec<ValueRecord>) -> Self {
        let mut label = Self {
            fields,
            status: RecordStatus::None,
            values,
        };
        label.propagate_to_values();
        label
    }

    pub fn id(&self) -> &str {
        &self.fields.label_id
    }

    /// Attributes every owned value mirrors
    pub fn inherited(&self) -> InheritedFields {
        InheritedFields {
            index: self.fields.index.clone(),
            collection: self.fields.collection.clone(),
            section: self.fields.section.clone(),
        }
    }

    /// Propagate the label's identity and inherited attributes to its values
    ///
    /// Rewrites every value's owning `label_id` (rename cascade) and inherited
    /// display attributes. Values are neither added nor removed.
    ///
    /// Returns how many values had their owning id rewritten.
    pub fn propagate_to_values(&mut self) -> usize {
        let inherited = self.inherited();
        let mut renamed = 0;
        for value in &mut self.values {
            if value.fields.label_id != self.fields.label_id {
                value.fields.label_id = self.fields.label_id.clone();
                renamed += 1;
            }
            value.inherited = inherited.clone();
        }
        renamed
    }

    pub fn value(&self, value_id: &str) -> Option<&ValueRecord> {
        self.values.iter().find(|v| v.id() == value_id)
    }

    pub fn value_mut(&mut self, value_id: &str) -> Option<&mut ValueRecord> {
        self.values.iter_mut().find(|v| v.id() == value_id)
    }

    /// Reset the status of the label and all of its values
    pub fn clear_statuses(&mut self) {
        self.status = RecordStatus::None;
        for value in &mut self.values {
            value.status = RecordStatus::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label(id: &str) -> LabelFields {
        LabelFields {
            label_id: id.to_string(),
            name: format!("Label {}", id),
            index: "IDX".to_string(),
            collection: "catalog".to_string(),
            section: "main".to_string(),
            ..Default::default()
        }
    }

    fn value(id: &str, owner: &str) -> ValueRecord {
        ValueRecord::new(ValueFields {
            value_id: id.to_string(),
            label_id: owner.to_string(),
            value: format!("Value {}", id),
            ..Default::default()
        })
    }

    #[test]
    fn test_with_values_normalizes_owner_and_inherited_fields() {
        let record = LabelRecord::with_values(label("L1"), vec![value("V1", ""), value("V2", "L1")]);

        for v in &record.values {
            assert_eq!(v.fields.label_id, "L1");
            assert_eq!(v.inherited.index, "IDX");
            assert_eq!(v.inherited.collection, "catalog");
            assert_eq!(v.inherited.section, "main");
        }
    }

    #[test]
    fn test_propagate_to_values_rewrites_owner_after_rename() {
        let mut record =
            LabelRecord::with_values(label("A"), vec![value("V1", "A"), value("V2", "A")]);

        record.fields.label_id = "B".to_string();
        record.fields.section = "archive".to_string();
        let renamed = record.propagate_to_values();

        assert_eq!(renamed, 2);
        assert_eq!(record.values.len(), 2);
        assert!(record.values.iter().all(|v| v.fields.label_id == "B"));
        assert!(record.values.iter().all(|v| v.inherited.section == "archive"));
    }

    #[test]
    fn test_clear_statuses_resets_label_and_values() {
        let mut record = LabelRecord::with_values(label("L1"), vec![value("V1", "L1")]);
        record.status = RecordStatus::PendingUpdate;
        record.values[0].status = RecordStatus::PendingDelete;

        record.clear_statuses();

        assert_eq!(record.status, RecordStatus::None);
        assert_eq!(record.values[0].status, RecordStatus::None);
    }

    #[test]
    fn test_label_record_deserializes_backend_field_names() {
        let json = json!({
            "IDETIQUETA": "SIZES",
            "IDSOCIEDAD": 1000,
            "IDCEDI": 1001,
            "ETIQUETA": "Sizes",
            "INDICE": "SIZE",
            "COLECCION": "products",
            "SECCION": "attributes",
            "SECUENCIA": 2,
            "IMAGEN": null,
            "ROUTE": "/sizes",
            "DESCRIPCION": "Garment sizes",
            "values": [
                { "IDVALOR": "S", "IDETIQUETA": "SIZES", "VALOR": "Small", "ALIAS": "s" }
            ]
        });

        let record: LabelRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.id(), "SIZES");
        assert_eq!(record.fields.company_id, 1000);
        assert_eq!(record.fields.route.as_deref(), Some("/sizes"));
        assert!(record.fields.image.is_none());
        assert_eq!(record.status, RecordStatus::None);
        assert_eq!(record.values.len(), 1);
        assert_eq!(record.values[0].fields.alias, "s");
        assert_eq!(record.values[0].status, RecordStatus::None);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_value(RecordStatus::PendingDelete).unwrap();
        assert_eq!(json, "pendingDelete");
        assert!(RecordStatus::PendingCreate.is_pending());
        assert!(!RecordStatus::None.is_pending());
    }
}
