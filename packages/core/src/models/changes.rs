//! Partial Record Updates
//!
//! `LabelChanges` and `ValueChanges` carry only the attributes an edit touches.
//! Two pending edits on the same record collapse through [`LabelChanges::merge`]
//! / [`ValueChanges::merge`] (newer value wins per field), and an edit lands on a
//! record, or on a not-yet-sent creation payload, through `apply_to`.
//!
//! # Double-Option Pattern for Nullable Fields
//!
//! Nullable attributes (`image`, `route`, `parent_value_id`) use a double
//! `Option` so an edit can distinguish between:
//!
//! - `None`: leave the attribute unchanged (field omitted)
//! - `Some(None)`: clear the attribute (`null`)
//! - `Some(Some(value))`: set the attribute

use super::record::{LabelFields, ValueFields};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a nullable field into the double-Option pattern
///
/// - Missing field → None (don't update)
/// - null → Some(None) (clear)
/// - "value" → Some(Some("value")) (set)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Missing field is handled by #[serde(default)] on the struct field
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

fn merge_field<T>(slot: &mut Option<T>, newer: Option<T>) {
    if newer.is_some() {
        *slot = newer;
    }
}

fn apply_field<T: Clone>(target: &mut T, change: &Option<T>) {
    if let Some(value) = change {
        *target = value.clone();
    }
}

/// Partial update of a label's attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelChanges {
    /// Renames the label. Owned values follow the new id.
    #[serde(rename = "IDETIQUETA", default, skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,

    #[serde(rename = "IDSOCIEDAD", default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,

    #[serde(rename = "IDCEDI", default, skip_serializing_if = "Option::is_none")]
    pub cedi_id: Option<i64>,

    #[serde(rename = "ETIQUETA", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "INDICE", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(rename = "COLECCION", default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(rename = "SECCION", default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    #[serde(rename = "SECUENCIA", default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    #[serde(
        rename = "IMAGEN",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub image: Option<Option<String>>,

    #[serde(
        rename = "ROUTE",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub route: Option<Option<String>>,

    #[serde(rename = "DESCRIPCION", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LabelChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label_id(mut self, label_id: impl Into<String>) -> Self {
        self.label_id = Some(label_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// New label id if this update renames a label currently called `current`
    pub fn renames(&self, current: &str) -> Option<&str> {
        self.label_id.as_deref().filter(|id| *id != current)
    }

    /// Shallow-merge a newer edit into this one; fields set in `newer` win
    pub fn merge(&mut self, newer: LabelChanges) {
        merge_field(&mut self.label_id, newer.label_id);
        merge_field(&mut self.company_id, newer.company_id);
        merge_field(&mut self.cedi_id, newer.cedi_id);
        merge_field(&mut self.name, newer.name);
        merge_field(&mut self.index, newer.index);
        merge_field(&mut self.collection, newer.collection);
        merge_field(&mut self.section, newer.section);
        merge_field(&mut self.sequence, newer.sequence);
        merge_field(&mut self.image, newer.image);
        merge_field(&mut self.route, newer.route);
        merge_field(&mut self.description, newer.description);
    }

    /// Write every set field onto `fields`
    pub fn apply_to(&self, fields: &mut LabelFields) {
        apply_field(&mut fields.label_id, &self.label_id);
        apply_field(&mut fields.company_id, &self.company_id);
        apply_field(&mut fields.cedi_id, &self.cedi_id);
        apply_field(&mut fields.name, &self.name);
        apply_field(&mut fields.index, &self.index);
        apply_field(&mut fields.collection, &self.collection);
        apply_field(&mut fields.section, &self.section);
        apply_field(&mut fields.sequence, &self.sequence);
        apply_field(&mut fields.image, &self.image);
        apply_field(&mut fields.route, &self.route);
        apply_field(&mut fields.description, &self.description);
    }
}

/// Partial update of a value's attributes
///
/// There is no owning-label field: an update never moves a value to another label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueChanges {
    #[serde(rename = "IDVALOR", default, skip_serializing_if = "Option::is_none")]
    pub value_id: Option<String>,

    #[serde(rename = "IDSOCIEDAD", default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,

    #[serde(rename = "IDCEDI", default, skip_serializing_if = "Option::is_none")]
    pub cedi_id: Option<i64>,

    #[serde(
        rename = "IDVALORPA",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_value_id: Option<Option<String>>,

    #[serde(rename = "VALOR", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "ALIAS", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(rename = "SECUENCIA", default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    #[serde(rename = "IDVALORSAP", default, skip_serializing_if = "Option::is_none")]
    pub sap_id: Option<String>,

    #[serde(rename = "DESCRIPCION", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "IMAGEN",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub image: Option<Option<String>>,

    #[serde(
        rename = "ROUTE",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub route: Option<Option<String>>,
}

impl ValueChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_id(mut self, value_id: impl Into<String>) -> Self {
        self.value_id = Some(value_id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_parent_value_id(mut self, parent_value_id: Option<String>) -> Self {
        self.parent_value_id = Some(parent_value_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// New value id if this update renames a value currently called `current`
    pub fn renames(&self, current: &str) -> Option<&str> {
        self.value_id.as_deref().filter(|id| *id != current)
    }

    /// Shallow-merge a newer edit into this one; fields set in `newer` win
    pub fn merge(&mut self, newer: ValueChanges) {
        merge_field(&mut self.value_id, newer.value_id);
        merge_field(&mut self.company_id, newer.company_id);
        merge_field(&mut self.cedi_id, newer.cedi_id);
        merge_field(&mut self.parent_value_id, newer.parent_value_id);
        merge_field(&mut self.value, newer.value);
        merge_field(&mut self.alias, newer.alias);
        merge_field(&mut self.sequence, newer.sequence);
        merge_field(&mut self.sap_id, newer.sap_id);
        merge_field(&mut self.description, newer.description);
        merge_field(&mut self.image, newer.image);
        merge_field(&mut self.route, newer.route);
    }

    /// Write every set field onto `fields`
    pub fn apply_to(&self, fields: &mut ValueFields) {
        apply_field(&mut fields.value_id, &self.value_id);
        apply_field(&mut fields.company_id, &self.company_id);
        apply_field(&mut fields.cedi_id, &self.cedi_id);
        apply_field(&mut fields.parent_value_id, &self.parent_value_id);
        apply_field(&mut fields.value, &self.value);
        apply_field(&mut fields.alias, &self.alias);
        apply_field(&mut fields.sequence, &self.sequence);
        apply_field(&mut fields.sap_id, &self.sap_id);
        apply_field(&mut fields.description, &self.description);
        apply_field(&mut fields.image, &self.image);
        apply_field(&mut fields.route, &self.route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_newer_wins_per_field() {
        let mut staged = LabelChanges::new().with_name("First").with_sequence(1);
        staged.merge(LabelChanges::new().with_name("Second").with_section("tail"));

        assert_eq!(staged.name.as_deref(), Some("Second"));
        assert_eq!(staged.sequence, Some(1));
        assert_eq!(staged.section.as_deref(), Some("tail"));
        assert!(staged.label_id.is_none());
    }

    #[test]
    fn test_merge_keeps_explicit_clear() {
        let mut staged = ValueChanges::new().with_parent_value_id(Some("P".to_string()));
        staged.merge(ValueChanges::new().with_parent_value_id(None));

        assert_eq!(staged.parent_value_id, Some(None));
    }

    #[test]
    fn test_apply_to_only_touches_set_fields() {
        let mut fields = ValueFields {
            value_id: "V1".to_string(),
            value: "Old".to_string(),
            alias: "old".to_string(),
            parent_value_id: Some("V0".to_string()),
            ..Default::default()
        };

        ValueChanges::new()
            .with_alias("new")
            .with_parent_value_id(None)
            .apply_to(&mut fields);

        assert_eq!(fields.value, "Old");
        assert_eq!(fields.alias, "new");
        assert!(fields.parent_value_id.is_none());
    }

    #[test]
    fn test_renames_ignores_same_id() {
        let changes = LabelChanges::new().with_label_id("A");
        assert_eq!(changes.renames("A"), None);
        assert_eq!(changes.renames("Z"), Some("A"));
        assert_eq!(LabelChanges::new().renames("A"), None);
    }

    #[test]
    fn test_double_option_deserialization() {
        let omitted: LabelChanges = serde_json::from_value(json!({ "ETIQUETA": "x" })).unwrap();
        assert_eq!(omitted.image, None);

        let cleared: LabelChanges = serde_json::from_value(json!({ "IMAGEN": null })).unwrap();
        assert_eq!(cleared.image, Some(None));

        let set: LabelChanges = serde_json::from_value(json!({ "IMAGEN": "a.png" })).unwrap();
        assert_eq!(set.image, Some(Some("a.png".to_string())));
    }

    #[test]
    fn test_serialization_skips_untouched_fields() {
        let json = serde_json::to_value(ValueChanges::new().with_alias("a")).unwrap();
        assert_eq!(json, json!({ "ALIAS": "a" }));
        assert!(ValueChanges::new().is_empty());
        assert!(!LabelChanges::new().with_name("n").is_empty());
    }
}
