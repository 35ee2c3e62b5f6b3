// src/entity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix of the stored latitude component of a geopoint field.
pub const LATITUDE_PROPERTY: &str = "_latitude";
/// Suffix of the stored longitude component of a geopoint field.
pub const LONGITUDE_PROPERTY: &str = "_longitude";
/// Suffix of the stored altitude component of a geopoint field.
pub const ALTITUDE_PROPERTY: &str = "_altitude";
/// Suffix of the stored accuracy component of a geopoint field.
pub const ACCURACY_PROPERTY: &str = "_accuracy";

/// Reserved property holding the time the server accepted a submission.
pub const SUBMISSION_DATE_PROPERTY: &str = "__submissionDate";

/// A single scalar stored on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    /// Written for a component that exists on the field but was not supplied.
    Null,
    Double(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

impl From<Option<f64>> for PropertyValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Double)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Date(value)
    }
}

/// A persisted submission: a keyed bag of scalar properties.
///
/// One logical form field may own several properties here, named by the
/// field's property name plus a kind-specific suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub key: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Entity {
    pub fn new(kind: &str, key: &str) -> Self {
        Entity {
            kind: kind.to_string(),
            key: key.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn set<V: Into<PropertyValue>>(&mut self, property: &str, value: V) {
        self.properties.insert(property.to_string(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.properties.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    /// Reads a double; missing, `Null` and non-numeric properties are all `None`.
    pub fn get_double(&self, property: &str) -> Option<f64> {
        match self.properties.get(property) {
            Some(PropertyValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, property: &str) -> Option<&str> {
        match self.properties.get(property) {
            Some(PropertyValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_date(&self, property: &str) -> Option<DateTime<Utc>> {
        match self.properties.get(property) {
            Some(PropertyValue::Date(d)) => Some(*d),
            _ => None,
        }
    }
}
