// src/field/string.rs

use super::{fmt_field, is_selected, write_xml_element, SubmissionField};
use crate::entity::Entity;
use crate::error::AggregateError;
use crate::form::{FieldType, Form};
use serde_json::{Map, Value};
use std::fmt;

/// Free text, stored as one property under the bare field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringField {
    property_name: String,
    value: Option<String>,
}

impl StringField {
    pub fn new(property_name: &str) -> Self {
        StringField {
            property_name: property_name.to_string(),
            value: None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl SubmissionField for StringField {
    /// Any text is valid.
    fn parse(property_name: &str, text: &str) -> Result<Self, AggregateError> {
        Ok(StringField {
            property_name: property_name.to_string(),
            value: Some(text.to_string()),
        })
    }

    fn read_from_entity(property_name: &str, entity: &Entity, _form: &Form) -> Self {
        StringField {
            property_name: property_name.to_string(),
            value: entity.get_text(property_name).map(str::to_string),
        }
    }

    fn property_name(&self) -> &str {
        &self.property_name
    }

    fn field_type(&self) -> FieldType {
        FieldType::String
    }

    fn has_value(&self) -> bool {
        self.value.is_some()
    }

    fn value_text(&self) -> Option<String> {
        self.value.clone()
    }

    fn write_to_entity(&self, entity: &mut Entity) {
        if let Some(value) = &self.value {
            entity.set(&self.property_name, value.as_str());
        }
    }

    fn write_to_json(&self, json: &mut Map<String, Value>, selection: &[String]) {
        if !is_selected(&self.property_name, selection) {
            return;
        }
        if let Some(value) = &self.value {
            json.insert(self.property_name.clone(), Value::String(value.clone()));
        }
    }

    fn write_to_xml(&self, buffer: &mut String) {
        write_xml_element(buffer, &self.property_name, self.value.as_deref());
    }
}

impl fmt::Display for StringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_field(
            f,
            &self.property_name,
            self.value.as_ref().map(|v| v as &dyn fmt::Display),
        )
    }
}
