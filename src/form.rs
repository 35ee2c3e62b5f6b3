// src/form.rs

use crate::entity::Entity;
use crate::error::AggregateError;
use crate::field::{GeoPointField, ImageField, StringField, SubmissionField};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

// Property names double as XML element names and storage key prefixes.
static PROPERTY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("valid property regex"));

/// The kinds of field a form can declare.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    GeoPoint,
    Image,
}

impl FieldType {
    /// A field of this kind with no value.
    pub fn empty_field(self, property_name: &str) -> Box<dyn SubmissionField> {
        match self {
            FieldType::String => Box::new(StringField::new(property_name)),
            FieldType::GeoPoint => Box::new(GeoPointField::new(property_name)),
            FieldType::Image => Box::new(ImageField::new(property_name)),
        }
    }

    /// Decodes submitted text into a field of this kind.
    pub fn parse_field(
        self,
        property_name: &str,
        text: &str,
    ) -> Result<Box<dyn SubmissionField>, AggregateError> {
        Ok(match self {
            FieldType::String => Box::new(StringField::parse(property_name, text)?),
            FieldType::GeoPoint => Box::new(GeoPointField::parse(property_name, text)?),
            FieldType::Image => Box::new(ImageField::parse(property_name, text)?),
        })
    }

    /// Rebuilds a field of this kind from stored properties. Never fails.
    pub fn read_field(
        self,
        property_name: &str,
        entity: &Entity,
        form: &Form,
    ) -> Box<dyn SubmissionField> {
        match self {
            FieldType::String => Box::new(StringField::read_from_entity(property_name, entity, form)),
            FieldType::GeoPoint => {
                Box::new(GeoPointField::read_from_entity(property_name, entity, form))
            }
            FieldType::Image => Box::new(ImageField::read_from_entity(property_name, entity, form)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

fn check_name(what: &str, name: &str) -> Result<(), AggregateError> {
    if PROPERTY_NAME.is_match(name) {
        return Ok(());
    }
    Err(AggregateError::InvalidInput(format!(
        "Invalid {} {:?}: must start with a letter or underscore and contain only letters, digits, '_', '-' or '.'",
        what, name
    )))
}

/// A form definition: its identifier, display name and ordered fields.
///
/// Deserialized forms go through the same checks as [`Form::new`] and
/// [`Form::with_field`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "RawForm")]
pub struct Form {
    form_id: String,
    name: String,
    fields: Vec<FormField>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawForm {
    form_id: String,
    name: String,
    #[serde(default)]
    fields: Vec<FormField>,
}

impl TryFrom<RawForm> for Form {
    type Error = AggregateError;

    fn try_from(raw: RawForm) -> Result<Self, Self::Error> {
        raw.fields
            .into_iter()
            .try_fold(Form::new(&raw.form_id, &raw.name)?, |form, field| {
                form.with_field(&field.name, field.field_type)
            })
    }
}

impl Form {
    /// Creates a form with no fields. The id names the root element of
    /// exported XML, so it follows the same rules as field names.
    pub fn new(form_id: &str, name: &str) -> Result<Self, AggregateError> {
        check_name("form id", form_id)?;
        Ok(Form {
            form_id: form_id.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
        })
    }

    /// Appends a field. Names must be usable as XML element names and unique.
    pub fn with_field(mut self, name: &str, field_type: FieldType) -> Result<Self, AggregateError> {
        check_name("field name", name)?;
        if self.field(name).is_some() {
            return Err(AggregateError::InvalidInput(format!(
                "Field {:?} is declared twice on form {}",
                name, self.form_id
            )));
        }
        self.fields.push(FormField {
            name: name.to_string(),
            field_type,
        });
        Ok(self)
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.field(name).map(|f| f.field_type)
    }
}

/// Resolves form identifiers to their definitions.
pub trait FormContext {
    fn form(&self, form_id: &str) -> Result<&Form, AggregateError>;
}

/// In-memory set of form definitions.
#[derive(Debug, Default, Clone)]
pub struct FormRegistry {
    forms: HashMap<String, Form>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a form, replacing any previous definition with the same id.
    pub fn register(&mut self, form: Form) {
        log::debug!("Registering form {}", form.form_id());
        self.forms.insert(form.form_id().to_string(), form);
    }
}

impl FormContext for FormRegistry {
    fn form(&self, form_id: &str) -> Result<&Form, AggregateError> {
        self.forms
            .get(form_id)
            .ok_or_else(|| AggregateError::FormNotFound(form_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_field_names() {
        let form = Form::new("survey", "Survey").unwrap();
        assert!(form.clone().with_field("1st", FieldType::String).is_err());
        assert!(form.clone().with_field("a b", FieldType::String).is_err());
        assert!(form.clone().with_field("<x>", FieldType::String).is_err());
        let form = form.with_field("location", FieldType::GeoPoint).unwrap();
        assert!(matches!(
            form.with_field("location", FieldType::String),
            Err(AggregateError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_form_is_not_found() {
        let mut registry = FormRegistry::new();
        registry.register(Form::new("survey", "Survey").unwrap());
        assert_eq!(registry.form("survey").unwrap().name(), "Survey");
        assert!(matches!(
            registry.form("missing"),
            Err(AggregateError::FormNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn rejects_unusable_form_ids() {
        for id in ["household survey", "", "9forms", "a><b"] {
            assert!(
                matches!(Form::new(id, "Survey"), Err(AggregateError::InvalidInput(_))),
                "{:?} should be rejected",
                id
            );
        }
        assert!(Form::new("household_survey", "Household Survey").is_ok());
    }

    #[test]
    fn deserialized_forms_are_checked() {
        let injected = serde_json::json!({
            "formId": "f",
            "name": "F",
            "fields": [
                { "name": "a><b", "type": "GeoPoint" }
            ]
        });
        assert!(serde_json::from_value::<Form>(injected).is_err());

        let duplicated = serde_json::json!({
            "formId": "f",
            "name": "F",
            "fields": [
                { "name": "loc", "type": "GeoPoint" },
                { "name": "loc", "type": "String" }
            ]
        });
        assert!(serde_json::from_value::<Form>(duplicated).is_err());

        let bad_id = serde_json::json!({ "formId": "my form", "name": "F", "fields": [] });
        assert!(serde_json::from_value::<Form>(bad_id).is_err());

        let form = Form::new("survey", "Survey")
            .and_then(|f| f.with_field("location", FieldType::GeoPoint))
            .and_then(|f| f.with_field("photo", FieldType::Image))
            .unwrap();
        let text = serde_json::to_string(&form).unwrap();
        assert_eq!(serde_json::from_str::<Form>(&text).unwrap(), form);
    }
}
