// src/submission.rs

use crate::entity::{Entity, SUBMISSION_DATE_PROPERTY};
use crate::error::AggregateError;
use crate::field::SubmissionField;
use crate::form::Form;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// JSON key carrying the submission key in exported objects.
pub const KEY_JSON_PROPERTY: &str = "key";

/// One filled-in form: a key, when it arrived, and one decoded field per
/// form field, in form order.
#[derive(Debug)]
pub struct Submission {
    form_id: String,
    key: String,
    submitted_at: DateTime<Utc>,
    fields: Vec<Box<dyn SubmissionField>>,
}

impl Submission {
    /// Decodes submitted `(field name, text)` pairs against `form`.
    ///
    /// Form fields without a supplied value stay empty. The first value that
    /// fails to decode aborts the whole submission; unknown names are
    /// rejected as invalid input.
    pub fn parse(
        form: &Form,
        key: &str,
        submitted_at: DateTime<Utc>,
        values: &[(&str, &str)],
    ) -> Result<Self, AggregateError> {
        if let Some((name, _)) = values.iter().find(|(name, _)| form.field(name).is_none()) {
            return Err(AggregateError::InvalidInput(format!(
                "Form {} has no field named {}",
                form.form_id(),
                name
            )));
        }

        let mut fields = Vec::with_capacity(form.fields().len());
        for form_field in form.fields() {
            let supplied = values
                .iter()
                .rev()
                .find(|(name, _)| *name == form_field.name)
                .map(|(_, text)| *text);
            let field = match supplied {
                Some(text) => form_field.field_type.parse_field(&form_field.name, text)?,
                None => form_field.field_type.empty_field(&form_field.name),
            };
            fields.push(field);
        }

        Ok(Submission {
            form_id: form.form_id().to_string(),
            key: key.to_string(),
            submitted_at,
            fields,
        })
    }

    /// Rebuilds a submission from its stored entity.
    ///
    /// Field values never fail to decode here; only an entity that is not a
    /// submission of `form` at all is rejected.
    pub fn from_entity(form: &Form, entity: &Entity) -> Result<Self, AggregateError> {
        if entity.kind != form.form_id() {
            return Err(AggregateError::IncompleteSubmissionData(format!(
                "Entity {} is of kind {}, expected {}",
                entity.key,
                entity.kind,
                form.form_id()
            )));
        }
        let submitted_at = entity.get_date(SUBMISSION_DATE_PROPERTY).ok_or_else(|| {
            AggregateError::IncompleteSubmissionData(format!(
                "Entity {} has no submission date",
                entity.key
            ))
        })?;

        let fields = form
            .fields()
            .iter()
            .map(|f| f.field_type.read_field(&f.name, entity, form))
            .collect();

        Ok(Submission {
            form_id: form.form_id().to_string(),
            key: entity.key.clone(),
            submitted_at,
            fields,
        })
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn SubmissionField> {
        self.fields.iter().map(|f| &**f)
    }

    pub fn field(&self, name: &str) -> Option<&dyn SubmissionField> {
        self.fields().find(|f| f.property_name() == name)
    }

    /// The persisted form of this submission.
    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(&self.form_id, &self.key);
        entity.set(SUBMISSION_DATE_PROPERTY, self.submitted_at);
        for field in &self.fields {
            field.write_to_entity(&mut entity);
        }
        entity
    }

    /// Flat JSON object holding the key and every selected field's keys.
    pub fn to_json(&self, selection: &[String]) -> Value {
        let mut json = Map::new();
        json.insert(
            KEY_JSON_PROPERTY.to_string(),
            Value::String(self.key.clone()),
        );
        for field in &self.fields {
            field.write_to_json(&mut json, selection);
        }
        Value::Object(json)
    }

    /// `<formId>` wrapping each field's inline XML, in form order.
    pub fn to_xml(&self) -> String {
        let mut buffer = String::new();
        buffer.push('<');
        buffer.push_str(&self.form_id);
        buffer.push('>');
        for field in &self.fields {
            field.write_to_xml(&mut buffer);
        }
        buffer.push_str("</");
        buffer.push_str(&self.form_id);
        buffer.push('>');
        buffer
    }

    /// Attachment references of every field that has one.
    pub fn to_xml_attachments(&self, base_url: &Url) -> String {
        let mut buffer = String::new();
        for field in &self.fields {
            field.write_to_xml_attachment(&mut buffer, base_url);
        }
        buffer
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.form_id, self.key)?;
        for field in &self.fields {
            write!(f, " {{{}}}", field)?;
        }
        Ok(())
    }
}
