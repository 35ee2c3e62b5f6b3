// src/field/mod.rs

//! The submission field contract and its concrete kinds.
//!
//! A field is decoded exactly once, either from submitted text
//! ([`SubmissionField::parse`]) or from a stored entity
//! ([`SubmissionField::read_from_entity`]). There are no setters: to decode
//! again, build a new field.

pub mod geopoint;
pub mod image;
pub mod string;

pub use geopoint::GeoPointField;
pub use image::ImageField;
pub use string::StringField;

use crate::entity::Entity;
use crate::error::AggregateError;
use crate::form::{FieldType, Form};
use crate::geopoint::GeoPoint;
use quick_xml::escape::escape;
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// Separates the property name from the value in a field's display form.
pub const TO_STRING_DELIMITER: &str = ": ";

/// One form field of one submission.
pub trait SubmissionField: fmt::Debug + fmt::Display {
    /// Decodes submitted text. Fails with [`AggregateError::Decode`] when the
    /// text does not match this kind's grammar.
    fn parse(property_name: &str, text: &str) -> Result<Self, AggregateError>
    where
        Self: Sized;

    /// Rebuilds the field from stored properties. Storage is trusted, so
    /// missing properties only leave parts of the value absent.
    fn read_from_entity(property_name: &str, entity: &Entity, form: &Form) -> Self
    where
        Self: Sized;

    fn property_name(&self) -> &str;

    fn field_type(&self) -> FieldType;

    fn has_value(&self) -> bool;

    /// Human readable value, used for placemark titles.
    fn value_text(&self) -> Option<String>;

    /// The point this field carries, if it is a located field with a value.
    fn geo_point(&self) -> Option<&GeoPoint> {
        None
    }

    /// Stores the value's components. Leaves the entity untouched when there is no value.
    fn write_to_entity(&self, entity: &mut Entity);

    /// Adds the value to `json` when this field's name is in `selection`.
    /// An absent value adds no keys.
    fn write_to_json(&self, json: &mut Map<String, Value>, selection: &[String]);

    /// Appends `<name>value</name>`, or `<name/>` when there is no value.
    fn write_to_xml(&self, buffer: &mut String);

    /// Appends a reference to this field's binary attachment. Most kinds
    /// carry none and write nothing.
    fn write_to_xml_attachment(&self, _buffer: &mut String, _base_url: &Url) {}
}

pub(crate) fn is_selected(property_name: &str, selection: &[String]) -> bool {
    selection.iter().any(|s| s == property_name)
}

pub(crate) fn write_xml_element(buffer: &mut String, name: &str, text: Option<&str>) {
    match text {
        Some(text) => {
            buffer.push('<');
            buffer.push_str(name);
            buffer.push('>');
            buffer.push_str(&escape(text));
            buffer.push_str("</");
            buffer.push_str(name);
            buffer.push('>');
        }
        None => {
            buffer.push('<');
            buffer.push_str(name);
            buffer.push_str("/>");
        }
    }
}

pub(crate) fn fmt_field(
    f: &mut fmt::Formatter<'_>,
    property_name: &str,
    value: Option<&dyn fmt::Display>,
) -> fmt::Result {
    write!(f, "{}{}", property_name, TO_STRING_DELIMITER)?;
    match value {
        Some(v) => write!(f, "{}", v),
        None => Ok(()),
    }
}
