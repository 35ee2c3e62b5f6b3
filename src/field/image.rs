// src/field/image.rs

use super::{fmt_field, is_selected, write_xml_element, SubmissionField};
use crate::entity::Entity;
use crate::error::AggregateError;
use crate::form::{FieldType, Form};
use quick_xml::escape::escape;
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// Path, relative to the server base, that serves stored attachments.
pub const IMAGE_VIEWER_PATH: &str = "imageViewer";
/// Query parameter naming the attachment to serve.
pub const BLOB_KEY_PARAM: &str = "blobKey";

/// A photo attachment. The field itself only holds the blob key of the
/// uploaded image; the bytes live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageField {
    property_name: String,
    blob_key: Option<String>,
}

impl ImageField {
    pub fn new(property_name: &str) -> Self {
        ImageField {
            property_name: property_name.to_string(),
            blob_key: None,
        }
    }

    pub fn blob_key(&self) -> Option<&str> {
        self.blob_key.as_deref()
    }

    /// Where the attachment can be fetched from, relative to `base_url`.
    pub fn download_url(&self, base_url: &Url) -> Option<Url> {
        let blob_key = self.blob_key.as_deref()?;
        match base_url.join(IMAGE_VIEWER_PATH) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair(BLOB_KEY_PARAM, blob_key);
                Some(url)
            }
            Err(e) => {
                log::warn!(
                    "Cannot build attachment URL for {} from {}: {}",
                    self.property_name,
                    base_url,
                    e
                );
                None
            }
        }
    }
}

impl SubmissionField for ImageField {
    fn parse(property_name: &str, text: &str) -> Result<Self, AggregateError> {
        let blob_key = text.trim();
        if blob_key.is_empty() {
            return Err(AggregateError::Decode(format!(
                "{}: attachment reference is empty",
                property_name
            )));
        }
        Ok(ImageField {
            property_name: property_name.to_string(),
            blob_key: Some(blob_key.to_string()),
        })
    }

    fn read_from_entity(property_name: &str, entity: &Entity, _form: &Form) -> Self {
        ImageField {
            property_name: property_name.to_string(),
            blob_key: entity.get_text(property_name).map(str::to_string),
        }
    }

    fn property_name(&self) -> &str {
        &self.property_name
    }

    fn field_type(&self) -> FieldType {
        FieldType::Image
    }

    fn has_value(&self) -> bool {
        self.blob_key.is_some()
    }

    fn value_text(&self) -> Option<String> {
        self.blob_key.clone()
    }

    fn write_to_entity(&self, entity: &mut Entity) {
        if let Some(blob_key) = &self.blob_key {
            entity.set(&self.property_name, blob_key.as_str());
        }
    }

    fn write_to_json(&self, json: &mut Map<String, Value>, selection: &[String]) {
        if !is_selected(&self.property_name, selection) {
            return;
        }
        if let Some(blob_key) = &self.blob_key {
            json.insert(self.property_name.clone(), Value::String(blob_key.clone()));
        }
    }

    fn write_to_xml(&self, buffer: &mut String) {
        write_xml_element(buffer, &self.property_name, self.blob_key.as_deref());
    }

    fn write_to_xml_attachment(&self, buffer: &mut String, base_url: &Url) {
        let (Some(blob_key), Some(url)) = (self.blob_key.as_deref(), self.download_url(base_url))
        else {
            return;
        };
        buffer.push_str("<mediaFile><filename>");
        buffer.push_str(&escape(blob_key));
        buffer.push_str("</filename><downloadUrl>");
        buffer.push_str(&escape(url.as_str()));
        buffer.push_str("</downloadUrl></mediaFile>");
    }
}

impl fmt::Display for ImageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_field(
            f,
            &self.property_name,
            self.blob_key.as_ref().map(|v| v as &dyn fmt::Display),
        )
    }
}
