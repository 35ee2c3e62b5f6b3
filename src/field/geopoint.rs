// src/field/geopoint.rs

use super::{fmt_field, is_selected, write_xml_element, SubmissionField};
use crate::entity::{
    Entity, PropertyValue, ACCURACY_PROPERTY, ALTITUDE_PROPERTY, LATITUDE_PROPERTY,
    LONGITUDE_PROPERTY,
};
use crate::error::AggregateError;
use crate::form::{FieldType, Form};
use crate::geopoint::{format_decimal, GeoPoint};
use serde_json::{json, Map, Value};
use std::fmt;

/// A GPS location field, stored as four suffixed double properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeoPointField {
    property_name: String,
    coordinates: Option<GeoPoint>,
}

impl GeoPointField {
    /// A field with no coordinates.
    pub fn new(property_name: &str) -> Self {
        GeoPointField {
            property_name: property_name.to_string(),
            coordinates: None,
        }
    }

    pub fn with_value(property_name: &str, coordinates: GeoPoint) -> Self {
        GeoPointField {
            property_name: property_name.to_string(),
            coordinates: Some(coordinates),
        }
    }

    pub fn value(&self) -> Option<&GeoPoint> {
        self.coordinates.as_ref()
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.property_name, suffix)
    }
}

impl SubmissionField for GeoPointField {
    fn parse(property_name: &str, text: &str) -> Result<Self, AggregateError> {
        let coordinates = GeoPoint::parse(text).map_err(|e| match e {
            AggregateError::Decode(msg) => {
                AggregateError::Decode(format!("{}: {}", property_name, msg))
            }
            other => other,
        })?;
        Ok(GeoPointField::with_value(property_name, coordinates))
    }

    fn read_from_entity(property_name: &str, entity: &Entity, _form: &Form) -> Self {
        let mut field = GeoPointField::new(property_name);
        let latitude = entity.get_double(&field.key(LATITUDE_PROPERTY));
        let longitude = entity.get_double(&field.key(LONGITUDE_PROPERTY));
        let altitude = entity.get_double(&field.key(ALTITUDE_PROPERTY));
        let accuracy = entity.get_double(&field.key(ACCURACY_PROPERTY));

        field.coordinates = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::with_components(lat, lon, altitude, accuracy)),
            (None, None) => None,
            _ => {
                log::warn!(
                    "Entity {} has only half of the position for {}; treating it as absent",
                    entity.key,
                    property_name
                );
                None
            }
        };
        field
    }

    fn property_name(&self) -> &str {
        &self.property_name
    }

    fn field_type(&self) -> FieldType {
        FieldType::GeoPoint
    }

    fn has_value(&self) -> bool {
        self.coordinates.is_some()
    }

    fn value_text(&self) -> Option<String> {
        self.coordinates.map(|c| c.to_string())
    }

    fn geo_point(&self) -> Option<&GeoPoint> {
        self.coordinates.as_ref()
    }

    fn write_to_entity(&self, entity: &mut Entity) {
        let Some(c) = self.coordinates else {
            return;
        };
        entity.set(&self.key(LATITUDE_PROPERTY), c.latitude());
        entity.set(&self.key(LONGITUDE_PROPERTY), c.longitude());
        // Always written; Null marks a component the device did not report.
        entity.set(&self.key(ALTITUDE_PROPERTY), PropertyValue::from(c.altitude()));
        entity.set(&self.key(ACCURACY_PROPERTY), PropertyValue::from(c.accuracy()));
    }

    fn write_to_json(&self, json: &mut Map<String, Value>, selection: &[String]) {
        if !is_selected(&self.property_name, selection) {
            return;
        }
        let Some(c) = self.coordinates else {
            return;
        };
        json.insert(self.key(LATITUDE_PROPERTY), json!(c.latitude()));
        json.insert(self.key(LONGITUDE_PROPERTY), json!(c.longitude()));
        json.insert(self.key(ALTITUDE_PROPERTY), json!(c.altitude()));
        json.insert(self.key(ACCURACY_PROPERTY), json!(c.accuracy()));
    }

    fn write_to_xml(&self, buffer: &mut String) {
        let text = self.coordinates.map(|c| {
            c.components()
                .into_iter()
                .map(format_decimal)
                .collect::<Vec<_>>()
                .join(" ")
        });
        write_xml_element(buffer, &self.property_name, text.as_deref());
    }
}

impl fmt::Display for GeoPointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_field(
            f,
            &self.property_name,
            self.coordinates.as_ref().map(|c| c as &dyn fmt::Display),
        )
    }
}
