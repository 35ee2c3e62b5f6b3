pub mod config;
pub mod datastore;
pub mod entity;
pub mod error;
pub mod export;
pub mod field;
pub mod form;
pub mod geopoint;
pub mod kml;
pub mod submission;

pub use config::AggregateConfig;
pub use datastore::{MemoryDatastore, SubmissionSource};
pub use entity::{Entity, PropertyValue};
pub use error::AggregateError;
pub use field::{GeoPointField, ImageField, StringField, SubmissionField};
pub use form::{FieldType, Form, FormContext, FormRegistry};
pub use geopoint::GeoPoint;
pub use kml::{KmlRequest, Placemark, SubmissionKml};
pub use submission::Submission;
