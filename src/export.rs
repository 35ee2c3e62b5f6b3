// src/export.rs

//! Request-side glue for the KML download: turns query parameters into a
//! [`KmlRequest`] and runs the report against a writer.

use crate::config::AggregateConfig;
use crate::datastore::SubmissionSource;
use crate::error::AggregateError;
use crate::form::FormContext;
use crate::kml::{KmlRequest, SubmissionKml};
use std::collections::HashMap;
use std::io::Write;

pub const FORM_ID_PARAM: &str = "odkId";
pub const GEOPOINT_FIELD_PARAM: &str = "geopointField";
pub const TITLE_FIELD_PARAM: &str = "titleField";
pub const IMAGE_FIELD_PARAM: &str = "imageField";
pub const NUMBER_SUBMISSIONS_PARAM: &str = "numberSubmissions";

pub const KML_CONTENT_TYPE: &str = "application/vnd.google-earth.kml+xml";
pub const KML_FILENAME_APPEND: &str = ".kml";

const INVALID_NUM_SUBMISSIONS_FORMAT: &str = "ERROR! INVALID NUMBER OF SUBMISSIONS FORMAT";

/// Download file name offered for a form's KML.
pub fn kml_file_name(form_id: &str) -> String {
    format!("{}{}", form_id, KML_FILENAME_APPEND)
}

fn param<'p>(params: &'p HashMap<String, String>, name: &str) -> Option<&'p str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Builds a [`KmlRequest`] from request parameters.
///
/// `odkId` and `geopointField` are required. `numberSubmissions` falls back to
/// the configured default and must otherwise be a non-negative integer.
pub fn kml_request_from_params(
    params: &HashMap<String, String>,
    config: &AggregateConfig,
) -> Result<KmlRequest, AggregateError> {
    let (Some(form_id), Some(geopoint_field)) = (
        param(params, FORM_ID_PARAM),
        param(params, GEOPOINT_FIELD_PARAM),
    ) else {
        return Err(AggregateError::InvalidInput(format!(
            "Missing required parameter: {} and {} must both be supplied",
            FORM_ID_PARAM, GEOPOINT_FIELD_PARAM
        )));
    };

    let max_submissions = match param(params, NUMBER_SUBMISSIONS_PARAM) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| AggregateError::InvalidInput(INVALID_NUM_SUBMISSIONS_FORMAT.to_string()))?,
        None => config.default_max_submissions,
    };

    let mut request = KmlRequest::new(form_id, geopoint_field).max_submissions(max_submissions);
    if let Some(title) = param(params, TITLE_FIELD_PARAM) {
        request = request.title_field(title);
    }
    if let Some(image) = param(params, IMAGE_FIELD_PARAM) {
        request = request.image_field(image);
    }
    Ok(request)
}

/// Resolves `params` and streams the resulting KML into `sink`.
///
/// Returns the number of placemarks written. Errors map to transport
/// outcomes through [`AggregateError::status_code`].
pub fn export_kml<W: Write>(
    config: &AggregateConfig,
    forms: &dyn FormContext,
    source: &dyn SubmissionSource,
    params: &HashMap<String, String>,
    sink: W,
) -> Result<usize, AggregateError> {
    let request = kml_request_from_params(params, config)?;
    log::debug!(
        "KML export of {} located by {} (cap {})",
        request.form_id,
        request.geopoint_field,
        request.max_submissions
    );
    SubmissionKml::new(forms, source, config.base_url()).generate_kml(&request, sink)
}
