// src/kml.rs

use crate::config::DEFAULT_MAX_SUBMISSIONS;
use crate::datastore::SubmissionSource;
use crate::error::AggregateError;
use crate::form::{FieldType, Form, FormContext};
use crate::geopoint::GeoPoint;
use crate::submission::Submission;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use url::Url;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// What to put on the map: which form, which field locates each
/// submission, and which optional fields label and illustrate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmlRequest {
    pub form_id: String,
    pub geopoint_field: String,
    pub title_field: Option<String>,
    pub image_field: Option<String>,
    pub max_submissions: usize,
}

impl KmlRequest {
    pub fn new(form_id: &str, geopoint_field: &str) -> Self {
        KmlRequest {
            form_id: form_id.to_string(),
            geopoint_field: geopoint_field.to_string(),
            title_field: None,
            image_field: None,
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
        }
    }

    pub fn title_field(mut self, name: &str) -> Self {
        self.title_field = Some(name.to_string());
        self
    }

    pub fn image_field(mut self, name: &str) -> Self {
        self.image_field = Some(name.to_string());
        self
    }

    pub fn max_submissions(mut self, max: usize) -> Self {
        self.max_submissions = max;
        self
    }
}

/// One map marker, fully resolved before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub when: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub point: GeoPoint,
}

impl Placemark {
    /// Builds the marker for `submission`, or `None` when it has no location.
    pub fn from_submission(
        submission: &Submission,
        request: &KmlRequest,
        base_url: &Url,
    ) -> Option<Self> {
        let point = *submission.field(&request.geopoint_field)?.geo_point()?;

        let name = request
            .title_field
            .as_deref()
            .and_then(|title| submission.field(title))
            .and_then(|field| field.value_text())
            .unwrap_or_else(|| submission.key().to_string());

        let description = request
            .image_field
            .as_deref()
            .and_then(|image| submission.field(image))
            .filter(|field| field.has_value())
            .map(|field| {
                let mut buffer = String::new();
                field.write_to_xml_attachment(&mut buffer, base_url);
                buffer
            })
            .filter(|buffer| !buffer.is_empty());

        Some(Placemark {
            name,
            when: Some(submission.submitted_at()),
            description,
            point,
        })
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
        write_text_element(writer, "name", &self.name)?;
        if let Some(when) = self.when {
            writer.write_event(Event::Start(BytesStart::new("TimeStamp")))?;
            write_text_element(
                writer,
                "when",
                &when.to_rfc3339_opts(SecondsFormat::Secs, true),
            )?;
            writer.write_event(Event::End(BytesEnd::new("TimeStamp")))?;
        }
        if let Some(description) = &self.description {
            writer.write_event(Event::Start(BytesStart::new("description")))?;
            writer.write_event(Event::CData(BytesCData::new(description.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("description")))?;
        }
        writer.write_event(Event::Start(BytesStart::new("Point")))?;
        write_text_element(writer, "coordinates", &self.point.kml_coordinates())?;
        writer.write_event(Event::End(BytesEnd::new("Point")))?;
        writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
        Ok(())
    }
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Streams a KML document of one form's located submissions.
pub struct SubmissionKml<'a> {
    forms: &'a dyn FormContext,
    source: &'a dyn SubmissionSource,
    base_url: &'a Url,
}

impl<'a> SubmissionKml<'a> {
    pub fn new(
        forms: &'a dyn FormContext,
        source: &'a dyn SubmissionSource,
        base_url: &'a Url,
    ) -> Self {
        SubmissionKml {
            forms,
            source,
            base_url,
        }
    }

    /// Writes the document for `request` to `sink` and returns how many
    /// placemarks it holds.
    ///
    /// An unknown form or a failed retrieval is reported before anything is
    /// written. Submissions without a location are skipped. A submission that
    /// cannot be rebuilt mid-stream aborts the report with
    /// [`AggregateError::IncompleteSubmissionData`]; what was already written
    /// stays in `sink`.
    pub fn generate_kml<W: Write>(
        &self,
        request: &KmlRequest,
        sink: W,
    ) -> Result<usize, AggregateError> {
        let form = self.forms.form(&request.form_id)?;
        check_selections(form, request);
        let submissions = self.source.submissions(form, request.max_submissions)?;

        let mut writer = Writer::new_with_indent(sink, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("Document")))?;
        write_text_element(&mut writer, "name", form.name())?;

        let mut read = 0usize;
        let mut written = 0usize;
        for submission in submissions {
            let submission = submission?;
            read += 1;
            match Placemark::from_submission(&submission, request, self.base_url) {
                Some(placemark) => {
                    placemark.write(&mut writer)?;
                    written += 1;
                }
                None => log::debug!(
                    "Skipping submission {}: no value for {}",
                    submission.key(),
                    request.geopoint_field
                ),
            }
        }

        writer.write_event(Event::End(BytesEnd::new("Document")))?;
        writer.write_event(Event::End(BytesEnd::new("kml")))?;
        writer.into_inner().flush()?;

        log::info!(
            "KML for form {}: {} placemarks from {} submissions",
            form.form_id(),
            written,
            read
        );
        Ok(written)
    }
}

fn check_selections(form: &Form, request: &KmlRequest) {
    match form.field_type(&request.geopoint_field) {
        Some(FieldType::GeoPoint) => {}
        Some(other) => log::warn!(
            "Field {} of form {} is {:?}, not a geopoint; no placemarks will be produced",
            request.geopoint_field,
            form.form_id(),
            other
        ),
        None => log::warn!(
            "Form {} has no field {}; no placemarks will be produced",
            form.form_id(),
            request.geopoint_field
        ),
    }
    for name in [&request.title_field, &request.image_field]
        .into_iter()
        .flatten()
    {
        if form.field(name).is_none() {
            log::warn!("Form {} has no field {}; ignoring it", form.form_id(), name);
        }
    }
}
