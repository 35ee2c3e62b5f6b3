use crate::test_utils::shared::{
    config, count_placemarks, registry_with, store_submission, submitted_at, survey_form,
};
use odk_aggregate::entity::SUBMISSION_DATE_PROPERTY;
use odk_aggregate::{
    AggregateError, Entity, FormRegistry, KmlRequest, MemoryDatastore, Placemark, Submission,
    SubmissionKml,
};


#[cfg(test)]
mod kml_tests {
    use super::*;

    fn generate(
        forms: &FormRegistry,
        datastore: &MemoryDatastore,
        request: &KmlRequest,
    ) -> (Result<usize, AggregateError>, String) {
        let config = config();
        let mut out = Vec::new();
        let result =
            SubmissionKml::new(forms, datastore, config.base_url()).generate_kml(request, &mut out);
        (result, String::from_utf8(out).expect("KML is UTF-8"))
    }

    #[test]
    fn test_truncation_applies_before_location_filtering() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        for i in 1..=10u32 {
            let key = format!("sub-{}", i);
            if i <= 2 {
                store_submission(&datastore, &form, &key, i, &[("household_name", "none")]);
            } else {
                let location = format!("{} {}", i, i * 2);
                store_submission(&datastore, &form, &key, i, &[("location", location.as_str())]);
            }
        }

        let request = KmlRequest::new("household_survey", "location").max_submissions(3);
        let (result, kml) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(count_placemarks(&kml), 1);
        assert!(kml.contains("<name>sub-3</name>"));
        assert!(kml.contains("<coordinates>6.0,3.0</coordinates>"));
        assert!(!kml.contains("sub-4"));
    }

    #[test]
    fn test_placemarks_follow_retrieval_order() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        store_submission(&datastore, &form, "c", 0, &[("location", "50 5")]);
        store_submission(&datastore, &form, "a", 1, &[("location", "10 1")]);
        store_submission(&datastore, &form, "b", 2, &[("location", "30 3")]);

        let request = KmlRequest::new("household_survey", "location");
        let (result, kml) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 3);
        let c = kml.find("<name>c</name>").unwrap();
        let a = kml.find("<name>a</name>").unwrap();
        let b = kml.find("<name>b</name>").unwrap();
        assert!(c < a && a < b);
    }

    #[test]
    fn test_empty_result_is_a_valid_document() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();

        let request = KmlRequest::new("household_survey", "location");
        let (result, kml) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(count_placemarks(&kml), 0);
        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(kml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
        assert!(kml.contains("<name>Household Survey</name>"));
        assert!(kml.trim_end().ends_with("</kml>"));
    }

    #[test]
    fn test_unknown_form_writes_nothing() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        store_submission(&datastore, &form, "sub-1", 0, &[("location", "1 2")]);

        let request = KmlRequest::new("no_such_form", "location");
        let (result, kml) = generate(&forms, &datastore, &request);
        assert!(matches!(result, Err(AggregateError::FormNotFound(id)) if id == "no_such_form"));
        assert!(kml.is_empty());
    }

    #[test]
    fn test_title_and_image_selection() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        store_submission(
            &datastore,
            &form,
            "sub-1",
            0,
            &[
                ("location", "-1.5 36.75 1700"),
                ("household_name", "Mwangi & Daughters"),
                ("photo", "blob-1"),
            ],
        );
        store_submission(&datastore, &form, "sub-2", 1, &[("location", "1 2")]);

        let request = KmlRequest::new("household_survey", "location")
            .title_field("household_name")
            .image_field("photo");
        let (result, kml) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 2);

        assert!(kml.contains("<name>Mwangi &amp; Daughters</name>"));
        assert!(kml.contains("<coordinates>36.75,-1.5,1700.0</coordinates>"));
        assert!(kml.contains("<when>2024-05-17T09:00:00Z</when>"));
        assert!(kml.contains(
            "<description><![CDATA[<mediaFile><filename>blob-1</filename>\
             <downloadUrl>http://aggregate.example.org/odk/imageViewer?blobKey=blob-1</downloadUrl>\
             </mediaFile>]]></description>"
        ));

        // No title value falls back to the key, no photo means no description.
        assert!(kml.contains("<name>sub-2</name>"));
        assert_eq!(kml.matches("<description>").count(), 1);
    }

    #[test]
    fn test_unknown_selections_degrade() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        store_submission(&datastore, &form, "sub-1", 0, &[("location", "1 2")]);

        let request = KmlRequest::new("household_survey", "location")
            .title_field("missing_title")
            .image_field("missing_photo");
        let (result, kml) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 1);
        assert!(kml.contains("<name>sub-1</name>"));
        assert!(!kml.contains("<description>"));

        let request = KmlRequest::new("household_survey", "household_name");
        let (result, kml) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(count_placemarks(&kml), 0);
    }

    #[test]
    fn test_corrupt_entity_fails_the_report() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        store_submission(&datastore, &form, "sub-1", 0, &[("location", "1 2")]);
        let mut corrupt = Entity::new("household_survey", "sub-2");
        corrupt.set("location_latitude", 3.0);
        corrupt.set("location_longitude", 4.0);
        datastore.put(corrupt).unwrap();

        let request = KmlRequest::new("household_survey", "location");
        let (result, _) = generate(&forms, &datastore, &request);
        assert!(matches!(
            result,
            Err(AggregateError::IncompleteSubmissionData(_))
        ));

        let mut repaired = Entity::new("household_survey", "sub-2");
        repaired.set(SUBMISSION_DATE_PROPERTY, submitted_at(1));
        datastore.put(repaired).unwrap();
        let (result, _) = generate(&forms, &datastore, &request);
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_placemark_requires_location() {
        let form = survey_form();
        let config = config();
        let request = KmlRequest::new("household_survey", "location");

        let unlocated =
            Submission::parse(&form, "sub-1", submitted_at(0), &[("household_name", "x")])
                .unwrap();
        assert!(Placemark::from_submission(&unlocated, &request, config.base_url()).is_none());

        let located =
            Submission::parse(&form, "sub-2", submitted_at(0), &[("location", "0 0")]).unwrap();
        let placemark =
            Placemark::from_submission(&located, &request, config.base_url()).unwrap();
        assert_eq!(placemark.name, "sub-2");
        assert_eq!(placemark.point.kml_coordinates(), "0.0,0.0");
        assert!(placemark.description.is_none());
    }
}
