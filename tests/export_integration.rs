use crate::test_utils::shared::{config, registry_with, store_submission, survey_form};
use odk_aggregate::export::{
    export_kml, kml_file_name, kml_request_from_params, FORM_ID_PARAM, GEOPOINT_FIELD_PARAM,
    IMAGE_FIELD_PARAM, NUMBER_SUBMISSIONS_PARAM, TITLE_FIELD_PARAM,
};
use odk_aggregate::{AggregateError, KmlRequest, MemoryDatastore};
use std::collections::HashMap;


#[cfg(test)]
mod export_tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_request_from_full_params() {
        let request = kml_request_from_params(
            &params(&[
                (FORM_ID_PARAM, "household_survey"),
                (GEOPOINT_FIELD_PARAM, "location"),
                (TITLE_FIELD_PARAM, "household_name"),
                (IMAGE_FIELD_PARAM, "photo"),
                (NUMBER_SUBMISSIONS_PARAM, "25"),
            ]),
            &config(),
        )
        .unwrap();
        assert_eq!(
            request,
            KmlRequest::new("household_survey", "location")
                .title_field("household_name")
                .image_field("photo")
                .max_submissions(25)
        );
    }

    #[test]
    fn test_request_defaults() {
        let config = config().with_default_max_submissions(7);
        let request = kml_request_from_params(
            &params(&[
                (FORM_ID_PARAM, "household_survey"),
                (GEOPOINT_FIELD_PARAM, "location"),
                (TITLE_FIELD_PARAM, ""),
            ]),
            &config,
        )
        .unwrap();
        assert_eq!(request.max_submissions, 7);
        assert!(request.title_field.is_none());
        assert!(request.image_field.is_none());
    }

    #[test]
    fn test_missing_or_bad_params_are_rejected() {
        let missing = kml_request_from_params(&params(&[(FORM_ID_PARAM, "x")]), &config());
        assert!(matches!(missing, Err(AggregateError::InvalidInput(_))));

        let bad_count = kml_request_from_params(
            &params(&[
                (FORM_ID_PARAM, "x"),
                (GEOPOINT_FIELD_PARAM, "location"),
                (NUMBER_SUBMISSIONS_PARAM, "ten"),
            ]),
            &config(),
        );
        match bad_count {
            Err(e @ AggregateError::InvalidInput(_)) => {
                assert_eq!(e.status_code(), 400);
                assert!(e.to_string().contains("INVALID NUMBER OF SUBMISSIONS FORMAT"));
            }
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_export_kml_end_to_end() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        store_submission(&datastore, &form, "sub-1", 0, &[("location", "1 2")]);
        store_submission(&datastore, &form, "sub-2", 1, &[("location", "3 4")]);

        let mut out = Vec::new();
        let written = export_kml(
            &config(),
            &forms,
            &datastore,
            &params(&[
                (FORM_ID_PARAM, "household_survey"),
                (GEOPOINT_FIELD_PARAM, "location"),
                (NUMBER_SUBMISSIONS_PARAM, "1"),
            ]),
            &mut out,
        )
        .unwrap();
        assert_eq!(written, 1);
        let kml = String::from_utf8(out).unwrap();
        assert!(kml.contains("<name>sub-1</name>"));
        assert!(!kml.contains("sub-2"));
    }

    #[test]
    fn test_export_unknown_form_is_not_found() {
        let form = survey_form();
        let forms = registry_with(&form);
        let datastore = MemoryDatastore::new();
        let mut out = Vec::new();
        let err = export_kml(
            &config(),
            &forms,
            &datastore,
            &params(&[(FORM_ID_PARAM, "ghost"), (GEOPOINT_FIELD_PARAM, "location")]),
            &mut out,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(out.is_empty());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(kml_file_name("household_survey"), "household_survey.kml");
    }
}
