//! Response classification.
//!
//! # Design
//! `classify` maps a response body and status code to exactly one outcome.
//! The checks run in a fixed order and the first match wins:
//!
//! 1. single error message
//! 2. error collection
//! 3. status outside the success allow-list
//! 4. empty body
//! 5. PDF document (bytes 1..4 spell `PDF`)
//! 6. XML document (body starts with `<Nfse>`)
//! 7. JSON
//!
//! Structured errors are checked before the status code because the API
//! sends them with both failing and successful statuses. The document checks
//! compare literal bytes at fixed offsets since the API does not reliably set
//! `Content-Type`; a JSON body that happened to start with those bytes would
//! be misread, which is a known limitation of the wire format.

use tracing::debug;

use crate::error::{ApiError, ErrorCollection, ErrorMessage, StructuredError};

/// Status codes treated as success.
pub const SUCCESS_STATUSES: [u16; 5] = [100, 200, 201, 202, 204];

const PDF_MARKER: &[u8] = b"PDF";
const NFSE_MARKER: &[u8] = b"<Nfse>";

/// A non-empty successful response body, tagged by the shape that was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document<'a> {
    /// Raw PDF bytes.
    Pdf(&'a [u8]),
    /// Raw `<Nfse>` XML text.
    Nfse(&'a [u8]),
    /// Any other body, expected to be JSON.
    Json(&'a [u8]),
}

impl Document<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Document::Pdf(_) => "pdf",
            Document::Nfse(_) => "xml",
            Document::Json(_) => "json",
        }
    }
}

/// Successful classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// Empty body with a success status. Nothing to decode.
    Empty,
    Document(Document<'a>),
}

/// Classify a response. Pure: the same inputs always give the same outcome.
pub fn classify(body: &[u8], status: u16) -> Result<Outcome<'_>, ApiError> {
    let erm = ErrorMessage::probe(body);
    if erm.is_error() {
        debug!(status, "response is a single error message");
        return Err(ApiError::MessageError(erm));
    }

    let errs = ErrorCollection::probe(body);
    if errs.is_error() {
        debug!(status, count = errs.count(), "response is an error collection");
        return Err(ApiError::CollectionError(errs));
    }

    if !SUCCESS_STATUSES.contains(&status) {
        debug!(status, "response status is not a success");
        let message = if body.is_empty() {
            status_text(status)
        } else {
            String::from_utf8_lossy(body).into_owned()
        };
        return Err(ApiError::HttpError { status, message });
    }

    if body.is_empty() {
        return Ok(Outcome::Empty);
    }

    let document = if is_pdf(body) {
        Document::Pdf(body)
    } else if is_nfse(body) {
        Document::Nfse(body)
    } else {
        Document::Json(body)
    };
    debug!(status, kind = document.kind(), bytes = body.len(), "response classified");
    Ok(Outcome::Document(document))
}

/// Render a status line such as `500 Internal Server Error`.
pub fn status_text(status: u16) -> String {
    match ::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("{status} {reason}"),
        None => status.to_string(),
    }
}

fn is_pdf(body: &[u8]) -> bool {
    body.len() > 3 && &body[1..4] == PDF_MARKER
}

fn is_nfse(body: &[u8]) -> bool {
    body.len() > 5 && body.starts_with(NFSE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_error_wins_over_success_status() {
        let err = classify(br#"{"message":"bad thing"}"#, 200).unwrap_err();
        assert!(matches!(err, ApiError::MessageError(ref m) if m.message == "bad thing"));
    }

    #[test]
    fn single_error_wins_over_failing_status() {
        let err = classify(br#"{"message":"not found"}"#, 404).unwrap_err();
        assert!(matches!(err, ApiError::MessageError(_)));
    }

    #[test]
    fn error_collection_wins_over_success_status() {
        let err = classify(br#"[{"message":"a"},{"message":"b"}]"#, 201).unwrap_err();
        match err {
            ApiError::CollectionError(errs) => assert_eq!(errs.count(), 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_message_falls_through_to_json() {
        let outcome = classify(br#"{"message":""}"#, 200).unwrap();
        assert!(matches!(outcome, Outcome::Document(Document::Json(_))));
    }

    #[test]
    fn failing_status_uses_body_text() {
        let err = classify(b"internal failure", 500).unwrap_err();
        match err {
            ApiError::HttpError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal failure");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failing_status_with_empty_body_uses_status_text() {
        let err = classify(b"", 500).unwrap_err();
        assert_eq!(err.to_string(), "500 Internal Server Error");
    }

    #[test]
    fn unlisted_success_codes_are_failures() {
        // 203 and 206 are 2xx but not in the allow-list.
        assert!(matches!(classify(b"", 203), Err(ApiError::HttpError { status: 203, .. })));
        assert!(matches!(classify(b"", 206), Err(ApiError::HttpError { status: 206, .. })));
    }

    #[test]
    fn every_listed_status_with_empty_body_is_empty() {
        for status in SUCCESS_STATUSES {
            assert_eq!(classify(b"", status).unwrap(), Outcome::Empty, "{status}");
        }
    }

    #[test]
    fn pdf_is_sniffed_at_offset_one() {
        let body = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3";
        assert_eq!(classify(body, 200).unwrap(), Outcome::Document(Document::Pdf(body)));
    }

    #[test]
    fn pdf_marker_needs_more_than_three_bytes() {
        // "xPD" is too short to carry the marker at offset 1..4.
        let outcome = classify(b"xPD", 200).unwrap();
        assert!(matches!(outcome, Outcome::Document(Document::Json(_))));
        assert!(matches!(
            classify(b"PDF-", 200).unwrap(),
            Outcome::Document(Document::Json(_))
        ));
    }

    #[test]
    fn nfse_is_sniffed_at_start() {
        let body = b"<Nfse><Numero>1</Numero></Nfse>";
        assert_eq!(classify(body, 200).unwrap(), Outcome::Document(Document::Nfse(body)));
        assert!(matches!(
            classify(b" <Nfse></Nfse>", 200).unwrap(),
            Outcome::Document(Document::Json(_))
        ));
    }

    #[test]
    fn classification_is_repeatable() {
        let cases: [(&[u8], u16); 4] = [
            (br#"{"message":"x"}"#, 400),
            (b"", 204),
            (b"%PDF-1.7", 200),
            (br#"{"id":"abc"}"#, 200),
        ];
        for (body, status) in cases {
            let first = format!("{:?}", classify(body, status));
            let second = format!("{:?}", classify(body, status));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn status_text_falls_back_to_code() {
        assert_eq!(status_text(404), "404 Not Found");
        assert_eq!(status_text(599), "599");
    }
}
