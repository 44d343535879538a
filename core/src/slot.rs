//! Caller-owned output slots.
//!
//! The caller passes `&mut` to a slot and the client writes the decoded body
//! into it. Each slot type accepts one document kind:
//!
//! | slot        | accepts            |
//! |-------------|--------------------|
//! | `Vec<u8>`   | PDF bytes          |
//! | `String`    | `<Nfse>` XML       |
//! | `Option<T>` | JSON, as `T`       |
//! | `()`        | JSON, discarded    |
//!
//! Any other pairing is `ApiError::SlotMismatch`. An empty response never
//! touches the slot.

use serde::de::{DeserializeOwned, IgnoredAny};

use crate::classify::Document;
use crate::error::ApiError;

/// Destination for a successfully classified response body.
pub trait ResponseSlot {
    /// Name of the document kind this slot accepts, used in mismatch errors.
    const EXPECTS: &'static str;

    fn fill(&mut self, document: Document<'_>) -> Result<(), ApiError>;
}

fn mismatch<S: ResponseSlot + ?Sized>(document: &Document<'_>) -> ApiError {
    ApiError::SlotMismatch {
        expected: S::EXPECTS,
        received: document.kind(),
    }
}

impl ResponseSlot for Vec<u8> {
    const EXPECTS: &'static str = "pdf";

    fn fill(&mut self, document: Document<'_>) -> Result<(), ApiError> {
        match document {
            Document::Pdf(bytes) => {
                *self = bytes.to_vec();
                Ok(())
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ResponseSlot for String {
    const EXPECTS: &'static str = "xml";

    fn fill(&mut self, document: Document<'_>) -> Result<(), ApiError> {
        match document {
            Document::Nfse(bytes) => {
                *self = String::from_utf8_lossy(bytes).into_owned();
                Ok(())
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: DeserializeOwned> ResponseSlot for Option<T> {
    const EXPECTS: &'static str = "json";

    fn fill(&mut self, document: Document<'_>) -> Result<(), ApiError> {
        match document {
            Document::Json(bytes) => {
                let value = serde_json::from_slice(bytes).map_err(ApiError::DeserializationError)?;
                *self = Some(value);
                Ok(())
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ResponseSlot for () {
    const EXPECTS: &'static str = "json";

    fn fill(&mut self, document: Document<'_>) -> Result<(), ApiError> {
        match document {
            Document::Json(bytes) => {
                serde_json::from_slice::<IgnoredAny>(bytes).map_err(ApiError::DeserializationError)?;
                Ok(())
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Invoice {
        id: String,
        total: f64,
    }

    #[test]
    fn bytes_slot_takes_pdf() {
        let mut slot: Vec<u8> = Vec::new();
        slot.fill(Document::Pdf(b"%PDF-1.4")).unwrap();
        assert_eq!(slot, b"%PDF-1.4");
    }

    #[test]
    fn string_slot_takes_nfse() {
        let mut slot = String::new();
        slot.fill(Document::Nfse(b"<Nfse></Nfse>")).unwrap();
        assert_eq!(slot, "<Nfse></Nfse>");
    }

    #[test]
    fn string_slot_replaces_invalid_utf8() {
        let mut slot = String::new();
        slot.fill(Document::Nfse(b"<Nfse>\xffS\xe3o Paulo</Nfse>")).unwrap();
        assert_eq!(slot, "<Nfse>\u{FFFD}S\u{FFFD}o Paulo</Nfse>");
    }

    #[test]
    fn option_slot_takes_json() {
        let mut slot: Option<Invoice> = None;
        slot.fill(Document::Json(br#"{"id":"abc","total":12.5}"#)).unwrap();
        assert_eq!(
            slot,
            Some(Invoice {
                id: "abc".to_string(),
                total: 12.5
            })
        );
    }

    #[test]
    fn option_slot_reports_bad_json() {
        let mut slot: Option<Invoice> = None;
        let err = slot.fill(Document::Json(br#"{"id":1}"#)).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
        assert!(slot.is_none());
    }

    #[test]
    fn mismatched_slots_are_rejected() {
        let err = Vec::<u8>::new().fill(Document::Nfse(b"<Nfse>")).unwrap_err();
        assert!(matches!(
            err,
            ApiError::SlotMismatch {
                expected: "pdf",
                received: "xml"
            }
        ));

        let err = String::new().fill(Document::Pdf(b"%PDF")).unwrap_err();
        assert!(matches!(err, ApiError::SlotMismatch { expected: "xml", .. }));

        let mut slot: Option<Invoice> = None;
        let err = slot.fill(Document::Pdf(b"%PDF")).unwrap_err();
        assert!(matches!(err, ApiError::SlotMismatch { expected: "json", .. }));
    }

    #[test]
    fn unit_slot_validates_and_discards_json() {
        assert!(().fill(Document::Json(br#"{"anything":[1,2]}"#)).is_ok());
        assert!(matches!(
            ().fill(Document::Json(b"{oops")),
            Err(ApiError::DeserializationError(_))
        ));
    }
}
