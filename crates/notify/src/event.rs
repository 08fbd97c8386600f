use serde::{Deserialize, Deserializer};

/// Name of the only event the channel acts on.
const EVENT_PROCESSING_COMPLETE: &str = "processing_complete";

/// Server-pushed fact: the pipeline finished processing a document.
///
/// Arrives zero or one time per document, with no ordering guarantee
/// relative to the HTTP response that acknowledged the upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessingComplete {
    #[serde(deserialize_with = "de_document_id")]
    pub document_id: String,
    #[serde(default)]
    pub filename: String,
}

/// The server sends integer document ids; older builds sent strings.
fn de_document_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    })
}

/// Parses one text frame into a [`ProcessingComplete`] event.
///
/// Returns `None` for malformed JSON, unknown events, or a missing
/// document id — all of which are dropped silently by contract.
pub fn parse_event(text: &str) -> Option<ProcessingComplete> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if value.get("event")?.as_str()? != EVENT_PROCESSING_COMPLETE {
        return None;
    }
    serde_json::from_value(value).ok()
}
