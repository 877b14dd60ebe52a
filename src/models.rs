// markdown-pdf-converter/src/models.rs

use crate::error::{ConversionError, Result};
use chrono::{DateTime, TimeZone, Utc};
use google_cloud_googleapis::pubsub::v1::PubsubMessage;
use serde::Deserialize;
use std::fmt;

/// Kind of change a storage notification describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Finalized,
    Deleted,
    Archived,
    MetadataUpdated,
    Other(String),
}

impl EventType {
    /// Accepts both Pub/Sub notification names and CloudEvent type names.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OBJECT_FINALIZE" | "google.cloud.storage.object.v1.finalized" => EventType::Finalized,
            "OBJECT_DELETE" | "google.cloud.storage.object.v1.deleted" => EventType::Deleted,
            "OBJECT_ARCHIVE" | "google.cloud.storage.object.v1.archived" => EventType::Archived,
            "OBJECT_METADATA_UPDATE" | "google.cloud.storage.object.v1.metadataUpdated" => {
                EventType::MetadataUpdated
            }
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, EventType::Finalized)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Finalized => f.write_str("OBJECT_FINALIZE"),
            EventType::Deleted => f.write_str("OBJECT_DELETE"),
            EventType::Archived => f.write_str("OBJECT_ARCHIVE"),
            EventType::MetadataUpdated => f.write_str("OBJECT_METADATA_UPDATE"),
            EventType::Other(raw) => f.write_str(raw),
        }
    }
}

/// A storage-change notification, validated at the boundary.
#[derive(Debug, Clone)]
pub struct StorageChangeEvent {
    pub event_type: EventType,
    /// Type string exactly as delivered, for logging.
    pub event_type_raw: String,
    pub bucket: String,
    pub object_name: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub event_id: String,
    pub event_source: String,
    pub event_time: Option<DateTime<Utc>>,
    pub payload_format: Option<String>,
    pub notification_config: Option<String>,
    pub object_generation: Option<String>,
}

/// JSON_API_V1 object resource carried in the notification body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: Option<String>,
    bucket: Option<String>,
    // The JSON API encodes int64 as a decimal string.
    size: Option<serde_json::Value>,
    content_type: Option<String>,
    updated: Option<DateTime<Utc>>,
}

impl StorageChangeEvent {
    pub fn from_pubsub(message: &PubsubMessage) -> Result<Self> {
        let payload: ObjectResource = if message.data.is_empty() {
            ObjectResource::default()
        } else {
            serde_json::from_slice(&message.data).map_err(|e| {
                ConversionError::InvalidEvent(format!("undecodable object payload: {}", e))
            })?
        };

        // Values are kept verbatim: object names may legally carry whitespace.
        let attr = |key: &str| {
            message
                .attributes
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };

        let event_type_raw = attr("eventType")
            .ok_or_else(|| ConversionError::InvalidEvent("missing eventType attribute".into()))?;
        let event_type = EventType::parse(event_type_raw.trim());

        let bucket = attr("bucketId")
            .or(payload.bucket)
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| ConversionError::InvalidEvent("missing bucket".into()))?;

        let object_name = attr("objectId")
            .or(payload.name)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ConversionError::InvalidEvent("missing object name".into()))?;

        let size = match payload.size {
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            _ => None,
        };

        let event_time = attr("eventTime")
            .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
            .map(|t| t.with_timezone(&Utc))
            .or(payload.updated)
            .or_else(|| {
                message
                    .publish_time
                    .as_ref()
                    .and_then(|ts| Utc.timestamp_opt(ts.seconds, ts.nanos as u32).single())
            });

        Ok(Self {
            event_source: format!("//storage.googleapis.com/projects/_/buckets/{}", bucket),
            event_type,
            event_type_raw,
            bucket,
            object_name,
            size,
            content_type: payload.content_type,
            event_id: message.message_id.clone(),
            event_time,
            payload_format: attr("payloadFormat"),
            notification_config: attr("notificationConfig"),
            object_generation: attr("objectGeneration"),
        })
    }
}

/// Canonical metadata as reported by the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
}

/// Splits `key` at the first occurrence of `extension` and keeps the prefix.
///
/// `report.txt` gives `report`; `a.txt.backup.txt` gives `a`. Returns `None`
/// when the extension does not occur or the prefix would be empty.
pub fn derive_base_name<'a>(key: &'a str, extension: &str) -> Option<&'a str> {
    if extension.is_empty() {
        return None;
    }
    let (base, _) = key.split_once(extension)?;
    if base.is_empty() || base.ends_with('/') {
        return None;
    }
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn notification(attrs: &[(&str, &str)], data: &str) -> PubsubMessage {
        PubsubMessage {
            data: data.as_bytes().to_vec(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            message_id: "4242".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn base_name_strips_single_extension() {
        assert_eq!(derive_base_name("report.txt", ".txt"), Some("report"));
    }

    #[test]
    fn base_name_splits_on_first_occurrence() {
        assert_eq!(derive_base_name("a.txt.backup.txt", ".txt"), Some("a"));
        assert_eq!(derive_base_name("a.txt.backup", ".txt"), Some("a"));
    }

    #[test]
    fn base_name_keeps_folder_prefix() {
        assert_eq!(derive_base_name("inbox/2024/notes.txt", ".txt"), Some("inbox/2024/notes"));
    }

    #[test]
    fn empty_base_name_is_rejected() {
        assert_eq!(derive_base_name(".txt", ".txt"), None);
        assert_eq!(derive_base_name("drafts/.txt", ".txt"), None);
        assert_eq!(derive_base_name("readme.md", ".txt"), None);
    }

    #[test]
    fn both_event_type_vocabularies_parse() {
        assert_eq!(EventType::parse("OBJECT_FINALIZE"), EventType::Finalized);
        assert_eq!(
            EventType::parse("google.cloud.storage.object.v1.finalized"),
            EventType::Finalized
        );
        assert_eq!(EventType::parse("OBJECT_DELETE"), EventType::Deleted);
        assert_eq!(
            EventType::parse("custom.event"),
            EventType::Other("custom.event".to_string())
        );
    }

    #[test]
    fn parses_json_api_notification() {
        let msg = notification(
            &[
                ("eventType", "OBJECT_FINALIZE"),
                ("bucketId", "uploads"),
                ("objectId", "notes.txt"),
                ("eventTime", "2024-05-01T10:00:00.000Z"),
            ],
            r#"{"kind":"storage#object","name":"notes.txt","bucket":"uploads","size":"128","contentType":"text/plain"}"#,
        );

        let event = StorageChangeEvent::from_pubsub(&msg).unwrap();
        assert!(event.event_type.is_finalized());
        assert_eq!(event.bucket, "uploads");
        assert_eq!(event.object_name, "notes.txt");
        assert_eq!(event.size, Some(128));
        assert_eq!(event.content_type.as_deref(), Some("text/plain"));
        assert_eq!(event.event_id, "4242");
        assert_eq!(
            event.event_source,
            "//storage.googleapis.com/projects/_/buckets/uploads"
        );
        assert!(event.event_time.is_some());
        assert_eq!(event.event_type_raw, "OBJECT_FINALIZE");
    }

    #[test]
    fn object_name_whitespace_is_preserved() {
        let msg = notification(
            &[
                ("eventType", "OBJECT_FINALIZE"),
                ("bucketId", "uploads"),
                ("objectId", " notes.txt "),
            ],
            r#"{"name":" notes.txt ","bucket":"uploads"}"#,
        );
        let event = StorageChangeEvent::from_pubsub(&msg).unwrap();
        assert_eq!(event.object_name, " notes.txt ");
    }

    #[test]
    fn keeps_delivered_type_and_notification_attributes() {
        let msg = notification(
            &[
                ("eventType", "google.cloud.storage.object.v1.finalized"),
                ("bucketId", "uploads"),
                ("objectId", "notes.txt"),
                ("payloadFormat", "JSON_API_V1"),
                ("notificationConfig", "projects/_/buckets/uploads/notificationConfigs/3"),
                ("objectGeneration", "1714557600000000"),
            ],
            "",
        );
        let event = StorageChangeEvent::from_pubsub(&msg).unwrap();
        assert!(event.event_type.is_finalized());
        assert_eq!(event.event_type_raw, "google.cloud.storage.object.v1.finalized");
        assert_eq!(event.payload_format.as_deref(), Some("JSON_API_V1"));
        assert_eq!(
            event.notification_config.as_deref(),
            Some("projects/_/buckets/uploads/notificationConfigs/3")
        );
        assert_eq!(event.object_generation.as_deref(), Some("1714557600000000"));
    }

    #[test]
    fn payload_fills_missing_attributes() {
        let msg = notification(
            &[("eventType", "OBJECT_FINALIZE")],
            r#"{"name":"doc.txt","bucket":"uploads","size":7}"#,
        );
        let event = StorageChangeEvent::from_pubsub(&msg).unwrap();
        assert_eq!(event.bucket, "uploads");
        assert_eq!(event.object_name, "doc.txt");
        assert_eq!(event.size, Some(7));
    }

    #[test]
    fn rejects_event_without_object_name() {
        let msg = notification(&[("eventType", "OBJECT_FINALIZE"), ("bucketId", "uploads")], "");
        let err = StorageChangeEvent::from_pubsub(&msg).unwrap_err();
        assert_eq!(err.error_type(), "invalid_event");
    }

    #[test]
    fn rejects_garbage_payload() {
        let msg = notification(&[("eventType", "OBJECT_FINALIZE")], "not json");
        assert!(matches!(
            StorageChangeEvent::from_pubsub(&msg),
            Err(ConversionError::InvalidEvent(_))
        ));
    }
}
