// DynamoStreamDecoder - DynamoDB Streamsイベントを変更バッチに変換
//
// INSERT/MODIFYレコードのNewImageをエンティティとしてデシリアライズし、
// 配信順を保ったChangeBatchにまとめる。REMOVEは変更フィードの対象外のためスキップする。
// 1件でもデコードできないレコードがあればエラーを返し、Lambdaの再試行に委ねる。

use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{ChangeBatch, Entity};

/// ストリームレコードのデコードエラー
#[derive(Debug, Error)]
pub enum ChangeStreamError {
    /// NewImageが欠損しています（ストリームビュータイプがKEYS_ONLY等）
    #[error("NewImageが欠損しています: {0}")]
    MissingNewImage(String),

    /// エンティティのデシリアライズに失敗
    #[error("エンティティのデシリアライズに失敗: {event_id}: {message}")]
    DeserializationError { event_id: String, message: String },
}

/// DynamoDB Streamsイベントのデコーダー
pub struct DynamoStreamDecoder;

impl DynamoStreamDecoder {
    /// ストリームイベント全体を変更バッチに変換
    ///
    /// # Returns
    /// * `Ok(ChangeBatch)` - INSERT/MODIFYレコードのエンティティ（配信順）
    /// * `Err(ChangeStreamError)` - いずれかのレコードがデコードできない
    pub fn decode(event: &Event) -> Result<ChangeBatch, ChangeStreamError> {
        let mut entities = Vec::with_capacity(event.records.len());

        for record in &event.records {
            if let Some(entity) = Self::decode_record(record)? {
                entities.push(entity);
            }
        }

        Ok(ChangeBatch::new(entities))
    }

    /// 単一レコードを変換（変更フィード対象外のレコードは`None`）
    fn decode_record(record: &EventRecord) -> Result<Option<Entity>, ChangeStreamError> {
        match record.event_name.as_str() {
            "INSERT" | "MODIFY" => Self::decode_new_image(record).map(Some),
            "REMOVE" => {
                debug!(event_id = %record.event_id, "REMOVEレコードをスキップ");
                Ok(None)
            }
            other => {
                warn!(event_id = %record.event_id, event_name = other, "未知のイベントタイプ");
                Ok(None)
            }
        }
    }

    fn decode_new_image(record: &EventRecord) -> Result<Entity, ChangeStreamError> {
        let new_image = &record.change.new_image;
        if new_image.is_empty() {
            return Err(ChangeStreamError::MissingNewImage(record.event_id.clone()));
        }

        serde_dynamo::from_item(new_image.clone()).map_err(|e| {
            ChangeStreamError::DeserializationError {
                event_id: record.event_id.clone(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_lambda_events::event::dynamodb::StreamRecord;
    use serde_dynamo::{AttributeValue, Item};
    use std::collections::HashMap;

    // ==================== ヘルパー関数 ====================

    /// テスト用のDynamoDB Itemを作成
    fn create_item(attrs: Vec<(&str, AttributeValue)>) -> Item {
        let map: HashMap<String, AttributeValue> = attrs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Item::from(map)
    }

    fn string_attr(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn entity_image(id: &str) -> Item {
        create_item(vec![
            ("id", string_attr(id)),
            ("name", string_attr("widget")),
            ("createdAt", string_attr("2024-05-01T12:30:00Z")),
        ])
    }

    fn create_default_stream_record() -> StreamRecord {
        use chrono::{TimeZone, Utc};
        StreamRecord {
            approximate_creation_date_time: Utc.timestamp_opt(0, 0).unwrap(),
            keys: Item::from(HashMap::<String, AttributeValue>::new()),
            new_image: Item::from(HashMap::<String, AttributeValue>::new()),
            old_image: Item::from(HashMap::<String, AttributeValue>::new()),
            sequence_number: None,
            size_bytes: 0,
            stream_view_type: None,
        }
    }

    fn create_record(event_id: &str, event_name: &str, new_image: Item) -> EventRecord {
        EventRecord {
            aws_region: String::new(),
            change: StreamRecord {
                new_image,
                ..create_default_stream_record()
            },
            event_id: event_id.to_string(),
            event_name: event_name.to_string(),
            event_source: None,
            event_source_arn: None,
            event_version: None,
            user_identity: None,
            record_format: None,
            table_name: None,
        }
    }

    // ==================== decode テスト ====================

    #[test]
    fn test_decode_insert_and_modify_in_delivery_order() {
        let event = Event {
            records: vec![
                create_record("1", "MODIFY", entity_image("b2")),
                create_record("2", "INSERT", entity_image("a1")),
            ],
        };

        let batch = DynamoStreamDecoder::decode(&event).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.first().unwrap().id, "b2");
        assert_eq!(batch.entities()[1].name.as_deref(), Some("widget"));
    }

    #[test]
    fn test_decode_skips_remove_records() {
        let event = Event {
            records: vec![
                create_record("1", "REMOVE", Item::from(HashMap::<String, AttributeValue>::new())),
                create_record("2", "INSERT", entity_image("a1")),
            ],
        };

        let batch = DynamoStreamDecoder::decode(&event).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.first().unwrap().id, "a1");
    }

    #[test]
    fn test_decode_empty_event_gives_empty_batch() {
        let event = Event { records: vec![] };
        let batch = DynamoStreamDecoder::decode(&event).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_decode_null_created_at_stays_none() {
        let image = create_item(vec![
            ("id", string_attr("a1")),
            ("createdAt", AttributeValue::Null(true)),
        ]);
        let event = Event {
            records: vec![create_record("1", "INSERT", image)],
        };

        let batch = DynamoStreamDecoder::decode(&event).unwrap();
        assert_eq!(batch.first().unwrap().created_at, None);
    }

    #[test]
    fn test_decode_missing_new_image_fails() {
        let event = Event {
            records: vec![create_record("evt-1", "INSERT", Item::from(HashMap::<String, AttributeValue>::new()))],
        };

        match DynamoStreamDecoder::decode(&event) {
            Err(ChangeStreamError::MissingNewImage(event_id)) => assert_eq!(event_id, "evt-1"),
            other => panic!("予期しない結果: {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed_image_fails_whole_batch() {
        let bad_image = create_item(vec![("id", AttributeValue::N("42".to_string()))]);
        let event = Event {
            records: vec![
                create_record("1", "INSERT", entity_image("a1")),
                create_record("2", "INSERT", bad_image),
            ],
        };

        match DynamoStreamDecoder::decode(&event) {
            Err(ChangeStreamError::DeserializationError { event_id, .. }) => {
                assert_eq!(event_id, "2")
            }
            other => panic!("予期しない結果: {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let error = ChangeStreamError::MissingNewImage("evt-1".to_string());
        assert!(error.to_string().contains("NewImage"));
        assert!(error.to_string().contains("evt-1"));
    }
}
