//! Generic bulk entity transfer.
//!
//! One call moves one collection: read everything from the source,
//! deduplicate by the descriptor key, replace the destination contents in
//! batches. The whole collection is held in memory between read and write;
//! that bounds collection size by process memory and is a known scalability
//! limit of the current design.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use guilddb_core::{Entity, EntitySink, EntitySource, DEFAULT_BATCH_SIZE, DEFAULT_MAX_IN_FLIGHT};

use crate::error::TransferError;

/// Tuning for bulk transfers.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Rows per destination batch.
    pub batch_size: usize,
    /// Ceiling on concurrently in-flight batch writes.
    pub max_in_flight: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Pairs an entity collection with the key its rows deduplicate by.
///
/// The key may be a scalar id or a tuple for composite identity.
pub struct EntityDescriptor<T: Entity, K> {
    key: fn(&T) -> K,
}

impl<T: Entity, K: Hash + Eq> EntityDescriptor<T, K> {
    /// Build a descriptor from a key extractor.
    pub fn new(key: fn(&T) -> K) -> Self {
        Self { key }
    }
}

/// Outcome of one collection transfer.
#[derive(Debug, Clone)]
pub struct TransferReport {
    /// Collection that was transferred.
    pub entity: &'static str,
    /// Rows written to the destination, after deduplication.
    pub rows: usize,
    /// Wall-clock duration of the transfer.
    pub duration: Duration,
}

/// Copy one entity collection from `source` to `destination`.
///
/// Existing destination rows for the collection are discarded, not merged.
/// Batches either commit fully or fail the whole call; a failure names the
/// entity and batch index. The call is not resumable mid-collection: rerun
/// it from scratch after a failure, which the leading delete makes safe.
pub async fn transfer<T, K, S, D>(
    source: &S,
    destination: &D,
    descriptor: &EntityDescriptor<T, K>,
    config: &TransferConfig,
) -> Result<TransferReport, TransferError>
where
    T: Entity,
    K: Hash + Eq,
    S: EntitySource<T> + ?Sized,
    D: EntitySink<T> + ?Sized,
{
    let started = Instant::now();

    let rows = source
        .read_all()
        .await
        .map_err(|source| TransferError::Read {
            entity: T::TABLE,
            source,
        })?;
    let read_count = rows.len();

    let rows = dedup_last_wins(rows, descriptor.key);
    if rows.len() < read_count {
        debug!(
            entity = T::TABLE,
            dropped = read_count - rows.len(),
            "dropped rows with duplicate keys"
        );
    }

    info!(entity = T::TABLE, rows = rows.len(), "copying collection");

    let replaced = destination
        .delete_all()
        .await
        .map_err(|source| TransferError::Replace {
            entity: T::TABLE,
            source,
        })?;
    if replaced > 0 {
        debug!(entity = T::TABLE, replaced, "cleared destination rows");
    }

    stream::iter(
        rows.chunks(config.batch_size.max(1))
            .enumerate()
            .map(|(batch_index, batch)| async move {
                destination
                    .write_batch(batch)
                    .await
                    .map_err(|source| TransferError::Batch {
                        entity: T::TABLE,
                        batch_index,
                        source,
                    })
            }),
    )
    .buffer_unordered(config.max_in_flight.max(1))
    .try_collect::<Vec<()>>()
    .await?;

    let report = TransferReport {
        entity: T::TABLE,
        rows: rows.len(),
        duration: started.elapsed(),
    };
    info!(
        entity = report.entity,
        rows = report.rows,
        duration_ms = report.duration.as_millis() as u64,
        "collection copied"
    );
    Ok(report)
}

/// Deduplicate by key: the first occurrence of a key keeps its position, the
/// last occurrence supplies the surviving value.
///
/// The tie-break is deliberate, not an accident of enumeration order.
fn dedup_last_wins<T, K: Hash + Eq>(rows: Vec<T>, key: fn(&T) -> K) -> Vec<T> {
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut kept: Vec<T> = Vec::with_capacity(rows.len());
    for row in rows {
        match positions.entry(key(&row)) {
            Entry::Occupied(slot) => kept[*slot.get()] = row,
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(row);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use guilddb_core::entity::{Poll, Reminder, UserXpStats, Warning};
    use guilddb_core::StoreError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct VecSource<T> {
        rows: Vec<T>,
    }

    #[async_trait]
    impl<T: Entity> EntitySource<T> for VecSource<T> {
        async fn read_all(&self) -> Result<Vec<T>, StoreError> {
            Ok(self.rows.clone())
        }
    }

    struct RecordingSink<T> {
        rows: Mutex<Vec<T>>,
        deletes: Mutex<u32>,
        attempted_batches: Arc<Mutex<Vec<usize>>>,
        fail_from_batch: Option<usize>,
    }

    impl<T> Default for RecordingSink<T> {
        fn default() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                deletes: Mutex::new(0),
                attempted_batches: Arc::default(),
                fail_from_batch: None,
            }
        }
    }

    #[async_trait]
    impl<T: Entity> EntitySink<T> for RecordingSink<T> {
        async fn delete_all(&self) -> Result<u64, StoreError> {
            *self.deletes.lock() += 1;
            let mut rows = self.rows.lock();
            let removed = rows.len() as u64;
            rows.clear();
            Ok(removed)
        }

        async fn write_batch(&self, rows: &[T]) -> Result<(), StoreError> {
            let batch_index = {
                let mut attempted = self.attempted_batches.lock();
                let index = attempted.len();
                attempted.push(index);
                index
            };
            if self.fail_from_batch.is_some_and(|fail| batch_index >= fail) {
                return Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
            }
            self.rows.lock().extend_from_slice(rows);
            Ok(())
        }
    }

    fn reminder(id: i64, user_id: i64, message: &str) -> Reminder {
        Reminder {
            id,
            user_id,
            channel_id: 1,
            message: message.to_string(),
            due_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            is_private: false,
        }
    }

    fn warning(id: i64) -> Warning {
        Warning {
            id,
            guild_id: 1,
            user_id: 2,
            reason: None,
            moderator: "mod".to_string(),
            forgiven: false,
            warned_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn poll(id: i64) -> Poll {
        Poll {
            id,
            guild_id: 1,
            channel_id: 2,
            question: "?".to_string(),
        }
    }

    #[test]
    fn test_dedup_last_wins_keeps_position_and_latest_value() {
        let rows = vec![
            reminder(1, 10, "first"),
            reminder(2, 11, "other"),
            reminder(3, 10, "latest"),
        ];
        let deduped = dedup_last_wins(rows, |r: &Reminder| r.user_id);
        assert_eq!(deduped.len(), 2);
        // user 10's slot stays first but carries the later row.
        assert_eq!(deduped[0].id, 3);
        assert_eq!(deduped[0].message, "latest");
        assert_eq!(deduped[1].id, 2);
    }

    #[tokio::test]
    async fn test_transfer_dedups_colliding_reminders() {
        let source = VecSource {
            rows: vec![
                reminder(1, 10, "a"),
                reminder(2, 10, "b"),
                reminder(3, 11, "c"),
            ],
        };
        let sink = RecordingSink::default();
        let descriptor = EntityDescriptor::new(|r: &Reminder| r.user_id);

        let report = transfer(&source, &sink, &descriptor, &TransferConfig::default())
            .await
            .unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.entity, "reminders");
        assert_eq!(sink.rows.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_transfer_replaces_destination_contents() {
        let source = VecSource {
            rows: (1..=7).map(warning).collect(),
        };
        let sink = RecordingSink {
            rows: Mutex::new((100..110).map(warning).collect()),
            ..RecordingSink::default()
        };
        let descriptor = EntityDescriptor::new(|w: &Warning| w.id);

        let report = transfer(&source, &sink, &descriptor, &TransferConfig::default())
            .await
            .unwrap();

        assert_eq!(report.rows, 7);
        let rows = sink.rows.lock();
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|w| w.id <= 7));
        assert_eq!(*sink.deletes.lock(), 1);
    }

    #[tokio::test]
    async fn test_transfer_clears_destination_even_for_empty_source() {
        let source: VecSource<Warning> = VecSource { rows: Vec::new() };
        let sink = RecordingSink {
            rows: Mutex::new((1..=10).map(warning).collect()),
            ..RecordingSink::default()
        };
        let descriptor = EntityDescriptor::new(|w: &Warning| w.id);

        let report = transfer(&source, &sink, &descriptor, &TransferConfig::default())
            .await
            .unwrap();

        assert_eq!(report.rows, 0);
        assert!(sink.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_names_entity_and_index() {
        let source = VecSource {
            rows: (1..=5).map(poll).collect(),
        };
        let sink = RecordingSink {
            fail_from_batch: Some(2),
            ..RecordingSink::default()
        };
        let descriptor = EntityDescriptor::new(|p: &Poll| p.id);
        let config = TransferConfig {
            batch_size: 1,
            max_in_flight: 1,
        };

        let err = transfer(&source, &sink, &descriptor, &config)
            .await
            .unwrap_err();

        match err {
            TransferError::Batch {
                entity,
                batch_index,
                ..
            } => {
                assert_eq!(entity, "polls");
                assert_eq!(batch_index, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Batches after the failing one were never attempted.
        assert_eq!(sink.attempted_batches.lock().as_slice(), [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_composite_key_dedup() {
        let stat = |id: i64, user_id: i64, guild_id: i64, xp: i64| UserXpStats {
            id,
            user_id,
            guild_id,
            xp,
            awarded_xp: 0,
            last_level_up: None,
        };
        let source = VecSource {
            rows: vec![
                stat(1, 10, 1, 100),
                stat(2, 10, 2, 200),
                stat(3, 10, 1, 300),
            ],
        };
        let sink = RecordingSink::default();
        let descriptor = EntityDescriptor::new(|x: &UserXpStats| (x.user_id, x.guild_id));

        let report = transfer(&source, &sink, &descriptor, &TransferConfig::default())
            .await
            .unwrap();

        assert_eq!(report.rows, 2);
        let rows = sink.rows.lock();
        let kept = rows
            .iter()
            .find(|x| x.user_id == 10 && x.guild_id == 1)
            .unwrap();
        assert_eq!(kept.xp, 300);
    }
}
