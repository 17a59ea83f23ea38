//! Transaction scopes under concurrent use.

use std::sync::Arc;

use moneyflow_store::{MemoryDb, Record, RecordStore, StoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    id: String,
    task: usize,
}

impl Record for Entry {
    const TABLE: &'static str = "entries";

    fn id(&self) -> &str {
        &self.id
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_units_leave_no_trace() {
    let db = MemoryDb::new();
    let store: RecordStore<MemoryDb, Entry> = RecordStore::new(Arc::new(db.clone()));

    let tasks: Vec<_> = (0..16)
        .map(|task| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .scope()
                    .within_transaction(|scope| {
                        let tx = store.with_scope(scope);
                        async move {
                            for n in 0..3 {
                                tx.create(&Entry {
                                    id: format!("{task}-{n}"),
                                    task,
                                })
                                .await?;
                                tokio::task::yield_now().await;
                            }
                            if task % 2 == 1 {
                                return Err(StoreError::Backend("odd task".into()));
                            }
                            Ok(())
                        }
                    })
                    .await
            })
        })
        .collect();

    for task in tasks {
        let _ = task.await.unwrap();
    }

    let stats = db.stats();
    assert_eq!(stats.begun, 16);
    assert_eq!(stats.committed, 8);
    assert_eq!(stats.rolled_back, 8);

    let all = store.query(0, 100).await.unwrap();
    assert_eq!(all.len(), 24);
    assert!(all.iter().all(|e| e.task % 2 == 0));
}

#[tokio::test]
async fn test_read_then_write_in_one_scope() {
    let db = MemoryDb::new();
    let store: RecordStore<MemoryDb, Entry> = RecordStore::new(Arc::new(db.clone()));
    store
        .create(&Entry {
            id: "x".into(),
            task: 1,
        })
        .await
        .unwrap();

    store
        .scope()
        .within_transaction(|scope| {
            let tx = store.with_scope(scope);
            async move {
                let mut entry = tx.query_by_id("x").await?;
                entry.task += 1;
                tx.update(&entry).await
            }
        })
        .await
        .unwrap();

    assert_eq!(store.query_by_id("x").await.unwrap().task, 2);
    // One for the create, one for the read-then-write unit.
    assert_eq!(db.stats().begun, 2);
}
