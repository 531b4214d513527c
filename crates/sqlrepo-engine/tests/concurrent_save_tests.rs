mod common;

use common::{memory_repo, sqlite_repo, Item};
use sqlrepo_core::store::Store;
use sqlrepo_engine::{Repository, UpsertOutcome};
use std::sync::Arc;

const WRITERS: i64 = 16;

async fn same_id_saves<S: Store + 'static>(repo: Repository<S>) {
    repo.register_table::<Item>().await.unwrap();
    let repo = Arc::new(repo);

    let handles: Vec<_> = (0..WRITERS)
        .map(|n| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.save(&Item::new(1, n, "racer")).await })
        })
        .collect();

    let mut inserted = 0;
    let mut updated = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            UpsertOutcome::Inserted => inserted += 1,
            UpsertOutcome::Updated => updated += 1,
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(updated, WRITERS - 1);

    let rows = repo.find_all::<Item>().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
    assert!((0..WRITERS).contains(&rows[0].amount));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_of_one_id_insert_once() {
    same_id_saves(sqlite_repo()).await;
    same_id_saves(memory_repo()).await;
}
