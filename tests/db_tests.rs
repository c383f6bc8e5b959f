//! DB tests: file queue, batch creation/checkout/complete, stale lease reclaim, file-DB concurrency.

use brutus::engine::{
    BatchQueue, Clock, FileQueue, ManualClock, SearchSpace, SqliteStore, SystemClock, open_store,
    open_store_in_memory,
};
use brutus::{BatchStatus, FileStatus, Outcome, PasscodeRequirement, WorkerId};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

fn small_space() -> SearchSpace {
    SearchSpace::new(3, 10).unwrap()
}

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
    ))
}

fn store_with(clock: Arc<ManualClock>) -> SqliteStore {
    open_store_in_memory(small_space(), clock).unwrap()
}

fn store() -> SqliteStore {
    store_with(manual_clock())
}

fn add(store: &SqliteStore, path: &str, fingerprint: &str) -> i64 {
    assert!(store.add_if_new(Path::new(path), fingerprint).unwrap());
    store
        .get_by_fingerprint(fingerprint)
        .unwrap()
        .into_iter()
        .find(|f| f.path == Path::new(path))
        .unwrap()
        .id
}

#[test]
fn test_add_if_new_ignores_known_path() {
    let store = store();
    assert!(store.add_if_new(Path::new("/docs/a.pdf"), "h1").unwrap());
    assert!(!store.add_if_new(Path::new("/docs/a.pdf"), "h2").unwrap());

    let files = store.get_by_fingerprint("h1").unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].status, FileStatus::Pending);
    assert_eq!(files[0].passcode_required, PasscodeRequirement::Unknown);
    assert!(files[0].outcome.is_none());
    assert!(store.get_by_fingerprint("h2").unwrap().is_empty());
}

#[test]
fn test_get_by_fingerprint_returns_all_paths_in_id_order() {
    let store = store();
    let a = add(&store, "/docs/a.pdf", "same");
    let b = add(&store, "/docs/copy/a.pdf", "same");
    add(&store, "/docs/other.pdf", "different");

    let ids: Vec<_> = store
        .get_by_fingerprint("same")
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn test_next_to_process_prefers_lowest_pending() {
    let store = store();
    let a = add(&store, "/docs/a.pdf", "ha");
    let b = add(&store, "/docs/b.pdf", "hb");

    assert_eq!(store.next_to_process().unwrap().unwrap().id, a);
    store
        .record_result(a, &Outcome::NoPasscodeNeeded, Duration::ZERO)
        .unwrap();
    assert_eq!(store.next_to_process().unwrap().unwrap().id, b);
}

#[test]
fn test_next_to_process_falls_back_to_in_progress_with_pending_batches() {
    let store = store();
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.mark_in_progress(a, &worker).unwrap();
    store.create_batches(a).unwrap();

    let next = store.next_to_process().unwrap().unwrap();
    assert_eq!(next.id, a);
    assert_eq!(next.status, FileStatus::InProgress);

    // Lease every batch: nothing Pending remains anywhere.
    while store.checkout_next(a, &worker).unwrap().is_some() {}
    assert!(store.next_to_process().unwrap().is_none());
}

#[test]
fn test_next_to_process_pending_before_resumable() {
    let store = store();
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.mark_in_progress(a, &worker).unwrap();
    store.create_batches(a).unwrap();
    let b = add(&store, "/docs/b.pdf", "hb");

    assert_eq!(store.next_to_process().unwrap().unwrap().id, b);
}

#[test]
fn test_mark_in_progress_keeps_first_start_and_skips_terminal() {
    let clock = manual_clock();
    let store = store_with(Arc::clone(&clock));
    let a = add(&store, "/docs/a.pdf", "ha");

    store.mark_in_progress(a, &WorkerId::from("w1")).unwrap();
    let first = store.get(a).unwrap().unwrap();
    assert_eq!(first.status, FileStatus::InProgress);
    assert_eq!(first.owner.as_deref(), Some("w1"));

    clock.advance(MINUTE);
    store.mark_in_progress(a, &WorkerId::from("w2")).unwrap();
    let second = store.get(a).unwrap().unwrap();
    assert_eq!(second.started_at, first.started_at);
    assert_eq!(second.owner.as_deref(), Some("w2"));

    store
        .record_result(a, &Outcome::Found("123".into()), MINUTE)
        .unwrap();
    store.mark_in_progress(a, &WorkerId::from("w3")).unwrap();
    assert_eq!(store.get(a).unwrap().unwrap().status, FileStatus::Completed);
}

#[test]
fn test_record_result_first_writer_wins() {
    let store = store();
    let a = add(&store, "/docs/a.pdf", "ha");

    assert!(
        store
            .record_result(a, &Outcome::Found("042".into()), Duration::from_secs(90))
            .unwrap()
    );
    assert!(
        !store
            .record_result(a, &Outcome::Exhausted, Duration::from_secs(120))
            .unwrap()
    );

    let file = store.get(a).unwrap().unwrap();
    assert_eq!(file.status, FileStatus::Completed);
    assert_eq!(file.outcome, Some(Outcome::Found("042".into())));
    assert_eq!(file.duration_minutes, Some(1.5));
    assert!(file.completed_at.is_some());
}

#[test]
fn test_record_result_unreadable_marks_failed_with_reason() {
    let store = store();
    let a = add(&store, "/docs/broken.pdf", "hx");

    store
        .record_result(a, &Outcome::Unreadable("trailer not found".into()), Duration::ZERO)
        .unwrap();
    let file = store.get(a).unwrap().unwrap();
    assert_eq!(file.status, FileStatus::Failed);
    assert_eq!(
        file.outcome,
        Some(Outcome::Unreadable("trailer not found".into()))
    );
    assert!(store.next_to_process().unwrap().is_none());
}

#[test]
fn test_set_passcode_required() {
    let store = store();
    let a = add(&store, "/docs/a.pdf", "ha");
    store
        .set_passcode_required(a, PasscodeRequirement::Required)
        .unwrap();
    assert_eq!(
        store.get(a).unwrap().unwrap().passcode_required,
        PasscodeRequirement::Required
    );
}

#[test]
fn test_create_batches_is_idempotent() {
    let store = store();
    let a = add(&store, "/docs/a.pdf", "ha");

    assert_eq!(store.create_batches(a).unwrap(), 10);
    assert_eq!(store.create_batches(a).unwrap(), 0);

    let batches = store.batches_for_file(a).unwrap();
    assert_eq!(batches.len(), 10);
    assert!(batches.iter().all(|b| b.status == BatchStatus::Pending));
    assert_eq!(batches[0].range.from, "000");
    assert_eq!(batches[0].range.to, "099");
    assert_eq!(batches[9].range.from, "900");
    assert_eq!(batches[9].range.to, "999");
}

#[test]
fn test_create_batches_does_not_reset_progress() {
    let store = store();
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.create_batches(a).unwrap();
    let first = store.checkout_next(a, &worker).unwrap().unwrap();
    store.complete(first.id, BatchStatus::Completed).unwrap();

    store.create_batches(a).unwrap();
    let again = store.get_batch(first.id).unwrap().unwrap();
    assert_eq!(again.status, BatchStatus::Completed);
}

#[test]
fn test_checkout_next_in_index_order_with_lease() {
    let clock = manual_clock();
    let store = store_with(Arc::clone(&clock));
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.create_batches(a).unwrap();

    let b0 = store.checkout_next(a, &worker).unwrap().unwrap();
    let b1 = store.checkout_next(a, &worker).unwrap().unwrap();
    assert_eq!((b0.index, b1.index), (0, 1));
    assert_eq!(b0.status, BatchStatus::CheckedOut);
    assert_eq!(b0.owner.as_deref(), Some("w1"));
    assert_eq!(b0.checked_out_at, Some(clock.now()));
}

#[test]
fn test_checkout_next_none_when_nothing_pending() {
    let store = store();
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    assert!(store.checkout_next(a, &worker).unwrap().is_none());

    store.create_batches(a).unwrap();
    let mut seen = HashSet::new();
    while let Some(b) = store.checkout_next(a, &worker).unwrap() {
        assert!(seen.insert(b.index));
    }
    assert_eq!(seen.len(), 10);
}

#[test]
fn test_complete_and_all_complete() {
    let store = store();
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.create_batches(a).unwrap();

    let mut ids = Vec::new();
    while let Some(b) = store.checkout_next(a, &worker).unwrap() {
        ids.push(b.id);
    }
    for id in &ids[..9] {
        store.complete(*id, BatchStatus::Completed).unwrap();
    }
    assert!(!store.all_complete(a).unwrap());

    store.complete(ids[9], BatchStatus::Completed).unwrap();
    assert!(store.all_complete(a).unwrap());

    // Completing twice is a no-op.
    let before = store.get_batch(ids[9]).unwrap().unwrap();
    store.complete(ids[9], BatchStatus::Completed).unwrap();
    assert_eq!(
        store.get_batch(ids[9]).unwrap().unwrap().completed_at,
        before.completed_at
    );
}

#[test]
fn test_complete_rejects_non_terminal_status_and_unknown_id() {
    let store = store();
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.create_batches(a).unwrap();
    let b = store.checkout_next(a, &worker).unwrap().unwrap();

    assert!(store.complete(b.id, BatchStatus::Pending).is_err());
    assert!(store.complete(b.id, BatchStatus::CheckedOut).is_err());
    assert!(store.complete(9_999, BatchStatus::Completed).is_err());
}

#[test]
fn test_reclaim_stale_boundary() {
    let clock = manual_clock();
    let store = store_with(Arc::clone(&clock));
    let a = add(&store, "/docs/a.pdf", "ha");
    store.create_batches(a).unwrap();
    let b = store
        .checkout_next(a, &WorkerId::from("crashed"))
        .unwrap()
        .unwrap();
    let threshold = 10 * MINUTE;

    clock.advance(threshold - Duration::from_millis(1));
    assert_eq!(store.reclaim_stale(threshold).unwrap(), 0);
    assert_eq!(
        store.get_batch(b.id).unwrap().unwrap().status,
        BatchStatus::CheckedOut
    );

    clock.advance(Duration::from_millis(1));
    assert_eq!(store.reclaim_stale(threshold).unwrap(), 1);
    let reclaimed = store.get_batch(b.id).unwrap().unwrap();
    assert_eq!(reclaimed.status, BatchStatus::Pending);
    assert!(reclaimed.owner.is_none());
    assert!(reclaimed.checked_out_at.is_none());

    let again = store
        .checkout_next(a, &WorkerId::from("rescuer"))
        .unwrap()
        .unwrap();
    assert_eq!(again.id, b.id);
    assert_eq!(again.owner.as_deref(), Some("rescuer"));
}

#[test]
fn test_reclaim_stale_leaves_completed_and_fresh_batches() {
    let clock = manual_clock();
    let store = store_with(Arc::clone(&clock));
    let worker = WorkerId::from("w1");
    let a = add(&store, "/docs/a.pdf", "ha");
    store.create_batches(a).unwrap();

    let done = store.checkout_next(a, &worker).unwrap().unwrap();
    store.complete(done.id, BatchStatus::Completed).unwrap();
    let old = store.checkout_next(a, &worker).unwrap().unwrap();
    clock.advance(11 * MINUTE);
    let fresh = store.checkout_next(a, &worker).unwrap().unwrap();

    assert_eq!(store.reclaim_stale(10 * MINUTE).unwrap(), 1);
    assert_eq!(
        store.get_batch(done.id).unwrap().unwrap().status,
        BatchStatus::Completed
    );
    assert_eq!(
        store.get_batch(old.id).unwrap().unwrap().status,
        BatchStatus::Pending
    );
    assert_eq!(
        store.get_batch(fresh.id).unwrap().unwrap().status,
        BatchStatus::CheckedOut
    );
}

#[test]
fn test_file_db_concurrent_checkout_is_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("brutus.db");
    let space = SearchSpace::new(3, 50).unwrap();

    let setup = open_store(&db_path, space, Arc::new(SystemClock)).unwrap();
    assert!(setup.add_if_new(Path::new("/docs/a.pdf"), "ha").unwrap());
    let file_id = setup.next_to_process().unwrap().unwrap().id;
    setup.create_batches(file_id).unwrap();
    drop(setup);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let db_path = db_path.clone();
            thread::spawn(move || {
                let store = open_store(&db_path, space, Arc::new(SystemClock)).unwrap();
                let worker = WorkerId::from(format!("w{i}").as_str());
                let mut got = Vec::new();
                while let Some(b) = store.checkout_next(file_id, &worker).unwrap() {
                    assert_eq!(b.owner.as_deref(), Some(worker.as_str()));
                    got.push(b.index);
                }
                got
            })
        })
        .collect();

    let mut all = Vec::new();
    for h in handles {
        all.extend(h.join().unwrap());
    }
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(all.len(), 50);
    assert_eq!(unique.len(), 50);
}

#[test]
fn test_file_db_reopen_keeps_queue() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("brutus.db");
    let space = small_space();

    {
        let store = open_store(&db_path, space, Arc::new(SystemClock)).unwrap();
        assert!(store.add_if_new(Path::new("/docs/a.pdf"), "ha").unwrap());
    }
    let store = open_store(&db_path, space, Arc::new(SystemClock)).unwrap();
    assert!(!store.add_if_new(Path::new("/docs/a.pdf"), "ha").unwrap());
    assert_eq!(store.get_by_fingerprint("ha").unwrap().len(), 1);
}
