//! Watch mode integration tests
//!
//! These use the platform notification backend, so assertions poll with a
//! generous deadline instead of expecting exact timing.

use frep::watch::SessionState;
use frep::{MemoryStore, Replication, Synchronizer, WatchService};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const DEADLINE: Duration = Duration::from_secs(10);

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + DEADLINE;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

fn service_for(reps: Vec<Replication>) -> WatchService {
    let store = Arc::new(MemoryStore::new(reps));
    let synchronizer = Arc::new(Synchronizer::new(store));
    WatchService::new(synchronizer, Duration::from_millis(200))
}

fn read(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

#[test]
fn test_created_file_is_replicated() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let mut service = service_for(vec![Replication::new(src.path(), dst.path())]);
    service
        .start_watch(Duration::from_secs(3600))
        .expect("start watch");
    assert!(service.is_running());

    // let the initial periodic round finish so the event is what copies the file
    assert!(wait_until(|| service.scheduler().is_some_and(|s| s.ticks() >= 1)));

    fs::write(src.path().join("fresh.txt"), b"hello").expect("write source file");
    assert!(
        wait_until(|| read(&dst.path().join("fresh.txt")).as_deref() == Some(b"hello".as_slice())),
        "change was not replicated"
    );

    service.cleanup();
    assert!(!service.is_running());
}

#[test]
fn test_deleted_file_is_removed() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::write(src.path().join("doomed.txt"), b"x").expect("write source file");

    let mut service = service_for(vec![Replication::new(src.path(), dst.path())]);
    service
        .start_watch(Duration::from_secs(3600))
        .expect("start watch");
    assert!(wait_until(|| dst.path().join("doomed.txt").exists()));

    fs::remove_file(src.path().join("doomed.txt")).expect("remove source file");
    assert!(
        wait_until(|| !dst.path().join("doomed.txt").exists()),
        "deletion was not replicated"
    );
    service.cleanup();
}

#[test]
fn test_stop_is_prompt_and_final() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let mut service = service_for(vec![Replication::new(src.path(), dst.path())]);
    service
        .start_watch(Duration::from_secs(3600))
        .expect("start watch");
    assert!(wait_until(|| service.scheduler().is_some_and(|s| s.ticks() >= 1)));

    let began = Instant::now();
    service.stop();
    assert!(began.elapsed() < Duration::from_secs(2), "stop took {:?}", began.elapsed());

    let watcher = service.watcher().expect("watcher still present until cleanup");
    assert!(watcher
        .sessions()
        .iter()
        .all(|s| s.state() == SessionState::Stopped));

    // nothing replicates after stop returns
    fs::write(src.path().join("late.txt"), b"late").expect("write after stop");
    thread::sleep(Duration::from_millis(500));
    assert!(!dst.path().join("late.txt").exists());

    service.cleanup();
}

#[test]
fn test_unwatchable_replication_does_not_block_others() {
    let base = TempDir::new().expect("create base tempdir");
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let mut service = service_for(vec![
        Replication::new(base.path().join("missing"), base.path().join("out")),
        Replication::new(src.path(), dst.path()),
    ]);
    service
        .start_watch(Duration::from_secs(3600))
        .expect("start watch");

    let watcher = service.watcher().expect("watcher");
    assert_eq!(watcher.sessions().len(), 1);
    assert_eq!(watcher.active_sessions(), 1);
    service.cleanup();
}

#[test]
fn test_double_start_rejected() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let mut service = service_for(vec![Replication::new(src.path(), dst.path())]);
    service
        .start_watch(Duration::from_secs(3600))
        .expect("start watch");
    assert!(service.start_watch(Duration::from_secs(3600)).is_err());
    service.cleanup();
}
