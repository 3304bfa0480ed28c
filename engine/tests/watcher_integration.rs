use async_trait::async_trait;
use claims::assert_ok;
use engine::clock::{ManualClock, SystemClock};
use engine::paths::ThemePaths;
use engine::watcher::{ChangeDispatcher, ChangeHandler, ChangeWatcher, DEFAULT_DEBOUNCE};
use notify::event::{DataChange, ModifyKind};
use notify::{Event, EventKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingHandler {
    calls: AtomicUsize,
    paths: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl ChangeHandler for RecordingHandler {
    async fn on_change(&self, path: PathBuf) {
        self.paths.lock().await.push(path);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Takes a while per change, like an apply waiting on a busy writer
#[derive(Default)]
struct SlowHandler {
    started: tokio::sync::Notify,
    finished: AtomicUsize,
}

#[async_trait]
impl ChangeHandler for SlowHandler {
    async fn on_change(&self, _path: PathBuf) {
        self.started.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

impl RecordingHandler {
    async fn wait_for_calls(&self, expected: usize, within: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let calls = self.calls.load(Ordering::SeqCst);
            if calls >= expected || tokio::time::Instant::now() >= deadline {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

fn content_change(path: &std::path::Path) -> notify::Result<Event> {
    Ok(
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf()),
    )
}

#[tokio::test]
async fn test_burst_of_events_runs_handler_once() {
    let paths = ThemePaths::under_home(&PathBuf::from("/home/u"), &PathBuf::from("/t"));
    let handler = Arc::new(RecordingHandler::default());
    let clock = Arc::new(ManualClock::new());
    let tracked = paths.tracked_files().iter().map(|p| p.to_path_buf()).collect();

    let dispatcher =
        ChangeDispatcher::new(tracked, handler.clone(), clock.clone(), DEFAULT_DEBOUNCE);
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(dispatcher.run(rx, cancel.clone()));

    tx.send(content_change(&paths.dark.cache_source)).unwrap();
    clock.advance(Duration::from_millis(100));
    tx.send(content_change(&paths.dark.cache_source)).unwrap();

    assert_eq!(handler.wait_for_calls(1, Duration::from_secs(2)).await, 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_stopping_lets_in_flight_change_finish() {
    let paths = ThemePaths::under_home(&PathBuf::from("/home/u"), &PathBuf::from("/t"));
    let handler = Arc::new(SlowHandler::default());
    let tracked = paths.tracked_files().iter().map(|p| p.to_path_buf()).collect();

    let dispatcher = ChangeDispatcher::new(
        tracked,
        handler.clone(),
        Arc::new(ManualClock::new()),
        DEFAULT_DEBOUNCE,
    );
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(dispatcher.run(rx, cancel.clone()));

    tx.send(content_change(&paths.dark.cache_source)).unwrap();
    handler.started.notified().await;

    cancel.cancel();
    task.await.unwrap();
    assert_eq!(handler.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_events_after_window_run_handler_again() {
    let paths = ThemePaths::under_home(&PathBuf::from("/home/u"), &PathBuf::from("/t"));
    let handler = Arc::new(RecordingHandler::default());
    let clock = Arc::new(ManualClock::new());
    let tracked = paths.tracked_files().iter().map(|p| p.to_path_buf()).collect();
    let mut dispatcher =
        ChangeDispatcher::new(tracked, handler.clone(), clock.clone(), DEFAULT_DEBOUNCE);

    let first = content_change(&paths.dark.cache_source).unwrap();
    let second = content_change(&paths.light.cache_source).unwrap();

    assert!(dispatcher.dispatch(&first).is_some());
    clock.advance(Duration::from_millis(600));
    assert_eq!(dispatcher.dispatch(&second), Some(paths.light.cache_source.clone()));

    assert_eq!(handler.wait_for_calls(2, Duration::from_secs(2)).await, 2);
    let seen = handler.paths.lock().await.clone();
    assert!(seen.contains(&paths.dark.cache_source));
    assert!(seen.contains(&paths.light.cache_source));
}

#[tokio::test]
async fn test_writing_cache_file_notifies_handler() {
    let home = tempfile::tempdir().unwrap();
    let paths = ThemePaths::under_home(home.path(), &home.path().join("templates"));
    std::fs::create_dir_all(paths.dark.cache_source.parent().unwrap()).unwrap();

    let handler = Arc::new(RecordingHandler::default());
    let watcher = assert_ok!(ChangeWatcher::start(
        &paths,
        handler.clone(),
        SystemClock::shared(),
        DEFAULT_DEBOUNCE,
    ));
    assert_eq!(
        watcher.watched(),
        &[paths.dark.cache_source.parent().unwrap().to_path_buf()]
    );

    // Untracked files in the same directory are ignored
    std::fs::write(&paths.colors_file, "#1d1f21\n").unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

    std::fs::write(&paths.dark.cache_source, "-- rendered dark\n").unwrap();
    assert!(handler.wait_for_calls(1, Duration::from_secs(5)).await >= 1);
    assert_eq!(handler.paths.lock().await[0], paths.dark.cache_source);

    watcher.stop().await;
}

#[tokio::test]
async fn test_missing_cache_directory_is_skipped() {
    let home = tempfile::tempdir().unwrap();
    let paths = ThemePaths::under_home(home.path(), &home.path().join("templates"));

    let watcher = assert_ok!(ChangeWatcher::start(
        &paths,
        Arc::new(RecordingHandler::default()),
        SystemClock::shared(),
        DEFAULT_DEBOUNCE,
    ));
    assert!(watcher.watched().is_empty());
    watcher.stop().await;
}
