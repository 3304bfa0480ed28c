use async_trait::async_trait;
use claims::{assert_err, assert_ok};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use walsync::config::{AppConfig, ConfigLoadResult, load_config_from};
use walsync::supervisor::{ShutdownReason, Supervisor};
use walsync_engine::clock::ManualClock;
use walsync_engine::common::ProcessError;
use walsync_engine::process::{Pid, ProcessTable};

const EDITOR_PID: Pid = 5150;

/// One editor process that can be "closed" by the test
struct FakeEditor {
    running: AtomicBool,
    other_live: Vec<Pid>,
    reloads: Mutex<Vec<Pid>>,
}

impl FakeEditor {
    fn new(other_live: Vec<Pid>) -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(true),
            other_live,
            reloads: Mutex::new(Vec::new()),
        })
    }

    fn close(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn reload_count(&self) -> usize {
        self.reloads.lock().unwrap().len()
    }
}

#[async_trait]
impl ProcessTable for FakeEditor {
    async fn is_alive(&self, pid: Pid) -> bool {
        self.other_live.contains(&pid)
            || (pid == EDITOR_PID && self.running.load(Ordering::SeqCst))
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Pid>, ProcessError> {
        if name == "nvim" && self.running.load(Ordering::SeqCst) {
            Ok(vec![EDITOR_PID])
        } else {
            Ok(Vec::new())
        }
    }

    async fn send_reload(&self, pid: Pid) -> Result<(), ProcessError> {
        self.reloads.lock().unwrap().push(pid);
        Ok(())
    }
}

struct Home {
    dir: TempDir,
    lock_file: PathBuf,
    config: AppConfig,
}

impl Home {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();
        let lock_file = home.join("wal_nvim_lock");

        write(&home.join(".cache/wal/colors"), "#1d1f21\n#cc6666\n");
        write(&home.join(".config/walsync/templates/dark.lua"), "-- dark template\n");
        write(&home.join(".config/walsync/templates/light.lua"), "-- light template\n");
        write(
            &home.join(".local/share/nvim/lazy/base46/lua/base46/themes/gruvchad.lua"),
            "-- gruvchad\n",
        );

        let config_file = home.join("config.toml");
        write(
            &config_file,
            &format!(
                r#"
                [paths]
                lock_file = "{}"

                [consumer]
                liveness_interval_ms = 100

                [timings]
                stability_timeout_ms = 200
                stability_poll_ms = 10
                settle_delay_ms = 10
                debounce_ms = 50
                lock_retry_delay_ms = 10
                "#,
                lock_file.display()
            ),
        );

        let config = match load_config_from(Some(&config_file)) {
            ConfigLoadResult::Success(config) => *config,
            ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => {
                panic!("{e}")
            }
        };
        assert_ok!(config.validate());

        Self {
            dir,
            lock_file,
            config,
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn destination(&self) -> PathBuf {
        self.path()
            .join(".local/share/nvim/lazy/base46/lua/base46/themes/chadwal.lua")
    }

    /// Supervisor on the wall clock, for tests that race real file writes
    fn supervisor(&self, editor: Arc<FakeEditor>) -> Supervisor {
        Supervisor::from_config(&self.config, self.path()).with_process_table(editor)
    }

    /// Supervisor whose lock retries and pipeline waits take no real time
    fn virtual_supervisor(&self, editor: Arc<FakeEditor>) -> (Supervisor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let supervisor = self.supervisor(editor).with_clock(clock.clone());
        (supervisor, clock)
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

async fn wait_until(within: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

#[tokio::test]
async fn test_exits_when_editor_closes() {
    let home = Home::new();
    let editor = FakeEditor::new(Vec::new());
    let (supervisor, clock) = home.virtual_supervisor(editor.clone());

    let running = tokio::spawn(supervisor.run(CancellationToken::new()));

    let destination = home.destination();
    assert!(wait_until(Duration::from_secs(5), || destination.exists()).await);
    assert!(home.lock_file.exists());
    assert!(wait_until(Duration::from_secs(2), || editor.reload_count() == 1).await);
    // Settle delay and stability polls ran on the virtual clock
    assert!(clock.elapsed() >= Duration::from_millis(10));

    editor.close();
    let reason = assert_ok!(running.await.unwrap());
    assert_eq!(reason, ShutdownReason::ConsumerExited);
    assert!(!home.lock_file.exists());
}

#[tokio::test]
async fn test_interrupt_stops_cleanly() {
    let home = Home::new();
    let shutdown = CancellationToken::new();
    let (supervisor, _clock) = home.virtual_supervisor(FakeEditor::new(Vec::new()));

    let running = tokio::spawn(supervisor.run(shutdown.clone()));
    let destination = home.destination();
    assert!(wait_until(Duration::from_secs(5), || destination.exists()).await);

    shutdown.cancel();
    let reason = assert_ok!(running.await.unwrap());
    assert_eq!(reason, ShutdownReason::Interrupted);
    assert!(!home.lock_file.exists());
}

#[tokio::test]
async fn test_second_instance_exits_without_touching_lock() {
    let home = Home::new();
    write(&home.lock_file, "4242");
    let (supervisor, clock) = home.virtual_supervisor(FakeEditor::new(vec![4242]));

    let reason = assert_ok!(supervisor.run(CancellationToken::new()).await);
    assert_eq!(reason, ShutdownReason::AlreadyRunning { pid: 4242 });
    assert_eq!(std::fs::read_to_string(&home.lock_file).unwrap(), "4242");
    assert!(!home.destination().exists());
    assert_eq!(clock.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_missing_palette_is_fatal_and_releases_lock() {
    let home = Home::new();
    std::fs::remove_file(home.path().join(".cache/wal/colors")).unwrap();
    let (supervisor, _clock) = home.virtual_supervisor(FakeEditor::new(Vec::new()));

    let error = assert_err!(supervisor.run(CancellationToken::new()).await);
    assert!(format!("{error:#}").contains("Initial theme update failed"));
    assert!(!home.lock_file.exists());
}

#[tokio::test]
async fn test_rendered_theme_is_republished() {
    let home = Home::new();
    let editor = FakeEditor::new(Vec::new());
    let shutdown = CancellationToken::new();
    let running = tokio::spawn(home.supervisor(editor.clone()).run(shutdown.clone()));

    let destination = home.destination();
    assert!(wait_until(Duration::from_secs(5), || destination.exists()).await);

    // Let the watcher subscribe before pywal "renders"
    tokio::time::sleep(Duration::from_millis(200)).await;
    write(
        &home.path().join(".cache/wal/base46-dark.lua"),
        "-- rendered by pywal\n",
    );

    let republished = wait_until(Duration::from_secs(5), || {
        std::fs::read_to_string(&destination).unwrap_or_default() == "-- rendered by pywal\n"
    })
    .await;
    assert!(republished);
    assert!(wait_until(Duration::from_secs(2), || editor.reload_count() >= 2).await);

    shutdown.cancel();
    assert_ok!(running.await.unwrap());
}
