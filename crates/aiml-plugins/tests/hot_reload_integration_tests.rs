//! Hot reload integration tests
//!
//! Drives a real file watcher over a temporary plugins directory and checks
//! that source changes end up as unit re-executions and observer calls.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use aiml_kernel::plugin::{PluginError, PluginResult, SubUnit, UnitBuilder, UnitHandle, unit_address};
use aiml_plugins::hot_reload::{
    HotReloadConfig, HotReloadSupervisor, ReloadObserver, ReloadOrderer, UnitRegistry,
};
use crossbeam_channel::{Receiver, unbounded};
use tempfile::TempDir;

const NAMESPACE: &str = "test.plugins";
const EVENT_TIMEOUT: Duration = Duration::from_secs(10);
const QUIET_PERIOD: Duration = Duration::from_millis(1500);
const SETTLE: Duration = Duration::from_millis(250);

struct Fixture {
    dir: TempDir,
    units: Arc<UnitRegistry>,
    supervisor: HotReloadSupervisor,
    reloaded: Receiver<String>,
}

impl Fixture {
    fn plugins_root(&self) -> &Path {
        self.dir.path()
    }

    fn touch(&self, relative: &str, content: &str) {
        fs::write(self.plugins_root().join(relative), content).unwrap();
    }

    fn generation(&self, sub: Option<SubUnit>) -> Option<u64> {
        self.units.generation(&unit_address(NAMESPACE, "model", sub))
    }
}

fn counting_builder() -> Arc<dyn UnitBuilder> {
    let builds = Arc::new(AtomicUsize::new(0));
    Arc::new(move || -> PluginResult<UnitHandle> {
        Ok(Arc::new(builds.fetch_add(1, Ordering::SeqCst)))
    })
}

/// Succeeds on first load and fails on every re-execution
fn broken_after_load_builder() -> Arc<dyn UnitBuilder> {
    let builds = Arc::new(AtomicUsize::new(0));
    Arc::new(move || -> PluginResult<UnitHandle> {
        if builds.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(Arc::new(()))
        } else {
            Err(PluginError::build_failed("model.callbacks", "syntax error"))
        }
    })
}

/// Sleeps through every re-execution, recording when it starts and finishes
fn slow_reload_builder(
    delay: Duration,
    started: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
) -> Arc<dyn UnitBuilder> {
    let builds = Arc::new(AtomicUsize::new(0));
    Arc::new(move || -> PluginResult<UnitHandle> {
        if builds.fetch_add(1, Ordering::SeqCst) > 0 {
            started.store(true, Ordering::SeqCst);
            thread::sleep(delay);
            finished.store(true, Ordering::SeqCst);
        }
        Ok(Arc::new(()))
    })
}

fn fixture(callbacks_builder: Arc<dyn UnitBuilder>) -> Fixture {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("model")).unwrap();
    fs::write(dir.path().join("model/layout.rs"), "// v1").unwrap();

    let units = Arc::new(UnitRegistry::new());
    units
        .register(&unit_address(NAMESPACE, "model", None), counting_builder())
        .unwrap();
    units
        .register(
            &unit_address(NAMESPACE, "model", Some(SubUnit::Layout)),
            counting_builder(),
        )
        .unwrap();
    units
        .register(
            &unit_address(NAMESPACE, "model", Some(SubUnit::Callbacks)),
            callbacks_builder,
        )
        .unwrap();

    let orderer = Arc::new(ReloadOrderer::with_namespace(units.clone(), NAMESPACE));
    let (tx, reloaded) = unbounded();
    let observer: ReloadObserver = Arc::new(move |plugin_id: &str| {
        let _ = tx.send(plugin_id.to_string());
    });

    let config = HotReloadConfig::default()
        .with_debounce(Duration::from_millis(300))
        .with_unit_namespace(NAMESPACE);
    let supervisor =
        HotReloadSupervisor::new(dir.path(), config, orderer, Some(observer)).unwrap();

    Fixture {
        dir,
        units,
        supervisor,
        reloaded,
    }
}

#[test]
fn test_source_change_reloads_plugin() {
    let mut fx = fixture(counting_builder());
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);

    fx.touch("model/layout.rs", "// v2");

    let plugin_id = fx.reloaded.recv_timeout(EVENT_TIMEOUT).unwrap();
    assert_eq!(plugin_id, "model");
    assert!(fx.generation(None).unwrap() >= 1);
    assert!(fx.generation(Some(SubUnit::Layout)).unwrap() >= 1);
    assert!(fx.generation(Some(SubUnit::Callbacks)).unwrap() >= 1);

    fx.supervisor.stop().unwrap();
}

#[test]
fn test_new_file_in_plugin_reloads() {
    let mut fx = fixture(counting_builder());
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);

    fx.touch("model/styles.rs", "// new unit source");

    assert_eq!(fx.reloaded.recv_timeout(EVENT_TIMEOUT).unwrap(), "model");
    fx.supervisor.stop().unwrap();
}

#[test]
fn test_failed_reload_skips_observer() {
    let mut fx = fixture(broken_after_load_builder());
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);

    fx.touch("model/callbacks.rs", "// broken");

    assert!(fx.reloaded.recv_timeout(QUIET_PERIOD).is_err());
    // The failing unit comes before the aggregate, which stays untouched.
    assert_eq!(fx.generation(None), Some(0));
    assert_eq!(fx.generation(Some(SubUnit::Callbacks)), Some(0));
    assert!(fx.supervisor.is_running());

    fx.supervisor.stop().unwrap();
}

#[test]
fn test_irrelevant_changes_are_ignored() {
    let mut fx = fixture(counting_builder());
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);

    fx.touch("model/notes.txt", "not source");
    fx.touch("loose.rs", "outside any plugin");

    assert!(fx.reloaded.recv_timeout(QUIET_PERIOD).is_err());
    assert_eq!(fx.generation(None), Some(0));

    fx.supervisor.stop().unwrap();
}

#[test]
fn test_no_reloads_after_stop() {
    let mut fx = fixture(counting_builder());
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);
    fx.supervisor.stop().unwrap();

    fx.touch("model/layout.rs", "// edited while stopped");

    assert!(fx.reloaded.recv_timeout(QUIET_PERIOD).is_err());
    assert_eq!(fx.generation(None), Some(0));
}

#[test]
fn test_debounce_tokens_survive_restart() {
    let mut fx = fixture(counting_builder());
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);

    fx.touch("model/layout.rs", "// v2");
    assert_eq!(fx.reloaded.recv_timeout(EVENT_TIMEOUT).unwrap(), "model");

    fx.supervisor.stop().unwrap();
    let first = fx.supervisor.last_accepted("model");
    assert!(first.is_some());

    fx.supervisor.start().unwrap();
    fx.supervisor.stop().unwrap();
    assert_eq!(fx.supervisor.last_accepted("model"), first);
}

#[test]
fn test_run_scoped_watches_during_closure() {
    let mut fx = fixture(counting_builder());
    let path = fx.plugins_root().join("model/layout.rs");
    let reloaded = fx.reloaded.clone();

    let observed = fx
        .supervisor
        .run_scoped(|| {
            thread::sleep(SETTLE);
            fs::write(&path, "// v2").unwrap();
            reloaded.recv_timeout(EVENT_TIMEOUT).ok()
        })
        .unwrap();

    assert_eq!(observed.as_deref(), Some("model"));
    assert!(!fx.supervisor.is_running());
}

#[test]
fn test_stop_waits_for_in_flight_reload() {
    let started = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let mut fx = fixture(slow_reload_builder(
        Duration::from_millis(800),
        started.clone(),
        finished.clone(),
    ));
    fx.supervisor.start().unwrap();
    thread::sleep(SETTLE);

    fx.touch("model/layout.rs", "// v2");

    let deadline = Instant::now() + EVENT_TIMEOUT;
    while !started.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "reload never started");
        thread::sleep(Duration::from_millis(10));
    }

    fx.supervisor.stop().unwrap();
    assert!(finished.load(Ordering::SeqCst));
    assert!(!fx.supervisor.is_running());
}
