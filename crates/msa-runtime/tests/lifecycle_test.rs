//! Lifecycle tests for the module orchestrator

mod common;

use common::LogCapture;
use msa_config::{Config, Section};
use msa_core::{Error, ModuleError, ModuleId, ModuleState};
use msa_runtime::{Host, Module, ModuleSet, Services, StopReason};
use parking_lot::Mutex;
use std::sync::Arc;

type CallLog = Arc<Mutex<Vec<(ModuleId, &'static str)>>>;

/// Module that records its calls and fails on request
#[derive(Debug)]
struct Recorder {
    id: ModuleId,
    log: CallLog,
    fail_on: Option<&'static str>,
}

impl Recorder {
    fn record(&self, hook: &'static str) -> Result<(), ModuleError> {
        self.log.lock().push((self.id, hook));
        if self.fail_on == Some(hook) {
            return Err(ModuleError::new(42, format!("{hook} refused")));
        }
        Ok(())
    }
}

impl Module for Recorder {
    fn id(&self) -> ModuleId {
        self.id
    }

    fn init(&mut self, _services: &Arc<Services>, _section: &Section) -> Result<(), ModuleError> {
        self.record("init")
    }

    fn setup(&mut self, _services: &Arc<Services>) -> Result<(), ModuleError> {
        self.record("setup")
    }

    fn teardown(&mut self, _services: &Arc<Services>) -> Result<(), ModuleError> {
        self.record("teardown")
    }

    fn quit(&mut self, _services: &Arc<Services>) -> Result<(), ModuleError> {
        self.record("quit")
    }
}

fn recorders(log: &CallLog, failing: Option<(ModuleId, &'static str)>) -> ModuleSet {
    ModuleId::ALL.into_iter().fold(ModuleSet::builtin(), |set, id| {
        set.with_module(Box::new(Recorder {
            id,
            log: Arc::clone(log),
            fail_on: failing.filter(|(m, _)| *m == id).map(|(_, hook)| hook),
        }))
    })
}

fn start(log: &CallLog, failing: Option<(ModuleId, &'static str)>) -> Result<Host, Error> {
    Host::start_with(
        &Config::new(),
        recorders(log, failing),
        Arc::new(Services::new()),
    )
}

fn calls(log: &CallLog, hook: &str) -> Vec<ModuleId> {
    log.lock()
        .iter()
        .filter(|(_, h)| *h == hook)
        .map(|(id, _)| *id)
        .collect()
}

#[test]
fn test_startup_order() {
    let log = CallLog::default();
    let host = start(&log, None).unwrap();

    assert_eq!(calls(&log, "init"), ModuleId::INIT_ORDER.to_vec());
    assert_eq!(calls(&log, "setup"), vec![ModuleId::Plugin, ModuleId::Event]);
    assert_eq!(host.state(ModuleId::Agent), ModuleState::Initialized);
    assert_eq!(host.state(ModuleId::Plugin), ModuleState::SetUp);
}

#[test]
fn test_normal_stop_order() {
    let log = CallLog::default();
    let mut host = start(&log, None).unwrap();
    log.lock().clear();

    host.stop(StopReason::Normal).unwrap();

    assert_eq!(calls(&log, "teardown"), vec![ModuleId::Plugin, ModuleId::Event]);
    assert_eq!(
        calls(&log, "quit"),
        vec![
            ModuleId::Plugin,
            ModuleId::Input,
            ModuleId::Agent,
            ModuleId::Command,
            ModuleId::Event,
            ModuleId::Output,
            ModuleId::Log,
        ]
    );
    host.dispose().unwrap();
}

#[test]
fn test_abort_skips_teardown() {
    let log = CallLog::default();
    let mut host = start(&log, None).unwrap();

    host.stop(StopReason::Abort(msa_core::Status::Input)).unwrap();

    assert!(calls(&log, "teardown").is_empty());
    assert_eq!(calls(&log, "quit").len(), 7);
}

#[test]
fn test_agent_init_failure_rolls_back() {
    let log = CallLog::default();
    let err = start(&log, Some((ModuleId::Agent, "init"))).unwrap_err();

    assert!(matches!(
        err,
        Error::ModuleInit { module: ModuleId::Agent, ref source } if source.status == 42
    ));
    assert_eq!(err.status().code(), 6);

    assert_eq!(
        calls(&log, "init"),
        vec![
            ModuleId::Log,
            ModuleId::Output,
            ModuleId::Event,
            ModuleId::Input,
            ModuleId::Agent,
        ]
    );
    assert_eq!(
        calls(&log, "quit"),
        vec![ModuleId::Input, ModuleId::Event, ModuleId::Output, ModuleId::Log]
    );
    assert!(calls(&log, "setup").is_empty());
    assert!(calls(&log, "teardown").is_empty());
}

#[test]
fn test_init_and_quit_counts_match_on_every_failure() {
    for failing in ModuleId::INIT_ORDER {
        let log = CallLog::default();
        assert!(start(&log, Some((failing, "init"))).is_err());

        let mut inited = calls(&log, "init");
        inited.retain(|id| *id != failing);
        let mut quit = calls(&log, "quit");
        inited.sort();
        quit.sort();
        assert_eq!(inited, quit, "{failing} failing init");
    }
}

#[test]
fn test_setup_failure_rolls_back_everything() {
    let log = CallLog::default();
    let err = start(&log, Some((ModuleId::Event, "setup"))).unwrap_err();

    assert!(matches!(err, Error::ModuleSetup { module: ModuleId::Event, .. }));
    assert_eq!(calls(&log, "quit").len(), 7);
    assert!(calls(&log, "teardown").is_empty());
}

#[test]
fn test_teardown_failure_is_absorbed() {
    let log = CallLog::default();
    let mut host = start(&log, Some((ModuleId::Plugin, "teardown"))).unwrap();

    host.stop(StopReason::Normal).unwrap();

    assert_eq!(calls(&log, "teardown"), vec![ModuleId::Plugin, ModuleId::Event]);
    assert_eq!(calls(&log, "quit").len(), 7);
    host.dispose().unwrap();
}

#[test]
fn test_quit_failure_halts_shutdown() {
    let log = CallLog::default();
    let mut host = start(&log, Some((ModuleId::Command, "quit"))).unwrap();
    log.lock().clear();

    let err = host.stop(StopReason::Normal).unwrap_err();
    assert!(matches!(err, Error::ModuleQuit { module: ModuleId::Command, .. }));
    assert_eq!(err.status().code(), 7);

    assert_eq!(
        calls(&log, "quit"),
        vec![
            ModuleId::Plugin,
            ModuleId::Input,
            ModuleId::Agent,
            ModuleId::Command,
        ]
    );
    assert_eq!(host.state(ModuleId::Command), ModuleState::Initialized);
    assert_eq!(host.state(ModuleId::Event), ModuleState::TornDown);
    assert_eq!(host.state(ModuleId::Log), ModuleState::Initialized);

    let refused = host.dispose().unwrap_err();
    assert!(matches!(refused.error, Error::ModulesLive(ModuleId::Event)));
}

#[test]
fn test_dispose_refusal_frees_nothing() {
    let log = CallLog::default();
    let host = start(&log, None).unwrap();
    log.lock().clear();

    let refused = host.dispose().unwrap_err();
    assert!(log.lock().is_empty());

    let mut host = refused.host;
    assert!(host.is_running());
    host.stop(StopReason::Normal).unwrap();
    host.dispose().unwrap();
}

#[test]
fn test_drop_quits_live_modules() {
    let log = CallLog::default();
    let host = start(&log, None).unwrap();
    drop(host);

    assert_eq!(calls(&log, "quit").len(), 7);
}

#[test]
fn test_lifecycle_failure_is_logged() {
    let log = CallLog::default();
    let capture = LogCapture::new();
    let config = Config::new().with_section(Section::new("LOG").with("LEVEL", "debug"));
    let modules = ModuleSet::builtin().with_module(Box::new(Recorder {
        id: ModuleId::Agent,
        log: Arc::clone(&log),
        fail_on: Some("init"),
    }));

    let result = capture.run(|| Host::start_with(&config, modules, Arc::new(Services::new())));

    assert!(result.is_err());
    assert!(capture.has("ERROR", "Failed to start agent module: init refused"));
    assert!(capture.has("DEBUG", "Agent module's init() returned 42"));
}
