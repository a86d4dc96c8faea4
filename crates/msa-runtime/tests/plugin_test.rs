//! Plugin tests against the built-in modules

mod common;

use common::LogCapture;
use msa_config::{Config, Section};
use msa_core::ModuleId;
use msa_plugin_api::testing::MockPlugin;
use msa_plugin_api::{
    topics, Command, Event, HandlerSync, HostApi, HostHandle, Plugin, PluginError, Subscription,
};
use msa_runtime::{BufferSink, Host, HostBuilder, StopReason};
use std::sync::Arc;

fn start(plugins: &[fn(HostHandle) -> Box<dyn Plugin>]) -> (Host, BufferSink) {
    start_with_config(Config::new(), plugins)
}

fn start_with_config(
    config: Config,
    plugins: &[fn(HostHandle) -> Box<dyn Plugin>],
) -> (Host, BufferSink) {
    let sink = BufferSink::new();
    let builder = plugins.iter().fold(
        HostBuilder::new()
            .config(config)
            .output_sink(Arc::new(sink.clone())),
        |builder, register| builder.static_plugin(*register),
    );
    (builder.start().unwrap(), sink)
}

fn command_names(host: &Host) -> Vec<String> {
    host.services()
        .commands()
        .into_iter()
        .map(|c| c.name)
        .collect()
}

#[test]
fn test_example_plugin_round_trip() {
    let (mut host, sink) = start(&[msa_example_plugin::register]);

    let registry = host.services().plugin_registry().unwrap();
    assert!(registry.contains("example"));
    assert!(command_names(&host).contains(&"LOVE".to_string()));

    host.submit_input("love").unwrap();
    assert_eq!(
        sink.contents(),
        "DEFAULT_NAME: \"Master, the new command works!\"\n"
    );

    assert!(host.services().unload_plugin("example").unwrap());
    assert!(!registry.contains("example"));

    let commands = host.services().command_registry().unwrap();
    assert!(commands.lookup("LOVE").is_none());
    assert_eq!(commands.prune(), 0);
    assert_eq!(command_names(&host), vec!["HELP", "SAY", "EXIT"]);

    host.stop(StopReason::Normal).unwrap();
    host.dispose().unwrap();
}

#[test]
fn test_example_plugin_settings() {
    let config = Config::new()
        .with_section(Section::new("PLUGIN").with("EXAMPLE.MESSAGE", "Hello, $USER_TITLE"));
    let (host, sink) = start_with_config(config, &[msa_example_plugin::register]);

    host.submit_input("LOVE").unwrap();
    assert_eq!(sink.contents(), "DEFAULT_NAME: \"Hello, Master\"\n");
}

fn love_twice(_host: HostHandle) -> Box<dyn Plugin> {
    Box::new(
        MockPlugin::new("copycat")
            .with_command(Command::new("love", "a copy", "LOVE", |host, _, _| {
                host.say("copycat")
            })),
    )
}

#[test]
fn test_duplicate_command_keeps_first() {
    let (host, sink) = start(&[msa_example_plugin::register, love_twice]);

    let commands = host.services().command_registry().unwrap();
    let loves: Vec<_> = command_names(&host)
        .into_iter()
        .filter(|name| name == "LOVE")
        .collect();
    assert_eq!(loves.len(), 1);
    assert_eq!(commands.owner_of("LOVE").as_deref(), Some("example"));

    host.submit_input("love").unwrap();
    assert!(sink.contents().contains("the new command works!"));

    // both plugins still loaded
    assert_eq!(host.services().plugin_registry().unwrap().len(), 2);
}

fn same_name(_host: HostHandle) -> Box<dyn Plugin> {
    Box::new(MockPlugin::new("example"))
}

fn broken(_host: HostHandle) -> Box<dyn Plugin> {
    Box::new(MockPlugin::new("broken").failing_on("init"))
}

fn panicking(_host: HostHandle) -> Box<dyn Plugin> {
    panic!("entry point exploded")
}

#[test]
fn test_bad_plugins_do_not_stop_the_others() {
    let capture = LogCapture::new();
    let (host, _) =
        capture.run(|| start(&[broken, panicking, msa_example_plugin::register, same_name]));

    let registry = host.services().plugin_registry().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(!registry.get("broken").unwrap().is_active());
    assert!(registry.get("example").unwrap().is_active());
    assert_eq!(host.state(ModuleId::Plugin), msa_core::ModuleState::SetUp);
    assert!(command_names(&host).contains(&"LOVE".to_string()));

    assert!(capture.has("ERROR", "Plugin 'example' is already registered"));
    assert!(capture.has("ERROR", "entry point panicked"));
}

fn echo(_host: HostHandle) -> Box<dyn Plugin> {
    Box::new(MockPlugin::new("echo").with_subscription(Subscription::new(
        topics::TEXT_INPUT,
        |host: &dyn HostApi, event: &Event, sync: &HandlerSync| -> Result<(), PluginError> {
            sync.report(1);
            host.write_text(&format!("echo: {}\n", event.text().unwrap_or_default()))
        },
    )))
}

#[test]
fn test_plugin_event_handler_wired_and_released() {
    let (mut host, sink) = start(&[echo]);

    let outcome = host.submit_input("dance").unwrap();
    assert_eq!(outcome.handled(), 2);
    assert!(sink.contents().ends_with("echo: dance\n"));

    let dispatcher = host.services().dispatcher().unwrap();
    assert_eq!(dispatcher.subscriber_count(topics::TEXT_INPUT), 2);

    host.stop(StopReason::Normal).unwrap();
    assert_eq!(dispatcher.subscriber_count(topics::TEXT_INPUT), 0);
    host.dispose().unwrap();
}

#[test]
fn test_plugin_hooks_follow_host_lifecycle() {
    let mock = MockPlugin::new("watcher");
    let observed = mock.clone();

    let (mut host, _) = start(&[]);

    // a plugin registered after startup still gets unloaded by quit
    let registry = host.services().plugin_registry().unwrap();
    let loaded = msa_plugin_runtime::LoadedPlugin {
        plugin: Box::new(mock),
        origin: msa_plugin_runtime::PluginOrigin::Static,
        library: None,
    };
    let context = msa_plugin_api::PluginContext::new(host.handle(), serde_json::json!({}));
    let entry = registry.register(loaded, context).unwrap();
    entry.init().unwrap();

    host.stop(StopReason::Normal).unwrap();
    assert_eq!(observed.calls(), vec!["init", "teardown", "quit"]);
    assert!(host.services().plugin_registry().is_none());
}

#[test]
fn test_shutdown_breaks_host_reference_cycle() {
    let (mut host, _) = start(&[msa_example_plugin::register]);
    let services = Arc::downgrade(host.services());

    host.stop(StopReason::Normal).unwrap();
    host.dispose().unwrap();

    assert!(services.upgrade().is_none());
}
