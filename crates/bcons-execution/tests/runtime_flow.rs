use std::sync::Arc;
use std::time::Duration;

use bcons_core::config::RelayConfig;
use bcons_core::console::RecordingConsole;
use bcons_core::message::WireMessage;
use bcons_core::user::UserData;
use bcons_execution::{RelayOptions, RelayRuntime, RelayServices};
use bcons_infrastructure::{
    HttpUserDataApi, InMemorySecretStore, InMemoryUserDataRepository, LoopbackTransport,
    RecordingNetRules, TransportEvent,
};
use serde_json::json;

fn user_data() -> UserData {
    serde_json::from_value(json!({
        "token": "tok",
        "wsServers": ["wss://one"],
        "projects": [{ "id": "p1", "name": "Shop", "a_domains": ["shop.test"] }],
        "preferences": {
            "consoleSettings": { "default": { "sendConsole": true, "sendConsoleTabs": ["l"] } }
        }
    }))
    .unwrap()
}

async fn start() -> (RelayRuntime, LoopbackTransport, RecordingConsole) {
    let (transport, inbound) = LoopbackTransport::new();
    let services = RelayServices {
        repository: Arc::new(InMemoryUserDataRepository::new(Some(user_data()))),
        secrets: Arc::new(InMemorySecretStore::new()),
        transport: Arc::new(transport.clone()),
        api: Arc::new(HttpUserDataApi::new("http://127.0.0.1:9")),
        net_rules: Arc::new(RecordingNetRules::new()),
    };
    let console = RecordingConsole::new();
    let mut options = RelayOptions::from_config(&RelayConfig::default(), "tab-1");
    options.navigation_timeout = Duration::from_millis(500);
    let runtime = RelayRuntime::start(services, inbound, console.clone(), options).await;
    (runtime, transport, console)
}

fn log(m: &str) -> WireMessage {
    WireMessage {
        p: "p1".into(),
        m: m.into(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_messages_reach_the_console_in_arrival_order() {
    let (runtime, transport, console) = start().await;

    let ctx = runtime.navigate("https://shop.test/cart").await.unwrap();
    assert_eq!(ctx.project_id(), "p1");
    assert!(runtime.navigate("https://shop.test/cart").await.is_none());

    for m in ["one", "two"] {
        assert!(transport.inject(log(m)).unwrap());
    }
    runtime.panel_shown();
    for m in ["three", "four"] {
        assert!(transport.inject(log(m)).unwrap());
    }

    runtime.shutdown().await;

    let bodies: Vec<_> = console.lines().into_iter().map(|l| l.content.to_value()).collect();
    assert_eq!(bodies, vec!["one", "two", "three", "four"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_leaving_the_project_closes_the_session() {
    let (runtime, transport, console) = start().await;

    runtime.navigate("https://shop.test/").await.unwrap();
    let ctx = runtime.navigate("https://other.test/").await.unwrap();
    assert_eq!(ctx.project_id(), "");

    assert!(transport.session().unwrap().is_none());
    assert!(!transport.inject(log("dropped")).unwrap());
    assert!(matches!(transport.events().last(), Some(TransportEvent::Disconnected)));

    runtime.shutdown().await;
    assert!(console.calls().is_empty());
}
