// End-to-end flow: bootstrap -> bus -> synchronizer -> dashboard binding

use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use teleinfo_sync::bootstrap::{bootstrap, JsonFileSource, StaticSource};
use teleinfo_sync::bus::EventBus;
use teleinfo_sync::config::BusConfig;
use teleinfo_sync::dashboard::TeleinfoBinding;
use teleinfo_sync::device::Device;
use teleinfo_sync::event::BusMessage;
use teleinfo_sync::state::{DeviceRegistry, EventSynchronizer, SyncMetrics};
use tokio::sync::mpsc;

// ── Test wiring ───────────────────────────────────────────────────────────────

struct Session {
    registry: Arc<DeviceRegistry>,
    bus: Arc<EventBus>,
    metrics: SyncMetrics,
}

fn session(devices: Vec<Device>) -> Session {
    let config = BusConfig::default();
    let registry = Arc::new(DeviceRegistry::new());
    bootstrap(&registry, &StaticSource(devices)).unwrap();

    let metrics = SyncMetrics::new();
    let bus = Arc::new(EventBus::new(&config, metrics.clone()));
    let sync = Arc::new(EventSynchronizer::new(Arc::clone(&registry), metrics.clone()));
    sync.attach(&bus, &config).unwrap();

    Session {
        registry,
        bus,
        metrics,
    }
}

fn power(uuid: &str, params: Value) -> BusMessage {
    BusMessage::new("teleinfo.power.update", uuid, params)
}

fn attr(registry: &DeviceRegistry, uuid: &str, field: &str) -> Option<Value> {
    registry.find(uuid)?.read().attribute(field).cloned()
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_power_update_scenarios() {
    let s = session(vec![Device::new("dev-1", "instant-power")
        .with_attribute("power", 100)
        .with_attribute("lastupdate", 1000)]);

    s.bus
        .publish(&power("dev-1", json!({"power": 150, "lastupdate": 2000})))
        .unwrap();
    assert_eq!(attr(&s.registry, "dev-1", "power"), Some(json!(150)));
    assert_eq!(attr(&s.registry, "dev-1", "lastupdate"), Some(json!(2000)));

    s.bus.publish(&power("dev-1", json!({"power": 200}))).unwrap();
    assert_eq!(attr(&s.registry, "dev-1", "power"), Some(json!(200)));
    assert_eq!(attr(&s.registry, "dev-1", "lastupdate"), Some(json!(2000)));

    let before = s.registry.snapshot();
    s.bus.publish(&power("dev-999", json!({"power": 5}))).unwrap();
    assert_eq!(s.registry.snapshot(), before);
    assert_eq!(s.registry.len(), 1);
    assert_eq!(
        s.registry.find("dev-1").unwrap().read().device_type,
        "instant-power"
    );

    let metrics = s.metrics.snapshot();
    assert_eq!(metrics.applied, 2);
    assert_eq!(metrics.discarded_not_found, 1);
}

#[test]
fn test_late_device_is_not_reconciled() {
    let s = session(vec![Device::instant_power("early")]);

    // Patch arrives before "late" is loaded: dropped
    s.bus.publish(&power("late", json!({"power": 900}))).unwrap();
    s.registry
        .populate(vec![Device::instant_power("late")])
        .unwrap();

    assert_eq!(attr(&s.registry, "late", "power"), Some(json!(0)));
}

#[test]
fn test_malformed_patch_leaves_registry_untouched() {
    let s = session(vec![Device::instant_power("p")]);
    let before = s.registry.snapshot();

    let result = s.bus.publish(&power("p", json!({"power": 10, "voltage": 230})));

    assert!(result.is_err());
    assert_eq!(s.registry.snapshot(), before);
    assert_eq!(s.metrics.snapshot().rejected, 1);
}

#[tokio::test]
async fn test_queued_events_apply_last_writer_wins() {
    let s = session(vec![
        Device::instant_power("p"),
        Device::power_consumption("c"),
    ]);
    let binding = TeleinfoBinding::bind(&s.registry);

    let (tx, rx) = mpsc::channel(8);
    let pump = tokio::spawn(Arc::clone(&s.bus).run(rx));

    let messages = vec![
        power("p", json!({"power": 1100, "currentmode": "HC..", "nextmode": "BLEU"})),
        BusMessage::new(
            "teleinfo.consumption.update",
            "c",
            json!({"lastupdate": 1700000000, "heurescreuses": 4000, "heurespleines": 6000}),
        ),
        power("p", json!({"power": 2200, "currentmode": "HP.."})),
        BusMessage::new("parameters.time.now", "", json!({"hour": 0, "minute": 0})),
    ];
    for message in messages {
        tx.send(message).await.unwrap();
    }
    drop(tx);
    assert_eq!(pump.await.unwrap(), 4);

    assert_eq!(binding.power(), Some(2200));
    assert_eq!(binding.current_mode().as_deref(), Some("HP.."));
    assert_eq!(binding.next_mode().as_deref(), Some("BLEU"));
    assert_eq!(binding.consumption().unwrap().heures_pleines, Some(6000));
    assert_eq!(s.metrics.snapshot().applied, 3);
}

#[test]
fn test_bootstrap_from_devices_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!({
            "8b7f": {"type": "teleinfoinstantpower", "name": "Instant power", "power": 0},
            "c41a": {"type": "teleinfopowerconsumption", "name": "Power consumption"},
            "d3e0": {"type": "temperature", "celsius": 19.0}
        })
    )
    .unwrap();

    let registry = DeviceRegistry::new();
    let added = bootstrap(&registry, &JsonFileSource::new(file.path())).unwrap();

    assert_eq!(added, 3);
    let binding = TeleinfoBinding::bind(&registry);
    assert_eq!(binding.instant_power_device().unwrap().read().uuid, "8b7f");
    assert_eq!(binding.power_consumption_device().unwrap().read().uuid, "c41a");
}
