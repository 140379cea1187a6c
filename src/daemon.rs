use anyhow::{Context, Result};
use concord_lib::protocol::{CommandId, DecodedMessage};
use concord_lib::state::{PanelState, StateChange, ZoneRecord};
use concord_lib::AlarmPanel;
use log::{error, info, log, warn, Level};
use serde_json::json;
use std::sync::mpsc;

use crate::{commandline, mqtt};

/// Messages the panel repeats all the time.
fn chatter_level(command: CommandId) -> Level {
    match command {
        CommandId::Touchpad | CommandId::SirenSync => Level::Trace,
        _ => Level::Debug,
    }
}

/// Forwards every decoded message to the returned channel, so the loop
/// thread never waits on console or broker output.
pub fn forward_messages(panel: &mut AlarmPanel) -> mpsc::Receiver<DecodedMessage> {
    let (tx, rx) = mpsc::channel();
    for command in CommandId::ALL {
        let tx = tx.clone();
        panel.register_handler(*command, move |msg| {
            tx.send(msg.clone())?;
            Ok(())
        });
    }
    rx
}

fn publish_simple_format(
    publisher: &mut mqtt::MqttPublisher,
    base_topic: &str,
    name: &str,
    value: &serde_json::Value,
) {
    fn publish_recursive(
        publisher: &mut mqtt::MqttPublisher,
        topic: &str,
        val: &serde_json::Value,
    ) {
        let payload = match val {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let sub_topic = format!("{topic}/{k}");
                    publish_recursive(publisher, &sub_topic, v);
                }
                return;
            }
            serde_json::Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    let sub_topic = format!("{topic}/{i}");
                    publish_recursive(publisher, &sub_topic, v);
                }
                return;
            }
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            // Do not publish null values
            serde_json::Value::Null => return,
        };
        if let Err(e) = publisher.publish(topic, &payload) {
            error!("Failed to publish message to topic {topic}: {e}");
        }
    }
    let root_topic = format!("{base_topic}/{name}");
    publish_recursive(publisher, &root_topic, value);
}

fn zone_summary_json(zone: &ZoneRecord) -> serde_json::Value {
    json!({
        "zone_number": zone.zone_number,
        "name": zone.name(),
        "state": zone.summary(),
        "zone_state": zone.zone_state,
    })
}

enum Output {
    Console,
    Mqtt {
        publisher: mqtt::MqttPublisher,
        format: commandline::MqttFormat,
    },
}

impl Output {
    fn message(&mut self, msg: &DecodedMessage) -> Result<()> {
        match self {
            Output::Console => {
                println!(
                    "[{}] {}: {:?}",
                    chrono::Local::now().to_rfc3339(),
                    msg.command_id().display_name(),
                    msg
                );
            }
            Output::Mqtt { publisher, format } => {
                let name = msg.command_id().as_str().to_lowercase();
                let value = serde_json::to_value(msg)
                    .with_context(|| format!("Failed to serialize {}", msg.command_id()))?;
                match format {
                    commandline::MqttFormat::Json => {
                        let payload = json!({
                            "timestamp": chrono::Utc::now().to_rfc3339(),
                            "message": value,
                        });
                        let topic = format!("{}/{}", publisher.topic(), name);
                        publisher.publish(&topic, &payload.to_string())?;
                    }
                    commandline::MqttFormat::Simple => {
                        let base_topic = publisher.topic().to_string();
                        publish_simple_format(publisher, &base_topic, &name, &value);
                    }
                }
            }
        }
        Ok(())
    }

    fn zone(&mut self, zone: &ZoneRecord) -> Result<()> {
        match self {
            Output::Console => {
                let summary = zone.summary();
                println!(
                    "[{}] Zone {}: {} {}",
                    chrono::Local::now().to_rfc3339(),
                    zone.name(),
                    summary,
                    zone.zone_state
                );
            }
            Output::Mqtt { publisher, format } => {
                let topic = format!("{}/zone/{}", publisher.topic(), zone.zone_number);
                match format {
                    commandline::MqttFormat::Json => {
                        publisher.publish(&topic, &zone_summary_json(zone).to_string())?
                    }
                    commandline::MqttFormat::Simple => {
                        publisher.publish(&format!("{topic}/state"), zone.summary().as_str())?;
                        publisher.publish(&format!("{topic}/name"), &zone.name())?;
                    }
                }
            }
        }
        Ok(())
    }
}

pub fn run(
    mut panel: AlarmPanel,
    output: commandline::DaemonOutput,
    initial_query: bool,
) -> Result<()> {
    info!("Starting daemon mode: output={output:?}, initial_query={initial_query}");

    let mut output = match output {
        commandline::DaemonOutput::Console => Output::Console,
        commandline::DaemonOutput::Mqtt {
            config_file,
            format,
        } => {
            let config = mqtt::MqttConfig::load(&config_file)
                .with_context(|| format!("Failed to open MQTT config file at '{config_file}'"))?;
            info!("Successfully loaded MQTT config from {config_file}: {config:?}");
            let publisher = mqtt::MqttPublisher::new(config)
                .with_context(|| "Failed to create MQTT publisher")?;
            info!("MQTT Publisher created successfully.");
            Output::Mqtt { publisher, format }
        }
    };

    let messages = forward_messages(&mut panel);
    let handle = panel.handle();
    let worker = std::thread::Builder::new()
        .name("panel".to_string())
        .spawn(move || panel.run())
        .with_context(|| "Cannot start panel thread")?;

    if initial_query {
        handle.request_all_equipment()?;
        handle.request_dynamic_refresh()?;
    }

    let mut state = PanelState::new();
    // Ends once the panel thread has finished and dropped its handlers.
    for msg in messages {
        log!(
            chatter_level(msg.command_id()),
            "Handling panel message {}, {}",
            msg.command_id(),
            msg.command_id().display_name()
        );
        if let Err(e) = output.message(&msg) {
            error!("Cannot output {}: {e:#}", msg.command_id());
        }
        match state.apply(&msg) {
            Some(StateChange::ZoneLearned(number)) | Some(StateChange::ZoneUpdated(number)) => {
                if let Some(zone) = state.zone(number) {
                    if zone.summary().is_error() {
                        warn!("Zone {} is in {} state: {}", zone.name(), zone.summary(), zone.zone_state);
                    }
                    if let Err(e) = output.zone(zone) {
                        error!("Cannot output zone {}: {e:#}", zone.name());
                    }
                }
            }
            Some(StateChange::EquipmentListComplete) => info!("Panel is ready"),
            Some(StateChange::Alarm(partition)) => warn!("Alarm on partition {partition}"),
            Some(StateChange::Cleared) if initial_query => {
                info!("Reloading equipment list after image clear");
                if let Err(e) = handle.request_all_equipment() {
                    warn!("Cannot reload equipment list: {e}");
                }
            }
            _ => {}
        }
    }

    match worker.join() {
        Ok(result) => result.with_context(|| "Panel connection lost"),
        Err(_) => anyhow::bail!("Panel thread panicked"),
    }
}
