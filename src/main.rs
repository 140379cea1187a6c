use anyhow::{bail, Context, Result};
use clap::Parser;
use concord_lib::framing::{append_checksum, decode_message_from_ascii, verify_checksum};
use concord_lib::protocol::{CommandId, DecodedMessage};
use concord_lib::request::{parse_keys, EquipmentCategory};
use concord_lib::state::PanelState;
use concord_lib::transport::{ReplayTransport, SerialTransport};
use concord_lib::{AlarmPanel, Error, PanelConfig, PanelHandle};
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::{ops::Deref, panic, time::Duration};

mod commandline;
mod daemon;
mod mqtt;

use commandline::{CliArgs, CliCommands};

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    log_handle
}

fn print_message(msg: &DecodedMessage) {
    println!(
        "{} ({}): {:#?}",
        msg.command_id().display_name(),
        msg.command_id(),
        msg
    );
}

fn print_all_messages(panel: &mut AlarmPanel) {
    for command in CommandId::ALL {
        panel.register_handler(*command, |msg| {
            print_message(msg);
            Ok(())
        });
    }
}

/// Collects the panel state on the loop thread.
fn collect_state(panel: &mut AlarmPanel) -> Arc<Mutex<PanelState>> {
    let state = Arc::new(Mutex::new(PanelState::new()));
    for command in CommandId::ALL {
        let state = Arc::clone(&state);
        panel.register_handler(*command, move |msg| {
            state
                .lock()
                .map_err(|_| "panel state lock poisoned")?
                .apply(msg);
            Ok(())
        });
    }
    state
}

fn print_state(state: &PanelState) {
    if let Some(panel) = state.panel() {
        println!(
            "Panel: {} hw {} sw {} serial {}",
            panel.panel_type, panel.hardware_revision, panel.software_revision, panel.serial_number
        );
    }
    for partition in state.partitions() {
        println!(
            "Partition {}: {} {}",
            partition.partition_number,
            partition.arming_level.as_deref().unwrap_or("unknown"),
            partition.partition_text
        );
    }
    for zone in state.zones() {
        println!(
            "Zone {}: {} {} (partition {}, group {})",
            zone.name(),
            zone.summary(),
            zone.zone_state,
            zone.partition_number,
            zone.group_number
                .map_or_else(|| "unknown".to_string(), |g| g.to_string())
        );
    }
    if !state.is_ready() {
        warn!("Equipment list was not complete");
    }
}

fn open_panel(args: &CliArgs) -> AlarmPanel {
    let config = PanelConfig {
        read_timeout: args.timeout,
        ack_timeout: args.ack_timeout,
        ..PanelConfig::default()
    };
    AlarmPanel::new(SerialTransport::new(&args.device, args.timeout), config)
}

fn start(mut panel: AlarmPanel) -> Result<JoinHandle<concord_lib::Result<()>>> {
    std::thread::Builder::new()
        .name("panel".to_string())
        .spawn(move || panel.run())
        .with_context(|| "Cannot start panel thread")
}

fn finish(handle: PanelHandle, worker: JoinHandle<concord_lib::Result<()>>) -> Result<()> {
    handle.stop();
    match worker.join() {
        Ok(result) => result.with_context(|| "Panel communication failed"),
        Err(_) => bail!("Panel thread panicked"),
    }
}

/// Waits until the queued request left the in-flight slot, bounded by `limit`.
fn wait_until_sent(handle: &PanelHandle, limit: Duration) {
    let started = std::time::Instant::now();
    while handle.completed_requests() == 0 && !handle.is_stopped() {
        if started.elapsed() >= limit {
            warn!("Request not confirmed within {limit:?}");
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());

    match &args.command {
        CliCommands::Decode { hex, fix_checksum } => {
            let mut msg = decode_message_from_ascii(hex.trim())
                .with_context(|| format!("Cannot decode hex '{hex}'"))?;
            if *fix_checksum {
                msg.pop();
                append_checksum(&mut msg);
                info!("Message with fixed checksum: {msg:02X?}");
            }
            if !verify_checksum(&msg) {
                bail!(Error::ChecksumError { frame: msg });
            }
            let decoded = concord_lib::decode_message(&msg)
                .with_context(|| format!("Cannot decode message {msg:02X?}"))?;
            print_message(&decoded);
        }
        CliCommands::Replay { file } => {
            let data = std::fs::read(file)
                .with_context(|| format!("Cannot read capture file {file:?}"))?;
            let mut panel = AlarmPanel::new(ReplayTransport::new(data), PanelConfig::default());
            print_all_messages(&mut panel);
            match panel.run() {
                Ok(()) | Err(Error::TransportClosed) => info!("End of capture"),
                Err(e) => return Err(e).with_context(|| "Cannot replay capture"),
            }
        }
        CliCommands::Listen { request_all } => {
            let mut panel = open_panel(&args);
            print_all_messages(&mut panel);
            let handle = panel.handle();
            if *request_all {
                handle.request_all_equipment()?;
            }
            let worker = start(panel)?;
            match worker.join() {
                Ok(result) => result.with_context(|| "Panel communication failed")?,
                Err(_) => bail!("Panel thread panicked"),
            }
        }
        CliCommands::Equipment { category, wait } => {
            let mut panel = open_panel(&args);
            let state = collect_state(&mut panel);
            let handle = panel.handle();
            if *category == EquipmentCategory::All {
                handle.request_all_equipment()?;
            } else {
                handle.request_equipment(*category)?;
            }
            let worker = start(panel)?;
            std::thread::sleep(*wait);
            finish(handle, worker)?;
            let state = state
                .lock()
                .map_err(|_| anyhow::anyhow!("panel state lock poisoned"))?;
            print_state(&state);
        }
        CliCommands::Refresh { wait } => {
            let mut panel = open_panel(&args);
            print_all_messages(&mut panel);
            let handle = panel.handle();
            handle.request_dynamic_refresh()?;
            let worker = start(panel)?;
            std::thread::sleep(*wait);
            finish(handle, worker)?;
        }
        CliCommands::Keypress {
            partition,
            area,
            keys,
        } => {
            let codes = parse_keys(keys).with_context(|| format!("Invalid keys '{keys}'"))?;
            let panel = open_panel(&args);
            let handle = panel.handle();
            handle
                .send_keypress(&codes, *partition, *area)
                .with_context(|| "Cannot send keypress")?;
            let worker = start(panel)?;
            wait_until_sent(&handle, args.ack_timeout + Duration::from_secs(1));
            finish(handle, worker)?;
        }
        CliCommands::Daemon {
            output,
            no_initial_query,
        } => {
            let panel = open_panel(&args);
            daemon::run(panel, output.clone(), !no_initial_query)?;
        }
    }

    Ok(())
}
