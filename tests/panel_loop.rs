// Message loop tests driving AlarmPanel with a scripted in-memory transport.

use concord_lib::framing::{append_checksum, decode_message_from_ascii, encode_message_to_ascii};
use concord_lib::panel::{AlarmPanel, LinkState, PanelConfig, PanelHandle};
use concord_lib::protocol::{CommandId, DecodedMessage};
use concord_lib::transport::Transport;
use concord_lib::Error;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ACK: u8 = 0x06;

/// Replays scripted reads, `None` being a read timeout, and records writes.
struct ScriptedTransport {
    reads: VecDeque<Option<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> concord_lib::Result<()> {
        Ok(())
    }

    fn read_byte(&mut self) -> concord_lib::Result<Option<u8>> {
        self.reads.pop_front().ok_or(Error::TransportClosed)
    }

    fn write_all(&mut self, bytes: &[u8]) -> concord_lib::Result<()> {
        self.written.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct Harness {
    panel: AlarmPanel,
    written: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
}

impl Harness {
    fn new(reads: Vec<Option<u8>>, config: PanelConfig) -> Self {
        let written = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = ScriptedTransport {
            reads: reads.into(),
            written: Arc::clone(&written),
            closed: Arc::clone(&closed),
        };
        Self {
            panel: AlarmPanel::new(transport, config),
            written,
            closed,
        }
    }

    fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }
}

/// Wire representation of a message given without checksum.
fn wire(hex: &str) -> Vec<u8> {
    let mut msg = decode_message_from_ascii(hex).unwrap();
    append_checksum(&mut msg);
    let mut out = vec![b'\n'];
    out.extend(encode_message_to_ascii(&msg).into_bytes());
    out
}

fn reads(chunks: &[&[u8]]) -> Vec<Option<u8>> {
    chunks.iter().flat_map(|c| c.iter().copied().map(Some)).collect()
}

const ZONE_STATUS: &str = "0721050000a719";

#[test]
fn frame_is_acked_and_dispatched_to_handlers_in_order() {
    let mut h = Harness::new(reads(&[&wire(ZONE_STATUS)]), PanelConfig::default());
    let calls = Arc::new(Mutex::new(Vec::new()));
    for name in ["first", "second"] {
        let calls = Arc::clone(&calls);
        h.panel
            .register_handler(CommandId::ZoneStatus, move |msg: &DecodedMessage| {
                if let DecodedMessage::ZoneStatus(zone) = msg {
                    calls.lock().unwrap().push((name, zone.zone_number));
                }
                Ok(())
            });
    }

    let result = h.panel.run();

    assert!(matches!(result, Err(Error::TransportClosed)));
    assert_eq!(h.written(), vec![ACK]);
    assert_eq!(*calls.lock().unwrap(), vec![("first", 167), ("second", 167)]);
    assert!(h.closed.load(Ordering::SeqCst));
    assert_eq!(h.panel.state(), LinkState::Stopped);
}

#[test]
fn checksum_failure_is_dropped_without_ack() {
    let mut corrupted = wire(ZONE_STATUS);
    let last = corrupted.len() - 1;
    corrupted[last] = if corrupted[last] == b'0' { b'1' } else { b'0' };

    let mut h = Harness::new(
        reads(&[&corrupted, &wire(ZONE_STATUS)]),
        PanelConfig::default(),
    );
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    h.panel.register_handler(CommandId::ZoneStatus, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    // End of input is reported, not the checksum error of the first frame.
    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(h.written(), vec![ACK]);
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn unknown_command_is_acked_but_not_dispatched() {
    let mut h = Harness::new(
        reads(&[&wire("027e"), &wire(ZONE_STATUS)]),
        PanelConfig::default(),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    for command in CommandId::ALL {
        let seen = Arc::clone(&seen);
        h.panel.register_handler(*command, move |msg| {
            seen.lock().unwrap().push(msg.command_id());
            Ok(())
        });
    }

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(h.written(), vec![ACK, ACK]);
    assert_eq!(*seen.lock().unwrap(), vec![CommandId::ZoneStatus]);
}

#[test]
fn garbage_and_interrupted_frames_resynchronise() {
    let mut h = Harness::new(
        reads(&[b"zz", b"\n07zz", b"\n0721", &wire(ZONE_STATUS)]),
        PanelConfig::default(),
    );
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    h.panel.register_handler(CommandId::ZoneStatus, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn failing_handler_does_not_stop_the_loop() {
    let mut h = Harness::new(
        reads(&[&wire(ZONE_STATUS), &wire(ZONE_STATUS)]),
        PanelConfig::default(),
    );
    h.panel
        .register_handler(CommandId::ZoneStatus, |_| panic!("broken handler"));
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    h.panel.register_handler(CommandId::ZoneStatus, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(*count.lock().unwrap(), 2);
    assert_eq!(h.written(), vec![ACK, ACK]);
}

#[test]
fn queued_requests_wait_for_ack() {
    let mut h = Harness::new(vec![None, Some(ACK), None], PanelConfig::default());
    let handle = h.panel.handle();
    handle.request_dynamic_refresh().unwrap();
    handle.send_keypress(&[0x0a], 3, 0).unwrap();

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(
        String::from_utf8(h.written()).unwrap(),
        "\n0220DE\n054003000AAE"
    );
    assert_eq!(handle.completed_requests(), 1);
}

#[test]
fn request_without_ack_blocks_the_queue() {
    let mut h = Harness::new(vec![None, None], PanelConfig::default());
    let handle = h.panel.handle();
    handle.request_dynamic_refresh().unwrap();
    handle.send_keypress(&[0x0a], 3, 0).unwrap();

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(String::from_utf8(h.written()).unwrap(), "\n0220DE");
    assert_eq!(handle.completed_requests(), 0);
}

#[test]
fn ack_timeout_drops_the_frame_without_retry() {
    let config = PanelConfig {
        read_timeout: Duration::from_millis(10),
        ack_timeout: Duration::ZERO,
        ..PanelConfig::default()
    };
    let mut h = Harness::new(vec![None, None, None], config);
    let handle = h.panel.handle();
    handle.request_dynamic_refresh().unwrap();
    handle.request_all_equipment().unwrap();

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(
        String::from_utf8(h.written()).unwrap(),
        "\n0220DE\n0202FC"
    );
    assert_eq!(handle.completed_requests(), 2);
}

#[test]
fn nak_drops_the_frame() {
    let mut h = Harness::new(vec![None, Some(0x15), None], PanelConfig::default());
    let handle = h.panel.handle();
    handle.request_equipment(concord_lib::request::EquipmentCategory::ZoneData).unwrap();
    handle.request_dynamic_refresh().unwrap();

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(
        String::from_utf8(h.written()).unwrap(),
        "\n030203F8\n0220DE"
    );
    assert_eq!(handle.completed_requests(), 1);
}

#[test]
fn injected_alarm_reaches_handlers_without_touching_the_wire() {
    let mut h = Harness::new(Vec::new(), PanelConfig::default());
    let alarms = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&alarms);
    h.panel.register_handler(CommandId::Alarm, move |msg| {
        if let DecodedMessage::Alarm(alarm) = msg {
            seen.lock().unwrap().push(alarm.clone());
        }
        Ok(())
    });
    h.panel.handle().inject_alarm(3, 1, 4).unwrap();

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert!(h.written().is_empty());
    let alarms = alarms.lock().unwrap();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].partition_number, 3);
    assert_eq!(alarms[0].alarm_general_type, "Alarm");
    assert_eq!(alarms[0].alarm_specific_type, "Police Panic");
}

#[test]
fn stop_from_handler_ends_the_loop_cleanly() {
    let mut h = Harness::new(
        reads(&[&wire(ZONE_STATUS), &wire(ZONE_STATUS), &wire(ZONE_STATUS)]),
        PanelConfig::default(),
    );
    let handle = h.panel.handle();
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    let stopper = handle.clone();
    h.panel.register_handler(CommandId::ZoneStatus, move |_| {
        *counter.lock().unwrap() += 1;
        stopper.stop();
        Ok(())
    });

    assert!(h.panel.run().is_ok());
    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(handle.state(), LinkState::Stopped);
    assert!(h.closed.load(Ordering::SeqCst));
}

#[test]
fn receive_frame_reports_errors_per_frame() {
    let mut h = Harness::new(Vec::new(), PanelConfig::default());

    let mut msg = decode_message_from_ascii(ZONE_STATUS).unwrap();
    append_checksum(&mut msg);
    assert_eq!(h.panel.receive_frame(&msg).unwrap(), 0);

    let last = msg.len() - 1;
    msg[last] = msg[last].wrapping_add(1);
    assert!(matches!(
        h.panel.receive_frame(&msg),
        Err(Error::ChecksumError { .. })
    ));

    let mut unknown = vec![0x02, 0x7e];
    append_checksum(&mut unknown);
    assert!(matches!(
        h.panel.receive_frame(&unknown),
        Err(Error::UnknownCommand(_))
    ));
    assert_eq!(h.written(), vec![ACK, ACK]);
}

#[test]
fn bad_length_frame_is_acked_but_not_dispatched() {
    let mut h = Harness::new(
        reads(&[&wire("0621050000a7"), &wire(ZONE_STATUS)]),
        PanelConfig::default(),
    );
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    h.panel.register_handler(CommandId::ZoneStatus, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(h.written(), vec![ACK, ACK]);
    assert_eq!(*count.lock().unwrap(), 1);
}

/// Raises a stop request from inside a read, as if another thread stopped
/// the panel while a frame was arriving. Read timeouts take `idle_pause`.
struct StopDuringRead {
    inner: ScriptedTransport,
    reads: usize,
    stop_at: usize,
    idle_pause: Duration,
    handle: Arc<Mutex<Option<PanelHandle>>>,
}

impl StopDuringRead {
    fn new(reads: Vec<Option<u8>>, stop_at: usize, written: &Arc<Mutex<Vec<u8>>>) -> Self {
        Self {
            inner: ScriptedTransport {
                reads: reads.into(),
                written: Arc::clone(written),
                closed: Arc::new(AtomicBool::new(false)),
            },
            reads: 0,
            stop_at,
            idle_pause: Duration::ZERO,
            handle: Arc::new(Mutex::new(None)),
        }
    }
}

impl Transport for StopDuringRead {
    fn open(&mut self) -> concord_lib::Result<()> {
        self.inner.open()
    }

    fn read_byte(&mut self) -> concord_lib::Result<Option<u8>> {
        self.reads += 1;
        if self.reads == self.stop_at {
            if let Some(handle) = self.handle.lock().unwrap().as_ref() {
                handle.stop();
            }
        }
        let byte = self.inner.read_byte()?;
        if byte.is_none() {
            std::thread::sleep(self.idle_pause);
        }
        Ok(byte)
    }

    fn write_all(&mut self, bytes: &[u8]) -> concord_lib::Result<()> {
        self.inner.write_all(bytes)
    }

    fn close(&mut self) {
        self.inner.close()
    }
}

#[test]
fn stop_waits_for_the_frame_in_progress() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let transport = StopDuringRead::new(
        reads(&[&wire(ZONE_STATUS), &wire(ZONE_STATUS)]),
        4,
        &written,
    );
    let slot = Arc::clone(&transport.handle);
    let mut panel = AlarmPanel::new(transport, PanelConfig::default());
    *slot.lock().unwrap() = Some(panel.handle());
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    panel.register_handler(CommandId::ZoneStatus, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    assert!(panel.run().is_ok());
    assert_eq!(*written.lock().unwrap(), vec![ACK]);
    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(panel.state(), LinkState::Stopped);
}

#[test]
fn stalled_partial_frame_does_not_block_stop() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let mut script = reads(&[b"\n0721"]);
    script.extend([None; 5]);
    let mut transport = StopDuringRead::new(script, 3, &written);
    transport.idle_pause = Duration::from_millis(50);
    let slot = Arc::clone(&transport.handle);
    let config = PanelConfig {
        frame_timeout: Duration::from_millis(20),
        ..PanelConfig::default()
    };
    let mut panel = AlarmPanel::new(transport, config);
    *slot.lock().unwrap() = Some(panel.handle());

    assert!(panel.run().is_ok());
    assert!(written.lock().unwrap().is_empty());
    assert_eq!(panel.state(), LinkState::Stopped);
}

#[test]
fn requests_fail_once_the_loop_has_ended() {
    let mut h = Harness::new(Vec::new(), PanelConfig::default());
    let handle = h.panel.handle();

    assert!(matches!(h.panel.run(), Err(Error::TransportClosed)));
    assert_eq!(handle.state(), LinkState::Stopped);
    assert!(handle.is_stopped());
    assert!(matches!(
        handle.request_dynamic_refresh(),
        Err(Error::TransportClosed)
    ));
    assert!(matches!(
        handle.inject_alarm(1, 1, 4),
        Err(Error::TransportClosed)
    ));
}
