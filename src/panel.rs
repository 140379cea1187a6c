//! Message loop talking to the panel.
//!
//! [`AlarmPanel`] owns the transport and runs on a dedicated thread. Other
//! threads talk to it through cloned [`PanelHandle`]s: outbound requests are
//! queued without blocking and picked up by the loop between frames.
//!
//! ```no_run
//! use concord_lib::panel::{AlarmPanel, PanelConfig};
//! use concord_lib::protocol::{CommandId, DecodedMessage};
//! use concord_lib::transport::SerialTransport;
//!
//! let config = PanelConfig::default();
//! let transport = SerialTransport::new("/dev/ttyUSB0", config.read_timeout);
//! let mut panel = AlarmPanel::new(transport, config);
//! panel.register_handler(CommandId::ZoneStatus, |msg: &DecodedMessage| {
//!     println!("{:?}", msg);
//!     Ok(())
//! });
//! let handle = panel.handle();
//! let worker = std::thread::spawn(move || panel.run());
//! handle.request_all_equipment().unwrap();
//! handle.stop();
//! worker.join().unwrap().unwrap();
//! ```

use crate::framing::{
    append_checksum, encode_message_to_ascii, verify_checksum, FrameEvent, FrameReader, ACK,
    LINE_FEED,
};
use crate::protocol::{decode_message, AlarmTrouble, CommandId, DecodedMessage};
use crate::request::{self, EquipmentCategory};
use crate::transport::Transport;
use crate::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    /// How long a single byte read may block. Bounds the reaction time to
    /// [`PanelHandle::stop`] and to queued requests.
    pub read_timeout: Duration,
    /// How long a sent frame waits for the panel's ACK before it is dropped.
    pub ack_timeout: Duration,
    /// Longest gap between two bytes of one frame. A partial frame older than
    /// this is discarded.
    pub frame_timeout: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
        }
    }
}

/// Connection state of the message loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkState {
    Disconnected = 0,
    Connecting = 1,
    Listening = 2,
    /// A frame was written and the panel's ACK is outstanding.
    AwaitingAck = 3,
    Stopped = 4,
}

impl LinkState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LinkState::Connecting,
            2 => LinkState::Listening,
            3 => LinkState::AwaitingAck,
            4 => LinkState::Stopped,
            _ => LinkState::Disconnected,
        }
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Listening => "listening",
            LinkState::AwaitingAck => "awaiting ack",
            LinkState::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = std::result::Result<(), HandlerError>;
type Handler = Box<dyn FnMut(&DecodedMessage) -> HandlerResult + Send>;

/// Handlers per command, invoked in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<CommandId, Vec<Handler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (command, handlers) in &self.handlers {
            map.entry(command, &handlers.len());
        }
        map.finish()
    }
}

impl HandlerRegistry {
    pub fn register<F>(&mut self, command: CommandId, handler: F)
    where
        F: FnMut(&DecodedMessage) -> HandlerResult + Send + 'static,
    {
        self.handlers
            .entry(command)
            .or_default()
            .push(Box::new(handler));
    }

    pub fn handler_count(&self, command: CommandId) -> usize {
        self.handlers.get(&command).map_or(0, Vec::len)
    }

    /// Invokes every handler registered for the message's command and returns
    /// how many ran.
    ///
    /// A failing or panicking handler is logged, the remaining handlers still
    /// see the message.
    pub fn dispatch(&mut self, msg: &DecodedMessage) -> usize {
        let command = msg.command_id();
        let Some(handlers) = self.handlers.get_mut(&command) else {
            log::debug!("No handler for {}", command);
            return 0;
        };
        for (index, handler) in handlers.iter_mut().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(msg))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("Handler #{} for {} failed: {}", index, command, e),
                Err(_) => log::error!("Handler #{} for {} panicked", index, command),
            }
        }
        handlers.len()
    }
}

enum Outbound {
    Frame(Vec<u8>),
    Inject(DecodedMessage),
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    stop: AtomicBool,
    /// Sent frames that were ACKed, NAKed or timed out.
    completed: AtomicUsize,
}

impl Shared {
    fn state(&self) -> LinkState {
        LinkState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: LinkState) {
        let previous = self.state.swap(state as u8, Ordering::SeqCst);
        if previous != state as u8 {
            log::trace!("Link state {} -> {}", LinkState::from_u8(previous), state);
        }
    }
}

/// Thread-safe access to a running [`AlarmPanel`].
#[derive(Clone)]
pub struct PanelHandle {
    outbound: mpsc::Sender<Outbound>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for PanelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PanelHandle")
            .field("state", &self.state())
            .finish()
    }
}

impl PanelHandle {
    fn send(&self, item: Outbound) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::TransportClosed);
        }
        self.outbound.send(item).map_err(|_| Error::TransportClosed)
    }

    /// Queues a message for transmission; the checksum is appended here.
    pub fn enqueue(&self, mut payload: Vec<u8>) -> Result<()> {
        append_checksum(&mut payload);
        log::trace!("Queued {:02X?}", payload);
        self.send(Outbound::Frame(payload))
    }

    pub fn request_all_equipment(&self) -> Result<()> {
        self.enqueue(request::build_equipment_list(EquipmentCategory::All))
    }

    pub fn request_equipment(&self, category: EquipmentCategory) -> Result<()> {
        self.enqueue(request::build_equipment_list(category))
    }

    pub fn request_dynamic_refresh(&self) -> Result<()> {
        self.enqueue(request::build_dynamic_data_refresh())
    }

    pub fn send_keypress(&self, keys: &[u8], partition: u8, area: u8) -> Result<()> {
        self.enqueue(request::build_keypress(keys, partition, area)?)
    }

    /// Dispatches a synthetic alarm to the ALARM handlers on the loop thread.
    /// Nothing is written to the panel.
    pub fn inject_alarm(&self, partition: u8, general: u8, specific: u8) -> Result<()> {
        let alarm = AlarmTrouble::new(partition, general, specific);
        log::info!(
            "Injecting alarm {}/{} for partition {}",
            alarm.alarm_general_type,
            alarm.alarm_specific_type,
            partition
        );
        self.send(Outbound::Inject(DecodedMessage::Alarm(alarm)))
    }

    /// Asks the loop to stop once no frame is partially received. Calling it
    /// again has no further effect.
    pub fn stop(&self) {
        if !self.shared.stop.swap(true, Ordering::SeqCst) {
            log::debug!("Stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stop.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> LinkState {
        self.shared.state()
    }

    /// Number of sent frames that are no longer in flight, whether they were
    /// acknowledged or dropped.
    pub fn completed_requests(&self) -> usize {
        self.shared.completed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct InFlight {
    frame: Vec<u8>,
    sent_at: Instant,
}

/// The message loop: frames bytes, ACKs and decodes frames, dispatches them
/// to the registered handlers and transmits queued requests.
pub struct AlarmPanel {
    transport: Box<dyn Transport>,
    config: PanelConfig,
    registry: HandlerRegistry,
    reader: FrameReader,
    last_byte_at: Instant,
    outbound_tx: mpsc::Sender<Outbound>,
    outbound_rx: mpsc::Receiver<Outbound>,
    pending: VecDeque<Vec<u8>>,
    in_flight: Option<InFlight>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for AlarmPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("AlarmPanel")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("pending", &self.pending.len())
            .field("in_flight", &self.in_flight)
            .field("state", &self.shared.state())
            .finish()
    }
}

impl AlarmPanel {
    pub fn new(transport: impl Transport + 'static, config: PanelConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel();
        Self {
            transport: Box::new(transport),
            config,
            registry: HandlerRegistry::default(),
            reader: FrameReader::new(),
            last_byte_at: Instant::now(),
            outbound_tx,
            outbound_rx,
            pending: VecDeque::new(),
            in_flight: None,
            shared: Arc::new(Shared {
                state: AtomicU8::new(LinkState::Disconnected as u8),
                stop: AtomicBool::new(false),
                completed: AtomicUsize::new(0),
            }),
        }
    }

    /// Registers an additional handler for `command`.
    pub fn register_handler<F>(&mut self, command: CommandId, handler: F)
    where
        F: FnMut(&DecodedMessage) -> HandlerResult + Send + 'static,
    {
        self.registry.register(command, handler);
    }

    pub fn handle(&self) -> PanelHandle {
        PanelHandle {
            outbound: self.outbound_tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> LinkState {
        self.shared.state()
    }

    /// Opens the transport and processes messages until stopped or until a
    /// fatal error occurs. The transport is closed in either case and the
    /// handles refuse further requests.
    pub fn run(&mut self) -> Result<()> {
        self.shared.set_state(LinkState::Connecting);
        let result = match self.transport.open() {
            Ok(()) => {
                self.shared.set_state(LinkState::Listening);
                log::info!("Listening to panel");
                self.message_loop()
            }
            Err(e) => Err(e),
        };
        self.transport.close();
        self.in_flight = None;
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.set_state(LinkState::Stopped);
        match &result {
            Ok(()) => log::info!("Panel loop stopped"),
            Err(e) => log::error!("Panel loop failed: {}", e),
        }
        result
    }

    fn message_loop(&mut self) -> Result<()> {
        loop {
            self.expire_partial_frame();
            if self.reader.is_idle() && self.shared.stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            self.drain_outbound();
            self.expire_in_flight();

            if self.reader.is_idle() && self.in_flight.is_none() {
                if let Some(frame) = self.pending.pop_front() {
                    self.send_frame(frame)?;
                }
            }

            match self.transport.read_byte() {
                Ok(Some(byte)) => {
                    self.last_byte_at = Instant::now();
                    self.receive_byte(byte)?
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("Read failed: {}", e),
            }
        }
    }

    fn drain_outbound(&mut self) {
        while let Ok(item) = self.outbound_rx.try_recv() {
            match item {
                Outbound::Frame(frame) => self.pending.push_back(frame),
                Outbound::Inject(msg) => {
                    self.dispatch(&msg);
                }
            }
        }
    }

    fn expire_partial_frame(&mut self) {
        if !self.reader.is_idle() && self.last_byte_at.elapsed() >= self.config.frame_timeout {
            log::warn!(
                "No byte within {:?}, discarding partial frame",
                self.config.frame_timeout
            );
            self.reader.reset();
        }
    }

    fn expire_in_flight(&mut self) {
        let expired = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.sent_at.elapsed() >= self.config.ack_timeout);
        if expired {
            if let Some(flight) = self.in_flight.take() {
                log::warn!(
                    "No ACK within {:?}, dropping {:02X?}",
                    self.config.ack_timeout,
                    flight.frame
                );
                self.shared.completed.fetch_add(1, Ordering::SeqCst);
            }
            self.shared.set_state(LinkState::Listening);
        }
    }

    fn send_frame(&mut self, frame: Vec<u8>) -> Result<()> {
        let name = request::tx_identity(&frame)
            .ok()
            .and_then(request::tx_command_name)
            .unwrap_or_else(|| "Unknown command".to_string());
        log::debug!("Sending {}: {:02X?}", name, frame);

        let mut wire = Vec::with_capacity(1 + 2 * frame.len());
        wire.push(LINE_FEED);
        wire.extend_from_slice(encode_message_to_ascii(&frame).as_bytes());
        self.transport.write_all(&wire)?;

        self.in_flight = Some(InFlight {
            frame,
            sent_at: Instant::now(),
        });
        self.shared.set_state(LinkState::AwaitingAck);
        Ok(())
    }

    fn receive_byte(&mut self, byte: u8) -> Result<()> {
        match self.reader.push(byte) {
            Ok(Some(FrameEvent::Frame(frame))) => match self.receive_frame(&frame) {
                Ok(_) => Ok(()),
                Err(e) if e.is_fatal() => Err(e),
                Err(e @ Error::UnknownCommand(_)) => {
                    log::debug!("Ignoring message: {}", e);
                    Ok(())
                }
                Err(e) => {
                    log::warn!("Dropping message: {}", e);
                    Ok(())
                }
            },
            Ok(Some(FrameEvent::Ack)) => {
                match self.in_flight.take() {
                    Some(flight) => {
                        log::debug!("ACK for {:02X?}", flight.frame);
                        self.shared.completed.fetch_add(1, Ordering::SeqCst);
                    }
                    None => log::debug!("Unexpected ACK"),
                }
                self.shared.set_state(LinkState::Listening);
                Ok(())
            }
            Ok(Some(FrameEvent::Nak)) => {
                match self.in_flight.take() {
                    Some(flight) => {
                        log::warn!("NAK, dropping {:02X?}", flight.frame);
                        self.shared.completed.fetch_add(1, Ordering::SeqCst);
                    }
                    None => log::warn!("Unexpected NAK"),
                }
                self.shared.set_state(LinkState::Listening);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                log::warn!("Resynchronising: {}", e);
                Ok(())
            }
        }
    }

    /// Handles a complete binary frame as read from the wire.
    ///
    /// The frame is acknowledged as soon as its checksum verifies, before it
    /// is decoded. Returns the number of handlers invoked.
    pub fn receive_frame(&mut self, frame: &[u8]) -> Result<usize> {
        log::trace!("Received {:02X?}", frame);
        if !verify_checksum(frame) {
            return Err(Error::ChecksumError {
                frame: frame.to_vec(),
            });
        }
        self.transport.write_all(&[ACK])?;
        let msg = decode_message(frame)?;
        Ok(self.dispatch(&msg))
    }

    /// Runs all handlers for `msg` on the calling thread.
    pub fn dispatch(&mut self, msg: &DecodedMessage) -> usize {
        log::debug!(
            "Dispatching {} ({})",
            msg.command_id(),
            msg.command_id().display_name()
        );
        self.registry.dispatch(msg)
    }
}
