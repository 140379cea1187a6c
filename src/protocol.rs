use crate::alarm_codes::decode_alarm_type;
use crate::framing::{be_u32, check_length, LengthRule};
use crate::tables;
use crate::tokens::decode_text_tokens;
use crate::{Error, Result};
use std::fmt;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Offset of the (primary) command byte, right after the length byte.
const COMMAND_OFFSET: usize = 1;

/// Primary command bytes that are always followed by a secondary byte.
const EXTENDED_PRIMARIES: &[u8] = &[0x22, 0x23];

/// Identity of a command, used as lookup key on the receive and the transmit
/// side alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identity {
    Single(u8),
    Extended(u8, u8),
}

impl Identity {
    pub fn is_extended_primary(primary: u8) -> bool {
        EXTENDED_PRIMARIES.contains(&primary)
    }

    /// Reads the identity of a binary message (length byte first).
    pub fn from_message(msg: &[u8]) -> Result<Self> {
        let primary = *msg
            .get(COMMAND_OFFSET)
            .ok_or_else(|| Error::MalformedFrame(format!("message too short: {msg:02X?}")))?;
        if !Self::is_extended_primary(primary) {
            return Ok(Identity::Single(primary));
        }
        let secondary = *msg.get(COMMAND_OFFSET + 1).ok_or_else(|| {
            Error::MalformedFrame(format!(
                "missing sub-command for 0x{primary:02x}: {msg:02X?}"
            ))
        })?;
        Ok(Identity::Extended(primary, secondary))
    }

    pub fn primary(&self) -> u8 {
        match *self {
            Identity::Single(primary) | Identity::Extended(primary, _) => primary,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identity::Single(code) => write!(f, "0x{code:02x}"),
            Identity::Extended(primary, secondary) => {
                write!(f, "0x{primary:02x}/0x{secondary:02x}")
            }
        }
    }
}

macro_rules! command_ids {
    ($($variant:ident => $identity:expr, $id:literal, $name:literal;)*) => {
        /// Symbolic name of every command the panel sends.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CommandId {
            $($variant,)*
        }

        impl CommandId {
            pub const ALL: &'static [CommandId] = &[$(CommandId::$variant,)*];

            pub fn identity(&self) -> Identity {
                match self {
                    $(CommandId::$variant => $identity,)*
                }
            }

            /// Stable identifier, e.g. `ZONE_STATUS`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(CommandId::$variant => $id,)*
                }
            }

            pub fn display_name(&self) -> &'static str {
                match self {
                    $(CommandId::$variant => $name,)*
                }
            }
        }
    };
}

command_ids! {
    PanelType => Identity::Single(0x01), "PANEL_TYPE", "Panel Type";
    EventLost => Identity::Single(0x02), "EVENT_LOST", "Automation Event Lost";
    // Answers to equipment list requests.
    ZoneData => Identity::Single(0x03), "ZONE_DATA", "Zone Data";
    PartitionData => Identity::Single(0x04), "PART_DATA", "Partition Data";
    BusDeviceData => Identity::Single(0x05), "BUS_DEV_DATA", "SuperBus Device Data";
    BusCapabilities => Identity::Single(0x06), "BUS_CAP_DATA", "SuperBus Device Capabilities Data";
    OutputData => Identity::Single(0x07), "OUTPUT_DATA", "Output Data";
    // Sent after all zone and SuperBus device data of an equipment list.
    EquipmentListDone => Identity::Single(0x08), "EQPT_LIST_DONE", "Equipment List Complete";
    UserData => Identity::Single(0x09), "USER_DATA", "User Data";
    ScheduleData => Identity::Single(0x0a), "SCHED_DATA", "Schedule Data";
    ScheduledEventData => Identity::Single(0x0b), "EVENT_DATA", "Scheduled Event Data";
    LightAttach => Identity::Single(0x0c), "LIGHT_ATTACH", "Light to Sensor Attachment";
    ClearImage => Identity::Single(0x20), "CLEAR_IMAGE", "Clear Automation Image";
    ZoneStatus => Identity::Single(0x21), "ZONE_STATUS", "Zone Status";
    ArmingLevel => Identity::Extended(0x22, 0x01), "ARM_LEVEL", "Arming Level";
    Alarm => Identity::Extended(0x22, 0x02), "ALARM", "Alarm/Trouble";
    EntryExitDelay => Identity::Extended(0x22, 0x03), "DELAY", "Entry/Exit Delay";
    SirenSetup => Identity::Extended(0x22, 0x04), "SIREN_SETUP", "Siren Setup";
    SirenSync => Identity::Extended(0x22, 0x05), "SIREN_SYNC", "Siren Synchronize";
    SirenGo => Identity::Extended(0x22, 0x06), "SIREN_GO", "Siren Go";
    Touchpad => Identity::Extended(0x22, 0x09), "TOUCHPAD", "Touchpad Display";
    SirenStop => Identity::Extended(0x22, 0x0b), "SIREN_STOP", "Siren Stop";
    FeatureState => Identity::Extended(0x22, 0x0c), "FEAT_STATE", "Feature State";
    Temperature => Identity::Extended(0x22, 0x0d), "TEMP", "Temperature";
    TimeAndDate => Identity::Extended(0x22, 0x0e), "TIME", "Time and Date";
    LightsState => Identity::Extended(0x23, 0x01), "LIGHTS_STATE", "Lights State Command";
    UserLights => Identity::Extended(0x23, 0x02), "USER_LIGHTS", "User Lights Command";
    KeyfobCommand => Identity::Extended(0x23, 0x03), "KEYFOB_CMD", "Keyfob Command";
}

impl CommandId {
    pub fn from_identity(identity: Identity) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.identity() == identity)
    }

    /// Case-insensitive lookup by stable identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "serde")]
impl Serialize for CommandId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn check_command(msg: &[u8], command: CommandId) -> Result<()> {
    let identity = Identity::from_message(msg)?;
    if identity != command.identity() {
        return Err(Error::MalformedFrame(format!(
            "unexpected command {identity} for {command} decoder"
        )));
    }
    Ok(())
}

/// Text tokens between a fixed header and the trailing checksum.
fn trailing_tokens(msg: &[u8], start: usize) -> &[u8] {
    let end = msg.len().saturating_sub(1);
    if end > start {
        &msg[start..end]
    } else {
        &[]
    }
}

/// Set of zone state flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(into = "Vec<&'static str>"))]
pub struct ZoneStates(u8);

impl ZoneStates {
    pub const TRIPPED: u8 = 0x01;
    pub const FAULTED: u8 = 0x02;
    pub const ALARM: u8 = 0x04;
    pub const TROUBLE: u8 = 0x08;
    pub const BYPASSED: u8 = 0x10;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Names of known flags that are set, in ascending bit order.
    pub fn names(&self) -> Vec<&'static str> {
        tables::ZONE_STATES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }

    /// No known flag is set.
    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl From<ZoneStates> for Vec<&'static str> {
    fn from(states: ZoneStates) -> Self {
        states.names()
    }
}

impl fmt::Display for ZoneStates {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PanelType {
    pub panel_type: String,
    pub panel_type_code: u8,
    pub is_concord: bool,
    pub hardware_revision: String,
    pub software_revision: String,
    pub serial_number: u32,
}

impl PanelType {
    pub const COMMAND: CommandId = CommandId::PanelType;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x0b, LengthRule::Exact)?;
        check_command(msg, Self::COMMAND)?;
        let code = msg[2];
        let is_concord = tables::is_concord(code);
        let serial_number = be_u32(&msg[7..]).ok_or_else(|| {
            Error::MalformedFrame(format!("serial number missing: {msg:02X?}"))
        })?;
        let (hardware_revision, software_revision) = if is_concord {
            // Letter/digit pair, 'A' is sent as 1 and '0' as 0.
            let letter = match msg[3] {
                1..=26 => (b'A' + msg[3] - 1) as char,
                _ => '?',
            };
            let digit = match msg[4] {
                0..=9 => (b'0' + msg[4]) as char,
                _ => '?',
            };
            (
                format!("{letter}{digit}"),
                u16::from_be_bytes([msg[5], msg[6]]).to_string(),
            )
        } else {
            (
                format!("{}.{}", msg[3], msg[4]),
                format!("{}.{}", msg[5], msg[6]),
            )
        };
        Ok(Self {
            panel_type: tables::panel_type_name(code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Unknown Panel Type 0x{code:02x}")),
            panel_type_code: code,
            is_concord,
            hardware_revision,
            software_revision,
            serial_number,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ZoneStatus {
    pub partition_number: u8,
    pub area_number: u8,
    pub zone_number: u16,
    pub zone_state: ZoneStates,
}

impl ZoneStatus {
    pub const COMMAND: CommandId = CommandId::ZoneStatus;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x07, LengthRule::Exact)?;
        check_command(msg, Self::COMMAND)?;
        Ok(Self {
            partition_number: msg[2],
            area_number: msg[3],
            zone_number: u16::from_be_bytes([msg[4], msg[5]]),
            zone_state: ZoneStates::from_bits(msg[6]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ZoneData {
    pub partition_number: u8,
    pub area_number: u8,
    pub group_number: u8,
    pub zone_number: u16,
    /// Only meaningful on Concord family panels.
    pub zone_type: String,
    pub zone_type_code: u8,
    pub zone_state: ZoneStates,
    pub zone_text: String,
    pub zone_text_tokens: Vec<u8>,
}

impl ZoneData {
    pub const COMMAND: CommandId = CommandId::ZoneData;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x09, LengthRule::AtLeast)?;
        check_command(msg, Self::COMMAND)?;
        let tokens = trailing_tokens(msg, 9);
        Ok(Self {
            partition_number: msg[2],
            area_number: msg[3],
            group_number: msg[4],
            zone_number: u16::from_be_bytes([msg[5], msg[6]]),
            zone_type: tables::zone_type_name(msg[7])
                .unwrap_or("Unknown")
                .to_string(),
            zone_type_code: msg[7],
            zone_state: ZoneStates::from_bits(msg[8]),
            zone_text: decode_text_tokens(tokens).text,
            zone_text_tokens: tokens.to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PartitionData {
    pub partition_number: u8,
    pub area_number: u8,
    pub arming_level: String,
    pub arming_level_code: u8,
    pub partition_text: String,
}

impl PartitionData {
    pub const COMMAND: CommandId = CommandId::PartitionData;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x05, LengthRule::AtLeast)?;
        check_command(msg, Self::COMMAND)?;
        Ok(Self {
            partition_number: msg[2],
            area_number: msg[3],
            arming_level: tables::partition_arm_level_name(msg[4])
                .unwrap_or("Unknown Arming Level")
                .to_string(),
            arming_level_code: msg[4],
            partition_text: decode_text_tokens(trailing_tokens(msg, 5)).text,
        })
    }
}

/// Access code of a user, when the panel sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(into = "String"))]
pub enum UserCode {
    NotSupplied,
    Code(String),
}

impl fmt::Display for UserCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserCode::NotSupplied => write!(f, "Not supplied"),
            UserCode::Code(code) => write!(f, "{code}"),
        }
    }
}

impl From<UserCode> for String {
    fn from(code: UserCode) -> Self {
        code.to_string()
    }
}

/// Packed decimal: every nibble is one digit.
fn bcd_decode(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |value, b| {
        100 * value + 10 * u32::from(b >> 4) + u32::from(b & 0x0f)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UserData {
    pub user_number: u8,
    pub user_code: UserCode,
}

impl UserData {
    pub const COMMAND: CommandId = CommandId::UserData;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x04, LengthRule::AtLeast)?;
        check_command(msg, Self::COMMAND)?;
        let code_bytes = trailing_tokens(msg, 5);
        let code_bytes = &code_bytes[..code_bytes.len().min(2)];
        let user_code = if code_bytes.is_empty() {
            UserCode::NotSupplied
        } else {
            UserCode::Code(format!("{:04}", bcd_decode(code_bytes)))
        };
        Ok(Self {
            user_number: msg[3],
            user_code,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ArmingLevel {
    pub partition_number: u8,
    pub area_number: u8,
    pub is_keyfob: bool,
    pub user_number_high: u8,
    pub user_number_low: u8,
    pub user_info: String,
    pub arming_level: String,
    pub arming_level_code: u8,
}

impl ArmingLevel {
    pub const COMMAND: CommandId = CommandId::ArmingLevel;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x08, LengthRule::Exact)?;
        check_command(msg, Self::COMMAND)?;
        Ok(Self {
            partition_number: msg[3],
            area_number: msg[4],
            is_keyfob: msg[5] > 0,
            user_number_high: msg[5],
            user_number_low: msg[6],
            user_info: tables::user_info(msg[6]),
            arming_level: tables::arming_level_name(msg[7])
                .unwrap_or("Unknown Arming Level")
                .to_string(),
            arming_level_code: msg[7],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AlarmTrouble {
    pub partition_number: u8,
    pub area_number: u8,
    pub source_type: String,
    pub source_type_code: u8,
    pub source_number: u32,
    pub alarm_general_type_code: u8,
    pub alarm_specific_type_code: u8,
    pub alarm_general_type: String,
    pub alarm_specific_type: String,
    pub event_specific_data: u16,
}

impl AlarmTrouble {
    pub const COMMAND: CommandId = CommandId::Alarm;

    const SYSTEM_SOURCE: u8 = 3;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x0d, LengthRule::Exact)?;
        check_command(msg, Self::COMMAND)?;
        let mut alarm = Self::new(msg[3], msg[9], msg[10]);
        alarm.area_number = msg[4];
        alarm.source_type = tables::alarm_source_type_name(msg[5])
            .unwrap_or("Unknown Source")
            .to_string();
        alarm.source_type_code = msg[5];
        alarm.source_number = u32::from_be_bytes([0, msg[6], msg[7], msg[8]]);
        alarm.event_specific_data = u16::from_be_bytes([msg[11], msg[12]]);
        Ok(alarm)
    }

    /// Builds an event that did not come from the wire, reported with the
    /// system as source.
    pub fn new(partition_number: u8, general: u8, specific: u8) -> Self {
        let (general_name, specific_name) = decode_alarm_type(general, specific);
        Self {
            partition_number,
            area_number: 0,
            source_type: tables::alarm_source_type_name(Self::SYSTEM_SOURCE)
                .unwrap_or("Unknown Source")
                .to_string(),
            source_type_code: Self::SYSTEM_SOURCE,
            source_number: 0,
            alarm_general_type_code: general,
            alarm_specific_type_code: specific,
            alarm_general_type: general_name.to_string(),
            alarm_specific_type: specific_name.to_string(),
            event_specific_data: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Touchpad {
    pub partition_number: u8,
    pub area_number: u8,
    pub message_type: String,
    pub display_text: String,
    /// Byte ranges of `display_text` that blink on the touchpad.
    pub blinking: Vec<Range<usize>>,
}

impl Touchpad {
    pub const COMMAND: CommandId = CommandId::Touchpad;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        check_length(msg, Self::COMMAND.identity(), 0x06, LengthRule::AtLeast)?;
        check_command(msg, Self::COMMAND)?;
        let display = decode_text_tokens(trailing_tokens(msg, 6));
        Ok(Self {
            partition_number: msg[3],
            area_number: msg[4],
            message_type: tables::touchpad_message_type_name(msg[5])
                .unwrap_or("Unknown Message Type")
                .to_string(),
            display_text: display.text,
            blinking: display.blinking,
        })
    }
}

/// A decoded message received from the panel.
///
/// Commands without useful payload carry no fields, their identity is the
/// whole information.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(tag = "command_id"))]
pub enum DecodedMessage {
    #[cfg_attr(feature = "serde", serde(rename = "PANEL_TYPE"))]
    PanelType(PanelType),
    #[cfg_attr(feature = "serde", serde(rename = "EVENT_LOST"))]
    EventLost,
    #[cfg_attr(feature = "serde", serde(rename = "ZONE_DATA"))]
    ZoneData(ZoneData),
    #[cfg_attr(feature = "serde", serde(rename = "PART_DATA"))]
    PartitionData(PartitionData),
    #[cfg_attr(feature = "serde", serde(rename = "BUS_DEV_DATA"))]
    BusDeviceData,
    #[cfg_attr(feature = "serde", serde(rename = "BUS_CAP_DATA"))]
    BusCapabilities,
    #[cfg_attr(feature = "serde", serde(rename = "OUTPUT_DATA"))]
    OutputData,
    #[cfg_attr(feature = "serde", serde(rename = "EQPT_LIST_DONE"))]
    EquipmentListDone,
    #[cfg_attr(feature = "serde", serde(rename = "USER_DATA"))]
    UserData(UserData),
    #[cfg_attr(feature = "serde", serde(rename = "SCHED_DATA"))]
    ScheduleData,
    #[cfg_attr(feature = "serde", serde(rename = "EVENT_DATA"))]
    ScheduledEventData,
    #[cfg_attr(feature = "serde", serde(rename = "LIGHT_ATTACH"))]
    LightAttach,
    #[cfg_attr(feature = "serde", serde(rename = "CLEAR_IMAGE"))]
    ClearImage,
    #[cfg_attr(feature = "serde", serde(rename = "ZONE_STATUS"))]
    ZoneStatus(ZoneStatus),
    #[cfg_attr(feature = "serde", serde(rename = "ARM_LEVEL"))]
    ArmingLevel(ArmingLevel),
    #[cfg_attr(feature = "serde", serde(rename = "ALARM"))]
    Alarm(AlarmTrouble),
    #[cfg_attr(feature = "serde", serde(rename = "DELAY"))]
    EntryExitDelay,
    #[cfg_attr(feature = "serde", serde(rename = "SIREN_SETUP"))]
    SirenSetup,
    #[cfg_attr(feature = "serde", serde(rename = "SIREN_SYNC"))]
    SirenSync,
    #[cfg_attr(feature = "serde", serde(rename = "SIREN_GO"))]
    SirenGo,
    #[cfg_attr(feature = "serde", serde(rename = "TOUCHPAD"))]
    Touchpad(Touchpad),
    #[cfg_attr(feature = "serde", serde(rename = "SIREN_STOP"))]
    SirenStop,
    #[cfg_attr(feature = "serde", serde(rename = "FEAT_STATE"))]
    FeatureState,
    #[cfg_attr(feature = "serde", serde(rename = "TEMP"))]
    Temperature,
    #[cfg_attr(feature = "serde", serde(rename = "TIME"))]
    TimeAndDate,
    #[cfg_attr(feature = "serde", serde(rename = "LIGHTS_STATE"))]
    LightsState,
    #[cfg_attr(feature = "serde", serde(rename = "USER_LIGHTS"))]
    UserLights,
    #[cfg_attr(feature = "serde", serde(rename = "KEYFOB_CMD"))]
    KeyfobCommand,
}

impl DecodedMessage {
    /// The command this message was decoded from.
    pub fn command_id(&self) -> CommandId {
        match self {
            DecodedMessage::PanelType(_) => CommandId::PanelType,
            DecodedMessage::EventLost => CommandId::EventLost,
            DecodedMessage::ZoneData(_) => CommandId::ZoneData,
            DecodedMessage::PartitionData(_) => CommandId::PartitionData,
            DecodedMessage::BusDeviceData => CommandId::BusDeviceData,
            DecodedMessage::BusCapabilities => CommandId::BusCapabilities,
            DecodedMessage::OutputData => CommandId::OutputData,
            DecodedMessage::EquipmentListDone => CommandId::EquipmentListDone,
            DecodedMessage::UserData(_) => CommandId::UserData,
            DecodedMessage::ScheduleData => CommandId::ScheduleData,
            DecodedMessage::ScheduledEventData => CommandId::ScheduledEventData,
            DecodedMessage::LightAttach => CommandId::LightAttach,
            DecodedMessage::ClearImage => CommandId::ClearImage,
            DecodedMessage::ZoneStatus(_) => CommandId::ZoneStatus,
            DecodedMessage::ArmingLevel(_) => CommandId::ArmingLevel,
            DecodedMessage::Alarm(_) => CommandId::Alarm,
            DecodedMessage::EntryExitDelay => CommandId::EntryExitDelay,
            DecodedMessage::SirenSetup => CommandId::SirenSetup,
            DecodedMessage::SirenSync => CommandId::SirenSync,
            DecodedMessage::SirenGo => CommandId::SirenGo,
            DecodedMessage::Touchpad(_) => CommandId::Touchpad,
            DecodedMessage::SirenStop => CommandId::SirenStop,
            DecodedMessage::FeatureState => CommandId::FeatureState,
            DecodedMessage::Temperature => CommandId::Temperature,
            DecodedMessage::TimeAndDate => CommandId::TimeAndDate,
            DecodedMessage::LightsState => CommandId::LightsState,
            DecodedMessage::UserLights => CommandId::UserLights,
            DecodedMessage::KeyfobCommand => CommandId::KeyfobCommand,
        }
    }
}

/// Decodes a binary message (length byte up to and including the checksum).
///
/// The checksum is not verified here, see [`crate::framing::verify_checksum`].
pub fn decode_message(msg: &[u8]) -> Result<DecodedMessage> {
    let identity = Identity::from_message(msg)?;
    let command = CommandId::from_identity(identity).ok_or(Error::UnknownCommand(identity))?;
    log::trace!("Decoding {} ({}): {:02X?}", command, identity, msg);

    Ok(match command {
        CommandId::PanelType => DecodedMessage::PanelType(PanelType::decode(msg)?),
        CommandId::EventLost => DecodedMessage::EventLost,
        CommandId::ZoneData => DecodedMessage::ZoneData(ZoneData::decode(msg)?),
        CommandId::PartitionData => DecodedMessage::PartitionData(PartitionData::decode(msg)?),
        CommandId::BusDeviceData => DecodedMessage::BusDeviceData,
        CommandId::BusCapabilities => DecodedMessage::BusCapabilities,
        CommandId::OutputData => DecodedMessage::OutputData,
        CommandId::EquipmentListDone => DecodedMessage::EquipmentListDone,
        CommandId::UserData => DecodedMessage::UserData(UserData::decode(msg)?),
        CommandId::ScheduleData => DecodedMessage::ScheduleData,
        CommandId::ScheduledEventData => DecodedMessage::ScheduledEventData,
        CommandId::LightAttach => DecodedMessage::LightAttach,
        CommandId::ClearImage => DecodedMessage::ClearImage,
        CommandId::ZoneStatus => DecodedMessage::ZoneStatus(ZoneStatus::decode(msg)?),
        CommandId::ArmingLevel => DecodedMessage::ArmingLevel(ArmingLevel::decode(msg)?),
        CommandId::Alarm => DecodedMessage::Alarm(AlarmTrouble::decode(msg)?),
        CommandId::EntryExitDelay => DecodedMessage::EntryExitDelay,
        CommandId::SirenSetup => DecodedMessage::SirenSetup,
        CommandId::SirenSync => DecodedMessage::SirenSync,
        CommandId::SirenGo => DecodedMessage::SirenGo,
        CommandId::Touchpad => DecodedMessage::Touchpad(Touchpad::decode(msg)?),
        CommandId::SirenStop => DecodedMessage::SirenStop,
        CommandId::FeatureState => DecodedMessage::FeatureState,
        CommandId::Temperature => DecodedMessage::Temperature,
        CommandId::TimeAndDate => DecodedMessage::TimeAndDate,
        CommandId::LightsState => DecodedMessage::LightsState,
        CommandId::UserLights => DecodedMessage::UserLights,
        CommandId::KeyfobCommand => DecodedMessage::KeyfobCommand,
    })
}
