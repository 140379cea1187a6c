//! Outbound commands sent to the panel.
//!
//! The builders return the message without checksum, it is appended when the
//! message is queued for transmission.

use crate::protocol::Identity;
use crate::tables;
use crate::{Error, Result};

/// Command byte of the equipment list request.
pub const EQUIPMENT_LIST: u8 = 0x02;
/// Command byte of the dynamic data refresh request.
pub const DYNAMIC_DATA_REFRESH: u8 = 0x20;
/// Command byte of the keypress command.
pub const KEYPRESS: u8 = 0x40;

/// Upper bound of keys in a single keypress command.
pub const MAX_KEYS: usize = 54;

/// What an equipment list request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentCategory {
    All,
    ZoneData,
    PartitionData,
    BusDeviceData,
    BusCapabilities,
    OutputData,
    UserData,
    ScheduleData,
    ScheduledEventData,
    LightAttach,
}

impl EquipmentCategory {
    pub const ALL: &'static [EquipmentCategory] = &[
        EquipmentCategory::All,
        EquipmentCategory::ZoneData,
        EquipmentCategory::PartitionData,
        EquipmentCategory::BusDeviceData,
        EquipmentCategory::BusCapabilities,
        EquipmentCategory::OutputData,
        EquipmentCategory::UserData,
        EquipmentCategory::ScheduleData,
        EquipmentCategory::ScheduledEventData,
        EquipmentCategory::LightAttach,
    ];

    pub fn code(&self) -> u8 {
        match self {
            EquipmentCategory::All => 0x00,
            EquipmentCategory::ZoneData => 0x03,
            EquipmentCategory::PartitionData => 0x04,
            EquipmentCategory::BusDeviceData => 0x05,
            EquipmentCategory::BusCapabilities => 0x06,
            EquipmentCategory::OutputData => 0x07,
            EquipmentCategory::UserData => 0x09,
            EquipmentCategory::ScheduleData => 0x0a,
            EquipmentCategory::ScheduledEventData => 0x0b,
            EquipmentCategory::LightAttach => 0x0c,
        }
    }

    /// Request type code -> category. 0x08 is not a valid request type.
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.code() == code)
            .ok_or(Error::InvalidRequestType(code))
    }

    pub fn description(&self) -> &'static str {
        match self {
            EquipmentCategory::All => "All Data",
            EquipmentCategory::ZoneData => "Zone Data",
            EquipmentCategory::PartitionData => "Partition Data",
            EquipmentCategory::BusDeviceData => "Superbus Device Data",
            EquipmentCategory::BusCapabilities => "Superbus Device Capabilities Data",
            EquipmentCategory::OutputData => "Output Data",
            EquipmentCategory::UserData => "User Data",
            EquipmentCategory::ScheduleData => "Schedule Data",
            EquipmentCategory::ScheduledEventData => "Scheduled Event Data",
            EquipmentCategory::LightAttach => "Light to Sensor Attachment",
        }
    }
}

impl std::str::FromStr for EquipmentCategory {
    type Err = String;

    /// Accepts the names `all`, `zone`, `partition`, ... or a request type code.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let category = match s.to_ascii_lowercase().as_str() {
            "all" => EquipmentCategory::All,
            "zone" | "zones" => EquipmentCategory::ZoneData,
            "partition" | "partitions" => EquipmentCategory::PartitionData,
            "bus-device" => EquipmentCategory::BusDeviceData,
            "bus-capabilities" => EquipmentCategory::BusCapabilities,
            "output" | "outputs" => EquipmentCategory::OutputData,
            "user" | "users" => EquipmentCategory::UserData,
            "schedule" => EquipmentCategory::ScheduleData,
            "event" | "events" => EquipmentCategory::ScheduledEventData,
            "light-attach" => EquipmentCategory::LightAttach,
            other => {
                let code = parse_code(other)
                    .ok_or_else(|| format!("unknown equipment category '{s}'"))?;
                return EquipmentCategory::from_code(code).map_err(|e| e.to_string());
            }
        };
        Ok(category)
    }
}

/// Decimal or `0x` prefixed hex.
fn parse_code(s: &str) -> Option<u8> {
    match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

pub fn build_equipment_list(category: EquipmentCategory) -> Vec<u8> {
    match category {
        EquipmentCategory::All => vec![0x02, EQUIPMENT_LIST],
        other => vec![0x03, EQUIPMENT_LIST, other.code()],
    }
}

pub fn build_dynamic_data_refresh() -> Vec<u8> {
    vec![0x02, DYNAMIC_DATA_REFRESH]
}

/// Keypress sequence for a partition/area.
///
/// All key codes must be in the keypress table.
pub fn build_keypress(keys: &[u8], partition: u8, area: u8) -> Result<Vec<u8>> {
    if keys.len() > MAX_KEYS {
        return Err(Error::TooManyKeys {
            count: keys.len(),
            max: MAX_KEYS,
        });
    }
    if let Some(invalid) = keys.iter().find(|k| tables::key_name(**k).is_none()) {
        return Err(Error::InvalidKeyCode(*invalid));
    }
    let mut msg = Vec::with_capacity(4 + keys.len());
    msg.extend_from_slice(&[4 + keys.len() as u8, KEYPRESS, partition, area]);
    msg.extend_from_slice(keys);
    Ok(msg)
}

/// Translates touchpad notation (`0`-`9`, `*`, `#`) into key codes.
///
/// Whitespace is ignored. Characters without a key map to `InvalidKeyCode`
/// carrying the character's byte value.
pub fn parse_keys(keys: &str) -> Result<Vec<u8>> {
    keys.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0'..='9' => Ok(c as u8 - b'0'),
            '*' => Ok(0x0a),
            '#' => Ok(0x0b),
            other => Err(Error::InvalidKeyCode(other as u8)),
        })
        .collect()
}

/// Identity of an outbound message (checksum optional).
///
/// Equipment list requests for a single category use the category code as
/// secondary byte.
pub fn tx_identity(msg: &[u8]) -> Result<Identity> {
    match msg {
        [_, EQUIPMENT_LIST, category, ..] if msg[0] == 0x03 => {
            Ok(Identity::Extended(EQUIPMENT_LIST, *category))
        }
        [_, command, ..] => Ok(Identity::Single(*command)),
        _ => Err(Error::MalformedFrame(format!(
            "outbound message too short: {msg:02X?}"
        ))),
    }
}

/// Human readable name of an outbound command, for logging.
pub fn tx_command_name(identity: Identity) -> Option<String> {
    match identity {
        Identity::Single(EQUIPMENT_LIST) => Some("Full Equipment List Request".to_string()),
        Identity::Extended(EQUIPMENT_LIST, code) => EquipmentCategory::from_code(code)
            .ok()
            .filter(|category| *category != EquipmentCategory::All)
            .map(|category| {
                format!("Single Equipment List Request/{}", category.description())
            }),
        Identity::Single(DYNAMIC_DATA_REFRESH) => Some("Dynamic Data Refresh Request".to_string()),
        Identity::Single(KEYPRESS) => Some("Keypress".to_string()),
        _ => None,
    }
}
