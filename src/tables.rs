//! Static lookup tables translating panel codes into readable names.
//!
//! Lookups never fail; callers substitute a placeholder for codes that are
//! missing from a table.

/// Panel model byte -> model name.
const PANEL_TYPES: &[(u8, &str)] = &[
    (0x14, "Concord"),
    (0x0b, "Concord Express"),
    (0x1e, "Concord Express 4"),
    (0x0e, "Concord Euro"),
    (0x0d, "Advent Commercial Fire 250"),
    (0x0f, "Advent Home Navigator 132"),
    (0x10, "Advent Commercial Burg 250"),
    (0x11, "Advent Home Navigator 250"),
    (0x15, "Advent Commercial Burg 500"),
    (0x16, "Advent Commercial Fire 500"),
    (0x17, "Advent Commercial Fire 132"),
    (0x18, "Advent Commercial Burg 132"),
];

const PANEL_TYPES_CONCORD: &[u8] = &[0x14, 0x0b, 0x1e, 0x0e];

pub fn panel_type_name(code: u8) -> Option<&'static str> {
    lookup(PANEL_TYPES, code)
}

/// True for models of the Concord family, whose revision bytes are packed
/// differently and whose zone types are meaningful.
pub fn is_concord(code: u8) -> bool {
    PANEL_TYPES_CONCORD.contains(&code)
}

/// Zone state bits, in ascending bit order.
pub const ZONE_STATES: &[(u8, &str)] = &[
    (0x01, "Tripped"),
    (0x02, "Faulted"),
    (0x04, "Alarm"),
    (0x08, "Trouble"),
    (0x10, "Bypassed"),
];

// Concord zone types only
const ZONE_TYPES: &[(u8, &str)] = &[(0, "Hardwired"), (1, "RF"), (2, "RF Touchpad")];

pub fn zone_type_name(code: u8) -> Option<&'static str> {
    lookup(ZONE_TYPES, code)
}

// Concord user number values only.
const USER_NUMBERS: &[(u8, &str)] = &[
    (246, "System Master Code"),
    (247, "Installer Code"),
    (248, "Dealer Code"),
    (249, "AVM Code"),
    (250, "Quick Arm"),
    (251, "Key Switch Arm"),
    (252, "System"),
];

/// Describes the user that changed an arming level.
///
/// Named codes win over the numeric ranges, which are checked in ascending
/// order.
pub fn user_info(user_number: u8) -> String {
    if let Some(name) = lookup(USER_NUMBERS, user_number) {
        return name.to_string();
    }
    match user_number {
        0..=229 => format!("Regular User {user_number}"),
        230..=237 => format!("Partition {} Master Code", user_number - 230),
        238..=245 => format!("Partition {} Duress Code", user_number - 238),
        _ => "Unknown Code".to_string(),
    }
}

/// Arming levels reported by the arming level message.
const ARMING_LEVELS: &[(u8, &str)] = &[
    (0, "Zone Test"),
    (1, "Off"),
    (2, "Home/Perimeter"),
    (3, "Away/Full"),
    (4, "Night"),
    (5, "Silent"),
];

pub fn arming_level_name(code: u8) -> Option<&'static str> {
    lookup(ARMING_LEVELS, code)
}

/// Arming levels reported in partition data.
const PARTITION_ARM_LEVELS: &[(u8, &str)] = &[
    (1, "Off"),
    (2, "Stay"),
    (3, "Away"),
    (8, "Phone Test"),
    (9, "Sensor Test"),
];

pub fn partition_arm_level_name(code: u8) -> Option<&'static str> {
    lookup(PARTITION_ARM_LEVELS, code)
}

const ALARM_SOURCE_TYPES: &[(u8, &str)] = &[
    (0, "Bus Device"),
    (1, "Local Phone"),
    (2, "Zone"),
    (3, "System"),
    (4, "Remote Phone"),
];

pub fn alarm_source_type_name(code: u8) -> Option<&'static str> {
    lookup(ALARM_SOURCE_TYPES, code)
}

const TOUCHPAD_MESSAGE_TYPES: &[(u8, &str)] = &[(0, "Normal"), (1, "Broadcast")];

pub fn touchpad_message_type_name(code: u8) -> Option<&'static str> {
    lookup(TOUCHPAD_MESSAGE_TYPES, code)
}

/// Key codes accepted by the keypress command. 0x16..=0x1b and 0x2b are
/// undefined.
pub const KEYPRESS_CODES: &[(u8, &str)] = &[
    (0x00, "0"),
    (0x01, "1"),
    (0x02, "2"),
    (0x03, "3"),
    (0x04, "4"),
    (0x05, "5"),
    (0x06, "6"),
    (0x07, "7"),
    (0x08, "8"),
    (0x09, "9"),
    (0x0a, "*"),
    (0x0b, "#"),
    (0x0c, "Police Panic"),
    (0x0d, "Aux. Panic"),
    (0x0e, "Fire Panic"),
    (0x10, "Lights On"),
    (0x11, "Lights Off"),
    (0x12, "Lights Toggle"),
    (0x13, "Keyswitch On"),
    (0x14, "Keyswitch Off"),
    (0x15, "Keyswitch Toggle (not implemented)"),
    (0x1c, "Fire TP - Acknowledge"),
    (0x1d, "Fire TP - Silence"),
    (0x1e, "Fire TP - Fire Test"),
    (0x1f, "Fire TP - Smoke Reset"),
    (0x20, "Keyfob Disarm"),
    (0x21, "Keyfob Arm"),
    (0x22, "Keyfob Lights"),
    (0x23, "Keyfob Star"),
    (0x24, "Keyfob Arm/Disarm"),
    (0x25, "Keyfob Lights/Star"),
    (0x26, "Keyfob Long Lights"),
    (0x27, "Keyfob Direct Arm to Level 3"),
    (0x28, "Keyfob Direct Arm to Level 2"),
    (0x29, "Keyfob Arm/Star"),
    (0x2a, "Keyfob Disarm/Lights"),
    (0x2c, "TP A Key"),
    (0x30, "TP B Key"),
    (0x2d, "TP C Key"),
    (0x33, "TP D Key"),
    (0x2e, "TP E Key"),
    (0x36, "TP F Key"),
];

pub fn key_name(code: u8) -> Option<&'static str> {
    lookup(KEYPRESS_CODES, code)
}

fn lookup(table: &'static [(u8, &'static str)], code: u8) -> Option<&'static str> {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}
