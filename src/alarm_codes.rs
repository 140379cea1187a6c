//! Alarm and trouble event codes.
//!
//! Specific type codes only have a meaning together with their general type,
//! so the table is two levels deep: general code -> (label, specific codes).

type SpecificCodes = &'static [(u8, &'static str)];

const ALARM_TYPES: SpecificCodes = &[
    (0, "Unspecified"),
    (1, "Fire"),
    (2, "Fire Panic"),
    (3, "Police"),
    (4, "Police Panic"),
    (5, "Auxiliary"),
    (6, "Auxiliary Panic"),
    (7, "Tamper"),
    (8, "No Activity"),
    (9, "Suspicion"),
    (10, "Not used"),
    (11, "Low Temperature"),
    (12, "High Temperature"),
    (13, "Keystrike"),
    (14, "Duress"),
    (15, "Exit Fault"),
    (16, "Explosive Gas"),
    (17, "Carbon Monoxide"),
    (18, "Environmental"),
    (19, "Latchkey"),
    (20, "Equipment Tamper"),
    (21, "Holdup"),
    (22, "Sprinkler"),
    (23, "Heat"),
    (24, "Siren Tamper"),
    (25, "Smoke"),
    (26, "Repeater Tamper"),
    (27, "Fire Pump Activated"),
    (28, "Fire Pump Failure"),
    (29, "Fire Gate Valve"),
    (30, "Low CO2 Pressure"),
    (31, "Low Liquid Pressure"),
    (32, "Low Liquid Level"),
    (33, "Entry/Exit"),
    (34, "Perimeter"),
    (35, "Interior"),
    (36, "Near"),
    (37, "Water Alarm"),
];

const TROUBLE_TYPES: SpecificCodes = &[
    (0, "Unspecified"),
    (1, "Hardwire"),
    (2, "Ground Fault"),
    (3, "Device"),
    (4, "Supervisory"),
    (5, "Low Battery"),
    (6, "Tamper"),
    (7, "SAM"),
    (8, "Partial Obscurity"),
    (9, "Jam"),
    (10, "Zone AC Fail"),
    (11, "n/u"),
    (12, "NAC Trouble"),
    (13, "Analog Zone Trouble"),
    (14, "Fire Supervisory"),
    (15, "Pump Fail"),
    (16, "Fire Gate Valve Closed"),
    (17, "CO2 Pressure Trouble"),
    (18, "Liquid Pressure Trouble"),
    (19, "Liquid Level Trouble"),
];

const BYPASS_TYPES: SpecificCodes = &[
    (0, "Direct Bypass"),
    (1, "Indirect Bypass"),
    (2, "Swinger Bypass"),
    (3, "Inhibit"),
];

const OPENING_TYPES: SpecificCodes = &[
    (0, "Normal Open"),
    (1, "Early Open"),
    (2, "Late Open"),
    (3, "Fail To Open"),
    (4, "Open Exception"),
    (5, "Open Extension"),
    (6, "Open Using Keyfob/Keycard"),
    (7, "Scheduled Open"),
    (8, "Remote Open"),
];

const CLOSING_TYPES: SpecificCodes = &[
    (0, "Normal Close"),
    (1, "Early Close"),
    (2, "Late Close"),
    (3, "Fail To Close"),
    (4, "Close Exception"),
    (5, "Close Extension"),
    (6, "Close Using Keyfob/Keycard"),
    (7, "Scheduled Close"),
    (8, "Remote Close"),
    (9, "Recent Close"),
];

const PARTITION_CONFIGURATION_TYPES: SpecificCodes = &[
    (0, "User Access Code Added"),
    (1, "User Access Code Deleted"),
    (2, "User Access Code Changed"),
    (3, "User Access Code Expired"),
    (4, "User Code Authority Changed"),
    (5, "Authority Levels Changed"),
    (6, "Schedule Changed"),
    (7, "Arming or O/C Schedule Changed"),
    (8, "Zone Added"),
    (9, "Zone Deleted"),
];

const PARTITION_EVENT_TYPES: SpecificCodes = &[
    (0, "Schedule On"),
    (1, "Schedule Off"),
    (2, "Latchkey On"),
    (3, "Latchkey Off"),
    (4, "Smoke Detectors Reset"),
    (5, "Valid User Access Code Entered"),
    (6, "Arming Level Changed"),
    (7, "Alarm Reported"),
    (8, "Agent Release"),
    (9, "Agent Release Restoral"),
    (10, "Partition Remote Access"),
    (11, "Keystroke Sequence Control"),
];

const PARTITION_TEST_TYPES: SpecificCodes = &[
    (0, "Fire Drill"),
    (1, "Fire Drill End"),
    (2, "Sensor Test"),
    (3, "Sensor Test End"),
    (4, "Transmitter Test"),
    (5, "Transmitter Test End"),
    (6, "Phone Test"),
    (7, "Phone Test End"),
];

const SYSTEM_TROUBLE_TYPES: SpecificCodes = &[
    (0, "Bus Receiver Failure"),
    (1, "Bus Antenna Tamper"),
    (2, "Main Low Battery"),
    (3, "SnapCard Low Battery"),
    (4, "Module Low Battery"),
    (5, "Main AC Failure"),
    (6, "SnapCard AC Failure"),
    (7, "Module AC Failure"),
    (8, "Aux Power Failure"),
    (9, "Bus Shutdown"),
    (10, "Bus Low Power Mode"),
    (11, "Phone Line 1 Failure"),
    (12, "Phone Line 2 Failure"),
    (13, "Remote Phone Tamper"),
    (14, "Watchdog Reset"),
    (15, "RAM Failure"),
    (16, "Flash Failure"),
    (17, "Printer Error"),
    (18, "History Buffer (almost) Full"),
    (19, "History Buffer Overflow"),
    (20, "Report Buffer Overflow"),
    (21, "Bus Device Failure"),
    (22, "Failure To Communicate"),
    (23, "Long Range Radio Trouble"),
    (24, "Module Tamper Trouble"),
    (25, "Unenrolled Module Trouble"),
    (26, "Audio Output Trouble"),
    (27, "Analog Module Trouble"),
    (28, "Cell Module Trouble"),
    (29, "Buddy Failure"),
    (30, "Buddy Tamper"),
];

const SYSTEM_CONFIGURATION_TYPES: SpecificCodes = &[
    (0, "Program Mode Entry"),
    (1, "Program Mode Exit Without Change"),
    (2, "Program Mode Exit With Change"),
    (3, "Downloader Session Start"),
    (4, "Downloader Session End Without Change"),
    (5, "Downloader Session End With Change"),
    (6, "Downloader Error"),
    (7, "Downloader Connection Denied"),
    (8, "Date/Time Changed"),
    (9, "Module Added"),
    (10, "Module Deleted"),
    (11, "Speech Tokens Changed"),
    (12, "Code Changed"),
    (13, "Panel First Service"),
    (14, "Panel Back In Service"),
    (15, "Installer Code Changed"),
];

const SYSTEM_EVENT_TYPES: SpecificCodes = &[
    (0, "Callback Requested"),
    (1, "Output Activity"),
    (2, "Buddy Reception"),
    (3, "Buddy Transmission Request"),
    (4, "History Buffer Cleared"),
    (5, "Zone Expansion Module Added"),
];

const ALARM_CODES: &[(u8, &str, SpecificCodes)] = &[
    (1, "Alarm", ALARM_TYPES),
    (2, "Alarm Cancel", ALARM_TYPES),
    (3, "Alarm Restoral", ALARM_TYPES),
    (4, "Fire Trouble", TROUBLE_TYPES),
    (5, "Fire Trouble Restoral", TROUBLE_TYPES),
    (6, "Non Fire Trouble", TROUBLE_TYPES),
    (7, "Non Fire Trouble Restoral", TROUBLE_TYPES),
    (8, "Bypass", BYPASS_TYPES),
    (9, "Unbypass", BYPASS_TYPES),
    (10, "Opening", OPENING_TYPES),
    (11, "Closing", CLOSING_TYPES),
    (12, "Partition Configuration Change", PARTITION_CONFIGURATION_TYPES),
    (13, "Partition Event", PARTITION_EVENT_TYPES),
    (14, "Partition Test", PARTITION_TEST_TYPES),
    (15, "System Trouble", SYSTEM_TROUBLE_TYPES),
    (16, "System Trouble Restoral", SYSTEM_TROUBLE_TYPES),
    (17, "System Configuration Change", SYSTEM_CONFIGURATION_TYPES),
    (18, "System Event", SYSTEM_EVENT_TYPES),
];

/// Label used for either half when a code is not in the table.
pub const UNKNOWN: &str = "Unknown";

/// Returns the general and specific labels for an alarm/trouble event.
pub fn decode_alarm_type(general: u8, specific: u8) -> (&'static str, &'static str) {
    match ALARM_CODES.iter().find(|(code, _, _)| *code == general) {
        Some((_, general_name, specifics)) => {
            let specific_name = specifics
                .iter()
                .find(|(code, _)| *code == specific)
                .map(|(_, name)| *name)
                .unwrap_or(UNKNOWN);
            (*general_name, specific_name)
        }
        None => (UNKNOWN, UNKNOWN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_code_is_scoped_by_general_code() {
        assert_eq!(decode_alarm_type(1, 1), ("Alarm", "Fire"));
        assert_eq!(decode_alarm_type(8, 1), ("Bypass", "Indirect Bypass"));
        assert_eq!(decode_alarm_type(4, 9), ("Fire Trouble", "Jam"));
    }

    #[test]
    fn misses_degrade_to_unknown() {
        assert_eq!(decode_alarm_type(0, 1), (UNKNOWN, UNKNOWN));
        assert_eq!(decode_alarm_type(200, 0), (UNKNOWN, UNKNOWN));
        assert_eq!(decode_alarm_type(8, 99), ("Bypass", UNKNOWN));
    }
}
