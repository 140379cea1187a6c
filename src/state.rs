//! Accumulated view of the panel built from decoded messages.
//!
//! Zone and partition messages only carry part of the picture each, so the
//! latest values are merged into one record per zone and per partition.

use crate::protocol::{AlarmTrouble, DecodedMessage, PanelType, ZoneStates};
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Condensed zone state, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "snake_case"))]
pub enum ZoneSummary {
    Normal,
    Alarm,
    Fault,
    Tripped,
    Bypassed,
    TrippedBypassed,
}

impl ZoneSummary {
    pub fn from_states(states: ZoneStates) -> Self {
        if states.is_empty() {
            ZoneSummary::Normal
        } else if states.contains(ZoneStates::ALARM) {
            ZoneSummary::Alarm
        } else if states.contains(ZoneStates::FAULTED) || states.contains(ZoneStates::TROUBLE) {
            ZoneSummary::Fault
        } else if states.contains(ZoneStates::TRIPPED) {
            if states.contains(ZoneStates::BYPASSED) {
                ZoneSummary::TrippedBypassed
            } else {
                ZoneSummary::Tripped
            }
        } else {
            ZoneSummary::Bypassed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneSummary::Normal => "normal",
            ZoneSummary::Alarm => "alarm",
            ZoneSummary::Fault => "fault",
            ZoneSummary::Tripped => "tripped",
            ZoneSummary::Bypassed => "bypassed",
            ZoneSummary::TrippedBypassed => "tripped_bypassed",
        }
    }

    /// Alarm and fault states need attention.
    pub fn is_error(&self) -> bool {
        matches!(self, ZoneSummary::Alarm | ZoneSummary::Fault)
    }
}

impl fmt::Display for ZoneSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ZoneRecord {
    pub zone_number: u16,
    pub partition_number: u8,
    pub area_number: u8,
    /// Only known once zone data was received.
    pub group_number: Option<u8>,
    pub zone_type: Option<String>,
    pub zone_text: String,
    pub zone_state: ZoneStates,
}

impl ZoneRecord {
    fn new(zone_number: u16, partition_number: u8, area_number: u8) -> Self {
        Self {
            zone_number,
            partition_number,
            area_number,
            group_number: None,
            zone_type: None,
            zone_text: String::new(),
            zone_state: ZoneStates::default(),
        }
    }

    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary::from_states(self.zone_state)
    }

    /// Zone number, followed by the zone text when known.
    pub fn name(&self) -> String {
        if self.zone_text.is_empty() {
            self.zone_number.to_string()
        } else {
            format!("{} - {}", self.zone_number, self.zone_text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PartitionRecord {
    pub partition_number: u8,
    pub area_number: u8,
    pub arming_level: Option<String>,
    pub arming_level_code: Option<u8>,
    pub partition_text: String,
    /// User that changed the arming level last.
    pub last_user: Option<String>,
    /// Latest alarm/trouble event, kept until the panel image is cleared.
    pub last_alarm: Option<AlarmTrouble>,
}

impl PartitionRecord {
    fn new(partition_number: u8, area_number: u8) -> Self {
        Self {
            partition_number,
            area_number,
            arming_level: None,
            arming_level_code: None,
            partition_text: String::new(),
            last_user: None,
            last_alarm: None,
        }
    }
}

/// What a message changed in the [`PanelState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    PanelIdentified,
    ZoneLearned(u16),
    ZoneUpdated(u16),
    PartitionUpdated(u8),
    EquipmentListComplete,
    Cleared,
    Alarm(u8),
}

/// Zone type reported for panels outside the Concord family.
const UNKNOWN_ZONE_TYPE: &str = "Unknown";

#[derive(Debug, Default, Clone)]
pub struct PanelState {
    panel: Option<PanelType>,
    zones: BTreeMap<u16, ZoneRecord>,
    partitions: BTreeMap<u8, PartitionRecord>,
    equipment_list_complete: bool,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> Option<&PanelType> {
        self.panel.as_ref()
    }

    pub fn zone(&self, zone_number: u16) -> Option<&ZoneRecord> {
        self.zones.get(&zone_number)
    }

    /// Zones in ascending zone number order.
    pub fn zones(&self) -> impl Iterator<Item = &ZoneRecord> {
        self.zones.values()
    }

    pub fn partition(&self, partition_number: u8) -> Option<&PartitionRecord> {
        self.partitions.get(&partition_number)
    }

    pub fn partitions(&self) -> impl Iterator<Item = &PartitionRecord> {
        self.partitions.values()
    }

    /// True once the panel finished sending an equipment list.
    pub fn is_ready(&self) -> bool {
        self.equipment_list_complete
    }

    fn zone_entry(&mut self, zone_number: u16, partition: u8, area: u8) -> (&mut ZoneRecord, bool) {
        match self.zones.entry(zone_number) {
            Entry::Occupied(entry) => {
                let zone = entry.into_mut();
                zone.partition_number = partition;
                zone.area_number = area;
                (zone, false)
            }
            Entry::Vacant(entry) => (entry.insert(ZoneRecord::new(zone_number, partition, area)), true),
        }
    }

    fn partition_entry(&mut self, partition: u8, area: u8) -> &mut PartitionRecord {
        let record = self
            .partitions
            .entry(partition)
            .or_insert_with(|| PartitionRecord::new(partition, area));
        record.area_number = area;
        record
    }

    /// Merges a decoded message. Messages that carry no state return `None`.
    pub fn apply(&mut self, msg: &DecodedMessage) -> Option<StateChange> {
        match msg {
            DecodedMessage::PanelType(panel) => {
                log::info!(
                    "Panel is {} (hw {}, sw {}, serial {})",
                    panel.panel_type,
                    panel.hardware_revision,
                    panel.software_revision,
                    panel.serial_number
                );
                self.panel = Some(panel.clone());
                if !panel.is_concord {
                    for zone in self.zones.values_mut() {
                        if zone.zone_type.is_some() {
                            zone.zone_type = Some(UNKNOWN_ZONE_TYPE.to_string());
                        }
                    }
                }
                Some(StateChange::PanelIdentified)
            }
            DecodedMessage::ZoneData(data) => {
                let zone_type = if self.panel.as_ref().is_some_and(|p| !p.is_concord) {
                    UNKNOWN_ZONE_TYPE.to_string()
                } else {
                    data.zone_type.clone()
                };
                let (zone, learned) =
                    self.zone_entry(data.zone_number, data.partition_number, data.area_number);
                zone.group_number = Some(data.group_number);
                zone.zone_type = Some(zone_type);
                zone.zone_text = data.zone_text.clone();
                zone.zone_state = data.zone_state;
                Some(zone_change(zone, learned, "zone data"))
            }
            DecodedMessage::ZoneStatus(status) => {
                let (zone, learned) = self.zone_entry(
                    status.zone_number,
                    status.partition_number,
                    status.area_number,
                );
                zone.zone_state = status.zone_state;
                Some(zone_change(zone, learned, "zone status"))
            }
            DecodedMessage::PartitionData(data) => {
                let partition = self.partition_entry(data.partition_number, data.area_number);
                partition.arming_level = Some(data.arming_level.clone());
                partition.arming_level_code = Some(data.arming_level_code);
                partition.partition_text = data.partition_text.clone();
                Some(StateChange::PartitionUpdated(data.partition_number))
            }
            DecodedMessage::ArmingLevel(level) => {
                let partition = self.partition_entry(level.partition_number, level.area_number);
                partition.arming_level = Some(level.arming_level.clone());
                partition.arming_level_code = Some(level.arming_level_code);
                partition.last_user = Some(level.user_info.clone());
                Some(StateChange::PartitionUpdated(level.partition_number))
            }
            DecodedMessage::Alarm(alarm) => {
                let partition = self.partition_entry(alarm.partition_number, alarm.area_number);
                partition.last_alarm = Some(alarm.clone());
                Some(StateChange::Alarm(alarm.partition_number))
            }
            DecodedMessage::EquipmentListDone => {
                if self.equipment_list_complete {
                    None
                } else {
                    self.equipment_list_complete = true;
                    log::info!(
                        "Equipment list complete: {} zones, {} partitions",
                        self.zones.len(),
                        self.partitions.len()
                    );
                    Some(StateChange::EquipmentListComplete)
                }
            }
            DecodedMessage::ClearImage => {
                log::info!("Panel requested to clear the automation image");
                self.zones.clear();
                self.partitions.clear();
                self.equipment_list_complete = false;
                Some(StateChange::Cleared)
            }
            _ => None,
        }
    }
}

fn zone_change(zone: &ZoneRecord, learned: bool, source: &str) -> StateChange {
    if learned {
        log::info!("Learning new zone {} from {}", zone.name(), source);
        StateChange::ZoneLearned(zone.zone_number)
    } else {
        log::debug!("Updating zone {} with {}", zone.name(), source);
        StateChange::ZoneUpdated(zone.zone_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ArmingLevel, ZoneData, ZoneStatus};

    fn zone_status(zone_number: u16, bits: u8) -> DecodedMessage {
        DecodedMessage::ZoneStatus(ZoneStatus {
            partition_number: 1,
            area_number: 0,
            zone_number,
            zone_state: ZoneStates::from_bits(bits),
        })
    }

    fn zone_data(zone_number: u16, text: &str) -> DecodedMessage {
        DecodedMessage::ZoneData(ZoneData {
            partition_number: 1,
            area_number: 0,
            group_number: 10,
            zone_number,
            zone_type: "Hardwired".to_string(),
            zone_type_code: 0,
            zone_state: ZoneStates::default(),
            zone_text: text.to_string(),
            zone_text_tokens: Vec::new(),
        })
    }

    #[test]
    fn summary_precedence() {
        let summary = |bits| ZoneSummary::from_states(ZoneStates::from_bits(bits));
        assert_eq!(summary(0x00), ZoneSummary::Normal);
        assert_eq!(summary(0x1f), ZoneSummary::Alarm);
        assert_eq!(summary(0x19), ZoneSummary::Fault);
        assert_eq!(summary(0x02), ZoneSummary::Fault);
        assert_eq!(summary(0x01), ZoneSummary::Tripped);
        assert_eq!(summary(0x11), ZoneSummary::TrippedBypassed);
        assert_eq!(summary(0x10), ZoneSummary::Bypassed);
        assert!(summary(0x04).is_error());
        assert!(!summary(0x11).is_error());
        assert_eq!(ZoneSummary::TrippedBypassed.to_string(), "tripped_bypassed");
    }

    #[test]
    fn zone_data_and_status_merge() {
        let mut state = PanelState::new();
        assert_eq!(
            state.apply(&zone_data(3, "FRONT DOOR")),
            Some(StateChange::ZoneLearned(3))
        );
        assert_eq!(state.apply(&zone_status(3, 0x01)), Some(StateChange::ZoneUpdated(3)));

        let zone = state.zone(3).unwrap();
        assert_eq!(zone.group_number, Some(10));
        assert_eq!(zone.zone_text, "FRONT DOOR");
        assert_eq!(zone.name(), "3 - FRONT DOOR");
        assert_eq!(zone.summary(), ZoneSummary::Tripped);
    }

    fn panel_type(code: u8, is_concord: bool) -> DecodedMessage {
        DecodedMessage::PanelType(PanelType {
            panel_type: "Test Panel".to_string(),
            panel_type_code: code,
            is_concord,
            hardware_revision: "1.0".to_string(),
            software_revision: "2.0".to_string(),
            serial_number: 1234,
        })
    }

    #[test]
    fn zone_type_is_unknown_outside_concord_family() {
        let mut state = PanelState::new();
        state.apply(&zone_data(1, "HALL"));
        assert_eq!(state.zone(1).unwrap().zone_type.as_deref(), Some("Hardwired"));

        assert_eq!(state.apply(&panel_type(0x0d, false)), Some(StateChange::PanelIdentified));
        assert_eq!(state.zone(1).unwrap().zone_type.as_deref(), Some("Unknown"));
        state.apply(&zone_data(2, "GARAGE"));
        assert_eq!(state.zone(2).unwrap().zone_type.as_deref(), Some("Unknown"));

        let mut concord = PanelState::new();
        concord.apply(&panel_type(0x14, true));
        concord.apply(&zone_data(2, "GARAGE"));
        assert_eq!(concord.zone(2).unwrap().zone_type.as_deref(), Some("Hardwired"));
    }

    #[test]
    fn status_before_data_learns_the_zone() {
        let mut state = PanelState::new();
        assert_eq!(state.apply(&zone_status(9, 0x10)), Some(StateChange::ZoneLearned(9)));
        let zone = state.zone(9).unwrap();
        assert_eq!(zone.group_number, None);
        assert_eq!(zone.name(), "9");
        assert_eq!(zone.summary(), ZoneSummary::Bypassed);
    }

    #[test]
    fn arming_level_updates_partition() {
        let mut state = PanelState::new();
        let msg = DecodedMessage::ArmingLevel(ArmingLevel {
            partition_number: 2,
            area_number: 0,
            is_keyfob: false,
            user_number_high: 0,
            user_number_low: 5,
            user_info: "Regular User 5".to_string(),
            arming_level: "Home/Perimeter".to_string(),
            arming_level_code: 2,
        });
        assert_eq!(state.apply(&msg), Some(StateChange::PartitionUpdated(2)));
        let partition = state.partition(2).unwrap();
        assert_eq!(partition.arming_level.as_deref(), Some("Home/Perimeter"));
        assert_eq!(partition.last_user.as_deref(), Some("Regular User 5"));
    }

    #[test]
    fn alarm_is_kept_per_partition() {
        let mut state = PanelState::new();
        let alarm = AlarmTrouble::new(4, 1, 1);
        assert_eq!(
            state.apply(&DecodedMessage::Alarm(alarm.clone())),
            Some(StateChange::Alarm(4))
        );
        assert_eq!(state.partition(4).unwrap().last_alarm, Some(alarm));
    }

    #[test]
    fn equipment_list_and_clear_image() {
        let mut state = PanelState::new();
        state.apply(&zone_status(1, 0));
        assert!(!state.is_ready());
        assert_eq!(
            state.apply(&DecodedMessage::EquipmentListDone),
            Some(StateChange::EquipmentListComplete)
        );
        assert_eq!(state.apply(&DecodedMessage::EquipmentListDone), None);
        assert!(state.is_ready());

        assert_eq!(state.apply(&DecodedMessage::ClearImage), Some(StateChange::Cleared));
        assert!(!state.is_ready());
        assert_eq!(state.zones().count(), 0);
        assert_eq!(state.apply(&DecodedMessage::SirenSync), None);
    }
}
