//! Text tokens used by the panel for zone names, partition names and
//! touchpad display contents.
//!
//! Every byte is a token: a single character or a whole word followed by a
//! space. A few control tokens affect the rendering instead of adding text.

use std::ops::Range;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The next token is displayed blinking.
const BLINK_NEXT: u8 = 0xfe;
/// Removes the last rendered character.
const BACKSPACE: u8 = 0xfd;
const LINE_BREAK: &[u8] = &[0xf9, 0xfb];
const PSEUDO_SPACE: u8 = 0xfa;

/// Rendered for tokens missing from the table.
const UNKNOWN_TOKEN: &str = "?";

const WORDS: &[(u8, &str)] = &[
    (0x30, "AC POWER"),
    (0x31, "ACCESS"),
    (0x32, "ACCOUNT"),
    (0x33, "ALARM"),
    (0x34, "ALL"),
    (0x35, "ARM"),
    (0x36, "ARMING"),
    (0x37, "AREA"),
    (0x38, "ATTIC"),
    (0x39, "AUTO"),
    (0x3a, "AUXILIARY"),
    (0x3b, "AWAY"),
    (0x3c, "BACK"),
    (0x3d, "BATTERY"),
    (0x3e, "BEDROOM"),
    (0x3f, "BEEPS"),
    (0x40, "BOTTOM"),
    (0x41, "BREEZEWAY"),
    (0x42, "BASEMENT"),
    (0x43, "BATHROOM"),
    (0x44, "BUS"),
    (0x45, "BYPASS"),
    (0x46, "BYPASSED"),
    (0x47, "CABINET"),
    (0x48, "CANCELED"),
    (0x49, "CARPET"),
    (0x4a, "CHIME"),
    (0x4b, "CLOSET"),
    (0x4c, "CLOSING"),
    (0x4d, "CODE"),
    (0x4e, "CONTROL"),
    (0x4f, "CPU"),
    (0x50, "DEGREES"),
    (0x51, "DEN"),
    (0x52, "DESK"),
    (0x53, "DELAY"),
    (0x54, "DELETE"),
    (0x55, "DINING"),
    (0x56, "DIRECT"),
    (0x57, "DOOR"),
    (0x58, "DOWN"),
    (0x59, "DOWNLOAD"),
    (0x5a, "DOWNSTAIRS"),
    (0x5b, "DRAWER"),
    (0x5c, "DISPLAY"),
    (0x5d, "DURESS"),
    (0x5e, "EAST"),
    (0x5f, "ENERGY SAVER"),
    (0x60, "ENTER"),
    (0x61, "ENTRY"),
    (0x62, "ERROR"),
    (0x63, "EXIT"),
    (0x64, "FAIL"),
    (0x65, "FAILURE"),
    (0x66, "FAMILY"),
    (0x67, "FEATURES"),
    (0x68, "FIRE"),
    (0x69, "FIRST"),
    (0x6a, "FLOOR"),
    (0x6b, "FORCE"),
    (0x6c, "FORMAT"),
    (0x6d, "FREEZE"),
    (0x6e, "FRONT"),
    (0x6f, "FURNACE"),
    (0x70, "GARAGE"),
    (0x71, "GALLERY"),
    (0x72, "GOODBYE"),
    (0x73, "GROUP"),
    (0x74, "HALL"),
    (0x75, "HEAT"),
    (0x76, "HELLO"),
    (0x77, "HELP"),
    (0x78, "HIGH"),
    (0x79, "HOURLY"),
    (0x7a, "HOUSE"),
    (0x7b, "IMAGE"),
    (0x7c, "IN"),
    (0x7d, "INSTALLER"),
    (0x7e, "INTERIOR"),
    (0x7f, "INTRUSION"),
    (0x80, "INVALID"),
    (0x81, "IS"),
    (0x82, "KEY"),
    (0x83, "KITCHEN"),
    (0x84, "LAUNDRY"),
    (0x85, "LEARN"),
    (0x86, "LEFT"),
    (0x87, "LIBRARY"),
    (0x88, "LEVEL"),
    (0x89, "LIGHT"),
    (0x8a, "LIGHTS"),
    (0x8b, "LIVING"),
    (0x8c, "LOW"),
    (0x8d, "MAIN"),
    (0x8e, "MASTER"),
    (0x8f, "MEDICAL"),
    (0x90, "MEMORY"),
    (0x91, "MIN"),
    (0x92, "MODE"),
    (0x93, "MOTION"),
    (0x94, "NIGHT"),
    (0x95, "NORTH"),
    (0x96, "NOT"),
    (0x97, "NUMBER"),
    (0x98, "OFF"),
    (0x99, "OFFICE"),
    (0x9a, "OK"),
    (0x9b, "ON"),
    (0x9c, "OPEN"),
    (0x9d, "OPENING"),
    (0x9e, "PANIC"),
    (0x9f, "PARTITION"),
    (0xa0, "PATIO"),
    (0xa1, "PHONE"),
    (0xa2, "POLICE"),
    (0xa3, "POOL"),
    (0xa4, "PORCH"),
    (0xa5, "PRESS"),
    (0xa6, "QUIET"),
    (0xa7, "QUICK"),
    (0xa8, "RECEIVER"),
    (0xa9, "REAR"),
    (0xaa, "REPORT"),
    (0xab, "REMOTE"),
    (0xac, "RESTORE"),
    (0xad, "RIGHT"),
    (0xae, "ROOM"),
    (0xaf, "SCHEDULE"),
    (0xb0, "SCRIPT"),
    (0xb1, "SEC"),
    (0xb2, "SECOND"),
    (0xb3, "SET"),
    (0xb4, "SENSOR"),
    (0xb5, "SHOCK"),
    (0xb6, "SIDE"),
    (0xb7, "SIREN"),
    (0xb8, "SLIDING"),
    (0xb9, "SMOKE"),
    (0xba, "Sn"),
    (0xbb, "SOUND"),
    (0xbc, "SOUTH"),
    (0xbd, "SPECIAL"),
    (0xbe, "STAIRS"),
    (0xbf, "START"),
    (0xc0, "STATUS"),
    (0xc1, "STAY"),
    (0xc2, "STOP"),
    (0xc3, "SUPERVISORY"),
    (0xc4, "SYSTEM"),
    (0xc5, "TAMPER"),
    (0xc6, "TEMPERATURE"),
    (0xc7, "TEMPORARY"),
    (0xc8, "TEST"),
    (0xc9, "TIME"),
    (0xca, "TIMEOUT"),
    (0xcb, "TOUCHPAD"),
    (0xcc, "TRIP"),
    (0xcd, "TROUBLE"),
    (0xce, "UNBYPASS"),
    (0xcf, "UNIT"),
    (0xd0, "UP"),
    (0xd1, "VERIFY"),
    (0xd2, "VIOLATION"),
    (0xd3, "WARNING"),
    (0xd4, "WEST"),
    (0xd5, "WINDOW"),
    (0xd6, "MENU"),
    (0xd7, "RETURN"),
    (0xd8, "POUND"),
    (0xd9, "HOME"),
];

/// Decoded display text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DisplayText {
    pub text: String,
    /// Byte ranges of `text` shown blinking on the touchpad.
    pub blinking: Vec<Range<usize>>,
}

fn token_text(token: u8) -> Option<String> {
    let single = match token {
        0x00..=0x09 => Some((b'0' + token) as char),
        0x0c => Some('#'),
        0x0d => Some(':'),
        0x0e => Some('/'),
        0x0f => Some('?'),
        0x10 => Some('.'),
        0x11..=0x2a => Some((b'A' + token - 0x11) as char),
        0x2b => Some(' '),
        0x2c => Some('\''),
        0x2d => Some('-'),
        0x2e => Some('_'),
        0x2f => Some('*'),
        _ => None,
    };
    if let Some(c) = single {
        return Some(c.to_string());
    }
    WORDS
        .iter()
        .find(|(code, _)| *code == token)
        .map(|(_, word)| format!("{word} "))
}

/// Renders a sequence of text tokens.
pub fn decode_text_tokens(tokens: &[u8]) -> DisplayText {
    let mut display = DisplayText::default();
    let mut blink_next = false;

    for &token in tokens {
        match token {
            BLINK_NEXT => blink_next = true,
            BACKSPACE => {
                display.text.pop();
                let len = display.text.len();
                display.blinking.retain_mut(|range| {
                    range.end = range.end.min(len);
                    range.start < range.end
                });
            }
            PSEUDO_SPACE => display.text.push(' '),
            t if LINE_BREAK.contains(&t) => display.text.push('\n'),
            _ => {
                let start = display.text.len();
                match token_text(token) {
                    Some(s) => display.text.push_str(&s),
                    None => {
                        log::debug!("Unknown text token 0x{:02x}", token);
                        display.text.push_str(UNKNOWN_TOKEN);
                    }
                }
                if blink_next {
                    display.blinking.push(start..display.text.trim_end().len().max(start));
                    blink_next = false;
                }
            }
        }
    }

    let trimmed = display.text.trim_end().len();
    display.text.truncate(trimmed);
    display.blinking.retain_mut(|range| {
        range.end = range.end.min(trimmed);
        range.start < range.end
    });
    display
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_text() {
        assert_eq!(decode_text_tokens(&[]), DisplayText::default());
    }

    #[test]
    fn words_are_separated_and_trailing_space_trimmed() {
        let display = decode_text_tokens(&[0x6e, 0x57]);
        assert_eq!(display.text, "FRONT DOOR");
        assert!(display.blinking.is_empty());
    }

    #[test]
    fn characters_and_digits() {
        // Z O N E space 1 2
        let display = decode_text_tokens(&[0x2a, 0x1f, 0x1e, 0x15, 0x2b, 0x01, 0x02]);
        assert_eq!(display.text, "ZONE 12");
    }

    #[test]
    fn blink_marks_next_token() {
        let display = decode_text_tokens(&[0x35, BLINK_NEXT, 0x3b]);
        assert_eq!(display.text, "ARM AWAY");
        assert_eq!(display.blinking, vec![4..8]);
        assert_eq!(&display.text[display.blinking[0].clone()], "AWAY");
    }

    #[test]
    fn control_tokens() {
        let display = decode_text_tokens(&[0x11, BACKSPACE, 0x12, 0xf9, 0x13, PSEUDO_SPACE, 0x14]);
        assert_eq!(display.text, "B\nC D");
    }

    #[test]
    fn unknown_token_renders_placeholder() {
        assert_eq!(decode_text_tokens(&[0x11, 0xee]).text, "A?");
    }
}
