use crate::mqtt;
use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use concord_lib::request::EquipmentCategory;
use std::path::PathBuf;
use std::time::Duration;

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1")
    } else {
        String::from("/dev/ttyUSB0")
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Decode a single message given as hex digits, e.g. 0721050000a719d9
    Decode {
        /// The message in hex, length byte first, including the checksum
        hex: String,
        /// Replace the last byte with the correct checksum before decoding
        #[clap(long, action)]
        fix_checksum: bool,
    },
    /// Decode a captured byte stream from a file, as read from the serial line
    Replay {
        /// File holding the raw capture
        file: PathBuf,
    },
    /// Print every message the panel sends until interrupted
    Listen {
        /// Request the full equipment list after connecting
        #[clap(long, action)]
        request_all: bool,
    },
    /// Request the equipment list and print the zones and partitions learned
    Equipment {
        /// Category to request: all, zone, partition, user, ... or a request type code
        #[clap(long, short, default_value = "all")]
        category: EquipmentCategory,
        /// How long to collect answers (e.g., "5s", "1m")
        #[clap(long, short, value_parser = humantime::parse_duration, default_value = "10s")]
        wait: Duration,
    },
    /// Ask the panel to resend its dynamic data (arming levels, zone states)
    Refresh {
        /// How long to collect answers (e.g., "5s", "1m")
        #[clap(long, short, value_parser = humantime::parse_duration, default_value = "5s")]
        wait: Duration,
    },
    /// Send key presses to a partition, e.g. "1234" to disarm with code 1234
    Keypress {
        /// Partition number (decimal or 0x prefixed hex)
        #[clap(long, short, value_parser = maybe_hex::<u8>)]
        partition: u8,
        /// Area number (decimal or 0x prefixed hex)
        #[clap(long, short, value_parser = maybe_hex::<u8>, default_value = "0")]
        area: u8,
        /// Keys in touchpad notation: digits, '*' and '#'
        keys: String,
    },
    /// Run in daemon mode, following the panel and outputting its messages
    Daemon {
        /// Output destination for messages
        #[command(subcommand)]
        output: DaemonOutput,
        /// Do not request equipment list and dynamic data on startup
        #[clap(long, action)]
        no_initial_query: bool,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, PartialEq)]
pub enum MqttFormat {
    Simple,
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DaemonOutput {
    /// Print messages and zone states to the standard output (console).
    Console,
    /// Publish messages and zone states to an MQTT broker.
    Mqtt {
        /// The configuration file for the MQTT broker
        #[arg(long, default_value_t = mqtt::MqttConfig::DEFAULT_CONFIG_FILE.to_string())]
        config_file: String,
        /// Output format for MQTT messages
        #[arg(long, value_enum, default_value_t = MqttFormat::Simple)]
        format: MqttFormat,
    },
}

const fn about_text() -> &'static str {
    "concord alarm panel command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Serial port device path (e.g., /dev/ttyUSB0 on Linux, COM1 on Windows)
    #[arg(short, long, default_value_t = default_device_name())]
    pub device: String,

    #[command(subcommand)]
    pub command: CliCommands,

    /// Read timeout for a single byte (e.g., "100ms", "1s")
    #[arg(value_parser = humantime::parse_duration, long, default_value = "100ms")]
    pub timeout: Duration,

    /// How long to wait for the panel to acknowledge a request (e.g., "2s")
    #[arg(value_parser = humantime::parse_duration, long, default_value = "2s")]
    pub ack_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keypress_with_hex_partition() {
        let args =
            CliArgs::try_parse_from(["concord", "keypress", "--partition", "0x02", "*1234#"])
                .unwrap();
        assert_eq!(
            args.command,
            CliCommands::Keypress {
                partition: 2,
                area: 0,
                keys: "*1234#".to_string()
            }
        );
        assert_eq!(args.timeout, Duration::from_millis(100));
    }

    #[test]
    fn parses_equipment_category() {
        let args = CliArgs::try_parse_from(["concord", "equipment", "--category", "zone"]).unwrap();
        match args.command {
            CliCommands::Equipment { category, wait } => {
                assert_eq!(category, EquipmentCategory::ZoneData);
                assert_eq!(wait, Duration::from_secs(10));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(CliArgs::try_parse_from(["concord", "equipment", "--category", "8"]).is_err());
    }

    #[test]
    fn parses_daemon_mqtt_defaults() {
        let args = CliArgs::try_parse_from(["concord", "daemon", "mqtt"]).unwrap();
        assert_eq!(
            args.command,
            CliCommands::Daemon {
                output: DaemonOutput::Mqtt {
                    config_file: "mqtt.yaml".to_string(),
                    format: MqttFormat::Simple
                },
                no_initial_query: false
            }
        );
    }
}
