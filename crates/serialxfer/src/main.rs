mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "serialxfer", version, about = "Packetized serial transfer CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        env = "SERIALXFER_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr). `debug` reports every dropped frame.
    #[arg(
        long,
        value_name = "LEVEL",
        env = "SERIALXFER_LOG_LEVEL",
        ignore_case = true,
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "serialxfer",
            "send",
            "ttyUSB0",
            "--id",
            "5",
            "--data",
            "hello",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.id, 5);
                assert_eq!(args.serial.baud, 115_200);
                assert!(!args.serial.unrestricted);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "serialxfer",
            "send",
            "ttyUSB0",
            "--hex",
            "7e00",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_out_of_range_id() {
        let err = Cli::try_parse_from(["serialxfer", "send", "ttyUSB0", "--id", "256"])
            .expect_err("id above 255 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from([
            "serialxfer",
            "listen",
            "/dev/ttyACM0",
            "--baud",
            "9600",
            "--unrestricted",
            "--ids",
            "1,2",
            "--count",
            "3",
            "--idle-timeout",
            "500ms",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.serial.baud, 9600);
                assert!(args.serial.unrestricted);
                assert_eq!(args.ids, Some(vec![1, 2]));
                assert_eq!(args.count, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn log_level_flag_accepts_any_case() {
        let cli = Cli::try_parse_from(["serialxfer", "--log-level", "TRACE", "ports"])
            .expect("log level should parse");
        assert_eq!(cli.log_level, LogLevel::Trace);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["serialxfer", "ports", "--format", "json"])
            .expect("global flags should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Ports(_)));
    }
}
