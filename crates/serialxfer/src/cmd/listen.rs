use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serialxfer_frame::Link;
use serialxfer_transport::SerialConnection;
use tracing::info;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_packet, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(2);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let idle_timeout = args.idle_timeout.as_deref().map(parse_duration).transpose()?;

    let conn = SerialConnection::open(&args.serial.config())
        .map_err(|err| transport_error("open failed", err))?;
    let port = conn.name().to_string();
    let mut link = Link::new(conn);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let mut last_packet = Instant::now();

    while running.load(Ordering::SeqCst) {
        let id = match link.available() {
            Ok(Some(id)) => id,
            Ok(None) => {
                if idle_timeout.is_some_and(|limit| last_packet.elapsed() >= limit) {
                    return Err(CliError::new(TIMEOUT, "no packet received before idle timeout"));
                }
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        };
        last_packet = Instant::now();

        if let Some(ids) = &args.ids {
            if !ids.contains(&id) {
                continue;
            }
        }

        if let Some(rx) = link.rx() {
            print_packet(&port, id, rx.as_slice(), format);
        }
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    let stats = link.stats();
    info!(
        packets = stats.packets,
        dropped = stats.dropped(),
        checksum_mismatch = stats.checksum_mismatch,
        timeouts = stats.timeouts,
        "listen finished"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
