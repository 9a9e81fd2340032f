//! Two links joined back to back in memory, exchanging typed packets.
//!
//! Run with:
//!   cargo run --example loopback

use serialxfer::frame::Link;
use serialxfer::transport::MemoryConnection;

const SENSOR: u8 = 1;
const ACK: u8 = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host_end, device_end) = MemoryConnection::pair();
    let mut host = Link::new(host_end);
    let mut device = Link::new(device_end);

    device.set_callback(SENSOR, |rx| {
        let reading = rx.read_f32();
        let label = rx.read_str().map(str::to_owned);
        match (reading, label) {
            (Ok(reading), Ok(label)) => eprintln!("device: {label} = {reading}"),
            (Err(e), _) | (_, Err(e)) => eprintln!("device: bad sensor packet: {e}"),
        }
    });

    for (i, reading) in [21.5f32, 21.75, 0x7E as f32].into_iter().enumerate() {
        host.tx().clear();
        host.tx().append_f32(reading)?;
        host.tx().append_str(&format!("probe-{i}"))?;
        let written = host.send(SENSOR)?;
        eprintln!("host: sent {written} byte frame");
    }

    device.tx().append_u8(1)?;
    while device.tick()?.is_some() {
        device.send(ACK)?;
    }

    let mut acks = 0;
    while let Some(id) = host.available()? {
        if id == ACK {
            acks += 1;
        }
    }
    eprintln!("host: {acks} acks, {:?}", host.stats());
    Ok(())
}
