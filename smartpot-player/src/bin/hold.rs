use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use smartpot_music::{NoteResolver, Tone, ToneOutput};
use smartpot_player::{init_logging, io::Client, pause};

/// Holds a single note on the SmartPot buzzer until a key is pressed
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct HoldArgs {
    /// Note to hold
    #[arg(default_value = "A4")]
    pub note: String,

    /// Serial port configuration
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    pub serial_port: String,

    /// Serial port baud rate
    #[arg(short, long, default_value_t = 9_600)]
    pub baud_rate: u32,
}

fn main() -> Result<()> {
    let args = HoldArgs::parse();
    init_logging(false);

    let Tone::Hz(frequency_hz) = NoteResolver::default().resolve_frequency(&args.note)? else {
        bail!("`{}` is a rest, nothing to hold", args.note);
    };

    /* List Available Serial Ports */

    println!();
    for port in serialport::available_ports()? {
        println!("{:?}", port);
    }
    println!();

    /* Open a serial connection with the supplied settings */

    let port = args.serial_port;
    let baud_rate = args.baud_rate;

    println!();
    println!("Serial Connection");
    println!("================");
    println!("Port: {}", port);
    println!("Baud Rate: {}", baud_rate);
    println!();

    let serial_port = serialport::new(port, baud_rate)
        .timeout(Duration::from_secs(10))
        .open()?;
    let mut client = Client::new(serial_port);

    /* Check client connection */

    println!("Connecting to client...");
    client.connect()?;
    println!("Client connection established!");

    /* Hold the note */

    println!("Holding {} ({:.2} Hz)", args.note, frequency_hz);
    client.set_tone(frequency_hz)?;

    pause!("Press any key to release the note...")?;

    client.stop_tone()?;
    client.end()?;

    Ok(())
}
