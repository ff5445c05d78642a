use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use smartpot_music::{
    melody::{preset, PRESET_NAMES},
    InvalidNotePolicy, Melody, MelodyEntry, MelodyPlayer, NoteResolver, PlayError,
    PlaybackSummary, Reference,
};
use smartpot_player::{
    config::parse_song_config,
    init_logging,
    io::Client,
    output::{ConsoleBuzzer, StdDelay},
    pause,
    resolve::{describe_note, read_token, resolver_for},
};

/// Plays SmartPot melodies on a serial buzzer or on the console
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct SmartPotArgs {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a song configuration or a built-in melody
    Play(PlayArgs),

    /// Print the semitone offset and frequency of a note token
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Path to the song configuration file (JSONC)
    #[arg(short, long, conflicts_with = "preset")]
    pub path: Option<PathBuf>,

    /// Built-in melody to play
    #[arg(long, default_value = "alarm")]
    pub preset: String,

    /// Serial port of the buzzer device. Tones are logged to the console when omitted
    #[arg(short, long)]
    pub serial_port: Option<String>,

    /// Serial port baud rate
    #[arg(short, long, default_value_t = 9_600)]
    pub baud_rate: u32,

    /// Wait for a key press before playing
    #[arg(long)]
    pub pause: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Note token such as `A4` or `C5#`. Read from stdin when omitted
    pub token: Option<String>,

    /// Note-numbering convention
    #[arg(short, long, value_enum, default_value = "c0")]
    pub reference: ReferenceArg,

    /// Overrides the reference pitch
    #[arg(long)]
    pub reference_hz: Option<f32>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ReferenceArg {
    C0,
    A4,
}

impl From<ReferenceArg> for Reference {
    fn from(value: ReferenceArg) -> Self {
        match value {
            ReferenceArg::C0 => Reference::C0,
            ReferenceArg::A4 => Reference::A4,
        }
    }
}

fn main() -> Result<()> {
    let args = SmartPotArgs::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Play(play) => run_play(play),
        Command::Resolve(resolve) => run_resolve(resolve),
    }
}

fn run_play(args: PlayArgs) -> Result<()> {
    /* Load the melody and its tuning */

    let song = args.path.as_deref().map(parse_song_config).transpose()?;

    let (entries, resolver, policy) = match &song {
        Some(song) => (song.entries(), song.tuning.resolver()?, song.on_invalid),
        None => {
            let melody = preset(&args.preset).ok_or_else(|| {
                anyhow!(
                    "unknown preset `{}` (available: {})",
                    args.preset,
                    PRESET_NAMES.join(", ")
                )
            })?;
            (
                melody.entries().to_vec(),
                NoteResolver::default(),
                InvalidNotePolicy::Abort,
            )
        }
    };

    let melody = Melody::new(&entries);

    println!();
    println!("Melody");
    println!("================");
    println!("Source: {}", describe_source(&args));
    println!("Entries: {}", melody.len());
    println!("Duration: {:.1} s", melody.total_duration_ms() as f64 / 1000.0);
    println!("Reference: {:?} @ {} Hz", resolver.reference(), resolver.reference_hz());
    println!("Invalid notes: {:?}", policy);
    println!();

    /* Play it on the console buzzer, or on the device over serial */

    let summary = match args.serial_port {
        None => {
            if args.pause {
                pause!("Press any key to play the melody...")?;
            }

            let mut player =
                MelodyPlayer::new(ConsoleBuzzer::new(), StdDelay, resolver).with_policy(policy);

            player
                .play(&melody)
                .map_err(|e| play_error(e, &entries))?
        }
        Some(port) => play_on_serial(&port, args.baud_rate, args.pause, &melody, resolver, policy)?,
    };

    println!();
    println!(
        "Played {} notes, {} rests, {} skipped ({} ms)",
        summary.notes, summary.rests, summary.skipped, summary.elapsed_ms
    );

    Ok(())
}

fn play_on_serial(
    port: &str,
    baud_rate: u32,
    wait_for_key: bool,
    melody: &Melody<'_>,
    resolver: NoteResolver,
    policy: InvalidNotePolicy,
) -> Result<PlaybackSummary> {
    /* List available serial ports */

    println!();
    for port in serialport::available_ports()? {
        println!("{:?}", port);
    }
    println!();

    println!();
    println!("Serial Connection");
    println!("================");
    println!("Port: {}", port);
    println!("Baud Rate: {}", baud_rate);
    println!();

    let serial_port = serialport::new(port, baud_rate)
        .timeout(Duration::from_secs(10))
        .open()
        .with_context(|| format!("could not open serial port `{}`", port))?;
    let mut client = Client::new(serial_port);

    /* Check client connection */

    println!("Connecting to client...");
    client.connect()?;
    println!("Client connection established!");

    if wait_for_key {
        pause!("Press any key to play the melody...")?;
    }

    let mut player = MelodyPlayer::new(&mut client, StdDelay, resolver).with_policy(policy);
    let result = player
        .play(melody)
        .map_err(|e| play_error(e, melody.entries()));
    drop(player);

    // Always close the session so the buzzer is left silent
    let ended = client.end();

    let summary = result?;
    ended?;

    Ok(summary)
}

fn play_error<E: std::fmt::Display>(
    error: PlayError<E>,
    entries: &[MelodyEntry<'_>],
) -> anyhow::Error {
    match error {
        PlayError::Note { index, source } => {
            let token = entries.get(index).map(|entry| entry.token).unwrap_or("?");
            anyhow!("melody entry {} (`{}`): {}", index, token, source)
        }
        PlayError::Output(e) => anyhow!("buzzer failed: {}", e),
    }
}

fn describe_source(args: &PlayArgs) -> String {
    match &args.path {
        Some(path) => path.display().to_string(),
        None => format!("preset `{}`", args.preset),
    }
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let token = match args.token {
        Some(token) => token,
        None => read_token(std::io::stdin().lock())?,
    };

    let resolver = resolver_for(args.reference.into(), args.reference_hz)?;

    info!(token = %token, reference = ?resolver.reference(), "resolving");

    println!("{}", describe_note(&token, &resolver)?);

    Ok(())
}
