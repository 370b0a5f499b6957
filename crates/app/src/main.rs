use std::path::{Path, PathBuf};

use beatdeck_core::sim::{SimClock, SimulatedPort};
use beatdeck_core::{BeatMap, DeckId, EngineConfig, RotationScheduler, VideoId};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Frame interval of the simulated tick loop, in seconds.
const FRAME_SECONDS: f32 = 0.1;

const DEMO_CATALOG: [&str; 8] = [
    "clip-01", "clip-02", "clip-03", "clip-04", "clip-05", "clip-06", "clip-07", "clip-08",
];
const DEMO_BEATS: [f32; 5] = [2.0, 4.5, 7.0, 9.5, 12.0];
const DEMO_TRACK_SECONDS: f32 = 14.0;

fn main() -> beatdeck_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            beat_map,
            seconds,
            seed,
            fail,
        } => run_simulation(beat_map.as_deref(), seconds, seed, &fail),
        Commands::Inspect { beat_map } => inspect_beat_map(&beat_map),
    }
}

/// Drives the rotation engine against the in-memory player backend and logs
/// every promotion, so the scheduling behaviour can be watched without any
/// real media.
fn run_simulation(
    beat_map: Option<&Path>,
    seconds: f32,
    seed: u64,
    fail: &[String],
) -> beatdeck_core::Result<()> {
    let (beats, track_length) = match beat_map {
        Some(path) => match BeatMap::load(path) {
            Ok(map) => {
                let length = map.timestamps().last().copied().unwrap_or(0.0) + 2.0;
                (map, length)
            }
            // A missing beat map is not fatal: the engine idles on an empty
            // map and the progress indicator stays at zero.
            Err(error) => {
                tracing::warn!(?path, %error, "beat map failed to load, running with an empty map");
                (BeatMap::empty(), DEMO_TRACK_SECONDS)
            }
        },
        None => (BeatMap::new(DEMO_BEATS.to_vec())?, DEMO_TRACK_SECONDS),
    };

    let (port_a, ctl_a) = SimulatedPort::new();
    let (port_b, ctl_b) = SimulatedPort::new();
    let (port_c, ctl_c) = SimulatedPort::new();
    let (port_d, ctl_d) = SimulatedPort::new();
    let port_controls = [ctl_a, ctl_b, ctl_c, ctl_d];
    let (clock, clock_control) = SimClock::looping(track_length);

    for control in &port_controls {
        for id in fail {
            control.fail_video(VideoId::new(id.clone()));
        }
    }

    let mut engine = RotationScheduler::with_seed(
        [port_a, port_b, port_c, port_d],
        clock,
        beats,
        EngineConfig::with_catalog(DEMO_CATALOG),
        seed,
    )?;

    let mut wall = 0.0_f32;
    engine.start(wall);
    tracing::info!(seconds, seed, "simulation started");

    let frames = (seconds / FRAME_SECONDS).ceil() as usize;
    let mut beats_fired = 0_u32;
    for _ in 0..frames {
        wall += FRAME_SECONDS;
        clock_control.advance(FRAME_SECONDS);
        for control in &port_controls {
            control.advance(FRAME_SECONDS);
        }

        let report = engine.tick(wall);
        if report.beat_fired {
            beats_fired += 1;
            let video = engine
                .video(report.active)
                .map(VideoId::to_string)
                .unwrap_or_default();
            tracing::info!(
                active = %report.active,
                video = %video,
                progress = %format!("{}/{}", report.beat_index, report.beat_total),
                "switched decks on beat"
            );
        }
    }

    for id in DeckId::ALL {
        tracing::info!(
            deck = %id,
            phase = ?engine.phase(id),
            video = %engine.video(id).map(VideoId::to_string).unwrap_or_default(),
            "final deck state"
        );
    }
    tracing::info!(beats_fired, "simulation finished");
    Ok(())
}

/// Validates a beat map file and reports the interval statistics the offline
/// analyzer promises (no two beats closer than the minimum spacing).
fn inspect_beat_map(path: &Path) -> beatdeck_core::Result<()> {
    let map = BeatMap::load(path)?;
    let beats = map.timestamps();
    tracing::info!(?path, count = beats.len(), "beat map loaded");

    if beats.len() > 1 {
        let intervals: Vec<f32> = beats.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let min = intervals.iter().copied().fold(f32::INFINITY, f32::min);
        let max = intervals.iter().copied().fold(0.0_f32, f32::max);
        let average = intervals.iter().sum::<f32>() / intervals.len() as f32;
        tracing::info!(
            first = beats[0],
            last = beats[beats.len() - 1],
            min_interval = min,
            max_interval = max,
            average_interval = average,
            "interval statistics"
        );
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat-synchronised deck rotation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the rotation engine against a simulated player backend.
    Simulate {
        /// Beat map JSON file (array of seconds). Uses a built-in demo map
        /// when omitted.
        #[arg(short, long)]
        beat_map: Option<PathBuf>,
        /// How many seconds of playback to simulate.
        #[arg(short, long, default_value_t = 30.0)]
        seconds: f32,
        /// Seed for video selection and warmup offsets.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Video ids scripted to fail loading, to exercise the recovery path.
        #[arg(long)]
        fail: Vec<String>,
    },
    /// Validate a beat map file and print its interval statistics.
    Inspect {
        /// Path to the beat map JSON file.
        beat_map: PathBuf,
    },
}
