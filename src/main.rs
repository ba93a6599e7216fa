use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use modplayer::engine::{Engine, Format};
use modplayer::module::Module;
use modplayer::sink::{AudioSink, CpalSink};
use modplayer::tracker::RowDisplay;

/// CLI-based Protracker module player.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a .mod file; the `.mod` suffix is appended if missing.
    path: String,

    /// Output sampling rate, in Hz.
    #[arg(short = 'f', long, default_value_t = 44_100)]
    rate: u32,

    /// Seed for the vibrato/tremolo random-waveform effects (14.4/14.7 with arg&3==3).
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Assume the NTSC master clock instead of PAL.
    #[arg(long)]
    ntsc: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let path = resolve_path(&args.path);

    let module = match Module::load(&path) {
        Ok(module) => module,
        Err(e) => {
            error!(%e, "failed to load module");
            return ExitCode::FAILURE;
        }
    };
    info!(song_name = %module.song_name, num_patterns = module.num_patterns, "loaded module");

    let format = if args.ntsc { Format::Ntsc } else { Format::Pal };
    let engine = Arc::new(Mutex::new(Engine::new(module, args.rate, format, args.seed)));

    let sink: Arc<Mutex<CpalSink>> = match CpalSink::new() {
        Ok(sink) => Arc::new(Mutex::new(sink)),
        Err(e) => {
            error!(%e, "no audio output device available");
            return ExitCode::FAILURE;
        }
    };

    let cb_engine = engine.clone();
    let cb_sink = sink.clone();
    let on_done: Box<dyn FnMut() + Send> = Box::new(move || {
        let mut engine = cb_engine.lock().unwrap();
        if engine.is_finished() {
            return;
        }
        let buffer = engine.play_tick();
        drop(engine);
        let _ = cb_sink.lock().unwrap().submit(&buffer);
    });

    if let Err(e) = sink.lock().unwrap().open(args.rate, on_done) {
        error!(%e, "failed to start audio stream");
        return ExitCode::FAILURE;
    }

    let mut last_printed = None;
    loop {
        let (finished, new_row, pattern, row_index, row) = {
            let engine = engine.lock().unwrap();
            (
                engine.is_finished(),
                engine.new_row(),
                engine.pattern_index(),
                engine.pat_row(),
                engine.current_row(),
            )
        };
        if finished {
            break;
        }
        if new_row && last_printed != Some((pattern, row_index)) {
            print!(
                "{}",
                RowDisplay {
                    row: &row,
                    pattern,
                    row_index,
                }
            );
            last_printed = Some((pattern, row_index));
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    sink.lock().unwrap().close();
    ExitCode::SUCCESS
}

fn resolve_path(path: &str) -> String {
    if path.to_ascii_lowercase().ends_with(".mod") {
        path.to_string()
    } else {
        format!("{path}.mod")
    }
}
