//! Host-level driver: loads a flat program image into kernel code
//! memory, optionally starts the serial console, then steps the CPU a
//! fixed number of cycles.
//!
//! Grounded on `cpu-6502/src/bin/6502test.rs` for the general
//! loader-then-cycle-loop shape and on `crates/emu-c64/src/main.rs`'s
//! hand-rolled `CliArgs`/`parse_args()` for the flag surface; no
//! argument-parsing crate is introduced, matching every binary in the
//! source workspace.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use mpce_cpu::Cpu;
use mpce_serial::SerialConsole;

struct CliArgs {
    program: Option<PathBuf>,
    cycles: u64,
    console: bool,
    verbosity: u8,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        program: None,
        cycles: 1,
        console: false,
        verbosity: 0,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--cycles" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.cycles = s.parse().unwrap_or(1);
                }
            }
            "--console" => cli.console = true,
            "-v" | "--verbose" => cli.verbosity += 1,
            "--help" | "-h" => {
                eprintln!("Usage: mpce-runner [OPTIONS] <program>");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --cycles <N>   Number of cpu.cycle() invocations to run (default 1)");
                eprintln!("  --console      Start the serial console and join it after cycling");
                eprintln!("  -v, --verbose  Raise log verbosity (repeatable)");
                process::exit(0);
            }
            other => cli.program = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    cli
}

#[derive(Debug)]
enum RunnerError {
    MissingProgram,
    Io(PathBuf, std::io::Error),
    OddLength(usize),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProgram => write!(f, "no program image given"),
            Self::Io(path, err) => write!(f, "reading {}: {err}", path.display()),
            Self::OddLength(len) => {
                write!(f, "program image has odd byte length ({len}), expected 16-bit words")
            }
        }
    }
}

impl std::error::Error for RunnerError {}

/// Reads `path` as a flat binary of big-endian 16-bit words.
fn load_program(path: &PathBuf) -> Result<Vec<u16>, RunnerError> {
    let bytes = fs::read(path).map_err(|err| RunnerError::Io(path.clone(), err))?;
    if bytes.len() % 2 != 0 {
        return Err(RunnerError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect())
}

fn run(cli: &CliArgs) -> Result<(), RunnerError> {
    let program_path = cli.program.clone().ok_or(RunnerError::MissingProgram)?;
    let words = load_program(&program_path)?;
    log::info!("loaded {} words from {}", words.len(), program_path.display());

    let mut cpu = Cpu::new();
    for (addr, word) in words.iter().enumerate() {
        cpu.mmio.get_code_mut(false).store_w(addr as u32, *word);
    }

    let console: Option<Arc<SerialConsole>> = cli.console.then(|| Arc::new(SerialConsole::new()));
    if let Some(console) = &console {
        cpu.register_mmio_device(console.clone());
        console.start_console();
    }

    for _ in 0..cli.cycles {
        cpu.cycle();
    }

    if let Some(console) = &console {
        // join_console() blocks until the input thread observes the 'Q'
        // sentinel; no explicit stop_console() call is made here.
        console.join_console();
    }

    log::info!("ran {} cycles", cli.cycles);
    Ok(())
}

fn main() {
    let cli = parse_args();

    let default_level = match cli.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("mpce-runner: {err}");
        process::exit(1);
    }
}
