use std::path::PathBuf;

use clap::Parser;

use chip8_core::constants::{DEFAULT_STEPS_PER_TICK, DEFAULT_TICK_INTERVAL};

mod keyboard;
mod keymap;
mod run;

/// Runs a Chip-8 ROM in an SDL2 window
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the ROM file to run
    rom: PathBuf,

    /// Instructions executed per tick
    #[arg(short, long, default_value_t = DEFAULT_STEPS_PER_TICK)]
    speed: usize,

    /// Milliseconds per tick; timers decrement and the screen refreshes once per tick
    #[arg(short, long, default_value_t = DEFAULT_TICK_INTERVAL.as_millis() as u64)]
    tick_ms: u64,

    /// Size multiplier for each pixel
    #[arg(long, default_value_t = 10)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    run::run(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(&["chip8", "BRIX"]).unwrap();
        assert_eq!(args.rom, PathBuf::from("BRIX"));
        assert_eq!(args.speed, 4);
        assert_eq!(args.tick_ms, 10);
        assert_eq!(args.scale, 10);
    }

    #[test]
    fn test_args_overrides() {
        let args =
            Args::try_parse_from(&["chip8", "--speed", "12", "-t", "16", "--scale", "4", "PONG"])
                .unwrap();
        assert_eq!(args.speed, 12);
        assert_eq!(args.tick_ms, 16);
        assert_eq!(args.scale, 4);
    }

    #[test]
    fn test_args_require_rom() {
        assert!(Args::try_parse_from(&["chip8"]).is_err());
    }
}
