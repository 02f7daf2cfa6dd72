use std::fs;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chip8_core::{Machine, Session, SessionConfig, SessionError};
use chip8_display::Display;

use crate::keyboard::Keyboard;
use crate::Args;

pub fn run(args: Args) -> Result<()> {
    let mut machine = Machine::new();

    // Load ROM
    let rom = fs::read(&args.rom)
        .with_context(|| format!("unable to read ROM {}", args.rom.display()))?;
    machine
        .load_rom(&rom)
        .with_context(|| format!("unable to load ROM {}", args.rom.display()))?;

    // Get SDL2 context
    let sdl = sdl2::init().map_err(|e| anyhow!("unable to initialise SDL: {}", e))?;
    let display = Display::new(&sdl, args.scale).context("unable to open display")?;
    let mut events = sdl
        .event_pump()
        .map_err(|e| anyhow!("unable to get SDL event pump: {}", e))?;

    let config = SessionConfig {
        steps_per_tick: args.speed,
    };
    let mut session = Session::new(machine, Keyboard::new(), display, config);
    info!(
        "running {} at {} steps every {}ms",
        args.rom.display(),
        args.speed,
        args.tick_ms
    );

    let tick_time = Duration::from_millis(args.tick_ms);
    let mut last_tick = Instant::now();

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => session.keys_mut().key_down(key),
                Event::KeyUp {
                    keycode: Some(key), ..
                } => session.keys_mut().key_up(key),
                _ => continue,
            };
        }

        // Update state
        match session.tick() {
            Ok(_) => {}
            Err(SessionError::Fault(fault)) => {
                error!("machine halted: {}", fault);
                return Err(fault).context("ROM stopped with a fault");
            }
            Err(err) => return Err(err.into()),
        }

        // Handle timing
        let elapsed = last_tick.elapsed();
        if tick_time > elapsed {
            std::thread::sleep(tick_time - elapsed);
        }
        last_tick = Instant::now();
    }

    info!("session ended");
    Ok(())
}
