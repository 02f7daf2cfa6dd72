use log::debug;

use crate::constants::DEFAULT_STEPS_PER_TICK;
use crate::error::SessionError;
use crate::machine::Machine;
use crate::state::{FrameBuffer, Keys};

/// Supplies the instantaneous pressed status of keys 0..F.
///
/// Mapping physical input to logical keys is up to the implementor.
pub trait KeySource {
    fn keys(&mut self) -> Keys;
}

/// Presents a frame buffer snapshot; scaling and colouring are up to the implementor.
pub trait FrameSink {
    type Error: std::error::Error + 'static;

    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Instructions executed per tick
    pub steps_per_tick: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            steps_per_tick: DEFAULT_STEPS_PER_TICK,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Instructions that ran to completion
    pub steps: usize,
    /// Whether any instruction touched the frame buffer
    pub redrawn: bool,
    /// Whether the sound timer ran out
    pub sound_stopped: bool,
}

/// # Session
/// Drives one `Machine` on behalf of its collaborators.
///
/// Each `tick`:
/// - samples the key source into the machine
/// - executes `steps_per_tick` instructions
/// - presents the frame buffer, whether or not anything was drawn
/// - decrements the timers once
pub struct Session<K, F> {
    machine: Machine,
    keys: K,
    sink: F,
    config: SessionConfig,
}

impl<K: KeySource, F: FrameSink> Session<K, F> {
    pub fn new(machine: Machine, keys: K, sink: F, config: SessionConfig) -> Self {
        Session {
            machine,
            keys,
            sink,
            config,
        }
    }

    /// Runs one tick.
    ///
    /// A fault stops the remaining steps, but the frame is still presented and the timers
    /// still tick before it is returned. The same holds when the sink fails to present;
    /// if both happen, the fault is returned.
    pub fn tick(&mut self) -> Result<TickReport, SessionError<F::Error>> {
        self.machine.set_keys(self.keys.keys());

        let mut report = TickReport::default();
        let mut fault = None;
        for _ in 0..self.config.steps_per_tick {
            if let Err(err) = self.machine.step() {
                fault = Some(err);
                break;
            }
            report.steps += 1;
        }

        report.redrawn = self.machine.is_dirty();
        let presented = self.sink.present(self.machine.frame());
        self.machine.clear_dirty();

        report.sound_stopped = self.machine.tick_timers();
        if report.sound_stopped {
            debug!("sound timer ran out");
        }

        // a fault outranks a failed present
        if let Some(fault) = fault {
            return Err(fault.into());
        }
        presented.map_err(SessionError::Sink)?;
        Ok(report)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// The key source, for feeding it input between ticks
    pub fn keys_mut(&mut self) -> &mut K {
        &mut self.keys
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Ends the session, handing back the machine and its collaborators
    pub fn into_parts(self) -> (Machine, K, F) {
        (self.machine, self.keys, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::error::Fault;

    #[derive(Default)]
    struct FixedKeys {
        keys: Keys,
        samples: usize,
    }

    impl KeySource for FixedKeys {
        fn keys(&mut self) -> Keys {
            self.samples += 1;
            self.keys
        }
    }

    #[derive(Debug)]
    struct Unplugged;

    impl fmt::Display for Unplugged {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "unplugged")
        }
    }

    impl std::error::Error for Unplugged {}

    #[derive(Default)]
    struct Recorder {
        frames: Vec<FrameBuffer>,
        unplugged: bool,
    }

    impl FrameSink for Recorder {
        type Error = Unplugged;

        fn present(&mut self, frame: &FrameBuffer) -> Result<(), Unplugged> {
            if self.unplugged {
                return Err(Unplugged);
            }
            self.frames.push(*frame);
            Ok(())
        }
    }

    fn session_with(rom: &[u8], steps_per_tick: usize) -> Session<FixedKeys, Recorder> {
        let mut machine = Machine::with_rng(Box::new(StepRng::new(0, 0)));
        machine.load_rom(rom).unwrap();
        Session::new(
            machine,
            FixedKeys::default(),
            Recorder::default(),
            SessionConfig { steps_per_tick },
        )
    }

    #[test]
    fn test_default_config_runs_four_steps() {
        assert_eq!(SessionConfig::default().steps_per_tick, 4);
    }

    #[test]
    fn test_tick_runs_configured_steps() {
        // JP 0x200
        let mut session = session_with(&[0x12, 0x00], 4);
        let report = session.tick().unwrap();
        assert_eq!(report.steps, 4);
        assert!(!report.redrawn);
    }

    #[test]
    fn test_tick_presents_every_frame() {
        let mut session = session_with(&[0x12, 0x00], 4);
        for _ in 0..3 {
            session.tick().unwrap();
        }
        let (_, keys, sink) = session.into_parts();
        assert_eq!(sink.frames.len(), 3);
        assert_eq!(keys.samples, 3);
    }

    #[test]
    fn test_tick_reports_and_clears_redraw() {
        // CLS; JP 0x202
        let mut session = session_with(&[0x00, 0xE0, 0x12, 0x02], 2);
        assert!(session.tick().unwrap().redrawn);
        assert!(!session.machine().is_dirty());
        assert!(!session.tick().unwrap().redrawn);
    }

    #[test]
    fn test_tick_with_no_steps_still_ticks_timers() {
        // LD V0, 5; LD DT, V0
        let mut session = session_with(&[0x60, 0x05, 0xF0, 0x15], 2);
        session.tick().unwrap();
        assert_eq!(session.machine().delay_timer(), 4);

        let (machine, keys, sink) = session.into_parts();
        let mut session = Session::new(machine, keys, sink, SessionConfig { steps_per_tick: 0 });
        session.tick().unwrap();
        assert_eq!(session.machine().delay_timer(), 3);
        for _ in 0..10 {
            session.tick().unwrap();
        }
        assert_eq!(session.machine().delay_timer(), 0);
    }

    #[test]
    fn test_tick_samples_keys_before_stepping() {
        // LD V2, K
        let mut session = session_with(&[0xF2, 0x0A], 1);
        session.tick().unwrap();
        assert_eq!(session.machine().pc(), 0x200);

        let (machine, mut keys, sink) = session.into_parts();
        keys.keys[0x7] = true;
        let mut session = Session::new(machine, keys, sink, SessionConfig { steps_per_tick: 1 });
        session.tick().unwrap();
        assert_eq!(session.machine().v(0x2), 0x7);
        assert_eq!(session.machine().pc(), 0x202);
    }

    #[test]
    fn test_tick_reports_sound_stopping() {
        // LD V0, 1; LD ST, V0; JP 0x204
        let mut session = session_with(&[0x60, 0x01, 0xF0, 0x18, 0x12, 0x04], 2);
        assert!(session.tick().unwrap().sound_stopped);
        assert!(!session.tick().unwrap().sound_stopped);
    }

    #[test]
    fn test_fault_stops_remaining_steps() {
        // LD V0, 1; LD ST, V0; <unsupported>
        let mut session = session_with(&[0x60, 0x01, 0xF0, 0x18, 0xFF, 0xFF], 4);
        match session.tick() {
            Err(SessionError::Fault(fault)) => assert_eq!(
                fault,
                Fault::UnsupportedOpcode {
                    opcode: 0xFFFF,
                    pc: 0x204
                }
            ),
            other => panic!("expected a fault, got {:?}", other.map(|_| ())),
        }
        // the tick still completed around the fault
        assert_eq!(session.machine().sound_timer(), 0);
        let (_, _, sink) = session.into_parts();
        assert_eq!(sink.frames.len(), 1);
    }

    #[test]
    fn test_sink_errors_are_returned() {
        let mut session = session_with(&[0x12, 0x00], 1);
        let (machine, keys, mut sink) = session.into_parts();
        sink.unplugged = true;
        session = Session::new(machine, keys, sink, SessionConfig::default());
        assert!(matches!(session.tick(), Err(SessionError::Sink(Unplugged))));
    }

    #[test]
    fn test_sink_error_still_ticks_timers() {
        // LD V0, 5; LD DT, V0; JP 0x204
        let mut session = session_with(&[0x60, 0x05, 0xF0, 0x15, 0x12, 0x04], 2);
        session.tick().unwrap();
        let (machine, keys, mut sink) = session.into_parts();
        sink.unplugged = true;
        let mut session = Session::new(machine, keys, sink, SessionConfig { steps_per_tick: 1 });
        assert!(matches!(session.tick(), Err(SessionError::Sink(Unplugged))));
        assert_eq!(session.machine().delay_timer(), 3);
    }

    #[test]
    fn test_fault_outranks_sink_error_and_timers_still_tick() {
        // LD V0, 5; LD DT, V0; <unsupported>
        let mut session = session_with(&[0x60, 0x05, 0xF0, 0x15, 0xFF, 0xFF], 2);
        session.tick().unwrap();
        assert_eq!(session.machine().delay_timer(), 4);

        let (machine, keys, mut sink) = session.into_parts();
        sink.unplugged = true;
        let mut session = Session::new(machine, keys, sink, SessionConfig { steps_per_tick: 1 });
        match session.tick() {
            Err(SessionError::Fault(fault)) => assert_eq!(
                fault,
                Fault::UnsupportedOpcode {
                    opcode: 0xFFFF,
                    pc: 0x204
                }
            ),
            other => panic!("expected a fault, got {:?}", other.map(|_| ())),
        }
        assert_eq!(session.machine().delay_timer(), 3);
        assert!(!session.machine().is_dirty());
    }
}
