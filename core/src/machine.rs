use std::io::Read;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::constants::{MAX_ROM_SIZE, PROGRAM_START};
use crate::error::{Fault, LoadError};
use crate::instruction::Instruction;
use crate::operations;
use crate::state::{FrameBuffer, Keys, State};

/// # Machine
/// A single Chip-8 virtual machine.
///
/// Tracks:
///  - the current `state`
///  - whether a ROM has been `loaded`; stepping does nothing until one has
///  - the `fault` that halted it, if any
///  - the random source used by `Cxkk`
///
/// Supplies interfaces for:
/// - loading a rom
/// - replacing the pressed keys
/// - stepping the CPU and ticking its timers
/// - inspecting its frame buffer for rendering by some display
pub struct Machine {
    state: State,
    loaded: bool,
    fault: Option<Fault>,
    rng: Box<dyn RngCore + Send>,
}

impl Machine {
    pub fn new() -> Self {
        Self::with_rng(Box::new(StdRng::from_entropy()))
    }

    /// Creates a machine whose random instructions draw from `rng`
    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        Machine {
            state: State::new(),
            loaded: false,
            fault: None,
            rng,
        }
    }

    /// Copies a ROM into memory at 0x200 and opens the load gate
    ///
    /// # Arguments
    /// * `rom` the raw program bytes; there is no header
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        if self.loaded {
            return Err(LoadError::AlreadyLoaded);
        }
        if rom.len() > MAX_ROM_SIZE {
            return Err(LoadError::RomTooLarge { size: rom.len() });
        }
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        self.loaded = true;
        info!("loaded {} byte ROM at {:#05X}", rom.len(), PROGRAM_START);
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom_from(&mut self, reader: &mut dyn Read) -> Result<(), LoadError> {
        let mut rom = Vec::with_capacity(MAX_ROM_SIZE);
        reader.read_to_end(&mut rom)?;
        self.load_rom(&rom)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The fault that halted this machine
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Advances the CPU by a single instruction
    /// - does nothing until a ROM is loaded
    /// - once faulted, keeps returning that fault without executing anything
    /// - otherwise fetches, decodes and executes the instruction at the pc
    pub fn step(&mut self) -> Result<(), Fault> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        if !self.loaded {
            return Ok(());
        }

        let pc = self.state.pc;
        let opcode = self.state.fetch();
        let result = match Instruction::decode(opcode) {
            Some(instruction) => {
                trace!("{:04X} {:04X} {}", pc, opcode, instruction);
                operations::execute(instruction, &mut self.state, &mut *self.rng)
            }
            None => Err(Fault::UnsupportedOpcode { opcode, pc }),
        };

        if let Err(fault) = result {
            debug!("halted: {}", fault);
            self.fault = Some(fault);
        }
        result
    }

    /// Decrements both timers by one if they're running.
    ///
    /// Returns true when the sound timer ran out on this tick.
    pub fn tick_timers(&mut self) -> bool {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }

        if self.state.sound_timer > 0 {
            self.state.sound_timer -= 1;
            return self.state.sound_timer == 0;
        }
        false
    }

    /// Replaces the pressed status of every key
    pub fn set_keys(&mut self, keys: Keys) {
        self.state.pressed_keys = keys;
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Whether an instruction has touched the frame buffer since the last `clear_dirty`
    pub fn is_dirty(&self) -> bool {
        self.state.draw_flag
    }

    pub fn clear_dirty(&mut self) {
        self.state.draw_flag = false;
    }

    /// Value of register V`register`.
    ///
    /// # Panics
    /// Panics if `register` is not in `0..16`.
    pub fn v(&self, register: usize) -> u8 {
        self.state.v[register]
    }

    pub fn i(&self) -> u16 {
        self.state.i
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    pub fn stack_depth(&self) -> usize {
        self.state.sp
    }

    pub fn memory(&self) -> &[u8] {
        &self.state.memory
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::constants::FONT_SHEET;

    fn machine_with(rom: &[u8]) -> Machine {
        let mut machine = Machine::with_rng(Box::new(StepRng::new(0, 0)));
        machine.load_rom(rom).unwrap();
        machine
    }

    #[test]
    fn test_machine_starts_unloaded_with_font_sheet() {
        let machine = Machine::new();
        assert!(!machine.is_loaded());
        assert_eq!(machine.memory()[0..80], FONT_SHEET[..]);
        assert_eq!(machine.pc(), 0x200);
    }

    #[test]
    fn test_step_is_a_noop_until_loaded() {
        let mut machine = Machine::new();
        for _ in 0..10 {
            assert_eq!(machine.step(), Ok(()));
        }
        assert_eq!(machine.pc(), 0x200);
        assert_eq!(machine.fault(), None);
    }

    #[test]
    fn test_loads_rom_at_program_start() {
        let machine = machine_with(&[0x12, 0x34, 0x56]);
        assert!(machine.is_loaded());
        assert_eq!(machine.memory()[0x200..0x203], [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_load_is_one_way() {
        let mut machine = machine_with(&[0x00, 0xE0]);
        assert!(matches!(
            machine.load_rom(&[0x00, 0xE0]),
            Err(LoadError::AlreadyLoaded)
        ));
        assert!(machine.is_loaded());
    }

    #[test]
    fn test_rejects_oversized_rom() {
        let mut machine = Machine::new();
        let rom = vec![0; MAX_ROM_SIZE + 1];
        assert!(matches!(
            machine.load_rom(&rom),
            Err(LoadError::RomTooLarge { size }) if size == MAX_ROM_SIZE + 1
        ));
        assert!(!machine.is_loaded());
    }

    #[test]
    fn test_accepts_rom_filling_memory() {
        let mut machine = Machine::new();
        let rom = vec![0xAB; MAX_ROM_SIZE];
        machine.load_rom(&rom).unwrap();
        assert_eq!(machine.memory()[0xFFF], 0xAB);
    }

    #[test]
    fn test_loads_rom_from_reader() {
        let mut machine = Machine::new();
        let mut reader: &[u8] = &[0x00, 0xE0];
        machine.load_rom_from(&mut reader).unwrap();
        assert_eq!(machine.memory()[0x200..0x202], [0x00, 0xE0]);
    }

    #[test]
    fn test_add_program() {
        let mut machine = machine_with(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x14]);
        for _ in 0..3 {
            machine.step().unwrap();
        }
        assert_eq!(machine.v(0x0), 8);
        assert_eq!(machine.v(0xF), 0);
        assert_eq!(machine.pc(), 0x206);
    }

    #[test]
    fn test_subroutine_program() {
        // 0x200 CALL 0x206; 0x202 LD V1, 0x01; 0x204 JP 0x204
        // 0x206 LD V0, 0xAA; 0x208 RET
        let mut machine = machine_with(&[
            0x22, 0x06, 0x61, 0x01, 0x12, 0x04, 0x60, 0xAA, 0x00, 0xEE,
        ]);
        machine.step().unwrap();
        assert_eq!(machine.pc(), 0x206);
        assert_eq!(machine.stack_depth(), 1);
        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.pc(), 0x202);
        assert_eq!(machine.stack_depth(), 0);
        machine.step().unwrap();
        assert_eq!(machine.v(0x0), 0xAA);
        assert_eq!(machine.v(0x1), 0x01);
    }

    #[test]
    fn test_unsupported_opcode_halts() {
        let mut machine = machine_with(&[0x60, 0x01, 0x01, 0x23, 0x60, 0x02]);
        machine.step().unwrap();
        let fault = Fault::UnsupportedOpcode {
            opcode: 0x0123,
            pc: 0x202,
        };
        assert_eq!(machine.step(), Err(fault));
        assert_eq!(machine.step(), Err(fault));
        assert_eq!(machine.fault(), Some(fault));
        assert_eq!(machine.pc(), 0x202);
        assert_eq!(machine.v(0x0), 0x01);
    }

    #[test]
    fn test_return_with_empty_stack_halts() {
        let mut machine = machine_with(&[0x00, 0xEE]);
        assert_eq!(machine.step(), Err(Fault::StackUnderflow { pc: 0x200 }));
        assert_eq!(machine.fault(), Some(Fault::StackUnderflow { pc: 0x200 }));
    }

    #[test]
    fn test_runaway_recursion_halts() {
        // 0x200 CALL 0x200
        let mut machine = machine_with(&[0x22, 0x00]);
        for _ in 0..16 {
            machine.step().unwrap();
        }
        assert_eq!(machine.step(), Err(Fault::StackOverflow { pc: 0x200 }));
        assert_eq!(machine.stack_depth(), 16);
    }

    #[test]
    fn test_wait_for_key_resumes_once_pressed() {
        let mut machine = machine_with(&[0xF3, 0x0A]);
        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.pc(), 0x200);

        let mut keys = [false; 16];
        keys[0xB] = true;
        machine.set_keys(keys);
        machine.step().unwrap();
        assert_eq!(machine.v(0x3), 0xB);
        assert_eq!(machine.pc(), 0x202);
    }

    #[test]
    fn test_draw_marks_frame_dirty() {
        let mut machine = machine_with(&[0x60, 0x00, 0xD0, 0x05]);
        machine.step().unwrap();
        assert!(!machine.is_dirty());
        machine.step().unwrap();
        assert!(machine.is_dirty());
        assert_eq!(machine.frame()[0][0..4], [1, 1, 1, 1]);
        machine.clear_dirty();
        assert!(!machine.is_dirty());
    }

    #[test]
    fn test_random_uses_injected_rng() {
        let mut machine = Machine::with_rng(Box::new(StepRng::new(0x5C, 0)));
        machine.load_rom(&[0xC4, 0xFF]).unwrap();
        machine.step().unwrap();
        assert_eq!(machine.v(0x4), 0x5C);
    }

    #[test]
    fn test_timers_decrement_once_per_tick() {
        // LD V0, 5; LD DT, V0; LD ST, V0
        let mut machine = machine_with(&[0x60, 0x05, 0xF0, 0x15, 0xF0, 0x18]);
        for _ in 0..3 {
            machine.step().unwrap();
        }
        assert_eq!(machine.delay_timer(), 5);
        machine.tick_timers();
        assert_eq!(machine.delay_timer(), 4);
        assert_eq!(machine.sound_timer(), 4);
        for _ in 0..10 {
            machine.tick_timers();
        }
        assert_eq!(machine.delay_timer(), 0);
        assert_eq!(machine.sound_timer(), 0);
    }

    #[test]
    fn test_tick_reports_sound_running_out_once() {
        // LD V0, 2; LD ST, V0
        let mut machine = machine_with(&[0x60, 0x02, 0xF0, 0x18]);
        machine.step().unwrap();
        machine.step().unwrap();
        assert!(!machine.tick_timers());
        assert!(machine.tick_timers());
        assert!(!machine.tick_timers());
    }

    #[test]
    fn test_v_reads_every_register() {
        let mut machine = Machine::with_rng(Box::new(StepRng::new(0, 0)));
        // LD VF, 0xAB
        machine.load_rom(&[0x6F, 0xAB]).unwrap();
        machine.step().unwrap();
        assert_eq!(machine.v(0xF), 0xAB);
        assert!((0..0xF).all(|reg| machine.v(reg) == 0));
    }

    #[test]
    #[should_panic]
    fn test_v_past_vf_panics() {
        let machine = Machine::default();
        machine.v(0x10);
    }
}
