use log::warn;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_SHEET, FONT_SHEET_END, KEY_COUNT, MEMORY_SIZE,
    PROGRAM_START, STACK_DEPTH,
};
use crate::error::Fault;

/// The FrameBuffer is indexed as [y][x]; every pixel is either 0 or 1
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// Pressed status of the keys 0..F
pub type Keys = [bool; KEY_COUNT];

/// Everything an instruction can read or modify
///
/// ## CPU
/// Registers
/// - (v) 16 8-bit registers (V0..VF)
///     - VF doubles as the carry, borrow, shift and collision flag
/// - (i) a 16-bit address register; never masked to 12 bits
///
/// Counter
/// - (pc) a 16-bit program counter, starting at 0x200
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented once per tick by the owning `Machine`
///
/// ## Memory
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the font sheet for the lifetime of the state
///     - 0x200.. holds the loaded ROM
/// - a stack of 16 return addresses with its pointer (sp)
/// - 32x64 frame buffer, with a flag set whenever an instruction touched it
///
/// ## Input
/// - the pressed status of keys 0..F, as last sampled from the keypad
#[derive(Clone)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub pressed_keys: Keys,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..FONT_SHEET_END].copy_from_slice(&FONT_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            pressed_keys: [false; KEY_COUNT],
        }
    }

    /// Reads a byte; addresses wrap around the end of memory
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[wrap(addr)]
    }

    /// Writes a byte; addresses wrap around the end of memory.
    /// Writes into the font sheet are dropped.
    pub fn write(&mut self, addr: u16, value: u8) {
        let addr = wrap(addr);
        if addr < FONT_SHEET_END {
            warn!("dropped write of {:#04X} into font sheet at {:#05X}", value, addr);
            return;
        }
        self.memory[addr] = value;
    }

    /// The big-endian word the pc points at
    pub fn fetch(&self) -> u16 {
        let left = u16::from(self.read(self.pc));
        let right = u16::from(self.read(self.pc.wrapping_add(1)));
        left << 8 | right
    }

    /// Pushes a return address
    pub fn push(&mut self, addr: u16) -> Result<(), Fault> {
        if self.sp == STACK_DEPTH {
            return Err(Fault::StackOverflow { pc: self.pc });
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pops the most recent return address
    pub fn pop(&mut self) -> Result<u16, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    /// Moves on to the next instruction
    pub fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Skips the next instruction when `condition` holds, otherwise moves on to it
    pub fn skip_if(&mut self, condition: bool) {
        self.advance();
        if condition {
            self.advance();
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap(addr: u16) -> usize {
    addr as usize % MEMORY_SIZE
}
