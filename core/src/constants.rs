use std::time::Duration;

/// Width of the display in pixels
pub const DISPLAY_WIDTH: usize = 64;
/// Height of the display in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Total addressable memory in bytes
pub const MEMORY_SIZE: usize = 4096;
/// ROMs are loaded into memory (and execution begins) at this address
pub const PROGRAM_START: u16 = 0x200;
/// The largest ROM that fits between `PROGRAM_START` and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Number of return addresses the stack can hold
pub const STACK_DEPTH: usize = 16;
/// Number of keys on the hexadecimal keypad
pub const KEY_COUNT: usize = 16;

/// Each font glyph is 5 rows of 8 pixels
pub const GLYPH_SIZE: u16 = 5;
/// The font sheet occupies `0x000..FONT_SHEET_END` and is never overwritten
pub const FONT_SHEET_END: usize = FONT_SHEET.len();

/// Instruction steps run by a `Session` per tick
pub const DEFAULT_STEPS_PER_TICK: usize = 4;
/// Wall-clock length of one tick
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// # Font sheet
/// Sprites for the hexadecimal digits 0..F, 5 bytes apiece.
///
/// Each byte is one row of a glyph; only the high nibble is lit.
/// ```text
/// 0xF0  ####
/// 0x90  #  #
/// 0x90  #  #
/// 0x90  #  #
/// 0xF0  ####
/// ```
pub const FONT_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
