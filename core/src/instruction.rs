use std::fmt;

use crate::opcode::Opcode;

/// A decoded instruction with its operands pulled out of the opcode.
///
/// Register operands are indices into V0..VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipEqualByte { x: usize, kk: u8 },
    /// 4xkk
    SkipNotEqualByte { x: usize, kk: u8 },
    /// 5xy0
    SkipEqual { x: usize, y: usize },
    /// 6xkk
    LoadByte { x: usize, kk: u8 },
    /// 7xkk
    AddByte { x: usize, kk: u8 },
    /// 8xy0
    Move { x: usize, y: usize },
    /// 8xy1
    Or { x: usize, y: usize },
    /// 8xy2
    And { x: usize, y: usize },
    /// 8xy3
    Xor { x: usize, y: usize },
    /// 8xy4
    Add { x: usize, y: usize },
    /// 8xy5
    Sub { x: usize, y: usize },
    /// 8xy6
    ShiftRight { x: usize },
    /// 8xy7
    SubReverse { x: usize, y: usize },
    /// 8xyE
    ShiftLeft { x: usize },
    /// 9xy0
    SkipNotEqual { x: usize, y: usize },
    /// Annn
    LoadI(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxkk
    Random { x: usize, kk: u8 },
    /// Dxyn
    Draw { x: usize, y: usize, n: u8 },
    /// Ex9E
    SkipKeyPressed { x: usize },
    /// ExA1
    SkipKeyReleased { x: usize },
    /// Fx07
    LoadDelay { x: usize },
    /// Fx0A
    WaitKey { x: usize },
    /// Fx15
    SetDelay { x: usize },
    /// Fx18
    SetSound { x: usize },
    /// Fx1E
    AddI { x: usize },
    /// Fx29
    LoadGlyph { x: usize },
    /// Fx33
    StoreBcd { x: usize },
    /// Fx55
    StoreRegisters { x: usize },
    /// Fx65
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Selects the Instruction for an opcode.
    ///
    /// The family nibble is matched first; the shared families `0`, `8`, `E` and `F` are
    /// resolved on their low byte or low nibble. Returns `None` for anything unsupported,
    /// including the machine-code `0nnn` calls.
    pub fn decode(op: u16) -> Option<Instruction> {
        use Instruction::*;

        let (x, y, n, kk, nnn) = (op.x(), op.y(), op.n(), op.kk(), op.addr());
        let instruction = match op.family() {
            0x0 => match op {
                0x00E0 => Clear,
                0x00EE => Return,
                _ => return None,
            },
            0x1 => Jump(nnn),
            0x2 => Call(nnn),
            0x3 => SkipEqualByte { x, kk },
            0x4 => SkipNotEqualByte { x, kk },
            0x5 if n == 0x0 => SkipEqual { x, y },
            0x6 => LoadByte { x, kk },
            0x7 => AddByte { x, kk },
            0x8 => match n {
                0x0 => Move { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => Add { x, y },
                0x5 => Sub { x, y },
                0x6 => ShiftRight { x },
                0x7 => SubReverse { x, y },
                0xE => ShiftLeft { x },
                _ => return None,
            },
            0x9 if n == 0x0 => SkipNotEqual { x, y },
            0xA => LoadI(nnn),
            0xB => JumpOffset(nnn),
            0xC => Random { x, kk },
            0xD => Draw { x, y, n },
            0xE => match kk {
                0x9E => SkipKeyPressed { x },
                0xA1 => SkipKeyReleased { x },
                _ => return None,
            },
            0xF => match kk {
                0x07 => LoadDelay { x },
                0x0A => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1E => AddI { x },
                0x29 => LoadGlyph { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegisters { x },
                0x65 => LoadRegisters { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;

        match *self {
            Clear => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(nnn) => write!(f, "JP {:#05X}", nnn),
            Call(nnn) => write!(f, "CALL {:#05X}", nnn),
            SkipEqualByte { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            SkipNotEqualByte { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            SkipEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadByte { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            AddByte { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x } => write!(f, "SHR V{:X}", x),
            SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x } => write!(f, "SHL V{:X}", x),
            SkipNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadI(nnn) => write!(f, "LD I, {:#05X}", nnn),
            JumpOffset(nnn) => write!(f, "JP V0, {:#05X}", nnn),
            Random { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipKeyReleased { x } => write!(f, "SKNP V{:X}", x),
            LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddI { x } => write!(f, "ADD I, V{:X}", x),
            LoadGlyph { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
