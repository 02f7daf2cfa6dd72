use rand::{Rng, RngCore};

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, GLYPH_SIZE};
use crate::error::Fault;
use crate::instruction::Instruction;
use crate::state::State;

/// Executes a single decoded instruction against `state`.
///
/// Every instruction leaves the pc either advanced past itself or explicitly set.
/// The single exception is `Fx0A`, which leaves it untouched until a key is down.
pub fn execute(
    instruction: Instruction,
    state: &mut State,
    rng: &mut dyn RngCore,
) -> Result<(), Fault> {
    use Instruction::*;

    match instruction {
        Clear => clr(state),
        Return => rts(state)?,
        Jump(nnn) => state.pc = nnn,
        Call(nnn) => call(state, nnn)?,
        SkipEqualByte { x, kk } => state.skip_if(state.v[x] == kk),
        SkipNotEqualByte { x, kk } => state.skip_if(state.v[x] != kk),
        SkipEqual { x, y } => state.skip_if(state.v[x] == state.v[y]),
        SkipNotEqual { x, y } => state.skip_if(state.v[x] != state.v[y]),
        LoadByte { x, kk } => load(state, x, kk),
        AddByte { x, kk } => add(state, x, kk),
        Move { x, y } => mv(state, x, y),
        Or { x, y } => or(state, x, y),
        And { x, y } => and(state, x, y),
        Xor { x, y } => xor(state, x, y),
        Add { x, y } => addr(state, x, y),
        Sub { x, y } => sub(state, x, y),
        ShiftRight { x } => shr(state, x),
        SubReverse { x, y } => subn(state, x, y),
        ShiftLeft { x } => shl(state, x),
        LoadI(nnn) => loadi(state, nnn),
        JumpOffset(nnn) => state.pc = nnn.wrapping_add(u16::from(state.v[0x0])),
        Random { x, kk } => rnd(state, rng, x, kk),
        Draw { x, y, n } => draw(state, x, y, n),
        SkipKeyPressed { x } => state.skip_if(key_pressed(state, x)),
        SkipKeyReleased { x } => state.skip_if(!key_pressed(state, x)),
        LoadDelay { x } => moved(state, x),
        WaitKey { x } => keyd(state, x),
        SetDelay { x } => loads(state, x),
        SetSound { x } => ld(state, x),
        AddI { x } => addi(state, x),
        LoadGlyph { x } => ldspr(state, x),
        StoreBcd { x } => bcd(state, x),
        StoreRegisters { x } => stor(state, x),
        LoadRegisters { x } => read(state, x),
    }
    Ok(())
}

/// clear
fn clr(state: &mut State) {
    state.frame_buffer = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    state.draw_flag = true;
    state.advance();
}

/// PC = STACK.pop()
/// The popped address already points past the call.
fn rts(state: &mut State) -> Result<(), Fault> {
    state.pc = state.pop()?;
    Ok(())
}

/// STACK.push(PC + 2); PC = addr
fn call(state: &mut State, addr: u16) -> Result<(), Fault> {
    state.push(state.pc.wrapping_add(2))?;
    state.pc = addr;
    Ok(())
}

/// Vx = kk
fn load(state: &mut State, x: usize, kk: u8) {
    state.v[x] = kk;
    state.advance();
}

/// Vx += kk
/// Overflow is dropped; VF is left alone
fn add(state: &mut State, x: usize, kk: u8) {
    state.v[x] = state.v[x].wrapping_add(kk);
    state.advance();
}

/// Vx = Vy
fn mv(state: &mut State, x: usize, y: usize) {
    state.v[x] = state.v[y];
    state.advance();
}

/// Vx |= Vy
fn or(state: &mut State, x: usize, y: usize) {
    state.v[x] |= state.v[y];
    state.advance();
}

/// Vx &= Vy
fn and(state: &mut State, x: usize, y: usize) {
    state.v[x] &= state.v[y];
    state.advance();
}

/// Vx ^= Vy
fn xor(state: &mut State, x: usize, y: usize) {
    state.v[x] ^= state.v[y];
    state.advance();
}

// The flag setting 8xyN instructions write Vx before VF, so VF holds the flag even when x = F.

/// Vx += Vy; VF = carry
fn addr(state: &mut State, x: usize, y: usize) {
    let (res, carry) = state.v[x].overflowing_add(state.v[y]);
    state.v[x] = res;
    state.v[0xF] = carry as u8;
    state.advance();
}

/// Vx -= Vy; VF = Vx > Vy
fn sub(state: &mut State, x: usize, y: usize) {
    let no_borrow = state.v[x] > state.v[y];
    state.v[x] = state.v[x].wrapping_sub(state.v[y]);
    state.v[0xF] = no_borrow as u8;
    state.advance();
}

/// Vx >>= 1; VF = lsb
fn shr(state: &mut State, x: usize) {
    let lsb = state.v[x] & 0x1;
    state.v[x] >>= 1;
    state.v[0xF] = lsb;
    state.advance();
}

/// Vx = Vy - Vx; VF = Vy > Vx
fn subn(state: &mut State, x: usize, y: usize) {
    let no_borrow = state.v[y] > state.v[x];
    state.v[x] = state.v[y].wrapping_sub(state.v[x]);
    state.v[0xF] = no_borrow as u8;
    state.advance();
}

/// Vx <<= 1; VF = msb
fn shl(state: &mut State, x: usize) {
    let msb = state.v[x] >> 7;
    state.v[x] <<= 1;
    state.v[0xF] = msb;
    state.advance();
}

/// I = addr
fn loadi(state: &mut State, addr: u16) {
    state.i = addr;
    state.advance();
}

/// Vx = rand_byte & kk
fn rnd(state: &mut State, rng: &mut dyn RngCore, x: usize, kk: u8) {
    let byte: u8 = rng.gen();
    state.v[x] = byte & kk;
    state.advance();
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite at memory I..I+n onto the FrameBuffer at (Vx, Vy), wrapping on both axes.
/// VF is set if any lit pixel was erased.
fn draw(state: &mut State, x: usize, y: usize, n: u8) {
    let origin_x = state.v[x] as usize;
    let origin_y = state.v[y] as usize;
    let mut collision = false;

    for row in 0..u16::from(n) {
        let sprite = state.read(state.i.wrapping_add(row));
        let py = (origin_y + row as usize) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            if sprite & (0x80 >> bit) == 0 {
                continue;
            }
            let px = (origin_x + bit) % DISPLAY_WIDTH;
            let pixel = &mut state.frame_buffer[py][px];
            collision |= *pixel == 1;
            *pixel ^= 1;
        }
    }

    state.v[0xF] = collision as u8;
    state.draw_flag = true;
    state.advance();
}

fn key_pressed(state: &State, x: usize) -> bool {
    // only the low nibble of Vx names a key
    state.pressed_keys[(state.v[x] & 0xF) as usize]
}

/// Vx = DT
fn moved(state: &mut State, x: usize) {
    state.v[x] = state.delay_timer;
    state.advance();
}

/// await keypress for Vx
/// Re-executed every step until some key is down; the lowest pressed key wins.
fn keyd(state: &mut State, x: usize) {
    if let Some(key) = state.pressed_keys.iter().position(|&pressed| pressed) {
        state.v[x] = key as u8;
        state.advance();
    }
}

/// DT = Vx
fn loads(state: &mut State, x: usize) {
    state.delay_timer = state.v[x];
    state.advance();
}

/// ST = Vx
fn ld(state: &mut State, x: usize) {
    state.sound_timer = state.v[x];
    state.advance();
}

/// I += Vx
fn addi(state: &mut State, x: usize) {
    state.i = state.i.wrapping_add(u16::from(state.v[x]));
    state.advance();
}

/// I = Vx * 5
/// Points I at the font sheet glyph for Vx
fn ldspr(state: &mut State, x: usize) {
    state.i = u16::from(state.v[x]) * GLYPH_SIZE;
    state.advance();
}

/// mem[I..I+3] = bcd(Vx)
fn bcd(state: &mut State, x: usize) {
    let value = state.v[x];
    let digits = [value / 100, value / 10 % 10, value % 10];
    for (offset, digit) in digits.iter().enumerate() {
        state.write(state.i.wrapping_add(offset as u16), *digit);
    }
    state.advance();
}

/// mem[I..=I+x] = V0..=Vx
fn stor(state: &mut State, x: usize) {
    for reg in 0..=x {
        state.write(state.i.wrapping_add(reg as u16), state.v[reg]);
    }
    state.advance();
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
fn read(state: &mut State, x: usize) {
    for reg in 0..=x {
        state.v[reg] = state.read(state.i.wrapping_add(reg as u16));
    }
    state.i = state.i.wrapping_add(x as u16 + 1);
    state.advance();
}
