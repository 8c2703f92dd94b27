use std::path::Path;

use tetanes_core::control_deck::HeadlessMode;
use tetanes_core::cpu::Cpu;
use tetanes_core::mem::{Read, Write};
use tetanes_core::prelude::*;

use crate::error::{EnvError, Result};
use crate::input::Buttons;
use crate::snapshot::Ram;

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 240;
pub const FRAME_CHANNELS: usize = 3;
pub const FRAME_LEN: usize = FRAME_WIDTH * FRAME_HEIGHT * FRAME_CHANNELS;

/// Opaque, engine-defined serialization of full emulator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveState(Vec<u8>);

impl SaveState {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Boundary to the emulation engine.
///
/// Frames are row-major RGB, `FRAME_HEIGHT x FRAME_WIDTH x 3`.
pub trait Emulator {
    fn set_controller(&mut self, buttons: Buttons);

    /// Runs exactly one frame under the current controller input.
    fn step_frame(&mut self) -> Result<()>;

    /// Most recently rendered frame.
    fn frame(&self) -> &[u8];

    fn peek(&self, addr: u16) -> u8;

    fn poke(&mut self, addr: u16, val: u8);

    fn read_ram(&self, out: &mut Ram) {
        for (addr, byte) in out.iter_mut().enumerate() {
            *byte = self.peek(addr as u16);
        }
    }

    fn save_state(&self) -> Result<SaveState>;

    fn load_state(&mut self, state: &SaveState) -> Result<()>;

    /// Power-on equivalent reset.
    fn power_cycle(&mut self) -> Result<()>;
}

// =============================================================================
// tetanes-core adapter
// =============================================================================

pub struct TetanesEmulator {
    deck: ControlDeck,
    rgb: Vec<u8>,
}

impl TetanesEmulator {
    pub fn new(rom_path: &Path) -> Result<Self> {
        let mut deck = ControlDeck::new();
        // Observations need video, never audio.
        deck.set_headless_mode(HeadlessMode::NO_AUDIO);
        deck.load_rom_path(rom_path).map_err(|e| {
            EnvError::Config(format!("failed to load ROM {}: {e}", rom_path.display()))
        })?;
        Ok(Self {
            deck,
            rgb: vec![0; FRAME_LEN],
        })
    }

    fn capture_frame(&mut self) {
        let rgba = self.deck.frame_buffer();
        for (dst, src) in self.rgb.chunks_exact_mut(3).zip(rgba.chunks_exact(4)) {
            dst.copy_from_slice(&src[..3]);
        }
    }
}

impl Emulator for TetanesEmulator {
    fn set_controller(&mut self, buttons: Buttons) {
        use tetanes_core::input::JoypadBtnState;
        let btn_state = buttons.to_joypad();
        let joypad = self.deck.joypad_mut(Player::One);
        for button in [
            JoypadBtnState::LEFT,
            JoypadBtnState::RIGHT,
            JoypadBtnState::UP,
            JoypadBtnState::DOWN,
            JoypadBtnState::A,
            JoypadBtnState::B,
            JoypadBtnState::START,
            JoypadBtnState::SELECT,
        ] {
            joypad.set_button(button, btn_state.contains(button));
        }
    }

    fn step_frame(&mut self) -> Result<()> {
        self.deck.clock_frame().map_err(EnvError::engine)?;
        self.capture_frame();
        Ok(())
    }

    fn frame(&self) -> &[u8] {
        &self.rgb
    }

    /// Any CPU address, cartridge work RAM included.
    fn peek(&self, addr: u16) -> u8 {
        self.deck.bus().peek(addr)
    }

    fn poke(&mut self, addr: u16, val: u8) {
        self.deck.bus_mut().write(addr, val);
    }

    fn save_state(&self) -> Result<SaveState> {
        let bytes = bincode::serialize(self.deck.cpu()).map_err(EnvError::engine)?;
        Ok(SaveState::new(bytes))
    }

    fn load_state(&mut self, state: &SaveState) -> Result<()> {
        let cpu: Cpu = bincode::deserialize(state.as_bytes()).map_err(EnvError::engine)?;
        self.deck.load_cpu(cpu);
        self.capture_frame();
        Ok(())
    }

    fn power_cycle(&mut self) -> Result<()> {
        self.deck.reset(ResetKind::Hard);
        Ok(())
    }
}
