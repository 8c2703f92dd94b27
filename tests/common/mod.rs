#![allow(dead_code)]

use nes_gym::emulator::FRAME_LEN;
use nes_gym::{
    ActionTable, Buttons, Console, Emulator, EnvConfig, MemoryView, NesEnv, RAM_SIZE, Result,
    RewardPolicy, SaveState,
};

/// Increments once per emulated frame.
pub const TICK: u16 = 0x0000;
/// Moves one step right or left per frame with the d-pad.
pub const X: u16 = 0x0010;
/// Controller byte of the last frame.
pub const HELD: u16 = 0x0020;

/// Deterministic stand-in for the NES: RAM follows fixed per-frame rules and
/// every frame is filled with the current tick.
#[derive(Debug, Clone)]
pub struct ScriptedNes {
    ram: Vec<u8>,
    buttons: Buttons,
    frame: Vec<u8>,
}

impl Default for ScriptedNes {
    fn default() -> Self {
        Self {
            ram: vec![0; RAM_SIZE],
            buttons: Buttons::NONE,
            frame: vec![0; FRAME_LEN],
        }
    }
}

impl Emulator for ScriptedNes {
    fn set_controller(&mut self, buttons: Buttons) {
        self.buttons = buttons;
    }

    fn step_frame(&mut self) -> Result<()> {
        let tick = usize::from(TICK);
        self.ram[tick] = self.ram[tick].wrapping_add(1);
        let x = usize::from(X);
        if self.buttons.contains(Buttons::RIGHT) {
            self.ram[x] = self.ram[x].wrapping_add(1);
        }
        if self.buttons.contains(Buttons::LEFT) {
            self.ram[x] = self.ram[x].wrapping_sub(1);
        }
        self.ram[usize::from(HELD)] = self.buttons.bits();
        self.frame.fill(self.ram[tick]);
        Ok(())
    }

    fn frame(&self) -> &[u8] {
        &self.frame
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram.get(usize::from(addr)).copied().unwrap_or(0)
    }

    fn poke(&mut self, addr: u16, val: u8) {
        if let Some(byte) = self.ram.get_mut(usize::from(addr)) {
            *byte = val;
        }
    }

    fn save_state(&self) -> Result<SaveState> {
        Ok(SaveState::new(self.ram.clone()))
    }

    fn load_state(&mut self, state: &SaveState) -> Result<()> {
        self.ram.copy_from_slice(state.as_bytes());
        self.frame.fill(self.ram[usize::from(TICK)]);
        Ok(())
    }

    fn power_cycle(&mut self) -> Result<()> {
        self.ram.fill(0);
        self.frame.fill(0);
        self.buttons = Buttons::NONE;
        Ok(())
    }
}

pub fn console() -> Console {
    Console::new(Box::new(ScriptedNes::default()))
}

pub fn env<P: RewardPolicy>(policy: P, config: EnvConfig) -> NesEnv<P> {
    NesEnv::new(Box::new(ScriptedNes::default()), policy, config).unwrap()
}

/// Rewards movement along `X` and ends the episode once `X` reaches `limit`.
#[derive(Debug, Clone)]
pub struct WalkRight {
    pub limit: u8,
    /// Capture a save state the first time `X` equals this value.
    pub backup_at: Option<u8>,
}

impl WalkRight {
    pub fn until(limit: u8) -> Self {
        Self {
            limit,
            backup_at: None,
        }
    }
}

impl RewardPolicy for WalkRight {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::NONE, Buttons::RIGHT])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        f64::from(memory.delta(X))
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        memory.get(X) >= self.limit
    }

    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        if self.backup_at == Some(console.memory().get(X)) {
            console.ensure_backup()?;
        }
        Ok(())
    }
}

/// Records the order in which the controller calls into the policy.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub calls: Vec<&'static str>,
}

impl RewardPolicy for Recorder {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::NONE, Buttons::RIGHT])
    }

    fn reward(&mut self, _memory: &MemoryView<'_>) -> f64 {
        self.calls.push("reward");
        0.0
    }

    fn done(&mut self, _memory: &MemoryView<'_>) -> bool {
        self.calls.push("done");
        false
    }

    fn will_step(&mut self, _console: &mut Console) -> Result<()> {
        self.calls.push("will_step");
        Ok(())
    }

    fn did_step(&mut self, _console: &mut Console) -> Result<()> {
        self.calls.push("did_step");
        Ok(())
    }

    fn will_reset(&mut self, _console: &mut Console) -> Result<()> {
        self.calls.push("will_reset");
        Ok(())
    }

    fn did_reset(&mut self, _console: &mut Console) -> Result<()> {
        self.calls.push("did_reset");
        Ok(())
    }
}
