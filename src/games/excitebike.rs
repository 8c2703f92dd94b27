use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{Endian, MemoryView, Which};

use super::{TAP_START, never};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    /// 0 at the start line, 1 while racing.
    pub racing_flag: u16,
    /// 0..=47.
    pub player_speed: u16,
    /// Overheats at 32.
    pub motor_temp: u16,
    /// Race clock, minutes first.
    pub timer: [u16; 3],
    pub player_status: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            racing_flag: 0x004F,
            player_speed: 0x00F3,
            motor_temp: 0x03E3,
            timer: [0x0068, 0x0069, 0x006A],
            player_status: 0x00F2,
        }
    }
}

const OVERHEAT_TEMP: u8 = 32;
const STATUS_OK: [u8; 2] = [0, 4];
const REWARD_SCALE: f64 = 1e4;

#[derive(Debug, Clone, Default)]
pub struct Excitebike {
    pub ram: RamMap,
    finish_time: Option<u64>,
}

impl Excitebike {
    pub fn finish_time(&self) -> Option<u64> {
        self.finish_time
    }

    fn race_time(&self, memory: &MemoryView<'_>, which: Which) -> u64 {
        memory
            .read_multi_byte(&self.ram.timer, Endian::Big, which)
            .unwrap_or_default()
    }
}

impl RewardPolicy for Excitebike {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::NONE,
            Buttons::LEFT,
            Buttons::RIGHT,
            Buttons::A,
            Buttons::B,
            Buttons::A | Buttons::LEFT,
            Buttons::A | Buttons::RIGHT,
            Buttons::B | Buttons::LEFT,
            Buttons::B | Buttons::RIGHT,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let mut reward = -0.01 + f64::from(memory.get(self.ram.player_speed)) / 10.0;
        if memory.get(self.ram.motor_temp) >= OVERHEAT_TEMP {
            reward -= 20.0;
        }
        if !STATUS_OK.contains(&memory.get(self.ram.player_status)) {
            reward -= 5.0;
        }
        reward / REWARD_SCALE
    }

    /// The race clock freezes once the finish line is crossed.
    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        if memory.get(self.ram.racing_flag) != 1 || self.finish_time.is_some() {
            return false;
        }
        let current = self.race_time(memory, Which::Current);
        let previous = self.race_time(memory, Which::Previous);
        if current == previous && current > 0 {
            self.finish_time = Some(current);
            return true;
        }
        false
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if console.peek(self.ram.racing_flag) != 1 {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn did_reset(&mut self, console: &mut Console) -> Result<()> {
        self.finish_time = None;
        if !console.has_backup() {
            for _ in 0..30 {
                for &buttons in &TAP_START {
                    console.frame_advance(buttons)?;
                }
            }
        }
        Ok(())
    }

    /// Holding A gets through the menus and off the start line.
    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let flag = self.ram.racing_flag;
        console.skip_forward(&[Buttons::A], |c| c.peek(flag) == 1, never)
    }
}
