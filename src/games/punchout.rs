//! Mike Tyson's Punch-Out!!

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::MemoryView;

use super::MASH_START;

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub opponent_id: u16,
    pub round_state: u16,
    pub mac_hp: u16,
    pub opponent_hp: u16,
    pub opponent_ko_count: u16,
    pub timer_minutes: u16,
    pub timer_tens: u16,
    pub timer_seconds: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            opponent_id: 0x0001,
            round_state: 0x0004,
            mac_hp: 0x0391,
            opponent_hp: 0x0398,
            opponent_ko_count: 0x03D1,
            timer_minutes: 0x0302,
            timer_tens: 0x0304,
            timer_seconds: 0x0305,
        }
    }
}

const IN_FIGHT: u8 = 0xFF;

/// Health drop in one step that counts as a knockdown.
pub const KNOCKDOWN_HP_DROP: i16 = -3;

#[derive(Debug, Clone, Default)]
pub struct PunchOut {
    pub ram: RamMap,
}

impl PunchOut {
    fn in_fight(&self, console: &Console) -> bool {
        console.peek(self.ram.round_state) == IN_FIGHT
    }

    /// Elapsed clock change in seconds.
    pub fn time_change(&self, memory: &MemoryView<'_>) -> i64 {
        60 * i64::from(memory.delta(self.ram.timer_minutes))
            + 10 * i64::from(memory.delta(self.ram.timer_tens))
            + i64::from(memory.delta(self.ram.timer_seconds))
    }
}

impl RewardPolicy for PunchOut {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::NONE, Buttons::LEFT, Buttons::B, Buttons::UP | Buttons::B])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let hit = (-memory.delta(self.ram.opponent_hp)).max(0);
        let taken = (-memory.delta(self.ram.mac_hp)).max(0);
        f64::from(hit - taken)
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        memory.delta(self.ram.mac_hp) < KNOCKDOWN_HP_DROP
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if !self.in_fight(console) {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    /// The clock starts running once the bell rings.
    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        if console.memory().get(self.ram.timer_seconds) != 0 {
            console.ensure_backup()?;
        }
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let ram = self.ram;
        console.skip_forward(
            &MASH_START,
            |c| c.peek(ram.round_state) == IN_FIGHT,
            |c| c.peek(ram.mac_hp) == 0,
        )
    }
}
