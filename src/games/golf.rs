//! Golf.

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{Endian, MemoryView, Which};

use super::{MASH_START, never};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub score: u16,
    /// 0x83 aiming, 0xC3 turning, 0x63 on the title screen.
    pub game_state: u16,
    pub on_green: u16,
    pub strokes: u16,
    /// Low byte first.
    pub distance: [u16; 2],
    pub green_distance: u16,
    pub par: u16,
    pub hole: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            score: 0x000F,
            game_state: 0x0002,
            on_green: 0x0049,
            strokes: 0x002C,
            distance: [0x0058, 0x0059],
            green_distance: 0x005E,
            par: 0x0083,
            hole: 0x002B,
        }
    }
}

const TITLE_SCREEN: u8 = 0x63;

#[derive(Debug, Clone, Default)]
pub struct Golf {
    pub ram: RamMap,
}

impl Golf {
    /// Distance to the hole, in green units once the ball is on the green.
    pub fn distance(&self, memory: &MemoryView<'_>, which: Which) -> f64 {
        let ram = memory.ram(which);
        if ram[usize::from(self.ram.on_green)] == 1 {
            return f64::from(ram[usize::from(self.ram.green_distance)]);
        }
        memory
            .read_multi_byte(&self.ram.distance, Endian::Little, which)
            .unwrap_or_default() as f64
    }
}

impl RewardPolicy for Golf {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::LEFT, Buttons::RIGHT, Buttons::UP, Buttons::DOWN, Buttons::A])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let ram = self.ram;
        let closer = self.distance(memory, Which::Current) - self.distance(memory, Which::Previous);
        let mut reward = 0.01 - closer.min(0.0);
        if memory.changed(ram.strokes) {
            reward -= 1000.0;
        }
        reward -= f64::from(memory.delta(ram.score).max(0)) * 10.0;
        reward += f64::from(memory.delta(ram.hole)) * 10_000.0;
        reward / 1e4
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        u16::from(memory.get(self.ram.strokes)) > u16::from(memory.get(self.ram.par)) * 2
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if console.peek(self.ram.game_state) == TITLE_SCREEN {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let state = self.ram.game_state;
        console.skip_forward(&MASH_START, |c| c.peek(state) != TITLE_SCREEN, never)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RAM_SIZE;

    #[test]
    fn distance_switches_to_green_units() {
        let game = Golf::default();
        let mut cur = Box::new([0u8; RAM_SIZE]);
        cur[0x58] = 0x10;
        cur[0x59] = 0x01;
        cur[0x5E] = 7;
        let prev = cur.clone();
        let view = MemoryView::new(&cur, &prev);
        assert_eq!(game.distance(&view, Which::Current), 272.0);

        cur[0x49] = 1;
        let view = MemoryView::new(&cur, &prev);
        assert_eq!(game.distance(&view, Which::Current), 7.0);
    }

    #[test]
    fn too_many_strokes_ends_the_round() {
        let mut game = Golf::default();
        let prev = Box::new([0u8; RAM_SIZE]);
        let mut cur = Box::new([0u8; RAM_SIZE]);
        cur[0x83] = 4;
        cur[0x2C] = 8;
        assert!(!game.done(&MemoryView::new(&cur, &prev)));
        cur[0x2C] = 9;
        assert!(game.done(&MemoryView::new(&cur, &prev)));
    }
}
