//! Baseball.
//!
//! Rewards runs both ways and, depending on whether the agent's team is at
//! bat, counts and runners on base.

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, Ram};

use super::{TAP_START, never};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    /// 0 on the title screen.
    pub in_game: u16,
    /// 0x80 on team select.
    pub game_state: u16,
    /// 1 while the agent's team bats.
    pub batting: u16,
    pub strikes: u16,
    pub balls: u16,
    pub outs: u16,
    pub team1_score: u16,
    pub team2_score: u16,
    /// 1 when the agent plays the second team.
    pub is_team2: u16,
    /// Runner layout in the low nibble.
    pub bases: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            in_game: 0x001E,
            game_state: 0x03D0,
            batting: 0x000F,
            strikes: 0x0062,
            balls: 0x0063,
            outs: 0x0064,
            team1_score: 0x0067,
            team2_score: 0x0068,
            is_team2: 0x004B,
            bases: 0x038D,
        }
    }
}

const TEAM_SELECT: u8 = 0x80;

#[derive(Debug, Clone, Copy)]
pub struct RewardConfig {
    pub run: f64,
    pub base: f64,
    pub ball: f64,
    pub strike: f64,
    pub out: f64,
    pub scale: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            run: 500.0,
            base: 100.0,
            ball: 1.0,
            strike: 10.0,
            out: 100.0,
            scale: 100.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Baseball {
    pub ram: RamMap,
    pub reward_config: RewardConfig,
}

impl Baseball {
    fn byte(ram: &Ram, addr: u16) -> u8 {
        ram[usize::from(addr)]
    }

    /// `(own, opponent)` runs.
    pub fn scores(&self, ram: &Ram) -> (i64, i64) {
        let one = i64::from(Self::byte(ram, self.ram.team1_score));
        let two = i64::from(Self::byte(ram, self.ram.team2_score));
        if Self::byte(ram, self.ram.is_team2) != 0 {
            (two, one)
        } else {
            (one, two)
        }
    }

    /// Runner value derived from the low nibble, never negative.
    pub fn bases(&self, memory: &MemoryView<'_>) -> f64 {
        let layout = f64::from(memory.get(self.ram.bases) & 0x0F);
        ((layout - 10.0) / 2.0).max(0.0)
    }

    /// 1 when the count went up by exactly one this step.
    fn ticked(memory: &MemoryView<'_>, addr: u16) -> f64 {
        if memory.delta(addr) == 1 { 1.0 } else { 0.0 }
    }

    fn in_menu(&self, console: &Console) -> bool {
        console.peek(self.ram.in_game) == 0
    }
}

impl RewardPolicy for Baseball {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::UP,
            Buttons::DOWN,
            Buttons::LEFT,
            Buttons::RIGHT,
            Buttons::B,
            Buttons::A,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let rc = &self.reward_config;
        let (own, opp) = self.scores(memory.current());
        let (prev_own, prev_opp) = self.scores(memory.previous());
        let mut reward = ((own - prev_own) - (opp - prev_opp)) as f64 * rc.run;

        let count = Self::ticked(memory, self.ram.balls) * rc.ball
            + Self::ticked(memory, self.ram.strikes) * rc.strike
            + Self::ticked(memory, self.ram.outs) * rc.out;
        if memory.get(self.ram.batting) == 1 {
            reward += self.bases(memory) * rc.base - count;
        } else {
            reward += count;
        }
        reward / rc.scale
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        self.skip_between_rounds(console)?;
        Ok(())
    }

    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        if !self.in_menu(console) && console.peek(self.ram.game_state) != TEAM_SELECT {
            console.ensure_backup()?;
        }
        Ok(())
    }

    /// Start through the title, then A through team select.
    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let ram = self.ram;
        let outcome = console.skip_forward(&TAP_START, |c| c.peek(ram.in_game) != 0, never)?;
        if outcome != SkipOutcome::Reached {
            return Ok(outcome);
        }
        console.skip_forward(
            &[Buttons::NONE, Buttons::A],
            |c| c.peek(ram.game_state) != TEAM_SELECT,
            never,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RAM_SIZE;

    fn pair(prev: &[(u16, u8)], cur: &[(u16, u8)]) -> (Box<Ram>, Box<Ram>) {
        let mut p = Box::new([0u8; RAM_SIZE]);
        let mut c = Box::new([0u8; RAM_SIZE]);
        for &(a, v) in prev {
            p[usize::from(a)] = v;
        }
        for &(a, v) in cur {
            c[usize::from(a)] = v;
        }
        (c, p)
    }

    #[test]
    fn runs_count_for_the_agents_team() {
        let mut game = Baseball::default();
        let (c, p) = pair(&[(0x4B, 1)], &[(0x4B, 1), (0x68, 1)]);
        assert!((game.reward(&MemoryView::new(&c, &p)) - 5.0).abs() < 1e-9);
        let (c, p) = pair(&[], &[(0x68, 1)]);
        assert!((game.reward(&MemoryView::new(&c, &p)) - -5.0).abs() < 1e-9);
    }

    #[test]
    fn counts_flip_sign_with_batting() {
        let mut game = Baseball::default();
        // fielding: an out is good for the agent
        let (c, p) = pair(&[(0x64, 1)], &[(0x64, 2)]);
        assert!((game.reward(&MemoryView::new(&c, &p)) - 1.0).abs() < 1e-9);
        // batting: a strike is bad, and a reset of the count is ignored
        let (c, p) = pair(&[(0x0F, 1), (0x62, 1)], &[(0x0F, 1), (0x62, 2)]);
        assert!((game.reward(&MemoryView::new(&c, &p)) - -0.1).abs() < 1e-9);
        let (c, p) = pair(&[(0x0F, 1), (0x62, 2)], &[(0x0F, 1), (0x62, 0)]);
        assert!((game.reward(&MemoryView::new(&c, &p)) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn runners_on_base_pay_while_batting() {
        let game = Baseball::default();
        let (c, p) = pair(&[], &[(0x38D, 0xAE)]);
        assert_eq!(game.bases(&MemoryView::new(&c, &p)), 2.0);
        let (c, p) = pair(&[], &[(0x38D, 0x05)]);
        assert_eq!(game.bases(&MemoryView::new(&c, &p)), 0.0);
    }
}
