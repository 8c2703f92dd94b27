//! Game-agnostic reward from a weighted list of RAM objectives.
//!
//! Each objective is a tuple of bytes read at fixed addresses. A step that
//! makes the tuple lexicographically larger earns the objective's weight, one
//! that makes it smaller loses it.

use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;

use crate::error::{EnvError, Result};
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, RAM_SIZE, Ram};

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    weight: f64,
    addresses: Vec<u16>,
}

impl Objective {
    pub fn new(weight: f64, addresses: Vec<u16>) -> Result<Self> {
        if addresses.is_empty() {
            return Err(EnvError::Config("objective needs at least one address".into()));
        }
        if let Some(&addr) = addresses.iter().find(|&&a| usize::from(a) >= RAM_SIZE) {
            return Err(EnvError::Config(format!(
                "objective address 0x{addr:04X} is outside of RAM"
            )));
        }
        Ok(Self { weight, addresses })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn addresses(&self) -> &[u16] {
        &self.addresses
    }

    fn values<'a>(&'a self, ram: &'a Ram) -> impl Iterator<Item = u8> + 'a {
        self.addresses.iter().map(move |&a| ram[usize::from(a)])
    }

    /// Signed contribution of this objective between two snapshots.
    pub fn score(&self, current: &Ram, previous: &Ram) -> f64 {
        match self.values(current).cmp(self.values(previous)) {
            Ordering::Greater => self.weight,
            Ordering::Less => -self.weight,
            Ordering::Equal => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectiveSet {
    objectives: Vec<Objective>,
}

impl ObjectiveSet {
    pub fn new(objectives: Vec<Objective>) -> Self {
        Self { objectives }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EnvError::Objectives {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.iter()
    }

    /// Total reward for one transition; zero when there is no previous snapshot.
    pub fn evaluate(&self, current: &Ram, previous: Option<&Ram>) -> f64 {
        let Some(previous) = previous else {
            return 0.0;
        };
        self.objectives
            .iter()
            .map(|o| o.score(current, previous))
            .sum()
    }
}

impl FromStr for ObjectiveSet {
    type Err = EnvError;

    /// One objective per line: a float weight followed by RAM addresses.
    fn from_str(text: &str) -> Result<Self> {
        let mut objectives = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let line_err =
                |msg: String| EnvError::Config(format!("objectives line {}: {msg}", lineno + 1));
            let mut tokens = line.split_whitespace();
            let weight = tokens
                .next()
                .unwrap_or_default()
                .parse::<f64>()
                .map_err(|e| line_err(format!("bad weight: {e}")))?;
            let addresses = tokens
                .map(|t| parse_address(t).ok_or_else(|| line_err(format!("bad address '{t}'"))))
                .collect::<Result<Vec<_>>>()?;
            let objective = Objective::new(weight, addresses).map_err(|e| line_err(e.to_string()))?;
            objectives.push(objective);
        }
        Ok(Self { objectives })
    }
}

/// Decimal or `0x`-prefixed hexadecimal address.
pub fn parse_address(token: &str) -> Option<u16> {
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Single direction presses, every button alone, and each direction with A or B.
pub fn generic_actions() -> ActionTable {
    let bits: [u8; 22] = [
        0, 1, 2, 4, 5, 6, 8, 9, 10, 16, 32, 64, 65, 66, 68, 72, 128, 129, 130, 132, 136, 192,
    ];
    ActionTable::from(bits.map(Buttons::from_bits))
}

/// Reward policy driven entirely by an [`ObjectiveSet`]. Never terminates.
#[derive(Debug, Clone)]
pub struct LexicographicReward {
    objectives: ObjectiveSet,
    primed: bool,
}

impl LexicographicReward {
    pub fn new(objectives: ObjectiveSet) -> Self {
        Self {
            objectives,
            primed: false,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        ObjectiveSet::from_file(path).map(Self::new)
    }

    pub fn objectives(&self) -> &ObjectiveSet {
        &self.objectives
    }
}

impl RewardPolicy for LexicographicReward {
    fn actions(&self) -> ActionTable {
        generic_actions()
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let previous = self.primed.then(|| memory.previous());
        self.primed = true;
        self.objectives.evaluate(memory.current(), previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ram_with(values: &[(u16, u8)]) -> Box<Ram> {
        let mut ram = Box::new([0u8; RAM_SIZE]);
        for &(addr, val) in values {
            ram[usize::from(addr)] = val;
        }
        ram
    }

    #[test]
    fn parses_weights_and_addresses() {
        let set: ObjectiveSet = "2.5 16 17\n\n-1 0x75 0x90 # position\n".parse().unwrap();
        let objectives: Vec<_> = set.iter().collect();
        assert_eq!(objectives.len(), 2);
        assert_eq!(objectives[0].weight(), 2.5);
        assert_eq!(objectives[0].addresses(), &[16, 17]);
        assert_eq!(objectives[1].weight(), -1.0);
        assert_eq!(objectives[1].addresses(), &[0x75, 0x90]);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!("abc 1".parse::<ObjectiveSet>(), Err(EnvError::Config(_))));
        assert!(matches!("1.0".parse::<ObjectiveSet>(), Err(EnvError::Config(_))));
        assert!(matches!("1.0 x".parse::<ObjectiveSet>(), Err(EnvError::Config(_))));
        assert!(matches!("1.0 4096".parse::<ObjectiveSet>(), Err(EnvError::Config(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ObjectiveSet::from_file("/nonexistent/dir/game.objectives").unwrap_err();
        assert!(matches!(err, EnvError::Objectives { .. }));
    }

    #[test]
    fn reads_objective_file() {
        let path = std::env::temp_dir().join(format!("nes-gym-{}.objectives", std::process::id()));
        std::fs::write(&path, "1 117 144\n0.5 1846\n").unwrap();
        let set = ObjectiveSet::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn weights_add_and_subtract() {
        let set: ObjectiveSet = "2 16\n5 17".parse().unwrap();
        let prev = ram_with(&[(16, 3), (17, 9)]);
        let cur = ram_with(&[(16, 4), (17, 8)]);
        assert_eq!(set.evaluate(&cur, Some(&prev)), -3.0);
        assert_eq!(set.evaluate(&cur, Some(&cur)), 0.0);
        assert_eq!(set.evaluate(&cur, None), 0.0);
    }

    #[test]
    fn first_address_dominates() {
        let set: ObjectiveSet = "1 0x75 0x90".parse().unwrap();
        // Page advanced while the in-page position wrapped around.
        let prev = ram_with(&[(0x75, 1), (0x90, 250)]);
        let cur = ram_with(&[(0x75, 2), (0x90, 3)]);
        assert_eq!(set.evaluate(&cur, Some(&prev)), 1.0);
        assert_eq!(set.evaluate(&prev, Some(&cur)), -1.0);
    }

    #[test]
    fn policy_is_silent_on_first_comparison() {
        let mut policy = LexicographicReward::new("1 16".parse().unwrap());
        let prev = ram_with(&[]);
        let cur = ram_with(&[(16, 1)]);
        let view = MemoryView::new(&cur, &prev);
        assert_eq!(policy.reward(&view), 0.0);
        assert_eq!(policy.reward(&view), 1.0);
        assert!(!policy.done(&view));
        assert_eq!(policy.actions().len(), 22);
    }
}
