use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};

// =============================================================================
// Controller Bitmask
// =============================================================================

/// Set of simultaneously pressed controller buttons, one bit per button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Self = Self(0x00);
    pub const RIGHT: Self = Self(0x01);
    pub const LEFT: Self = Self(0x02);
    pub const DOWN: Self = Self(0x04);
    pub const UP: Self = Self(0x08);
    pub const START: Self = Self(0x10);
    pub const SELECT: Self = Self(0x20);
    pub const B: Self = Self(0x40);
    pub const A: Self = Self(0x80);

    /// All single-button inputs in bit order, `NONE` first.
    pub const SINGLES: [Self; 9] = [
        Self::NONE,
        Self::RIGHT,
        Self::LEFT,
        Self::DOWN,
        Self::UP,
        Self::START,
        Self::SELECT,
        Self::B,
        Self::A,
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn to_joypad(self) -> tetanes_core::input::JoypadBtnState {
        use tetanes_core::input::JoypadBtnState;
        let mut state = JoypadBtnState::empty();
        for (button, flag) in [
            (Self::RIGHT, JoypadBtnState::RIGHT),
            (Self::LEFT, JoypadBtnState::LEFT),
            (Self::DOWN, JoypadBtnState::DOWN),
            (Self::UP, JoypadBtnState::UP),
            (Self::START, JoypadBtnState::START),
            (Self::SELECT, JoypadBtnState::SELECT),
            (Self::B, JoypadBtnState::B),
            (Self::A, JoypadBtnState::A),
        ] {
            state.set(flag, self.contains(button));
        }
        state
    }
}

impl BitOr for Buttons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<u8> for Buttons {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (Self::RIGHT, "right"),
            (Self::LEFT, "left"),
            (Self::DOWN, "down"),
            (Self::UP, "up"),
            (Self::START, "start"),
            (Self::SELECT, "select"),
            (Self::B, "b"),
            (Self::A, "a"),
        ];
        let mut first = true;
        for (button, name) in names {
            if self.contains(button) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Action Space
// =============================================================================

/// Discrete action space: index `i` presses `buttons[i]` for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTable {
    buttons: Vec<Buttons>,
}

impl ActionTable {
    pub fn new(buttons: Vec<Buttons>) -> Result<Self> {
        if buttons.is_empty() {
            return Err(EnvError::Config("action table must not be empty".into()));
        }
        Ok(Self { buttons })
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Buttons> {
        self.buttons
            .get(index)
            .copied()
            .ok_or(EnvError::ActionOutOfRange {
                index,
                len: self.buttons.len(),
            })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.buttons.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = Buttons> + '_ {
        self.buttons.iter().copied()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            buttons: Buttons::SINGLES.to_vec(),
        }
    }
}

impl<const N: usize> From<[Buttons; N]> for ActionTable {
    fn from(buttons: [Buttons; N]) -> Self {
        assert!(N > 0, "action table must not be empty");
        Self {
            buttons: buttons.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn combinations_are_bitwise_unions() {
        let jump_right = Buttons::RIGHT | Buttons::A;
        assert_eq!(jump_right.bits(), 0x81);
        assert!(jump_right.contains(Buttons::A));
        assert!(!jump_right.contains(Buttons::B));
        assert_eq!(jump_right.to_string(), "right+a");
        assert_eq!(Buttons::NONE.to_string(), "none");
    }

    #[test]
    fn default_table_lists_single_inputs() {
        let table = ActionTable::default();
        assert_eq!(table.len(), 9);
        assert_eq!(table.get(0).unwrap(), Buttons::NONE);
        assert_eq!(table.get(8).unwrap(), Buttons::A);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let table = ActionTable::from([Buttons::NONE, Buttons::RIGHT]);
        match table.get(2) {
            Err(EnvError::ActionOutOfRange { index: 2, len: 2 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_table_is_a_config_error() {
        assert!(matches!(ActionTable::new(Vec::new()), Err(EnvError::Config(_))));
    }

    #[test]
    fn samples_stay_in_range() {
        let table = ActionTable::from([Buttons::NONE, Buttons::RIGHT, Buttons::LEFT]);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(table.sample(&mut rng) < 3);
        }
    }
}
