use std::str::FromStr;

use crate::error::{EnvError, Result};

/// Size of the console's internal work RAM.
pub const RAM_SIZE: usize = 2048;

pub type Ram = [u8; RAM_SIZE];

/// Largest number of bytes [`MemoryView::read_multi_byte`] combines into a `u64`.
pub const MAX_MULTI_BYTE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// First listed address is the most significant byte.
    Big,
    /// First listed address is the least significant byte.
    Little,
}

impl FromStr for Endian {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "big" => Ok(Self::Big),
            "little" => Ok(Self::Little),
            other => Err(EnvError::InvalidArgument(format!(
                "multi-byte read with endian '{other}', expected 'big' or 'little'"
            ))),
        }
    }
}

/// Which of the two committed snapshots a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Which {
    #[default]
    Current,
    Previous,
}

// =============================================================================
// Double Buffer
// =============================================================================

/// Current/previous RAM snapshots plus a staging buffer for the next frame.
///
/// Rotation is a pair of swaps, so the committed pair is always replaced as a
/// whole and no buffer is ever shared between the two roles.
pub struct Snapshots {
    current: Box<Ram>,
    previous: Box<Ram>,
    staged: Box<Ram>,
}

impl Default for Snapshots {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshots {
    pub fn new() -> Self {
        Self {
            current: Box::new([0; RAM_SIZE]),
            previous: Box::new([0; RAM_SIZE]),
            staged: Box::new([0; RAM_SIZE]),
        }
    }

    /// Sets both committed snapshots to `ram`.
    pub fn fill(&mut self, ram: &Ram) {
        *self.current = *ram;
        *self.previous = *ram;
    }

    /// Buffer that receives the next frame's memory before it is committed.
    pub fn stage(&mut self) -> &mut Ram {
        &mut self.staged
    }

    /// The staged memory compared against the committed current snapshot.
    pub fn pending(&self) -> MemoryView<'_> {
        MemoryView {
            current: &self.staged,
            previous: &self.current,
        }
    }

    /// `previous := current`, `current := staged`.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        std::mem::swap(&mut self.current, &mut self.staged);
    }

    pub fn view(&self) -> MemoryView<'_> {
        MemoryView {
            current: &self.current,
            previous: &self.previous,
        }
    }

    pub fn current(&self) -> &Ram {
        &self.current
    }

    pub fn previous(&self) -> &Ram {
        &self.previous
    }
}

// =============================================================================
// Reads
// =============================================================================

/// Read-only pair of snapshots handed to reward and termination policies.
#[derive(Clone, Copy)]
pub struct MemoryView<'a> {
    current: &'a Ram,
    previous: &'a Ram,
}

impl<'a> MemoryView<'a> {
    pub fn new(current: &'a Ram, previous: &'a Ram) -> Self {
        Self { current, previous }
    }

    pub fn current(&self) -> &'a Ram {
        self.current
    }

    pub fn previous(&self) -> &'a Ram {
        self.previous
    }

    pub fn ram(&self, which: Which) -> &'a Ram {
        match which {
            Which::Current => self.current,
            Which::Previous => self.previous,
        }
    }

    /// Byte at `addr` in the current snapshot.
    pub fn get(&self, addr: u16) -> u8 {
        self.current[usize::from(addr)]
    }

    /// Byte at `addr` in the previous snapshot.
    pub fn prev(&self, addr: u16) -> u8 {
        self.previous[usize::from(addr)]
    }

    /// `current[addr] - previous[addr]`, signed.
    pub fn delta(&self, addr: u16) -> i16 {
        i16::from(self.get(addr)) - i16::from(self.prev(addr))
    }

    pub fn changed(&self, addr: u16) -> bool {
        self.get(addr) != self.prev(addr)
    }

    /// Combines several single-byte reads into one integer, `256^rank` per byte.
    pub fn read_multi_byte(&self, addrs: &[u16], endian: Endian, which: Which) -> Result<u64> {
        if addrs.len() > MAX_MULTI_BYTE {
            return Err(EnvError::InvalidArgument(format!(
                "multi-byte read of {} addresses exceeds {MAX_MULTI_BYTE}",
                addrs.len()
            )));
        }
        let ram = self.ram(which);
        let byte = |addr: &u16| u64::from(ram[usize::from(*addr)]);
        let value = match endian {
            Endian::Big => addrs.iter().fold(0u64, |acc, addr| (acc << 8) | byte(addr)),
            Endian::Little => addrs
                .iter()
                .rev()
                .fold(0u64, |acc, addr| (acc << 8) | byte(addr)),
        };
        Ok(value)
    }

    /// Decimal number stored one digit per byte (low nibble), most significant first.
    pub fn read_digits(&self, addrs: &[u16], which: Which) -> u64 {
        let ram = self.ram(which);
        addrs.iter().fold(0u64, |acc, &addr| {
            acc * 10 + u64::from(ram[usize::from(addr)] & 0x0F)
        })
    }

    /// Packed BCD, two digits per byte, most significant byte first.
    pub fn read_bcd(&self, addrs: &[u16], which: Which) -> u64 {
        let ram = self.ram(which);
        addrs.iter().fold(0u64, |acc, &addr| {
            let b = ram[usize::from(addr)];
            acc * 100 + u64::from(b >> 4) * 10 + u64::from(b & 0x0F)
        })
    }
}
