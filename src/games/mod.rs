//! Reward and termination policies for individual games.
//!
//! Every game is a flat [`RewardPolicy`](crate::policy::RewardPolicy)
//! implementation with its own typed RAM map. Nothing here maps names to
//! types; pick the struct directly.

use crate::console::Console;
use crate::input::Buttons;

pub mod baseball;
pub mod drmario;
pub mod excitebike;
pub mod golf;
pub mod kungfu;
pub mod mariobros;
pub mod punchout;
pub mod smb1;
pub mod smb2;
pub mod smb3;
pub mod tetris;
pub mod tmnt;

pub use baseball::Baseball;
pub use drmario::DrMario;
pub use excitebike::Excitebike;
pub use golf::Golf;
pub use kungfu::KungFu;
pub use mariobros::MarioBros;
pub use punchout::PunchOut;
pub use smb1::SuperMarioBros;
pub use smb2::SuperMarioBros2;
pub use smb3::SuperMarioBros3;
pub use tetris::Tetris;
pub use tmnt::Tmnt;

/// Two idle frames then two frames of Start.
pub(crate) const MASH_START: [Buttons; 4] =
    [Buttons::NONE, Buttons::NONE, Buttons::START, Buttons::START];

/// One idle frame then one frame of Start.
pub(crate) const TAP_START: [Buttons; 2] = [Buttons::NONE, Buttons::START];

pub(crate) fn never(_: &Console) -> bool {
    false
}
