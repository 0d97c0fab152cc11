mod challenge;
mod player;
mod pool;

pub use challenge::{Challenge, ChallengeError};
pub use player::{Player, RankedPlayer, Roster};
pub use pool::QuestionPool;
