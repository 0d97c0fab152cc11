//! The player roster: scores, per-round revolt flags, ranking.

use crate::types::Nick;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub nick: Nick,
    pub score: u32,
    pub is_revolting: bool,
}

/// A ranking entry, positions starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPlayer {
    pub position: usize,
    pub nick: Nick,
    pub score: u32,
}

/// Owns the set of active players. Kept in join order; lookups are linear,
/// which is fine for a channel-sized roster. Operations on unknown nicks
/// are silent no-ops since chat events can race with departures.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn nicks(&self) -> Vec<Nick> {
        self.players.iter().map(|p| p.nick.clone()).collect()
    }

    pub fn is_player(&self, nick: &str) -> bool {
        self.players.iter().any(|p| p.nick == nick)
    }

    pub fn is_revolting(&self, nick: &str) -> bool {
        self.players
            .iter()
            .any(|p| p.nick == nick && p.is_revolting)
    }

    /// Insert with score 0 and no revolt flag. No-op if already present.
    pub fn add_player(&mut self, nick: &str) {
        if !self.is_player(nick) {
            self.players.push(Player {
                nick: nick.to_string(),
                score: 0,
                is_revolting: false,
            });
        }
    }

    pub fn remove_player(&mut self, nick: &str) {
        self.players.retain(|p| p.nick != nick);
    }

    pub fn remove_all(&mut self) {
        self.players.clear();
    }

    /// Rename a player, preserving score and revolt flag. The renamed
    /// player moves to the end of join order, so among equal scores they
    /// rank as the most recent joiner. No-op if `old_nick` is absent.
    pub fn update_player(&mut self, old_nick: &str, new_nick: &str) {
        if let Some(pos) = self.players.iter().position(|p| p.nick == old_nick) {
            let mut player = self.players.remove(pos);
            player.nick = new_nick.to_string();
            self.players.push(player);
        }
    }

    /// No-op if not a player.
    pub fn increase_score(&mut self, nick: &str, amount: u32) {
        if let Some(player) = self.players.iter_mut().find(|p| p.nick == nick) {
            player.score += amount;
        }
    }

    /// No-op if not a player.
    pub fn set_revoltee(&mut self, nick: &str) {
        if let Some(player) = self.players.iter_mut().find(|p| p.nick == nick) {
            player.is_revolting = true;
        }
    }

    pub fn reset_revoltees(&mut self) {
        for player in &mut self.players {
            player.is_revolting = false;
        }
    }

    pub fn revoltees(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| p.is_revolting).collect()
    }

    /// Players ordered by score descending. Ties break towards the most
    /// recently joined: a stable ascending sort followed by a full
    /// reversal, preserved exactly from the original game's behavior.
    pub fn ranking(&self) -> Vec<RankedPlayer> {
        let mut by_score: Vec<&Player> = self.players.iter().collect();
        by_score.sort_by_key(|p| p.score);
        by_score.reverse();

        by_score
            .into_iter()
            .enumerate()
            .map(|(index, player)| RankedPlayer {
                position: index + 1,
                nick: player.nick.clone(),
                score: player.score,
            })
            .collect()
    }

    /// Top of the ranking, if anyone is playing.
    pub fn winner(&self) -> Option<RankedPlayer> {
        self.ranking().into_iter().next()
    }
}
