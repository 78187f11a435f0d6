use core::fmt;
use serde::{Deserialize, Serialize};

/// Smallest and largest supported table sizes.
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(usize);

impl PlayerId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Seat that receives this player's hand when hands rotate.
    pub const fn next(self, player_count: usize) -> PlayerId {
        PlayerId((self.0 + 1) % player_count)
    }

    /// All seats of a table in index order.
    pub fn seats(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count).map(PlayerId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerId;

    #[test]
    fn next_wraps_around() {
        assert_eq!(PlayerId::new(3).next(4), PlayerId::new(0));
        assert_eq!(PlayerId::new(0).next(2), PlayerId::new(1));
    }

    #[test]
    fn seats_are_in_index_order() {
        let seats: Vec<_> = PlayerId::seats(3).map(PlayerId::index).collect();
        assert_eq!(seats, vec![0, 1, 2]);
    }

    #[test]
    fn display_is_short_label() {
        assert_eq!(PlayerId::new(2).to_string(), "P2");
    }
}
