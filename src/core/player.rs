//! Seats and per-seat storage.
//!
//! The game is strictly two-player: seats are `PlayerId(0)` and
//! `PlayerId(1)`, and `PlayerMap` is a fixed two-slot array indexed by seat.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of seats at the table.
pub const PLAYER_COUNT: usize = 2;

/// Seat identifier (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The other seat.
    ///
    /// ```
    /// use opcg_rules::core::PlayerId;
    ///
    /// assert_eq!(PlayerId::new(0).opponent(), PlayerId::new(1));
    /// assert_eq!(PlayerId::new(1).opponent(), PlayerId::new(0));
    /// ```
    #[must_use]
    pub const fn opponent(self) -> Self {
        Self(1 - self.0)
    }

    /// Both seats in seat order.
    pub fn all() -> impl Iterator<Item = PlayerId> {
        [PlayerId(0), PlayerId(1)].into_iter()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// One value per seat.
///
/// ```
/// use opcg_rules::core::{PlayerId, PlayerMap};
///
/// let mut life: PlayerMap<u32> = PlayerMap::with_value(5);
/// life[PlayerId::new(1)] -= 1;
///
/// assert_eq!(life[PlayerId::new(0)], 5);
/// assert_eq!(life[PlayerId::new(1)], 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    seats: [T; PLAYER_COUNT],
}

impl<T> PlayerMap<T> {
    /// Build each seat's value from its id.
    pub fn new(mut factory: impl FnMut(PlayerId) -> T) -> Self {
        Self {
            seats: [factory(PlayerId(0)), factory(PlayerId(1))],
        }
    }

    /// Seat 0 gets `first`, seat 1 gets `second`.
    pub fn from_pair(first: T, second: T) -> Self {
        Self {
            seats: [first, second],
        }
    }

    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::from_pair(value.clone(), value)
    }

    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::from_pair(T::default(), T::default())
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.seats[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.seats[player.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        PlayerId::all().zip(self.seats.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        PlayerId::all().zip(self.seats.iter_mut())
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seats() {
        let seats: Vec<_> = PlayerId::all().collect();
        assert_eq!(seats, vec![PlayerId::new(0), PlayerId::new(1)]);
        assert_eq!(PlayerId::new(1).index(), 1);
        assert_eq!(PlayerId::new(0).opponent().opponent(), PlayerId::new(0));
        assert_eq!(PlayerId::new(1).to_string(), "P1");
    }

    #[test]
    fn test_map_from_factory_and_pair() {
        let map = PlayerMap::new(|p| p.index() * 10);
        assert_eq!(map[PlayerId::new(1)], 10);

        let map = PlayerMap::from_pair("first", "second");
        assert_eq!(map[PlayerId::new(0)], "first");
        assert_eq!(map[PlayerId::new(1)], "second");
    }

    #[test]
    fn test_map_mutation_and_iteration() {
        let mut map: PlayerMap<Vec<i32>> = PlayerMap::with_default();
        map[PlayerId::new(0)].push(1);
        map.get_mut(PlayerId::new(1)).push(2);
        for (_, values) in map.iter_mut() {
            values.push(0);
        }

        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs[0], (PlayerId::new(0), &vec![1, 0]));
        assert_eq!(pairs[1], (PlayerId::new(1), &vec![2, 0]));
    }

    #[test]
    fn test_map_serialization() {
        let map = PlayerMap::from_pair(3, 4);
        let json = serde_json::to_string(&map).unwrap();
        let back: PlayerMap<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
