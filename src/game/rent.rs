//! Rent calculation.

use crate::board::{
    Money, RAILROAD_INDICES, TileKind, UTILITY_FALLBACK_DICE_TOTAL, UTILITY_INDICES,
    UTILITY_PAIR_MULTIPLIER, UTILITY_SINGLE_MULTIPLIER, tile,
};
use crate::game::{DiceRoll, GameState, has_monopoly};

/// Rent owed for landing on `index`.
///
/// Returns 0 for unowned, mortgaged and non-purchasable tiles.
/// - Property: base rent, doubled for a monopoly with no houses; otherwise
///   the tier for the house count.
/// - Exchange: indexed by how many exchanges the owner holds.
/// - Utility: dice total times 4 (one owned) or 10 (both owned). Without a
///   live roll a nominal total of 7 is used.
#[must_use]
pub fn calculate_rent(state: &GameState, index: u8, dice: Option<DiceRoll>) -> Money {
    let Some(t) = tile(index) else {
        return 0;
    };
    let Some(prop) = state.properties.get(&index) else {
        return 0;
    };
    let Some(owner) = prop.owner_id.as_deref() else {
        return 0;
    };
    if prop.is_mortgaged {
        return 0;
    }

    match &t.kind {
        TileKind::Property(p) => {
            if prop.houses == 0 {
                if has_monopoly(state, owner, p.group) {
                    p.rent[0] * 2
                } else {
                    p.rent[0]
                }
            } else {
                p.rent
                    .get(usize::from(prop.houses))
                    .copied()
                    .unwrap_or(p.rent[5])
            }
        }
        TileKind::Railroad(r) => {
            let owned = count_owned(state, owner, &RAILROAD_INDICES);
            owned
                .checked_sub(1)
                .and_then(|i| r.rent.get(i))
                .copied()
                .unwrap_or(0)
        }
        TileKind::Utility(_) => {
            let total = dice.map_or(UTILITY_FALLBACK_DICE_TOTAL, |d| Money::from(d.total()));
            match count_owned(state, owner, &UTILITY_INDICES) {
                1 => total * UTILITY_SINGLE_MULTIPLIER,
                2 => total * UTILITY_PAIR_MULTIPLIER,
                _ => 0,
            }
        }
        _ => 0,
    }
}

fn count_owned(state: &GameState, owner: &str, indices: &[u8]) -> usize {
    indices
        .iter()
        .filter(|&&i| state.owner_of(i).is_some_and(|o| o == owner))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Player, Token};

    fn state_with_owner(tiles: &[u8]) -> GameState {
        let mut state = GameState::new("R", "a", 1, 0);
        state.players.insert(Player::new("a", "A", Token::Bitcoin));
        state.players.insert(Player::new("b", "B", Token::Ethereum));
        for &t in tiles {
            state.properties.get_mut(&t).unwrap().owner_id = Some("a".into());
            state.players.get_mut("a").unwrap().properties.insert(t);
        }
        state
    }

    #[test]
    fn test_base_rent() {
        let state = state_with_owner(&[6, 8]);
        assert_eq!(calculate_rent(&state, 6, None), 6);
    }

    #[test]
    fn test_monopoly_doubles_base_rent() {
        let state = state_with_owner(&[6, 8, 9]);
        assert_eq!(calculate_rent(&state, 6, None), 12);
        assert_eq!(calculate_rent(&state, 9, None), 16);
    }

    #[test]
    fn test_partial_group_not_doubled() {
        let state = state_with_owner(&[21, 23]);
        assert_eq!(calculate_rent(&state, 21, None), 18);
    }

    #[test]
    fn test_house_tiers_not_doubled() {
        let mut state = state_with_owner(&[1, 3]);
        state.properties.get_mut(&1).unwrap().houses = 2;
        assert_eq!(calculate_rent(&state, 1, None), 30);
        state.properties.get_mut(&1).unwrap().houses = 5;
        assert_eq!(calculate_rent(&state, 1, None), 250);
    }

    #[test]
    fn test_railroad_rent_by_count() {
        let state = state_with_owner(&[5]);
        assert_eq!(calculate_rent(&state, 5, None), 25);
        let state = state_with_owner(&[5, 15, 25]);
        assert_eq!(calculate_rent(&state, 25, None), 100);
        let state = state_with_owner(&RAILROAD_INDICES);
        assert_eq!(calculate_rent(&state, 35, None), 200);
    }

    #[test]
    fn test_utility_rent() {
        let state = state_with_owner(&[12]);
        assert_eq!(calculate_rent(&state, 12, Some(DiceRoll(3, 4))), 28);
        assert_eq!(calculate_rent(&state, 12, None), 28);
        let state = state_with_owner(&[12, 28]);
        assert_eq!(calculate_rent(&state, 28, Some(DiceRoll(6, 5))), 110);
    }

    #[test]
    fn test_mortgaged_and_unowned_pay_nothing() {
        let mut state = state_with_owner(&[39]);
        assert_eq!(calculate_rent(&state, 37, None), 0);
        state.properties.get_mut(&39).unwrap().is_mortgaged = true;
        assert_eq!(calculate_rent(&state, 39, None), 0);
        assert_eq!(calculate_rent(&state, 4, None), 0);
    }
}
