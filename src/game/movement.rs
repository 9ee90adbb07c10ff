//! Token movement around the board.

// Positions are always reduced modulo the board size before narrowing.
#![allow(clippy::cast_possible_truncation)]

use crate::board::BOARD_SIZE;

/// Result of moving a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    /// New board position.
    pub position: u8,
    /// Whether the move wrapped past GO.
    pub passed_go: bool,
}

/// Move forward `spaces` tiles, wrapping at the end of the board.
#[must_use]
pub const fn move_forward(from: u8, spaces: u8) -> Movement {
    let raw = from as u16 + spaces as u16;
    let position = (raw % BOARD_SIZE as u16) as u8;
    Movement {
        position,
        passed_go: spaces > 0 && position < from,
    }
}

/// Move backward `spaces` tiles. Never collects salary.
#[must_use]
pub const fn move_back(from: u8, spaces: u8) -> Movement {
    let board = BOARD_SIZE as u16;
    let back = spaces as u16 % board;
    let position = ((from as u16 + board - back) % board) as u8;
    Movement {
        position,
        passed_go: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_past_go() {
        let m = move_forward(38, 5);
        assert_eq!(m.position, 3);
        assert!(m.passed_go);
    }

    #[test]
    fn test_plain_move() {
        let m = move_forward(5, 3);
        assert_eq!(m.position, 8);
        assert!(!m.passed_go);
    }

    #[test]
    fn test_landing_exactly_on_go_counts_as_passing() {
        let m = move_forward(35, 5);
        assert_eq!(m.position, 0);
        assert!(m.passed_go);
    }

    #[test]
    fn test_move_back_wraps() {
        assert_eq!(move_back(2, 3).position, 39);
        assert_eq!(move_back(7, 3).position, 4);
        assert!(!move_back(2, 3).passed_go);
    }
}
