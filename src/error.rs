use thiserror::Error;

/// Errors surfaced by puzzle parsing, encoder construction and decoding.
#[derive(Debug, Error)]
pub enum NurikabeError {
    #[error("malformed puzzle: {0}")]
    MalformedPuzzle(String),

    #[error("invalid anchor at ({x}, {y}): {reason}")]
    InvalidAnchor { x: usize, y: usize, reason: String },

    #[error("infeasible clues: sum of clues {sum_clues} exceeds grid area {area}")]
    InfeasibleClues { sum_clues: usize, area: usize },

    #[error("solver returned UNSAT - puzzle may be unsolvable, or the anchor is unusable")]
    Unsolvable,

    #[error("corrupt model: {0}")]
    CorruptModel(String),
}
