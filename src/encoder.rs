//! The CNF encoding engine: the transformation from a Nurikabe puzzle
//! instance into a propositional formula whose satisfying assignments
//! correspond to valid solutions, plus the reverse decoding of a model to a
//! wall grid.
//!
//! Ported from the variable-family / clause-family structure of
//! `original_source/main.py`'s `Encoder`, rewritten around a shared
//! [`VariablePool`] and the [`crate::cardinality`] compiler rather than an
//! `IDPool`/`CardEnc` pair.

use crate::cardinality;
use crate::error::NurikabeError;
use crate::pool::{VarKey, VariablePool};
use crate::puzzle::{Puzzle, WallGrid};

/// Owns the variable pool and the puzzle's derived quantities for one
/// encoding. Single-threaded, synchronous: no field here survives past one
/// `build` -> `encode` -> `decode` cycle.
pub struct Encoder<'a> {
    puzzle: &'a Puzzle,
    anchor: (usize, usize),
    pool: VariablePool,
    /// clue_cells[i] = (x, y, value) for island index i.
    clue_cells: Vec<(usize, usize, u8)>,
    /// C_max: the largest clue value, bounding island-distance variables.
    c_max: usize,
    /// W_size: exact wall count in any valid solution.
    w_size: usize,
}

impl<'a> Encoder<'a> {
    /// Validates inputs, initializes the pool, and materializes every w/f/d
    /// variable up front.
    pub fn build(puzzle: &'a Puzzle, anchor: (usize, usize)) -> Result<Self, NurikabeError> {
        let (ax, ay) = anchor;
        if !puzzle.in_bounds(ax, ay) {
            return Err(NurikabeError::InvalidAnchor {
                x: ax,
                y: ay,
                reason: format!("out of bounds for a {}x{} grid", puzzle.width, puzzle.height),
            });
        }

        let clue_cells = puzzle.clue_cells();
        let area = puzzle.area();
        let sum_clues: usize = clue_cells.iter().map(|&(_, _, v)| v as usize).sum();
        if sum_clues > area {
            return Err(NurikabeError::InfeasibleClues { sum_clues, area });
        }
        for &(_, _, v) in &clue_cells {
            if v == 0 {
                return Err(NurikabeError::MalformedPuzzle(
                    "clue values must be positive".to_string(),
                ));
            }
        }

        let c_max = clue_cells.iter().map(|&(_, _, v)| v as usize).max().unwrap_or(0);
        let w_size = area - sum_clues;

        // A clue at the anchor only matters when there is wall connectivity
        // to anchor in the first place (spec.md §9): with W_size=0 the
        // d-family never materializes, so a fully-clued grid (no non-clue
        // cell exists to serve as anchor) is not a conflict.
        if w_size > 0 && puzzle.is_clue(ax, ay) {
            return Err(NurikabeError::InvalidAnchor {
                x: ax,
                y: ay,
                reason: "anchor coincides with a clue cell".to_string(),
            });
        }

        let mut pool = VariablePool::new();
        for y in 0..puzzle.height {
            for x in 0..puzzle.width {
                pool.id(VarKey::Wall(x, y));
            }
        }
        for y in 0..puzzle.height {
            for x in 0..puzzle.width {
                for i in 0..clue_cells.len() {
                    for d in 0..c_max {
                        pool.id(VarKey::Island(x, y, i, d));
                    }
                }
            }
        }
        for y in 0..puzzle.height {
            for x in 0..puzzle.width {
                for k in 0..w_size {
                    pool.id(VarKey::WallDist(x, y, k));
                }
            }
        }

        Ok(Encoder {
            puzzle,
            anchor,
            pool,
            clue_cells,
            c_max,
            w_size,
        })
    }

    fn w(&mut self, x: usize, y: usize) -> isize {
        self.pool.id(VarKey::Wall(x, y))
    }

    fn f(&mut self, x: usize, y: usize, i: usize, d: usize) -> isize {
        self.pool.id(VarKey::Island(x, y, i, d))
    }

    fn d(&mut self, x: usize, y: usize, k: usize) -> isize {
        self.pool.id(VarKey::WallDist(x, y, k))
    }

    /// Emits every clause family (P1-P11). Invokes the cardinality compiler
    /// for the "exactly k" families; allocates any auxiliary variables it
    /// needs from the same pool used to build the w/f/d families.
    pub fn encode(&mut self) -> Vec<Vec<isize>> {
        let mut clauses = Vec::new();
        let (width, height) = (self.puzzle.width, self.puzzle.height);
        let island_count = self.clue_cells.len();

        // P1: cover - every cell is a wall or belongs to exactly one
        // (island, distance) pair.
        for y in 0..height {
            for x in 0..width {
                let mut literals = vec![self.w(x, y)];
                for i in 0..island_count {
                    for d in 0..self.c_max {
                        literals.push(self.f(x, y, i, d));
                    }
                }
                clauses.extend(cardinality::exactly(&literals, 1, &mut self.pool));
            }
        }

        // P2: clue anchoring - only clue cells carry distance 0, each in
        // its own island.
        for i in 0..island_count {
            let (cx, cy, _) = self.clue_cells[i];
            for y in 0..height {
                for x in 0..width {
                    let lit = self.f(x, y, i, 0);
                    if (x, y) == (cx, cy) {
                        clauses.push(vec![lit]);
                    } else {
                        clauses.push(vec![-lit]);
                    }
                }
            }
        }

        // P3: island reachability (inward edge) - every non-anchor island
        // cell has a same-island neighbor one step closer to the anchor.
        for y in 0..height {
            for x in 0..width {
                let neighbors = self.puzzle.neighbors(x, y);
                for i in 0..island_count {
                    for d in 1..self.c_max {
                        let mut clause = vec![-self.f(x, y, i, d)];
                        for &(nx, ny) in &neighbors {
                            clause.push(self.f(nx, ny, i, d - 1));
                        }
                        clauses.push(clause);
                    }
                }
            }
        }

        // P4: island local shape - outward consistency & no-touch.
        for y in 0..height {
            for x in 0..width {
                let neighbors = self.puzzle.neighbors(x, y);
                for i in 0..island_count {
                    for d in 0..self.c_max {
                        for &(nx, ny) in &neighbors {
                            let mut clause = vec![-self.f(x, y, i, d), self.w(nx, ny)];
                            if d > 0 {
                                clause.push(self.f(nx, ny, i, d - 1));
                            }
                            if d < self.c_max - 1 {
                                clause.push(self.f(nx, ny, i, d + 1));
                            }
                            clauses.push(clause);
                        }
                    }
                }
            }
        }

        // P5: island size - each island has exactly its clue's cell count.
        for i in 0..island_count {
            let (_, _, value) = self.clue_cells[i];
            let mut literals = Vec::with_capacity(width * height * self.c_max.max(1));
            for y in 0..height {
                for x in 0..width {
                    for d in 0..self.c_max {
                        literals.push(self.f(x, y, i, d));
                    }
                }
            }
            clauses.extend(cardinality::exactly(&literals, value as usize, &mut self.pool));
        }

        // P6: no 2x2 wall square.
        for y in 0..height.saturating_sub(1) {
            for x in 0..width.saturating_sub(1) {
                let a = self.w(x, y);
                let b = self.w(x + 1, y);
                let c = self.w(x, y + 1);
                let e = self.w(x + 1, y + 1);
                clauses.push(vec![-a, -b, -c, -e]);
            }
        }

        if self.w_size > 0 {
            // P7: wall anchor.
            let (ax, ay) = self.anchor;
            for y in 0..height {
                for x in 0..width {
                    let lit = self.d(x, y, 0);
                    if (x, y) == (ax, ay) {
                        clauses.push(vec![lit]);
                    } else {
                        clauses.push(vec![-lit]);
                    }
                }
            }
        }

        // P8: wall distance exclusivity - either not a wall, or exactly one
        // distance. Emitted unconditionally; degenerates to "not a wall"
        // when W_size is 0 (no d-variables exist).
        for y in 0..height {
            for x in 0..width {
                let mut literals = vec![-self.w(x, y)];
                for k in 0..self.w_size {
                    literals.push(self.d(x, y, k));
                }
                clauses.extend(cardinality::exactly(&literals, 1, &mut self.pool));
            }
        }

        if self.w_size > 0 {
            // P9: wall reachability (inward edge).
            for y in 0..height {
                for x in 0..width {
                    let neighbors = self.puzzle.neighbors(x, y);
                    for k in 1..self.w_size {
                        let mut clause = vec![-self.d(x, y, k)];
                        for &(nx, ny) in &neighbors {
                            clause.push(self.d(nx, ny, k - 1));
                        }
                        clauses.push(clause);
                    }
                }
            }

            // P10: wall local consistency. Outer loop intentionally starts
            // at k=1, not 0 (see design note in SPEC_FULL.md / spec.md §9):
            // d=0 is already fully pinned by P7, so a k=0 case here would
            // only add spurious disjunctions that weaken propagation.
            for y in 0..height {
                for x in 0..width {
                    let neighbors = self.puzzle.neighbors(x, y);
                    for k in 1..self.w_size {
                        for &(nx, ny) in &neighbors {
                            let mut clause = vec![-self.d(x, y, k), -self.w(nx, ny)];
                            clause.push(self.d(nx, ny, k - 1));
                            if k < self.w_size - 1 {
                                clause.push(self.d(nx, ny, k + 1));
                            }
                            clauses.push(clause);
                        }
                    }
                }
            }

            // P11: walls are reachable. Redundant given P8, kept for solver
            // propagation (spec.md §8, invariant 7).
            for y in 0..height {
                for x in 0..width {
                    let mut clause = vec![-self.w(x, y)];
                    for k in 0..self.w_size {
                        clause.push(self.d(x, y, k));
                    }
                    clauses.push(clause);
                }
            }
        }

        clauses
    }

    /// Reads w(x,y) from a satisfying assignment and returns the decoded
    /// wall grid. `assignment[v-1]` is expected to be positive for a true
    /// variable `v`, negative for false, per spec.md §6's solver interface.
    /// Performs no validation beyond the wall-at-clue corruption check.
    pub fn decode(&self, assignment: &[i32]) -> Result<WallGrid, NurikabeError> {
        let mut grid = WallGrid::new(self.puzzle.width, self.puzzle.height);
        for y in 0..self.puzzle.height {
            for x in 0..self.puzzle.width {
                let var = self.pool.get(VarKey::Wall(x, y)).ok_or_else(|| {
                    NurikabeError::CorruptModel(format!("missing wall variable for ({x}, {y})"))
                })?;
                let idx = (var - 1) as usize;
                let value = *assignment.get(idx).ok_or_else(|| {
                    NurikabeError::CorruptModel(format!(
                        "assignment too short: missing entry for variable {var}"
                    ))
                })?;
                let is_wall = value > 0;
                if is_wall && self.puzzle.is_clue(x, y) {
                    return Err(NurikabeError::CorruptModel(format!(
                        "wall at clue cell ({x}, {y})"
                    )));
                }
                grid.set(x, y, is_wall);
            }
        }
        Ok(grid)
    }

    pub fn w_size(&self) -> usize {
        self.w_size
    }

    pub fn c_max(&self) -> usize {
        self.c_max
    }

    pub fn island_count(&self) -> usize {
        self.clue_cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varisat::{ExtendFormula, Lit, Solver};

    fn solve(clauses: &[Vec<isize>]) -> Option<Vec<i32>> {
        let mut solver = Solver::new();
        for clause in clauses {
            solver.add_clause(
                &clause
                    .iter()
                    .map(|&lit| Lit::from_dimacs(lit))
                    .collect::<Vec<_>>(),
            );
        }
        if solver.solve().unwrap_or(false) {
            let model = solver.model().unwrap();
            let max_var = model.iter().map(|l| l.var().to_dimacs()).max().unwrap_or(0);
            let mut assignment = vec![0i32; max_var as usize];
            for lit in model {
                let idx = (lit.var().to_dimacs() - 1) as usize;
                assignment[idx] = if lit.is_positive() { idx as i32 + 1 } else { -(idx as i32 + 1) };
            }
            Some(assignment)
        } else {
            None
        }
    }

    #[test]
    fn scenario_5x2_two_clues_of_four() {
        let puzzle = Puzzle::from_text("4...4\n.....").unwrap();
        let mut encoder = Encoder::build(&puzzle, (4, 1)).unwrap();
        let clauses = encoder.encode();
        let assignment = solve(&clauses).expect("expected SAT");
        let grid = encoder.decode(&assignment).unwrap();
        assert_eq!(grid.wall_count(), 2);
        for y in 0..grid.height.saturating_sub(1) {
            for x in 0..grid.width.saturating_sub(1) {
                let all_wall =
                    grid.get(x, y) && grid.get(x + 1, y) && grid.get(x, y + 1) && grid.get(x + 1, y + 1);
                assert!(!all_wall);
            }
        }
    }

    #[test]
    fn scenario_2x2_single_clue_one_is_unsat() {
        // Any non-wall cell other than the clue leaves a 2x2 wall block.
        let puzzle = Puzzle::from_text("1.\n..").unwrap();
        let mut encoder = Encoder::build(&puzzle, (1, 0)).unwrap();
        let clauses = encoder.encode();
        assert!(solve(&clauses).is_none());
    }

    #[test]
    fn scenario_3x3_single_clue_nine_has_no_walls() {
        let puzzle = Puzzle::from_text("...\n.9.\n...").unwrap();
        let mut encoder = Encoder::build(&puzzle, (0, 0)).unwrap();
        let clauses = encoder.encode();
        let assignment = solve(&clauses).expect("expected SAT");
        let grid = encoder.decode(&assignment).unwrap();
        assert_eq!(grid.wall_count(), 0);
    }

    #[test]
    fn scenario_3x1_two_clues_of_one() {
        let puzzle = Puzzle::from_text("1.1").unwrap();
        let mut encoder = Encoder::build(&puzzle, (1, 0)).unwrap();
        let clauses = encoder.encode();
        let assignment = solve(&clauses).expect("expected SAT");
        let grid = encoder.decode(&assignment).unwrap();
        assert_eq!(grid.wall_count(), 1);
        assert!(grid.get(1, 0));
    }

    #[test]
    fn one_by_one_single_clue_is_trivially_sat() {
        // W_size = 0 here: no non-clue cell exists to serve as a wall
        // anchor, and none is needed since there are no walls.
        let puzzle = Puzzle::from_text("1").unwrap();
        let mut encoder = Encoder::build(&puzzle, (0, 0)).unwrap();
        assert_eq!(encoder.w_size(), 0);
        let clauses = encoder.encode();
        let assignment = solve(&clauses).expect("expected SAT");
        let grid = encoder.decode(&assignment).unwrap();
        assert_eq!(grid.wall_count(), 0);
    }

    #[test]
    fn rejects_anchor_out_of_bounds() {
        let puzzle = Puzzle::from_text("1.\n..").unwrap();
        assert!(Encoder::build(&puzzle, (5, 5)).is_err());
    }

    #[test]
    fn rejects_anchor_on_clue() {
        let puzzle = Puzzle::from_text("1.\n..").unwrap();
        assert!(Encoder::build(&puzzle, (0, 0)).is_err());
    }

    #[test]
    fn rejects_infeasible_clues() {
        let puzzle = Puzzle::from_text("9.\n..").unwrap();
        assert!(Encoder::build(&puzzle, (1, 0)).is_err());
    }

    #[test]
    fn p11_clauses_are_entailed_by_the_rest_of_the_formula() {
        // spec.md §8, invariant 7: removing P11 must not change
        // satisfiability (P8 already forces a wall to have a distance).
        // Verify the entailment directly: every P11 clause (w(x,y) implies
        // some d(x,y,k)) is satisfied by a model of the formula *without*
        // P11, which is exactly what P8's "exactly one of {not-w} u {d_k}"
        // already guarantees.
        let puzzle = Puzzle::from_text("4...4\n.....").unwrap();
        let mut encoder = Encoder::build(&puzzle, (4, 1)).unwrap();
        let all_clauses = encoder.encode();
        let p11_len = puzzle.width * puzzle.height;
        let without_p11 = &all_clauses[..all_clauses.len() - p11_len];
        let assignment = solve(without_p11).expect("expected SAT without P11");

        for y in 0..puzzle.height {
            for x in 0..puzzle.width {
                let w_var = encoder.pool.get(VarKey::Wall(x, y)).unwrap();
                let w_true = assignment[(w_var - 1) as usize] > 0;
                if w_true {
                    let has_distance = (0..encoder.w_size())
                        .any(|k| assignment[(encoder.pool.get(VarKey::WallDist(x, y, k)).unwrap() - 1) as usize] > 0);
                    assert!(has_distance, "wall at ({x}, {y}) has no distance assigned");
                }
            }
        }
    }

    #[test]
    fn eight_by_ten_scenario_has_expected_wall_count() {
        // The concrete scenario from spec.md §8.2 uses an 8x10 grid; build
        // it directly from coordinates instead of ASCII art so row widths
        // stay exact.
        let mut rows = vec![vec!['.'; 8]; 10];
        rows[0][3] = '5';
        rows[1][6] = '1';
        rows[3][0] = '4';
        rows[4][1] = '2';
        rows[4][3] = '2';
        rows[4][7] = '2';
        rows[7][0] = '4';
        rows[7][2] = '4';
        rows[8][4] = '9';
        rows[9][7] = '2';
        let grid_text: String = rows
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        let puzzle = Puzzle::from_text(&grid_text).unwrap();
        // 5+1+4+2+2+2+4+4+9+2 = 35, so W_size = 80 - 35 = 45.
        assert_eq!(puzzle.sum_clues(), 35);
        let mut encoder = Encoder::build(&puzzle, (2, 0)).unwrap();
        let clauses = encoder.encode();
        let assignment = solve(&clauses).expect("expected SAT");
        let decoded = encoder.decode(&assignment).unwrap();
        assert_eq!(decoded.wall_count(), 80 - puzzle.sum_clues());
    }

    #[test]
    fn anchor_on_a_clue_is_rejected_even_for_the_larger_grid() {
        let mut rows = vec![vec!['.'; 8]; 10];
        rows[0][3] = '5';
        rows[1][6] = '1';
        rows[3][0] = '4';
        rows[4][1] = '2';
        rows[4][3] = '2';
        rows[4][7] = '2';
        rows[7][0] = '4';
        rows[7][2] = '4';
        rows[8][4] = '9';
        rows[9][7] = '2';
        let grid_text: String = rows
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        let puzzle = Puzzle::from_text(&grid_text).unwrap();
        assert!(Encoder::build(&puzzle, (3, 0)).is_err());
    }
}
