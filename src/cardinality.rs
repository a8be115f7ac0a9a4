//! A generic "exactly k" cardinality-constraint compiler.
//!
//! Implements the Sequential Counter encoding (Carsten Sinz, "Towards an
//! Optimal CNF Encoding of Boolean Cardinality Constraints", 2005), the same
//! encoding this codebase already uses for Minesweeper's per-cell mine
//! counts, generalized to allocate its auxiliary variables through a shared
//! [`VariablePool`] rather than a local counter.

use crate::pool::VariablePool;

/// Returns clauses equisatisfiable with "exactly `k` of `literals` are true".
///
/// A literal is a signed nonzero integer; positive `v` means variable `v`,
/// negative means its negation. Auxiliary variables needed by the encoding
/// are allocated via `pool`, so ids never collide with the caller's own
/// variables.
pub fn exactly(literals: &[isize], k: usize, pool: &mut VariablePool) -> Vec<Vec<isize>> {
    let n = literals.len();
    let mut clauses = Vec::new();

    if k > n {
        // Unsatisfiable, e.g. "exactly 5 of these 3 literals are true".
        clauses.push(vec![]);
        return clauses;
    }
    if n == 0 {
        if k > 0 {
            clauses.push(vec![]);
        }
        return clauses;
    }
    if k == 0 {
        for &lit in literals {
            clauses.push(vec![-lit]);
        }
        return clauses;
    }

    // s[i][j] means "at least j+1 of the first i+1 literals are true".
    let width = k + 1;
    let mut s = vec![0isize; n * width];
    for slot in s.iter_mut() {
        *slot = pool.fresh();
    }

    // Base case for the first literal (i=0).
    clauses.push(vec![-literals[0], s[0 * width]]);
    clauses.push(vec![literals[0], -s[0 * width]]);
    for j in 1..width {
        clauses.push(vec![-s[j]]);
    }

    // Inductive step for i from 1 to n-1.
    for i in 1..n {
        clauses.push(vec![-s[(i - 1) * width], s[i * width]]);
        clauses.push(vec![-literals[i], s[i * width]]);
        clauses.push(vec![s[(i - 1) * width], literals[i], -s[i * width]]);

        for j in 1..width {
            clauses.push(vec![-s[(i - 1) * width + j], s[i * width + j]]);
            clauses.push(vec![
                -literals[i],
                -s[(i - 1) * width + (j - 1)],
                s[i * width + j],
            ]);
            clauses.push(vec![s[(i - 1) * width + j], literals[i], -s[i * width + j]]);
            clauses.push(vec![
                s[(i - 1) * width + j],
                s[(i - 1) * width + (j - 1)],
                -s[i * width + j],
            ]);
        }
    }

    // At least k: the running sum must reach k by the last literal.
    clauses.push(vec![s[(n - 1) * width + (k - 1)]]);

    // At most k: the running sum must not reach k+1.
    if k < n {
        clauses.push(vec![-s[(n - 1) * width + k]]);
    }

    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::VarKey;
    use varisat::{ExtendFormula, Lit, Solver};

    /// Registers `n` placeholder cells through `pool` and returns their ids,
    /// so a test's literals occupy the low end of the id space exactly like
    /// a real call site's w/f/d variables do - leaving `pool.fresh()` free to
    /// allocate auxiliary ids above them without colliding.
    fn placeholder_literals(pool: &mut VariablePool, n: usize) -> Vec<isize> {
        (0..n).map(|i| pool.id(VarKey::Wall(i, 0))).collect()
    }

    fn count_solutions(clauses: &[Vec<isize>]) -> usize {
        let mut solver = Solver::new();
        for clause in clauses {
            solver.add_clause(
                &clause
                    .iter()
                    .map(|&lit| Lit::from_dimacs(lit))
                    .collect::<Vec<_>>(),
            );
        }
        let mut count = 0;
        loop {
            if !solver.solve().unwrap_or(false) {
                break;
            }
            let model = solver.model().expect("model");
            count += 1;
            let blocking: Vec<Lit> = model.iter().map(|&lit| !lit).collect();
            solver.add_clause(&blocking);
            if count > 1000 {
                break;
            }
        }
        count
    }

    #[test]
    fn exactly_one_of_three() {
        let mut pool = VariablePool::new();
        let lits = placeholder_literals(&mut pool, 3);
        let clauses = exactly(&lits, 1, &mut pool);
        assert_eq!(count_solutions(&clauses), 3);
    }

    #[test]
    fn exactly_two_of_four() {
        let mut pool = VariablePool::new();
        let lits = placeholder_literals(&mut pool, 4);
        let clauses = exactly(&lits, 2, &mut pool);
        // C(4,2) = 6
        assert_eq!(count_solutions(&clauses), 6);
    }

    #[test]
    fn exactly_zero_forces_all_false() {
        let mut pool = VariablePool::new();
        let lits = placeholder_literals(&mut pool, 2);
        let clauses = exactly(&lits, 0, &mut pool);
        assert_eq!(count_solutions(&clauses), 1);
    }

    #[test]
    fn exactly_k_greater_than_n_is_unsat() {
        let mut pool = VariablePool::new();
        let lits = placeholder_literals(&mut pool, 2);
        let clauses = exactly(&lits, 3, &mut pool);
        assert_eq!(count_solutions(&clauses), 0);
    }

    #[test]
    fn exactly_all_of_n() {
        let mut pool = VariablePool::new();
        let lits = placeholder_literals(&mut pool, 3);
        let clauses = exactly(&lits, 3, &mut pool);
        assert_eq!(count_solutions(&clauses), 1);
    }
}
