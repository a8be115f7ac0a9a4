/// A library for solving Nurikabe-style grid puzzles by reduction to
/// Boolean satisfiability.
///
/// This crate provides the CNF encoding engine: the transformation from a
/// puzzle instance into a propositional formula whose satisfying
/// assignments correspond to valid solutions, plus the reverse decoding of
/// a model to a wall grid.
pub mod cardinality;
pub mod encoder;
pub mod error;
pub mod pool;
pub mod puzzle;

use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use varisat::{ExtendFormula, Lit, Solver};

pub use encoder::Encoder;
pub use error::NurikabeError;
pub use puzzle::{Puzzle, WallGrid};

// number of variables - which is largest index
fn num_vars(clauses: &[Vec<isize>]) -> usize {
    clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .map(|&lit| lit.unsigned_abs())
        .max()
        .unwrap_or(0) // Handle case with no clauses
}

pub fn write_clauses<P: AsRef<Path>>(output: P, clauses: &[Vec<isize>]) -> Result<()> {
    let num_vars = num_vars(clauses);

    let file = File::create(&output)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "p cnf {num_vars} {}", clauses.len())?;
    for clause in clauses {
        for literal in clause {
            write!(writer, "{literal} ")?;
        }
        writeln!(writer, "0")?;
    }
    writer.flush()?;

    println!(
        "Successfully wrote problem to '{}' ({num_vars} variables, {} clauses)",
        output.as_ref().display(),
        clauses.len()
    );
    Ok(())
}

/// Runs the bundled SAT solver once on `clauses` and, on SAT, returns an
/// assignment indexed by variable id minus one (spec.md §6's solver
/// interface: positive means true, negative means false). This is the
/// single-shot counterpart to [`find_all_solutions`]'s iterator.
pub fn solve(clauses: &[Vec<isize>]) -> Result<Option<Vec<i32>>> {
    let mut solver = Solver::new();
    for clause in clauses {
        solver.add_clause(
            &clause
                .iter()
                .map(|&lit| Lit::from_dimacs(lit))
                .collect::<Vec<_>>(),
        );
    }

    if !solver.solve()? {
        return Ok(None);
    }
    let model = solver.model().expect("solve() returned true but no model");
    let max_var = model.iter().map(|l| l.var().to_dimacs()).max().unwrap_or(0);
    let mut assignment = vec![0i32; max_var as usize];
    for lit in model {
        let idx = (lit.var().to_dimacs() - 1) as usize;
        assignment[idx] = if lit.is_positive() {
            idx as i32 + 1
        } else {
            -(idx as i32 + 1)
        };
    }
    Ok(Some(assignment))
}

// holds the state needed to keep finding the next solution.
pub struct SolutionIterator<'a> {
    solver: Solver<'a>,
}

impl<'a> Iterator for SolutionIterator<'a> {
    type Item = Vec<Lit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.solver.solve().unwrap_or(false) {
            let model = self.solver.model().expect("No model found");
            // block the exact same solution from being found again
            // !(l1 AND l2 ... and lN) = (!l1 OR !l2 OR ... OR !lN)
            let blocking_clause: Vec<Lit> = model.iter().map(|&lit| !lit).collect();
            self.solver.add_clause(&blocking_clause);
            Some(model)
        } else {
            None
        }
    }
}

/// Finds all solutions and returns them as a memory-efficient iterator.
pub fn find_all_solutions(clauses: &[Vec<isize>]) -> Result<SolutionIterator> {
    let mut solver = Solver::new();
    for clause in clauses {
        solver.add_clause(
            &clause
                .iter()
                .map(|&lit| Lit::from_dimacs(lit))
                .collect::<Vec<_>>(),
        );
    }
    Ok(SolutionIterator { solver })
}
