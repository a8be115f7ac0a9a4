use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nurikabe_sat::encoder::Encoder;
use nurikabe_sat::puzzle::Puzzle;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Nurikabe puzzle solver via SAT encoding")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a DIMACS CNF file for a puzzle
    Generate {
        /// Path to the puzzle text file
        puzzle_file: PathBuf,
        /// Anchor cell for wall connectivity, as "x y"; defaults to the
        /// first non-clue cell in row-major order
        #[arg(short, long, num_args = 2, value_names = ["X", "Y"])]
        anchor: Option<Vec<usize>>,
        /// Output .cnf file path
        #[arg(short, long, default_value = "nurikabe.cnf")]
        output: PathBuf,
    },
    /// Solve a puzzle and print the decoded grid
    Solve {
        /// Path to the puzzle text file
        puzzle_file: PathBuf,
        /// Anchor cell for wall connectivity, as "x y"; defaults to the
        /// first non-clue cell in row-major order
        #[arg(short, long, num_args = 2, value_names = ["X", "Y"])]
        anchor: Option<Vec<usize>>,
    },
}

/// The first non-clue cell in row-major order, used as the default wall
/// anchor when the caller does not supply one (spec.md §9 leaves anchor
/// choice to the caller; this is the CLI's own conforming heuristic).
fn default_anchor(puzzle: &Puzzle) -> Option<(usize, usize)> {
    for y in 0..puzzle.height {
        for x in 0..puzzle.width {
            if !puzzle.is_clue(x, y) {
                return Some((x, y));
            }
        }
    }
    None
}

/// Every non-clue cell in row-major order, for the solve-path anchor retry.
fn candidate_anchors(puzzle: &Puzzle) -> Vec<(usize, usize)> {
    let mut candidates = Vec::new();
    for y in 0..puzzle.height {
        for x in 0..puzzle.width {
            if !puzzle.is_clue(x, y) {
                candidates.push((x, y));
            }
        }
    }
    candidates
}

fn resolve_anchor(puzzle: &Puzzle, anchor: &Option<Vec<usize>>) -> Result<(usize, usize)> {
    match anchor {
        Some(xy) => Ok((xy[0], xy[1])),
        None => default_anchor(puzzle)
            .context("puzzle has no non-clue cell to use as a default wall anchor"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            puzzle_file,
            anchor,
            output,
        } => {
            let puzzle = Puzzle::from_file(&puzzle_file)
                .with_context(|| format!("failed to parse {puzzle_file:?}"))?;
            let anchor = resolve_anchor(&puzzle, &anchor)?;
            println!("Generating CNF for {puzzle_file:?} with anchor {anchor:?}...");
            let mut encoder = Encoder::build(&puzzle, anchor)
                .with_context(|| format!("failed to build encoder for {puzzle_file:?}"))?;
            let clauses = encoder.encode();
            nurikabe_sat::write_clauses(&output, &clauses)?;
        }
        Commands::Solve {
            puzzle_file,
            anchor,
        } => {
            let puzzle = Puzzle::from_file(&puzzle_file)
                .with_context(|| format!("failed to parse {puzzle_file:?}"))?;

            // Anchors to try: an explicit one first (no retry if it fails),
            // or every non-clue cell in row-major order (spec.md §9,
            // strategy (a): iterate over candidate anchors).
            let anchors: Vec<(usize, usize)> = match &anchor {
                Some(xy) => vec![(xy[0], xy[1])],
                None => candidate_anchors(&puzzle),
            };
            if anchors.is_empty() {
                anyhow::bail!("puzzle has no non-clue cell to use as a wall anchor");
            }

            let mut last_err = None;
            for candidate in anchors {
                let mut encoder = match Encoder::build(&puzzle, candidate) {
                    Ok(e) => e,
                    Err(e) => {
                        last_err = Some(e);
                        continue;
                    }
                };
                let clauses = encoder.encode();
                match nurikabe_sat::solve(&clauses)? {
                    Some(assignment) => {
                        let grid = encoder
                            .decode(&assignment)
                            .context("decoding a satisfying model")?;
                        println!("Solved with anchor {candidate:?}:");
                        print!("{}", grid.render(&puzzle)?);
                        return Ok(());
                    }
                    None => {
                        last_err = Some(nurikabe_sat::NurikabeError::Unsolvable);
                        continue;
                    }
                }
            }

            Err(last_err.unwrap_or(nurikabe_sat::NurikabeError::Unsolvable).into())
        }
    }
}
