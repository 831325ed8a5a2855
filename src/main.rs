use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, ValueEnum};
use cubesolver::{
    solve_smart, CubeLike, CubieCube, FaceCube, Move, OptimalSolver, SolveResult, Solver,
    TableConfig, TableSet, Tables, TwoPhaseSolver, SMART_TARGET, SMART_TIMEOUT,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Solves a 3x3x3 cube, either quickly or optimally
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    cube: CubeSource,

    /// Which solver to run
    #[arg(short, long, value_enum, default_value_t = Mode::Fast)]
    mode: Mode,

    /// Longest solution to accept. Defaults to the solver's own limit. In smart mode, the target
    /// of the first two-phase pass.
    #[arg(long)]
    max_length: Option<usize>,

    /// Seconds the two-phase solver may keep improving once it has a solution. The optimal solver
    /// ignores it.
    #[arg(long)]
    timeout: Option<f64>,

    /// Where table files are kept
    #[arg(long, default_value = "tables", value_name = "DIR")]
    tables: PathBuf,

    /// Build every table in memory and save nothing
    #[arg(long)]
    no_persist: bool,

    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct CubeSource {
    /// 54 facelets in URFDLB order
    facelets: Option<String>,

    /// Apply a move sequence to a solved cube, e.g. "R U' F2"
    #[arg(long)]
    scramble: Option<String>,

    /// Solve a uniformly random cube
    #[arg(long)]
    random: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Two-phase search, stops at the first short enough solution
    Fast,
    /// Shortest possible solution, needs the full tables
    Optimal,
    /// Two-phase first, then proves or improves it optimally
    Smart,
}

impl CubeSource {
    fn cube(&self) -> anyhow::Result<CubieCube> {
        if let Some(facelets) = &self.facelets {
            return Ok(CubieCube::from_facelets(facelets)?);
        }
        if let Some(scramble) = &self.scramble {
            return Ok(CubieCube::solved().apply_all(Move::parse_sequence(scramble)?));
        }
        Ok(CubieCube::random(&mut rand::thread_rng()))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(match cli.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init()?;

    let timeout = parse_timeout(cli.timeout)?;
    let cube = cli.cube.cube()?;
    println!("{}", FaceCube::from(&cube).net());

    let config = TableConfig {
        dir: (!cli.no_persist).then(|| cli.tables.clone()),
        set: match cli.mode {
            Mode::Fast => TableSet::TwoPhase,
            Mode::Optimal | Mode::Smart => TableSet::Full,
        },
    };
    let tables = Tables::load_or_build(&config)?;

    let result = match cli.mode {
        Mode::Fast => solve_with(&TwoPhaseSolver::new(&tables), &cube, cli.max_length, timeout),
        Mode::Optimal => solve_with(&OptimalSolver::new(&tables), &cube, cli.max_length, timeout),
        Mode::Smart => solve_smart(
            &tables,
            &cube.to_facelets(),
            cli.max_length.unwrap_or(SMART_TARGET),
            timeout.unwrap_or(SMART_TIMEOUT),
        ),
    };

    println!("{}", result.message);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_timeout(secs: Option<f64>) -> anyhow::Result<Option<Duration>> {
    secs.map(Duration::try_from_secs_f64)
        .transpose()
        .context("Invalid --timeout")
}

fn solve_with(
    solver: &impl Solver,
    cube: &CubieCube,
    max_length: Option<usize>,
    timeout: Option<Duration>,
) -> SolveResult {
    solver.solve(
        cube,
        max_length.unwrap_or_else(|| solver.default_max_length()),
        timeout.unwrap_or_else(|| solver.default_timeout()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_checked() {
        assert_eq!(parse_timeout(None).unwrap(), None);
        assert_eq!(parse_timeout(Some(1.5)).unwrap(), Some(Duration::from_millis(1500)));
        assert!(parse_timeout(Some(-1.0)).is_err());
        assert!(parse_timeout(Some(f64::NAN)).is_err());
    }

    #[test]
    fn exactly_one_cube_source() {
        assert!(Cli::try_parse_from(["cubesolver"]).is_err());
        assert!(Cli::try_parse_from(["cubesolver", "--random", "--scramble", "R U"]).is_err());

        let cli = Cli::try_parse_from(["cubesolver", "--scramble", "R U", "-m", "smart"]).unwrap();
        assert!(cli.mode == Mode::Smart);
        assert!(!cli.cube.cube().unwrap().is_solved());
    }
}
