use crate::cli::ViolationsArgs;
use crate::error::Result;
use crate::input::read_scores;
use ensclust::engine::violations::ViolationCounter;
use std::collections::HashMap;
use tracing::info;

pub fn run(args: ViolationsArgs) -> Result<()> {
    let mut counter = ViolationCounter::from_file(&args.thresholds)?;
    info!(
        restraints = counter.thresholds().len(),
        "Loaded restraint thresholds."
    );
    let rows = read_scores(&args.scores)?;

    println!("{:>6}  violations", "row");
    for (row, violated) in count_rows(&mut counter, &rows).into_iter().enumerate() {
        println!("{:>6}  {}", row + 1, violated);
    }

    println!("\nViolations per restraint over {} row(s):", rows.len());
    for name in counter.thresholds().keys() {
        let count = counter.violation_counts().get(name).copied().unwrap_or(0);
        println!("  {:<24} {}", name, count);
    }
    Ok(())
}

/// Violations of every score row, in row order; the counter keeps the running tally.
fn count_rows(counter: &mut ViolationCounter, rows: &[HashMap<String, f64>]) -> Vec<usize> {
    rows.iter()
        .map(|scores| counter.count_violations(scores))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn counts_every_row_and_keeps_the_tally() {
        let dir = tempdir().unwrap();
        let thresholds = dir.path().join("thresholds.txt");
        fs::write(&thresholds, "# name threshold\ncrosslink 10.0\nem 0.5\n").unwrap();
        let scores = dir.path().join("scores.csv");
        fs::write(&scores, "crosslink,em\n12.0,0.1\n9.0,0.9\n").unwrap();

        let mut counter = ViolationCounter::from_file(&thresholds).unwrap();
        let rows = read_scores(&scores).unwrap();

        assert_eq!(count_rows(&mut counter, &rows), vec![1, 1]);
        assert_eq!(counter.violation_counts().get("crosslink"), Some(&1));
        assert_eq!(counter.violation_counts().get("em"), Some(&1));
        run(ViolationsArgs { thresholds, scores }).unwrap();
    }

    #[test]
    fn malformed_thresholds_are_reported() {
        let dir = tempdir().unwrap();
        let thresholds = dir.path().join("thresholds.txt");
        fs::write(&thresholds, "crosslink ten\n").unwrap();
        let scores = dir.path().join("scores.csv");
        fs::write(&scores, "crosslink\n1\n").unwrap();

        let result = run(ViolationsArgs { thresholds, scores });

        assert!(matches!(result, Err(CliError::Violations(_))));
    }
}
