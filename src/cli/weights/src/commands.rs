use rust_decimal::Decimal;
use stake_weights::{
    repositories::traits::StakeSnapshot,
    services::{allocation::AllocationService, formatter, formatter::AllocationReport},
    AggregateState, SubnetId, WeightError, WeightVector,
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

/// Error type for weights commands
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Weights(#[from] WeightError),

    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

/// Parses comma-separated netuids and fractions into an operator vector.
pub fn parse_operator_vector(netuids: &str, weights: &str) -> Result<WeightVector, Error> {
    let subnets = netuids
        .split(',')
        .map(SubnetId::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    let fractions = weights
        .split(',')
        .map(|raw| {
            Decimal::from_str(raw.trim()).map_err(|_| Error::Parse(format!("invalid weight '{}'", raw.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if subnets.len() != fractions.len() {
        return Err(Error::Parse(format!(
            "{} netuids but {} weights",
            subnets.len(),
            fractions.len()
        )));
    }

    Ok(WeightVector::from_fractions(subnets.into_iter().zip(fractions))?)
}

/// Commands for weight operations
pub struct WeightCommands;

impl WeightCommands {
    /// Print the current aggregate and stake partitions
    pub async fn show<S: StakeSnapshot>(service: &AllocationService<S>) -> Result<(), Error> {
        let snapshot = service.snapshot().await?;
        print_aggregate(snapshot.aggregate())?;
        Ok(())
    }

    /// Blend a new operator vector into the current snapshot and print the result
    pub async fn blend<S: StakeSnapshot>(
        service: &AllocationService<S>,
        netuids: Option<&str>,
        weights: Option<&str>,
    ) -> Result<(), Error> {
        let snapshot = service.snapshot().await?;
        print_aggregate(snapshot.aggregate())?;
        println!();

        let netuids = match netuids {
            Some(value) => value.to_string(),
            None => prompt("Enter netuids (comma-separated): ")?,
        };
        let weights = match weights {
            Some(value) => value.to_string(),
            None => prompt("Enter weights (comma-separated): ")?,
        };

        let new_weights = parse_operator_vector(&netuids, &weights)?;
        let report = snapshot.allocate(&new_weights)?;

        for line in report_lines(&report) {
            println!("{}", line);
        }

        Ok(())
    }
}

fn print_aggregate(aggregate: &AggregateState) -> Result<(), Error> {
    println!("Current voted weighted averages:");
    for row in formatter::format_vector(&aggregate.weights) {
        println!("{}", row);
    }
    println!();
    println!("Stake with weights: {}", aggregate.stake_with_weights.as_tokens());
    println!("Stake without weights: {}", aggregate.stake_without_weights.as_tokens());
    println!("Total stake: {}", aggregate.total_stake()?.as_tokens());
    Ok(())
}

/// Output of `blend`; the totals are the ones the blend itself used.
fn report_lines(report: &AllocationReport) -> Vec<String> {
    vec![
        "New weighted averages to submit:".to_string(),
        format!("Blended stake with weights: {}", report.stake_with_weights),
        format!("Blended stake without weights: {}", report.stake_without_weights),
        format!("Blended total stake: {}", report.total_stake),
        format!("Result netuids (comma-separated): {}", report.netuids_csv()),
        format!("Result weights (comma-separated): {}", report.weights_csv()),
    ]
}

fn prompt(label: &str) -> Result<String, Error> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
