//! simmem-bank: randomized soak runner for the response bank model.

use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};
use simmem_bank::config::SimConfig;
use simmem_bank::testing::run_round;

const USAGE: &str = "\
usage: simmem-bank [options]
  --config PATH   load soak parameters from a TOML file
  --rounds N      independent randomized rounds
  --steps N       stimulus steps per round
  --ids N         identifiers to draw stimulus from
  --seed N        base seed (round i runs with seed + i)
";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = parse_args(&args)?;
    config.validate()?;

    log::info!(
        "soak: capacity={} ids={} rounds={} steps={}",
        config.bank.capacity,
        config.num_ids,
        config.rounds,
        config.steps_per_round
    );

    let mut failed_rounds = 0u64;
    let mut total_released = 0u64;
    for i in 0..config.rounds {
        let seed = config.seed + i;
        let report = run_round(&config, seed)?;
        total_released += report.released;
        println!(
            "seed {seed}: {} released, {} mismatches, {} lost",
            report.released, report.mismatches, report.lost
        );
        if !report.passed() {
            failed_rounds += 1;
        }
    }

    println!();
    println!(
        "{} rounds, {total_released} responses released, {failed_rounds} failed",
        config.rounds
    );
    if failed_rounds > 0 {
        bail!("{failed_rounds} round(s) violated integrity or ordering");
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<SimConfig> {
    let mut config = None;
    let mut overrides: Vec<(&str, u64)> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                config = Some(
                    SimConfig::load_from_file(Path::new(path))
                        .with_context(|| format!("loading {path}"))?,
                );
            }
            "--rounds" | "--steps" | "--ids" | "--seed" => {
                let value = iter
                    .next()
                    .with_context(|| format!("{arg} requires a value"))?
                    .parse()
                    .with_context(|| format!("{arg} expects a number"))?;
                overrides.push((arg.as_str(), value));
            }
            other => bail!("unknown argument {other:?}\n{USAGE}"),
        }
    }

    let mut config = config.unwrap_or_else(SimConfig::load);
    for (flag, value) in overrides {
        match flag {
            "--rounds" => config.rounds = value,
            "--steps" => config.steps_per_round = value,
            "--ids" => config.num_ids = value as usize,
            "--seed" => config.seed = value,
            _ => unreachable!(),
        }
    }
    Ok(config)
}
