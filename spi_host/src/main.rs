mod commit_log;
mod error;
mod transaction_loader;

use std::error::Error;
use std::time::Instant;

use clap::Parser;
use rhdl::prelude::*;
use spi_core::{
    miette_report, register_values, SpiPeripheral, SpiPins, SpiTransaction, Stimulus,
    TimingConfig, REGISTER_COUNT,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use commit_log::{CommitLog, Registers};
use error::{HostError, Result};

/// Drives a list of SPI transactions into the simulated register peripheral
/// and records every change of its register bank.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV with columns write,address,data
    #[arg(short, long, default_value = "data/transactions.csv")]
    transactions: String,

    /// Where to write the register trace
    #[arg(short, long, default_value = "data/register_trace.csv")]
    output: String,

    /// Optional VCD waveform of the whole run
    #[arg(long)]
    vcd: Option<String>,

    /// System clock ticks per SCLK half period
    #[arg(long, default_value_t = TimingConfig::default().half_period_ticks)]
    half_period: usize,

    /// Idle ticks after each transaction
    #[arg(long, default_value_t = TimingConfig::default().idle_ticks)]
    idle: usize,

    /// Reset cycles before the first transaction
    #[arg(long, default_value_t = 5)]
    reset_cycles: usize,
}

impl Args {
    fn timing(&self) -> TimingConfig {
        TimingConfig {
            half_period_ticks: self.half_period,
            idle_ticks: self.idle,
            ..TimingConfig::default()
        }
    }
}

// what the bank should hold once every transaction has gone through
fn expected_registers(txs: &[SpiTransaction]) -> Registers {
    let mut regs = [0; REGISTER_COUNT];
    for tx in txs {
        if let Some(index) = tx.target_register() {
            regs[index] = tx.data;
        }
    }
    regs
}

// pins for the whole run, plus the tick by which each transaction has landed
// the drain keeps the last commit inside the run even with a tiny idle gap
fn build_stimulus(timing: TimingConfig, txs: &[SpiTransaction]) -> Result<(Vec<SpiPins>, Vec<u64>)> {
    let stimulus = Stimulus::new(timing)?.idle(1).transactions(txs).drain();
    let boundaries = stimulus.commit_ticks().into_iter().map(|t| t as u64).collect();
    Ok((stimulus.build(), boundaries))
}

// per-tick register bank, reset cycles excluded
fn simulate(pins: &[SpiPins], reset_cycles: usize) -> Result<Vec<Registers>> {
    let uut = SpiPeripheral::default();
    let stream = pins.to_vec().with_reset(reset_cycles).clock_pos_edge(100);

    let samples = uut.run(stream).map_err(|e| HostError::Simulation(miette_report(e)))?;
    Ok(samples
        .synchronous_sample()
        .filter(|t| !t.value.0.reset.any())
        .map(|t| register_values(t.value.2.registers))
        .collect())
}

fn dump_vcd(pins: &[SpiPins], reset_cycles: usize, path: &str) -> Result<()> {
    let uut = SpiPeripheral::default();
    let stream = pins.to_vec().with_reset(reset_cycles).clock_pos_edge(100);

    let vcd = uut
        .run(stream)
        .map_err(|e| HostError::Simulation(miette_report(e)))?
        .collect::<Vcd>();
    vcd.dump_to_file(path)
        .map_err(|e| HostError::Simulation(e.to_string()))?;
    Ok(())
}

fn write_trace(log: &CommitLog, path: &str) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["tick", "reg0", "reg1", "reg2", "reg3", "reg4"])?;

    for (tick, regs) in log.iter() {
        let mut record = vec![tick.to_string()];
        record.extend(regs.iter().map(|r| format!("{:#04x}", r)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    let txs = transaction_loader::load_transactions(&args.transactions)?;
    info!(count = txs.len(), path = %args.transactions, "loaded transactions");

    let (pins, boundaries) = build_stimulus(args.timing(), &txs)?;
    debug!(ticks = pins.len(), "stimulus built");

    let trace = simulate(&pins, args.reset_cycles)?;
    let log = CommitLog::from_trace(trace);
    info!(commits = log.len(), elapsed = ?start.elapsed(), "simulation finished");

    if log.is_empty() {
        warn!("no transaction changed the register bank");
    }
    for (tick, regs) in log.iter() {
        debug!(tick, registers = ?regs, "register bank changed");
    }
    for (tx, tick) in txs.iter().zip(&boundaries) {
        info!(
            write = tx.write,
            address = %format!("{:#04x}", tx.address),
            data = %format!("{:#04x}", tx.data),
            registers = ?log.registers_at(*tick),
            "transaction done"
        );
    }

    write_trace(&log, &args.output)?;
    info!(path = %args.output, "register trace written");

    if let Some(path) = &args.vcd {
        dump_vcd(&pins, args.reset_cycles, path)?;
        info!(path = %path, "waveform written");
    }

    let expected = expected_registers(&txs);
    let actual = log.final_registers();
    if expected == actual {
        info!(registers = ?actual, "final register bank matches the transaction list");
    } else {
        warn!(?expected, ?actual, "final register bank differs from the transaction list");
    }

    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    debug!(?args, "starting");

    run(&args)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> TimingConfig {
        TimingConfig {
            half_period_ticks: 2,
            idle_ticks: 10,
            setup_ticks: 1,
        }
    }

    #[test]
    fn test_expected_registers_follow_last_write() {
        let txs = vec![
            SpiTransaction::write(4, 0xCF).unwrap(),
            SpiTransaction::write(4, 0x01).unwrap(),
            SpiTransaction::write(9, 0x55).unwrap(),
            SpiTransaction::read(0, 0x77).unwrap(),
        ];
        assert_eq!(expected_registers(&txs), [0, 0, 0, 0, 0x01]);
    }

    #[test]
    fn test_simulated_trace_matches_expectation() {
        let txs = vec![
            SpiTransaction::write(0, 0xF0).unwrap(),
            SpiTransaction::write(0x30, 0xAA).unwrap(),
            SpiTransaction::write(1, 0xCC).unwrap(),
        ];
        let (pins, _) = build_stimulus(fast(), &txs).unwrap();

        let trace = simulate(&pins, 1).unwrap();
        let log = CommitLog::from_trace(trace);
        assert_eq!(log.len(), 2);
        assert_eq!(log.final_registers(), expected_registers(&txs));
    }

    #[test]
    fn test_last_commit_lands_with_short_idle_gap() {
        let timing = TimingConfig {
            idle_ticks: 1,
            ..fast()
        };
        let txs = vec![
            SpiTransaction::write(3, 0x11).unwrap(),
            SpiTransaction::write(2, 0x22).unwrap(),
            SpiTransaction::write(4, 0x33).unwrap(),
        ];
        let (pins, boundaries) = build_stimulus(timing, &txs).unwrap();

        let trace = simulate(&pins, 1).unwrap();
        let log = CommitLog::from_trace(trace);
        assert_eq!(log.final_registers(), expected_registers(&txs));

        // each boundary already shows its own transaction and nothing later
        for (n, tick) in boundaries.iter().enumerate() {
            assert_eq!(log.registers_at(*tick), expected_registers(&txs[..=n]));
        }
    }
}
