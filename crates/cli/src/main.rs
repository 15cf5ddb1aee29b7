//! Command Line Interface for the DeFi lab.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use defi_lab_domain::lending::{
    MINIMUM_COLLATERAL_RATIO, StakePosition, TroveSnapshot, TroveStatus, deposit_apr,
    lookback_block,
};
use defi_lab_domain::metrics::LpPosition;
use defi_lab_domain::metrics::impermanent_loss::il_from_price_ratio;
use defi_lab_domain::value_objects::amount::WEI_DECIMALS;
use defi_lab_domain::value_objects::{Amount, Price};
use defi_lab_simulation::prelude::*;
use dotenv::dotenv;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Price moves shown in the impermanent loss table.
const IL_PRICE_RATIOS: [f64; 4] = [0.8, 0.9, 1.1, 1.2];

#[derive(Parser)]
#[command(name = "defi-lab")]
#[command(about = "DeFi strategy comparison, LP risk and lending analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare yield strategies across simulated market scenarios
    Compare {
        /// JSON run configuration (defaults to the built-in four-regime run)
        #[arg(short, long, env = "DEFI_LAB_CONFIG")]
        config: Option<PathBuf>,

        /// Trials per scenario
        #[arg(short, long, env = "DEFI_LAB_TRIALS")]
        trials: Option<usize>,

        /// Seed for reproducible runs
        #[arg(short, long, env = "DEFI_LAB_SEED")]
        seed: Option<u64>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Option-equivalent risk of a constant-product LP position
    Risk {
        /// Token A reserve (the numeraire, e.g. USDC)
        #[arg(long, default_value_t = 100_000.0)]
        token_a: f64,

        /// Token B reserve (e.g. ETH)
        #[arg(long, default_value_t = 1_000.0)]
        token_b: f64,

        /// Price of token B in token A
        #[arg(long, default_value_t = 2_000.0)]
        price: f64,

        /// Pool fee tier (0.003 = 0.3%)
        #[arg(long, default_value_t = 0.003)]
        fee_tier: f64,

        /// Horizon in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,

        /// Annual risk-free rate
        #[arg(long, default_value_t = 0.01)]
        risk_free_rate: f64,

        /// Annualized volatility
        #[arg(long, default_value_t = 0.5)]
        volatility: f64,
    },
    /// Inspect a lending trove snapshot
    Inspect {
        /// Trove collateral in wei
        #[arg(long)]
        collateral_wei: String,

        /// Trove debt in wei
        #[arg(long)]
        debt_wei: String,

        /// On-chain status code (1 = active)
        #[arg(long, default_value_t = 1)]
        status: u8,

        /// ETH price in USD
        #[arg(long)]
        eth_price: Decimal,

        /// Stability pool deposit now, in LUSD
        #[arg(long, requires = "deposit_then")]
        deposit_now: Option<Decimal>,

        /// Stability pool deposit `days` ago, in LUSD
        #[arg(long, requires = "deposit_now")]
        deposit_then: Option<Decimal>,

        /// Lookback window for the APR estimate
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Current block, to estimate the lookback block
        #[arg(long)]
        current_block: Option<u64>,

        /// Staked governance tokens in wei
        #[arg(long, requires = "stake_price")]
        stake_wei: Option<String>,

        /// Price of the staked token in USD
        #[arg(long, requires = "stake_wei")]
        stake_price: Option<Decimal>,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            config,
            trials,
            seed,
            json,
        } => compare(config, trials, seed, json),
        Commands::Risk {
            token_a,
            token_b,
            price,
            fee_tier,
            days,
            risk_free_rate,
            volatility,
        } => risk(
            LpPosition::new(token_a, token_b, price, fee_tier),
            days,
            risk_free_rate,
            volatility,
        ),
        Commands::Inspect {
            collateral_wei,
            debt_wei,
            status,
            eth_price,
            deposit_now,
            deposit_then,
            days,
            current_block,
            stake_wei,
            stake_price,
        } => {
            let trove = TroveSnapshot::new(
                Amount::parse_raw(&debt_wei, WEI_DECIMALS)?,
                Amount::parse_raw(&collateral_wei, WEI_DECIMALS)?,
                TroveStatus::from_code(status),
            );
            let deposits = deposit_now.zip(deposit_then);
            let stake = match stake_wei.zip(stake_price) {
                Some((wei, price)) => Some(StakePosition {
                    amount: Amount::parse_raw(&wei, WEI_DECIMALS)?,
                    price: Price::new(price),
                }),
                None => None,
            };
            inspect(&trove, Price::new(eth_price), deposits, days, current_block, stake)
        }
    }
}

fn compare(
    config_path: Option<PathBuf>,
    trials: Option<usize>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => ComparisonConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ComparisonConfig::default(),
    };
    if let Some(trials) = trials {
        config = config.with_trials(trials);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    info!(
        trials = config.trials,
        seed = ?config.seed,
        scenarios = config.scenarios.len(),
        strategies = config.strategies.len(),
        "Running comparison"
    );
    let report = config.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "🎲 {} trials per scenario, initial price {}, capital {}",
        report.trials, report.settings.initial_price, report.settings.initial_capital
    );
    if let Some(seed) = report.seed {
        println!("   seed: {seed}");
    }
    for scenario in &config.scenarios {
        println!(
            "\n📈 {} market (drift {}, volatility {}, {} steps)",
            scenario.name, scenario.drift, scenario.volatility, scenario.steps
        );
        scenario_table(&report, &scenario.name).printstd();
    }

    Ok(())
}

fn scenario_table(report: &ComparisonReport, scenario: &str) -> Table {
    let mut table = Table::new();
    table.set_titles(row![
        "Strategy",
        "Mean final",
        "Std dev",
        "Mean return",
        "Max drawdown",
        "Win rate",
        "Sharpe",
        "Sortino",
        "Liquidated",
        "Failed"
    ]);

    for result in report.for_scenario(scenario) {
        match &result.statistics {
            Some(stats) => table.add_row(row![
                result.strategy_id,
                format!("{:.2}", stats.mean_final_value),
                format!("{:.2}", stats.stddev_final_value),
                format!("{:.2}%", stats.mean_return * 100.0),
                format!("{:.2}%", stats.max_drawdown * 100.0),
                format!("{:.1}%", stats.win_rate * 100.0),
                format!("{:.4}", stats.sharpe_ratio),
                format!("{:.4}", stats.sortino_ratio),
                format!("{:.1}%", stats.liquidation_rate * 100.0),
                result.failed_trials()
            ]),
            None => table.add_row(row![
                result.strategy_id,
                "-",
                "-",
                "-",
                "-",
                "-",
                "-",
                "-",
                "-",
                result.failed_trials()
            ]),
        };
    }

    table
}

fn risk(position: LpPosition, days: u32, risk_free_rate: f64, volatility: f64) -> Result<()> {
    let greeks = position.option_greeks(days, risk_free_rate, volatility)?;
    let curve = position.curve_sensitivities()?;

    println!("💧 Liquidity Position:");
    println!("Token A: {}", position.token_a);
    println!("Token B: {}", position.token_b);
    println!("Current Price: {}", position.price);
    println!("Fee Tier: {}%", position.fee_tier * 100.0);
    println!("Position Value: {:.2}", position.value());

    println!("\n📐 Equivalent Option Risk Metrics ({days} days):");
    println!("Delta: {:.4}", greeks.delta);
    println!("Gamma: {:.4}", greeks.gamma);
    println!("Vega: {:.4}", greeks.vega);
    println!("Theta: {:.4}", greeks.theta);

    println!("\n📉 Pool Curve Sensitivities:");
    println!("Delta: {:.4}", curve.delta);
    println!("Gamma: {:.6}", curve.gamma);

    println!("\n⚖️  Impermanent Loss:");
    for ratio in IL_PRICE_RATIOS {
        let il = il_from_price_ratio(ratio)?;
        println!(
            "Price change: {ratio:.1}x, Impermanent Loss: {:.2}%",
            il * 100.0
        );
    }

    Ok(())
}

fn inspect(
    trove: &TroveSnapshot,
    eth_price: Price,
    deposits: Option<(Decimal, Decimal)>,
    days: u32,
    current_block: Option<u64>,
    stake: Option<StakePosition>,
) -> Result<()> {
    match trove.report(eth_price)? {
        Some(report) => {
            println!("🏦 Trove (Active):");
            println!("Collateral: {} ETH", report.collateral.round_dp(4));
            println!("Debt: {} LUSD", report.debt.round_dp(2));
            match report.collateral_ratio.map(percent) {
                Some(Some(ratio)) => println!("Collateral Ratio: {}%", ratio.round_dp(2)),
                Some(None) => println!("Collateral Ratio: > {}%", Decimal::MAX),
                None => println!("Collateral Ratio: ∞ (no debt)"),
            }
            if report.liquidatable {
                println!(
                    "🚨 Below the minimum collateral ratio of {}%",
                    MINIMUM_COLLATERAL_RATIO * Decimal::ONE_HUNDRED
                );
            }
        }
        None => println!("🏦 Trove: not active ({:?})", trove.status),
    }

    if let Some((now, then)) = deposits {
        let apr = deposit_apr(then, now, days)?;
        println!("\n🛡️  Stability Pool:");
        println!("Deposit: {} LUSD", now.round_dp(2));
        println!("Estimated APR ({days} days): {}%", apr.round_dp(2));
        if let Some(block) = current_block {
            println!("Lookback block: {}", lookback_block(block, days));
        }
    }

    if let Some(stake) = stake {
        println!("\n🔒 Stake:");
        println!("Amount: {}", stake.amount.to_decimal()?.round_dp(4));
        println!("Value: ${}", stake.value()?.round_dp(2));
    }

    Ok(())
}

/// A ratio in percent, or `None` if it does not fit into a decimal.
fn percent(ratio: Decimal) -> Option<Decimal> {
    ratio.checked_mul(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare_flags() {
        let cli = Cli::try_parse_from(["defi-lab", "compare", "--trials", "50", "--seed", "7"])
            .unwrap();
        match cli.command {
            Commands::Compare {
                trials, seed, json, ..
            } => {
                assert_eq!(trials, Some(50));
                assert_eq!(seed, Some(7));
                assert!(!json);
            }
            _ => panic!("Expected compare"),
        }
    }

    #[test]
    fn test_inspect_requires_paired_deposits() {
        let result = Cli::try_parse_from([
            "defi-lab",
            "inspect",
            "--collateral-wei",
            "1",
            "--debt-wei",
            "1",
            "--eth-price",
            "2000",
            "--deposit-now",
            "100",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_oversized_trove_is_error() {
        let trove = TroveSnapshot::new(
            Amount::parse_raw("1", WEI_DECIMALS).unwrap(),
            Amount::parse_raw("79228162514000000000000000000", WEI_DECIMALS).unwrap(),
            TroveStatus::Active,
        );
        let eth_price = Price::new(Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0));
        assert!(inspect(&trove, eth_price, None, 30, None, None).is_err());

        let huge = Decimal::MAX / Decimal::TEN;
        assert_eq!(percent(huge), None);
        assert_eq!(percent(Decimal::ONE), Some(Decimal::ONE_HUNDRED));
    }

    #[test]
    fn test_scenario_table_has_row_per_strategy() {
        let config = ComparisonConfig::from_json_str(
            r#"{"trials": 3, "seed": 1,
                "scenarios": [{"name": "flat", "drift": 0.0, "volatility": 0.0, "steps": 5}],
                "strategies": [{"kind": "hold"}, {"kind": "lending"}]}"#,
        )
        .unwrap();
        let report = config.run().unwrap();
        assert_eq!(scenario_table(&report, "flat").len(), 2);
    }
}
