//! desk-runner: headless demo runner for the distribution platform engine.
//!
//! Seeds a deterministic sample network, runs the investment-creation
//! workflow end to end (split validation, installment generation, payment
//! transitions), and prints ledger summaries.
//!
//! Usage:
//!   desk-runner --seed 12345 --investments 8 --db desk.db
//!   desk-runner --seed 12345 --json

use anyhow::Result;
use debenture_core::{
    config::EngineConfig,
    engine::{CommissionEngine, NewInvestment},
    error::EngineError,
    investment::{BeneficiarySlot, CommissionSplit},
    sample::{seed_network, SampleSpec, SeedRng},
    store::{SqlStore, StatusTotals},
    types::{FieldTag, Role},
};
use chrono::NaiveDate;
use std::env;

#[derive(serde::Serialize)]
struct RunSummary {
    seed: u64,
    investments_created: usize,
    series_captured: f64,
    commissions: StatusTotals,
    remunerations: StatusTotals,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let investments = parse_arg(&args, "--investments", 6usize);
    let json_mode = args.iter().any(|a| a == "--json");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");

    if !json_mode {
        println!("debenture desk — demo runner");
        println!("  seed:        {seed}");
        println!("  investments: {investments}");
        println!("  db:          {db}");
        println!();
    }

    let store = if db == ":memory:" {
        SqlStore::in_memory()?
    } else {
        SqlStore::open(db)?
    };
    store.migrate()?;

    let network = seed_network(&store, seed, &SampleSpec::default())?;
    let engine = CommissionEngine::new(store, EngineConfig::default());

    let mut rng = SeedRng::new(seed ^ 0x5eed);
    let start_date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
    let mut created = Vec::new();

    for n in 0..investments {
        let investor = &network.investors[n % network.investors.len()];
        let split = chain_split(&engine, &investor.user_id, &mut rng)?;
        let amount = 10_000.0 + rng.next_u64_below(90) as f64 * 1_000.0;

        let investment = engine.create_investment(NewInvestment {
            series_id: network.series.series_id.clone(),
            investor_user_id: investor.user_id.clone(),
            split,
            amount,
            yield_percent: Some(network.series.annual_yield_percent),
            start_date,
        })?;
        let receipt = engine.generate_once(&investment.investment_id)?;
        if !json_mode {
            println!(
                "created {} — {:>10.2} — {} commission + {} remuneration installments",
                investment.investment_id,
                investment.amount,
                receipt.commission_installments,
                receipt.remuneration_installments,
            );
        }
        created.push(investment);
    }

    // Retrying generation is a no-op by contract.
    if let Some(first) = created.first() {
        match engine.generate_once(&first.investment_id) {
            Err(EngineError::AlreadyGenerated { .. }) => {
                log::info!("retry on {}: already generated (no-op)", first.investment_id)
            }
            other => log::warn!("retry on {}: unexpected {other:?}", first.investment_id),
        }
    }

    // Pay the first due installment of each investment.
    for investment in &created {
        let pending = engine.store().pending_commission_ids(&investment.investment_id)?;
        match pending.first() {
            Some(id) => {
                engine.mark_commission_paid(id)?;
            }
            None => log::warn!(
                "investment {} has no pending commission to pay",
                investment.investment_id
            ),
        }
    }

    if json_mode {
        let summary = RunSummary {
            seed,
            investments_created: created.len(),
            series_captured: engine.series_captured(&network.series.series_id)?,
            commissions: engine.commission_totals()?,
            remunerations: engine.remuneration_totals()?,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&engine, &network.series.series_id)?;
        demo_visibility(&engine, &created, &network.global.user_id)?;
    }

    Ok(())
}

/// Builds the commission split by walking the investor's real superior
/// chain, so every beneficiary is in the investor's own network branch.
fn chain_split(
    engine: &CommissionEngine,
    investor_id: &str,
    rng: &mut SeedRng,
) -> Result<CommissionSplit> {
    let mut split = CommissionSplit::default();
    let mut current = engine
        .store()
        .get_user(investor_id)?
        .and_then(|u| u.superior_user_id);

    while let Some(user_id) = current {
        let Some(user) = engine.store().get_user(&user_id)? else {
            break;
        };
        let slot = |pct: f64| BeneficiarySlot::new(user.user_id.clone(), pct);
        match user.role {
            Role::Agent => split.agent = slot(1.0 + rng.next_f64()),
            Role::RelationshipManager => split.relationship_manager = slot(1.5),
            Role::BranchOffice => split.branch_office = slot(2.0),
            Role::Master => split.master = slot(3.0),
            _ => {}
        }
        current = user.superior_user_id;
    }
    Ok(split)
}

fn print_summary(engine: &CommissionEngine, series_id: &str) -> Result<()> {
    let commissions = engine.commission_totals()?;
    let remunerations = engine.remuneration_totals()?;
    let captured = engine.series_captured(series_id)?;
    let positions = engine.store().investments_for_series(series_id)?.len();

    println!();
    println!("=== LEDGER SUMMARY ===");
    println!("  positions in series:    {positions:>6}");
    println!("  series captured:        {captured:>14.2}");
    println!(
        "  commissions pending:    {:>6} totaling {:>12.2}",
        commissions.pending_count, commissions.pending_amount
    );
    println!(
        "  commissions paid:       {:>6} totaling {:>12.2}",
        commissions.paid_count, commissions.paid_amount
    );
    println!(
        "  remunerations pending:  {:>6} totaling {:>12.2}",
        remunerations.pending_count, remunerations.pending_amount
    );
    Ok(())
}

/// Shows the field gate from three vantage points: the platform admin, a
/// direct party, and a user from another network branch.
fn demo_visibility(
    engine: &CommissionEngine,
    created: &[debenture_core::investment::InvestmentRecord],
    global_id: &str,
) -> Result<()> {
    let Some(investment) = created.first() else {
        return Ok(());
    };

    println!();
    println!("=== FIELD VISIBILITY ({}) ===", investment.investment_id);
    let viewers: Vec<(&str, String)> = vec![
        ("global", global_id.to_string()),
        ("investor", investment.investor_user_id.clone()),
    ];
    for (label, viewer_id) in viewers {
        let access = engine.field_access(&viewer_id, &investment.investment_id, FieldTag::Amount)?;
        println!("  {label:<10} amount: {access:?}");
    }

    // Any other master is cross-network by construction of the sample tree.
    let resolver = engine.resolver();
    if let Some(master_id) = investment.split.master.user_id.as_deref() {
        for other in engine.store().users_with_role(Role::Master)? {
            if other.user_id != master_id && !resolver.same_network(&other.user_id, master_id) {
                let visible = engine.is_visible(
                    &other.user_id,
                    &investment.investment_id,
                    FieldTag::Amount,
                )?;
                println!("  {:<10} amount visible: {visible} (cross-network master)", "peer");
                break;
            }
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
