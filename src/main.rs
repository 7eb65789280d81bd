//! fairdeal CLI binary

use anyhow::{Context, Result};
use clap::Parser;
use fairdeal::cli::{Cli, Commands, NegotiatorApp, PartyArgs};
use fairdeal::market::{AssetType, StaticMarket};
use fairdeal::negotiation::strategy::AdaptiveStrategy;
use fairdeal::negotiation::{NegotiationEngine, Outcome, SessionRequest, StrategyKind};
use fairdeal::{NegotiationSettings, PartyConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => NegotiationSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => NegotiationSettings::default(),
    };

    match cli.command {
        Commands::Run {
            parties,
            strategy,
            json,
        } => {
            let (buyer, seller) = build_parties(&parties)?;
            let engine = NegotiationEngine::new(settings);
            let outcome = engine.run(&buyer, &seller, parties.max_rounds, strategy)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(strategy, &outcome);
            }
        }

        Commands::Compare { parties } => {
            let (buyer, seller) = build_parties(&parties)?;
            let engine = NegotiationEngine::new(settings);

            println!(
                "{:<16} {:>7} {:>10} {:>9} {:>9} {:>9}",
                "strategy", "rounds", "price", "fairness", "buyer_u", "seller_u"
            );
            for kind in StrategyKind::DETERMINISTIC {
                let agreement = engine.run(&buyer, &seller, parties.max_rounds, kind)?.agreement;
                println!(
                    "{:<16} {:>7} {:>10.2} {:>9.3} {:>9.3} {:>9.3}",
                    kind.as_str(),
                    agreement.round_count,
                    agreement.final_price,
                    agreement.final_simple_fairness,
                    agreement.buyer_utility,
                    agreement.seller_utility
                );
            }
        }

        Commands::Explore {
            parties,
            episodes,
            seed,
        } => {
            let (buyer, seller) = build_parties(&parties)?;
            let mut exploration = settings.exploration;
            if seed.is_some() {
                exploration.seed = seed;
            }

            let mut learner = AdaptiveStrategy::new(buyer, exploration);
            let report = learner.train_against(&seller, episodes, parties.max_rounds, &settings.stop);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Session {
            role,
            target,
            min_price,
            max_price,
            quantity,
            max_rounds,
            strategy,
            symbol,
            asset_type,
            market_price,
            question,
            tx_hash,
            block_number,
        } => {
            let mut app = NegotiatorApp::new(settings);
            if let (Some(symbol), Some(price)) = (&symbol, market_price) {
                let kind: AssetType = asset_type.parse()?;
                app = app.with_market(Arc::new(StaticMarket::new().with_price(symbol, kind, price)));
            }

            let mut request = SessionRequest::new(role.into(), target, min_price, max_price);
            request.quantity = quantity;
            request.max_rounds = max_rounds;
            request.strategy = strategy;
            request.market_symbol = symbol;
            request.market_asset_type = Some(asset_type);

            let session = app.create_session(request).await?;
            let id = session.id().clone();

            let run = app.run_auto(&id).await?;
            print_outcome(strategy, &run.outcome);

            if let Some(question) = question {
                let reply = app.advise(&id, &question).await?;
                println!("\nadvisor ({}):\n{}", reply.source, reply.reply);
            }

            let finalized = app.finalize(&id).await?;
            println!(
                "\nfinalized {} at ${:.2} x {}\nreceipt {}",
                id, finalized.agreement.final_price, finalized.agreement.quantity, finalized.receipt
            );

            if let Some(tx_hash) = tx_hash {
                let recorded = app.record_ledger(&id, &tx_hash, block_number).await?;
                println!("status {}", recorded.status());
            }
        }
    }

    Ok(())
}

fn build_parties(args: &PartyArgs) -> Result<(PartyConfig, PartyConfig)> {
    let party = |target: f64| {
        PartyConfig::builder(target, args.min_price, args.max_price)
            .quantity(args.quantity)
            .aggressiveness(args.aggressiveness)
            .fairness_weight(args.fairness_weight)
            .maybe_market_price(args.market_price)
            .build()
    };

    let buyer = party(args.buyer_target).context("invalid buyer parameters")?;
    let seller = party(args.seller_target).context("invalid seller parameters")?;
    Ok((buyer, seller))
}

fn print_outcome(strategy: StrategyKind, outcome: &Outcome) {
    println!("strategy: {}", strategy);
    for record in &outcome.timeline {
        println!(
            "round {:>2}: buyer ${:>8.2}  seller ${:>8.2}  fairness {:.3}",
            record.round, record.buyer_offer, record.seller_offer, record.simple_fairness
        );
        println!("          buyer:  {}", record.buyer_explanation);
        println!("          seller: {}", record.seller_explanation);
    }

    let agreement = &outcome.agreement;
    println!(
        "{} after {} rounds at ${:.2} (fairness {:.3}, buyer {:.3}, seller {:.3})",
        if agreement.converged { "agreed" } else { "round limit" },
        agreement.round_count,
        agreement.final_price,
        agreement.final_simple_fairness,
        agreement.buyer_utility,
        agreement.seller_utility
    );
}
