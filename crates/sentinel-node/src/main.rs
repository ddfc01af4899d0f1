//! Async demo harness. Wires `sentinel-cycle`'s `Controller` against
//! `sentinel-scaffold`'s deterministic in-memory Mutator/Evaluator and runs
//! cycles on an interval, the way `src/main.rs`'s `AppState` drives
//! `run_main_loop` on a tick interval racing `signal::ctrl_c()` for
//! graceful shutdown. This binary is a reference harness for the core's
//! external entrypoints, not a production evaluation suite (spec's
//! Non-goals: no model training or real evaluation harness ships here).

use std::time::Duration;

use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sentinel_cycle::Controller;
use sentinel_ledger::Ledger;
use sentinel_scaffold::{InMemoryEvaluator, Mutator as ScaffoldMutator, ParametricSweepMutator};
use sentinel_types::{Policy, State};

struct MutatorAdapter(ParametricSweepMutator);
impl sentinel_cycle::Mutator for MutatorAdapter {
    fn propose(&self, champion: &State, n: usize, seed: u64) -> Vec<State> {
        ScaffoldMutator::propose(&self.0, champion, n, seed)
    }
}

struct EvaluatorAdapter(InMemoryEvaluator);
impl sentinel_cycle::Evaluator for EvaluatorAdapter {
    fn evaluate(&self, challenger: &State, seed: u64, deadline_ms: i64) -> Result<sentinel_types::Evidence, sentinel_types::SentinelError> {
        sentinel_scaffold::Evaluator::evaluate(&self.0, challenger, seed, deadline_ms)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("sentinel-node demo harness starting…");

    let ledger_path = std::env::var("SENTINEL_LEDGER_PATH").unwrap_or_else(|_| "sentinel_ledger.jsonl".to_string());
    let n_params: usize = std::env::var("SENTINEL_N_PARAMS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4);
    let tick_ms: u64 = std::env::var("SENTINEL_TICK_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1_000);

    let policy = Policy::default_for_dims(n_params);
    let ledger = Ledger::open_or_create(&ledger_path, policy.hash_algorithm)?;
    let state = State::genesis(vec![0.0; n_params], now_ms());

    info!(ledger_path, n_params, tick_ms, "controller initialized");

    let controller = Controller::new(state, policy, ledger, 0.0);

    let shutdown = shutdown_notify();
    let main_loop = run_cycles(controller, tick_ms, shutdown.clone());

    tokio::select! {
        res = main_loop => {
            if let Err(e) = res {
                error!(error = %e, "cycle loop exited with error");
            }
        }
        _ = signal::ctrl_c() => {
            info!("received Ctrl-C, initiating graceful shutdown");
        }
    }

    info!("sentinel-node demo harness stopped.");
    Ok(())
}

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// One tick per cycle: propose challengers, evaluate, run the full
/// dataflow, append the resulting PCAg, and log the verdict. Runs until
/// `shutdown` flips or a `LedgerError` ends the loop (the one condition
/// the core itself treats as fatal rather than recordable).
async fn run_cycles(mut controller: Controller, tick_ms: u64, shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<()> {
    let mutator = MutatorAdapter(ParametricSweepMutator::default());
    let evaluator = EvaluatorAdapter(InMemoryEvaluator::default());
    let interval = Duration::from_millis(tick_ms);
    let mut cycle_seed: u64 = 1;

    loop {
        if *shutdown.borrow() {
            info!("shutdown signal observed; exiting cycle loop");
            break;
        }

        let tick_start = tokio::time::Instant::now();
        let now_ms = now_ms();
        let deadline_ms = now_ms + 2_000;

        let pcag = controller.cycle(&mutator, &evaluator, 5, cycle_seed, deadline_ms, now_ms)?;
        info!(
            cycle_id = %pcag.cycle_id,
            action = ?pcag.verdict.action,
            l_inf_champion = pcag.l_inf_champion,
            l_inf_challenger = pcag.l_inf_challenger,
            alpha_eff = pcag.alpha_eff,
            "cycle completed"
        );

        cycle_seed = cycle_seed.wrapping_add(1);

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }

    Ok(())
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A `watch` channel flipped to `true` on Ctrl-C, mirroring
/// `utils::shutdown_notify`'s shape in the teacher's binary.
fn shutdown_notify() -> tokio::sync::watch::Receiver<bool> {
    let (tx, rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        let _ = tx.send(true);
    });
    rx
}
