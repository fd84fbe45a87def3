//! Load Testing Tool
//!
//! Fires concurrent random transfers between a pool of in-memory accounts
//! and checks that the total balance is unchanged afterwards.
//!
//! Run with: cargo run --bin load_test --release -- --accounts 20 --transfers 5000

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use rust_decimal::Decimal;

use wallet_engine::domain::{AccountNumber, OperationContext};
use wallet_engine::guard::{PinGuard, PinHashing};
use wallet_engine::handlers::{
    CreateAccountCommand, CreateAccountHandler, DepositCommand, DepositHandler, TransferCommand,
    TransferHandler,
};
use wallet_engine::store::{MemoryStore, WalletStore};
use wallet_engine::Currency;

const PIN: &str = "1234";
const OPENING_BALANCE: &str = "1000.00";

fn arg(args: &[String], name: &str, default: usize) -> usize {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let account_count = arg(&args, "--accounts", 20).max(2);
    let transfer_count = arg(&args, "--transfers", 5000);

    println!(
        "Load Test - {} transfers across {} accounts",
        transfer_count, account_count
    );

    let store: Arc<dyn WalletStore> = Arc::new(MemoryStore::new());
    // Minimal hashing cost; this measures the ledger, not argon2
    let guard = PinGuard::new(
        store.clone(),
        PinHashing {
            memory_kib: 8,
            iterations: 1,
        },
    );
    let accounts = CreateAccountHandler::new(store.clone());
    let deposits = DepositHandler::new(store.clone());
    let transfers = Arc::new(TransferHandler::new(store.clone(), guard.clone()));
    let context = OperationContext::new();

    let mut wallets: Vec<(uuid::Uuid, AccountNumber)> = Vec::with_capacity(account_count);
    for i in 0..account_count {
        let command = CreateAccountCommand::new(
            format!("Load{i}"),
            "Tester".to_string(),
            format!("load{i}@example.com"),
            "08000000000".to_string(),
        );
        let created = accounts.execute(command, &context).await?;
        let profile = created
            .data
            .ok_or_else(|| anyhow::anyhow!("signup returned no profile"))?;

        guard.set_pin(profile.id, PIN).await?;
        deposits
            .execute(
                DepositCommand::new(profile.id, Currency::NairaWallet, OPENING_BALANCE.to_string()),
                &context,
            )
            .await?;
        wallets.push((profile.id, profile.account_number));
    }
    let wallets = Arc::new(wallets);

    let start = Instant::now();
    let mut tasks = Vec::with_capacity(transfer_count);
    for _ in 0..transfer_count {
        let wallets = wallets.clone();
        let transfers = transfers.clone();
        let (from, to, cents) = {
            let mut rng = rand::thread_rng();
            let from = rng.gen_range(0..wallets.len());
            let mut to = rng.gen_range(0..wallets.len() - 1);
            if to >= from {
                to += 1;
            }
            (from, to, rng.gen_range(1..5_000i64))
        };

        tasks.push(tokio::spawn(async move {
            let command = TransferCommand::new(
                wallets[from].0,
                wallets[to].1.to_string(),
                Currency::NairaWallet,
                Decimal::new(cents, 2).to_string(),
                PIN.to_string(),
            );
            transfers.execute(command, &OperationContext::new()).await
        }));
    }

    let mut success_count = 0u64;
    let mut rejected_count = 0u64;
    for task in tasks {
        match task.await? {
            Ok(_) => success_count += 1,
            Err(_) => rejected_count += 1,
        }
    }
    let elapsed = start.elapsed();

    let mut total = Decimal::ZERO;
    for (id, _) in wallets.iter() {
        if let Some(account) = store.get_by_id(*id).await? {
            total += account.balance(Currency::NairaWallet).value();
        }
    }
    let expected = Decimal::from(account_count as u64) * OPENING_BALANCE.parse::<Decimal>()?;

    let rate = transfer_count as f64 / elapsed.as_secs_f64();

    println!("\n=== Load Test Results ===");
    println!("Total transfers: {}", transfer_count);
    println!("Successful: {}", success_count);
    println!("Rejected: {}", rejected_count);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} transfers/sec", rate);
    println!("Total balance: {} (expected {})", total, expected);

    if total != expected {
        anyhow::bail!("balance not conserved: {total} != {expected}");
    }

    Ok(())
}
