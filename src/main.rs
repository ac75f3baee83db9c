use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use alloy::primitives::Address;
use clap::{Parser, Subcommand, ValueEnum};
use eyre::{eyre, Result};
use log::info;

use lpdesk::approval::{ApprovalRecord, ApprovalState};
use lpdesk::apy::countdown::{Countdown, SystemClock};
use lpdesk::apy::{annualized_fee_yield, farm_apy, format_apy, reward_apr};
use lpdesk::config::Config;
use lpdesk::feed::ChainReader;
use lpdesk::liquidity::{Field, PoolPosition, WithdrawInput, WithdrawalCalculator, WithdrawalQuote};
use lpdesk::models::{Currency, PairStats, PoolSnapshot, StakingInfo, Token};
use lpdesk::tx::{deadline_from, remove_liquidity_candidates, CallContext};
use lpdesk::utils::app_context::AppContext;
use lpdesk::utils::constants::wrapped_native;
use lpdesk::utils::logger::setup_logger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which withdrawal field `amount` fills
#[derive(Clone, Copy, ValueEnum)]
enum InputField {
    /// Whole percent of the LP balance
    Percent,
    /// LP tokens
    Liquidity,
    /// Amount of token0
    Token0,
    /// Amount of token1
    Token1,
}

impl From<InputField> for Field {
    fn from(field: InputField) -> Self {
        match field {
            InputField::Percent => Self::Percent,
            InputField::Liquidity => Self::Liquidity,
            InputField::Token0 => Self::CurrencyA,
            InputField::Token1 => Self::CurrencyB,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the account's position in a pair
    Position {
        /// Pair address
        pair: Address,
    },
    /// Quote a withdrawal, and with --execute approve and send it
    Withdraw {
        /// Pair address
        pair: Address,
        /// Typed value
        amount: String,
        /// Field the value is typed into
        #[arg(long, value_enum, default_value = "percent")]
        field: InputField,
        /// Pay the wrapped native side out as the native coin
        #[arg(long)]
        native: bool,
        /// Submit the transactions instead of only quoting
        #[arg(long)]
        execute: bool,
    },
    /// Yield figures from indexer and staking numbers
    Apy {
        /// 24h volume in USD
        #[arg(long)]
        volume: f64,
        /// Pair reserve in USD
        #[arg(long)]
        reserve: f64,
        /// Reward tokens paid per day
        #[arg(long)]
        reward_rate: Option<f64>,
        /// Reward token price in USD
        #[arg(long, default_value_t = 0.0)]
        reward_price: f64,
        /// USD staked in the program
        #[arg(long, default_value_t = 0.0)]
        staked: f64,
    },
    /// Count down to a reward program's end
    Countdown {
        /// Unix end time; omit for a program without end
        end: Option<i64>,
        /// The program was closed out early
        #[arg(long)]
        ended: bool,
    },
}

/// The two currencies the withdrawal pays out, in token0/token1 order
fn payout_currencies(pool: &PoolSnapshot, chain_id: u64, native: bool) -> (Currency, Currency) {
    let wrapped = wrapped_native(chain_id);
    let as_currency = |token: &Token| {
        if native && wrapped.as_ref() == Some(token) {
            Currency::Native
        } else {
            Currency::Token(token.clone())
        }
    };
    (as_currency(pool.token0()), as_currency(pool.token1()))
}

fn print_quote(quote: &WithdrawalQuote, pool: &PoolSnapshot) -> Result<()> {
    println!("Pool:        {pool}");
    for token in [pool.token0(), pool.token1()] {
        println!("Price:       {}", pool.price_line(token)?);
    }
    println!("Pool share:  {}%", quote.position.share.to_fixed(2));
    println!("Removing:    {}%", quote.display_percent());
    println!("LP burned:   {}", quote.liquidity.to_significant(6));
    for (amount, minimum) in [(&quote.amount0, &quote.minimum0), (&quote.amount1, &quote.minimum1)] {
        println!(
            "Receive:     {} {} (at least {})",
            amount.to_significant(6),
            amount.token().symbol(),
            minimum.to_significant(6)
        );
    }
    Ok(())
}

async fn position(ctx: &AppContext, pair: Address) -> Result<()> {
    let account = ctx.account()?;
    let pool = ctx.client.pool_snapshot(pair).await?;
    let lp_balance = ctx.client.balance(pool.liquidity_token(), account).await?;
    let position = PoolPosition::new(&pool, &lp_balance)?;

    println!("Pool:        {pool}");
    println!("LP tokens:   {}", position.lp_balance.to_significant(6));
    println!("Pool share:  {}%", position.share.to_fixed(2));
    for pooled in [&position.pooled0, &position.pooled1] {
        println!("Pooled:      {} {}", pooled.to_significant(6), pooled.token().symbol());
    }
    Ok(())
}

async fn withdraw(ctx: &AppContext, pair: Address, amount: &str, field: InputField, native: bool, execute: bool) -> Result<()> {
    let account = ctx.account()?;
    let pool = ctx.client.pool_snapshot(pair).await?;
    let lp_balance = ctx.client.balance(pool.liquidity_token(), account).await?;

    let input = WithdrawInput::parse(field.into(), amount, pool.liquidity_token(), pool.token0(), pool.token1())?;
    let quote = WithdrawalCalculator::new(ctx.config.slippage_bps)?.quote(&pool, &lp_balance, &input)?;
    print_quote(&quote, &pool)?;
    if !execute {
        return Ok(());
    }

    let (currency_a, currency_b) = payout_currencies(&pool, ctx.config.chain_id, native);
    let lp_token = pool.liquidity_token();
    let record = Mutex::new(ApprovalRecord::new(
        Currency::Token(lp_token.clone()),
        Some(ctx.config.router),
    ));
    let ticket = {
        let mut record = record.lock().unwrap_or_else(PoisonError::into_inner);
        record.set_required(Some(quote.liquidity.clone()));
        record.ticket()
    };
    let allowance = ctx.client.allowance(lp_token, account, ctx.config.router).await?;
    let state = record
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .apply_allowance(ticket, allowance)?;

    let flow = ctx.flow();
    if state == ApprovalState::NotApproved {
        let confirmation = flow.approve(&format!("Approve {}", lp_token.symbol()), &record).await?;
        info!("main::withdraw: approval mined in block {}", confirmation.block_number);
    }
    let state = record.lock().unwrap_or_else(PoisonError::into_inner).state();

    let deadline = deadline_from(ctx.client.block_timestamp().await?, ctx.config.deadline_secs);
    let context = CallContext {
        chain_id: Some(ctx.config.chain_id),
        recipient: Some(account),
        deadline: Some(deadline),
    };
    let candidates = remove_liquidity_candidates(&quote, state, &currency_a, &currency_b, &context)?;
    let summary = quote.summary(&currency_a, &currency_b)?;
    let confirmation = flow.remove_liquidity(&summary, candidates).await?;
    println!("{summary}: mined in block {}", confirmation.block_number);

    for (id, tx) in flow.tracker().all() {
        info!("main::withdraw: #{id} {} {}", tx.status, tx.summary);
    }
    Ok(())
}

fn apy(volume: f64, reserve: f64, reward_rate: Option<f64>, reward_price: f64, staked: f64) {
    let fee = annualized_fee_yield(volume, reserve).map_or_else(|| "-".to_string(), format_apy);
    println!("Fee APY:     {fee}%");

    let Some(reward_rate) = reward_rate else {
        return;
    };
    let staking = StakingInfo {
        pair: Address::ZERO,
        reward_rate_per_day: reward_rate,
        reward_token_price_usd: reward_price,
        total_staked_usd: staked,
        period_end: None,
        ended: false,
    };
    let stats = PairStats {
        reserve_usd: reserve,
        one_day_volume_usd: Some(volume),
        ..PairStats::default()
    };
    let show = |value: Option<f64>| value.map_or_else(|| "-".to_string(), format_apy);
    println!("Reward APR:  {}%", show(reward_apr(&staking)));
    println!("Farm APY:    {}%", show(farm_apy(&staking, &stats)));
}

async fn countdown(end: Option<i64>, ended: bool) -> Result<()> {
    let program = StakingInfo {
        pair: Address::ZERO,
        reward_rate_per_day: 0.0,
        reward_token_price_usd: 0.0,
        total_staked_usd: 0.0,
        period_end: end,
        ended,
    };
    let mut countdown = Countdown::for_program(&program, SystemClock, Duration::from_secs(1));
    let mut rx = countdown.subscribe();
    println!("{}", countdown.current());
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", *rx.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                countdown.cancel();
                break;
            }
        }
    }
    countdown.stopped().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logger()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Position { pair } => {
            let ctx = AppContext::new(Config::from_env()?)?;
            position(&ctx, pair).await?;
        }
        Commands::Withdraw {
            pair,
            amount,
            field,
            native,
            execute,
        } => {
            let ctx = AppContext::new(Config::from_env()?)?;
            if execute && ctx.config.account.is_none() {
                return Err(eyre!("--execute needs LPDESK_ACCOUNT"));
            }
            withdraw(&ctx, pair, &amount, field, native, execute).await?;
        }
        Commands::Apy {
            volume,
            reserve,
            reward_rate,
            reward_price,
            staked,
        } => apy(volume, reserve, reward_rate, reward_price, staked),
        Commands::Countdown { end, ended } => countdown(end, ended).await?,
    }

    Ok(())
}
