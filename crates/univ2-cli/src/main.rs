use alloy::primitives::{Address, U256};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use univ2_quote::decimals::{format_price, parse_amount};
use univ2_quote::price::compute_inverse_price;
use univ2_quote::token::NATIVE_DECIMALS;
use univ2_quote::types::parse_address;
use univ2_quote::{
    compute_price, load_token_universe, ChainReader, DecimalsCheck, PairQueryResult,
    PairResolver, QuoteCalculator, QuoterConfig, ReserveReader, RpcChainReader, ScanConfig,
    ScanOutcome, ScanSummary, TokenDescriptor, TokenReader, TokenUniverseScanner,
};

struct AppContext {
    config: QuoterConfig,
    tokens_path: PathBuf,
    reader: Arc<dyn ChainReader>,
}

#[derive(Parser, Debug)]
#[command(name = "univ2-quote")]
#[command(about = "Uniswap V2 quote and liquidity discovery")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Token list (`{"tokens": [...]}`), JSON or `.yaml`/`.yml`.
    #[arg(long, global = true, default_value = "tokens.json")]
    tokens: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Spot price and reserves of the base token's pair with one token.
    Pair(PairArgs),
    /// Router quote for swapping base token into one token.
    Quote(QuoteArgs),
    /// Native and base token balances of an account.
    Balance(BalanceArgs),
    /// Discover pairs and quotes across the token list.
    Scan(ScanArgs),
    /// Compare configured token decimals with on-chain `decimals()`.
    CheckDecimals(CheckDecimalsArgs),
}

#[derive(Args, Debug)]
struct PairArgs {
    #[arg(long)]
    token: String,

    #[arg(long)]
    decimals: u32,
}

#[derive(Args, Debug)]
struct QuoteArgs {
    #[arg(long)]
    token: String,

    #[arg(long)]
    decimals: u32,

    /// Amount of base token, in whole units (e.g. `0.5`).
    #[arg(long, default_value = "1")]
    amount: String,
}

#[derive(Args, Debug)]
struct BalanceArgs {
    #[arg(long)]
    owner: String,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Amount of base token quoted into each token, in whole units.
    #[arg(long, default_value = "1")]
    amount: String,

    /// Network tag to scan; defaults to QUOTER_CHAIN.
    #[arg(long)]
    chain: Option<String>,

    #[arg(long)]
    concurrency: Option<usize>,

    /// Also read reserves and compute spot prices.
    #[arg(long)]
    reserves: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Args, Debug)]
struct CheckDecimalsArgs {
    #[arg(long)]
    chain: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let config = QuoterConfig::from_env()?;
    let client = reqwest::Client::new();
    let reader = RpcChainReader::connect(client, &config.rpc_url)
        .await
        .wrap_err("failed to connect to RPC node")?;

    let ctx = AppContext {
        config,
        tokens_path: cli.tokens,
        reader: Arc::new(reader),
    };

    match cli.command {
        Commands::Pair(args) => handle_pair(&ctx, args).await,
        Commands::Quote(args) => handle_quote(&ctx, args).await,
        Commands::Balance(args) => handle_balance(&ctx, args).await,
        Commands::Scan(args) => handle_scan(&ctx, args).await,
        Commands::CheckDecimals(args) => handle_check_decimals(&ctx, args).await,
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn target_token(ctx: &AppContext, address: &str, decimals: u32) -> Result<TokenDescriptor> {
    let parsed = parse_address(address)?;
    Ok(TokenDescriptor::new(
        &parsed.to_string(),
        "TOKEN",
        decimals,
        &ctx.config.chain,
    ))
}

async fn handle_pair(ctx: &AppContext, args: PairArgs) -> Result<()> {
    let base = &ctx.config.base_token;
    let base_address = base.parsed_address()?;
    let token = target_token(ctx, &args.token, args.decimals)?;
    let token_address = token.parsed_address()?;

    let resolver = PairResolver::new(ctx.reader.clone(), ctx.config.factory);
    let pair = match resolver.resolve_pair(base_address, token_address).await {
        PairQueryResult::Found(pair) => pair,
        PairQueryResult::NotFound => {
            println!("No pair exists for {} and {}", base.symbol, token_address);
            return Ok(());
        }
        PairQueryResult::CallFailed(e) => return Err(eyre!("getPair failed: {e}")),
    };

    let reader = ReserveReader::new(ctx.reader.clone());
    let meta = reader
        .pair_metadata(pair)
        .await
        .wrap_err("failed to read pair metadata")?;
    let reserves = reader
        .get_ordered_reserves(pair, base_address, token_address)
        .await
        .wrap_err("failed to read reserves")?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Pair", &pair.to_string()]);
    table.add_row(vec!["Name", &format!("{} ({})", meta.name, meta.symbol)]);
    table.add_row(vec!["LP Decimals", &meta.decimals.to_string()]);
    table.add_row(vec!["Token0", &meta.token0.to_string()]);
    table.add_row(vec!["Token1", &meta.token1.to_string()]);
    table.add_row(vec![
        format!("Reserve {}", base.symbol),
        univ2_quote::decimals::normalize(reserves.reserve_base, base.decimals)?.to_string(),
    ]);
    table.add_row(vec![
        "Reserve Token".to_string(),
        univ2_quote::decimals::normalize(reserves.reserve_quote, token.decimals)?.to_string(),
    ]);

    let updated = reserves
        .last_updated()
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "N/A".to_string());
    table.add_row(vec!["Last Updated", &updated]);

    let price = match compute_price(&reserves, base.decimals, token.decimals) {
        Ok(price) => format_price(&price),
        Err(e) => format!("unavailable ({e})"),
    };
    let inverse = match compute_inverse_price(&reserves, base.decimals, token.decimals) {
        Ok(price) => format_price(&price),
        Err(e) => format!("unavailable ({e})"),
    };
    table.add_row(vec![format!("Token per {}", base.symbol), price]);
    table.add_row(vec![format!("{} per Token", base.symbol), inverse]);

    println!("\n{}\n", table);
    Ok(())
}

async fn handle_quote(ctx: &AppContext, args: QuoteArgs) -> Result<()> {
    let base = &ctx.config.base_token;
    let token = target_token(ctx, &args.token, args.decimals)?;
    let amount_in = parse_amount(&args.amount, base.decimals)?;

    let quoter = QuoteCalculator::new(ctx.reader.clone(), ctx.config.router);
    let quote = quoter
        .quote(amount_in, base, &token)
        .await
        .wrap_err("failed to quote")?;

    println!(
        "{} {} -> {} {}",
        quote.amount_in, base.symbol, quote.amount_out, quote.token_out
    );
    Ok(())
}

async fn handle_balance(ctx: &AppContext, args: BalanceArgs) -> Result<()> {
    let owner: Address = parse_address(&args.owner)?;
    let base = &ctx.config.base_token;
    let reader = TokenReader::new(ctx.reader.clone());

    let native = reader
        .native_balance(owner)
        .await
        .wrap_err("failed to read native balance")?;
    let base_balance = reader
        .balance_of(base.parsed_address()?, owner, base.decimals)
        .await
        .wrap_err_with(|| format!("failed to read {} balance", base.symbol))?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Asset", "Balance"]);
    table.add_row(vec![
        format!("Native ({NATIVE_DECIMALS} decimals)"),
        native.to_string(),
    ]);
    table.add_row(vec![base.symbol.clone(), base_balance.to_string()]);

    println!("\n{}\n", table);
    Ok(())
}

#[derive(Serialize)]
struct ScanRow {
    symbol: String,
    address: String,
    pair_exists: bool,
    pair: Option<String>,
    amount_out: Option<String>,
    price: Option<String>,
    reserve_base: Option<String>,
    reserve_quote: Option<String>,
    error: Option<String>,
}

impl ScanRow {
    fn from_outcome(outcome: &ScanOutcome) -> Self {
        Self {
            symbol: outcome.token.symbol.clone(),
            address: outcome.token.address.clone(),
            pair_exists: outcome.pair_exists,
            pair: outcome.pair_address.map(|a| a.to_string()),
            amount_out: outcome.quote.map(|q| q.amount_out.to_string()),
            price: outcome.price.map(|p| format_price(&p)),
            reserve_base: outcome.reserves.map(|r| r.reserve_base.to_string()),
            reserve_quote: outcome.reserves.map(|r| r.reserve_quote.to_string()),
            error: outcome
                .error
                .as_ref()
                .map(|e| format!("{}: {e}", e.kind())),
        }
    }
}

async fn handle_scan(ctx: &AppContext, args: ScanArgs) -> Result<()> {
    let base = &ctx.config.base_token;
    let tokens = load_token_universe(&ctx.tokens_path)?;
    let amount_in: U256 = parse_amount(&args.amount, base.decimals)?;

    let chain = args.chain.unwrap_or_else(|| ctx.config.chain.clone());
    let config = ScanConfig::new(&chain)
        .with_concurrency(args.concurrency.unwrap_or(ctx.config.concurrency))
        .with_reserves(args.reserves);
    let scanner = TokenUniverseScanner::new(
        ctx.reader.clone(),
        ctx.config.factory,
        ctx.config.router,
        config,
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message(format!("scanning {} tokens on {chain}", tokens.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcomes = scanner.scan(base, &tokens, amount_in).await;
    pb.finish_and_clear();
    let outcomes = outcomes.wrap_err("scan aborted")?;

    let rows: Vec<ScanRow> = outcomes.iter().map(ScanRow::from_outcome).collect();
    let summary = ScanSummary::from_outcomes(&outcomes);

    match args.output {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonOutput<'a> {
                base: &'a str,
                amount_in: &'a str,
                chain: &'a str,
                tokens: Vec<ScanRow>,
                summary: ScanSummary,
            }

            let output = JsonOutput {
                base: &base.symbol,
                amount_in: &args.amount,
                chain: &chain,
                tokens: rows,
                summary,
            };
            let json_str =
                serde_json::to_string_pretty(&output).wrap_err("failed to serialize JSON")?;
            println!("{}", json_str);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            let mut header = vec![
                "Token".to_string(),
                "Pair".to_string(),
                format!("Out per {} {}", args.amount, base.symbol),
            ];
            if args.reserves {
                header.push(format!("Price per {}", base.symbol));
            }
            header.push("Error".to_string());
            table.set_header(header);

            for row in rows {
                let mut cells = vec![
                    row.symbol,
                    row.pair.unwrap_or_else(|| "-".to_string()),
                    row.amount_out.unwrap_or_else(|| "-".to_string()),
                ];
                if args.reserves {
                    cells.push(row.price.unwrap_or_else(|| "-".to_string()));
                }
                cells.push(row.error.unwrap_or_default());
                table.add_row(cells);
            }

            println!("\n{}\n", table);
            println!(
                "Scanned {} tokens: {} pairs, {} quotes, {} errors",
                summary.scanned, summary.pairs_found, summary.quoted, summary.errors
            );
        }
    }

    info!(chain = %chain, scanned = summary.scanned, "scan command finished");
    Ok(())
}

async fn handle_check_decimals(ctx: &AppContext, args: CheckDecimalsArgs) -> Result<()> {
    let tokens = load_token_universe(&ctx.tokens_path)?;
    let chain = args.chain.unwrap_or_else(|| ctx.config.chain.clone());

    let reader = TokenReader::new(ctx.reader.clone());
    let results = reader
        .check_universe(&tokens, &chain)
        .await
        .wrap_err("decimals verification aborted")?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Token", "Address", "Configured", "On-chain", "Status"]);

    for (token, check) in &results {
        let (actual, status) = match check {
            DecimalsCheck::Match(actual) => (actual.to_string(), "ok".to_string()),
            DecimalsCheck::Mismatch { actual, .. } => (actual.to_string(), "MISMATCH".to_string()),
            DecimalsCheck::Unavailable(e) => ("-".to_string(), format!("unavailable: {e}")),
        };
        table.add_row(vec![
            token.symbol.clone(),
            token.address.clone(),
            token.decimals.to_string(),
            actual,
            status,
        ]);
    }

    println!("\n{}\n", table);
    Ok(())
}
