use anyhow::{Context, Result};
use app_config::AppConfig;
use banks::boa::BoaVerifier;
use banks::cbe::CbeVerifier;
use banks::gemini::GeminiClient;
use banks::mock::{MockOcr, MockQrDecoder, MockVerifier};
use banks::qr_image::RqrrDecoder;
use banks::{BankVerifier, OcrIdExtractor, QrDecoder};
use banks::telebirr::TelebirrVerifier;
use clap::{Parser, Subcommand, ValueEnum};
use payverify_core::gate::BankKind;
use pipeline::{verify_with_retry, EvidenceKind, ImageVerifier, RetryOutcome, VerificationStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "payverify", about = "Verify Ethiopian bank payment receipts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BankArg {
    Cbe,
    Boa,
    Telebirr,
}

impl From<BankArg> for BankKind {
    fn from(bank: BankArg) -> Self {
        match bank {
            BankArg::Cbe => BankKind::Cbe,
            BankArg::Boa => BankKind::Boa,
            BankArg::Telebirr => BankKind::Telebirr,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Verify a payment by its transaction reference
    Verify {
        #[arg(value_enum)]
        bank: BankArg,
        transaction_id: String,
        /// CBE: payer account number; BOA: last 5 digits of the payer account
        #[arg(long)]
        account: Option<String>,
    },
    /// Verify a payment from a receipt image (QR code or OCR)
    VerifyImage {
        #[arg(value_enum)]
        bank: BankArg,
        image: PathBuf,
        /// CBE: payer account number, unless the QR code carries one
        #[arg(long)]
        account: Option<String>,
    },
    /// List stored verifications, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Store the Gemini API key in the OS keychain
    SetGeminiKey { key: String },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn create_verifier(
    cfg: &AppConfig,
    bank: BankKind,
    gemini: &Arc<GeminiClient>,
) -> Result<Arc<dyn BankVerifier>> {
    if cfg.provider.kind == "mock" {
        tracing::warn!(%bank, "using mock bank verifier");
        return Ok(Arc::new(MockVerifier::new_succeeding(bank)));
    }
    Ok(match bank {
        BankKind::Cbe => Arc::new(CbeVerifier::new(
            cfg.banks.cbe_base_url.clone(),
            Arc::clone(gemini),
        )?),
        BankKind::Boa => Arc::new(BoaVerifier::new(
            cfg.banks.boa_api_url.clone(),
            cfg.banks.boa_slip_url.clone(),
        )?),
        BankKind::Telebirr => Arc::new(TelebirrVerifier::new(cfg.banks.telebirr_base_url.clone())?),
    })
}

fn store_and_print(
    cfg: &AppConfig,
    bank: BankKind,
    evidence: EvidenceKind,
    outcome: RetryOutcome,
    attempts: usize,
    record: &payverify_core::TransactionRecord,
) -> Result<()> {
    let store = VerificationStore::open(&cfg.history_path, &cfg.audit_path)?;
    let request_id = store.save(bank, evidence, outcome, attempts, record)?;
    tracing::info!(%request_id, status = %record.status, "verification stored");
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

async fn run_verify(
    cfg: &AppConfig,
    gemini: &Arc<GeminiClient>,
    bank: BankKind,
    transaction_id: &str,
    account: Option<&str>,
) -> Result<()> {
    let verifier = create_verifier(cfg, bank, gemini)?;
    let (record, outcome, attempts) = match bank {
        BankKind::Telebirr => {
            let report = verify_with_retry(
                verifier.as_ref(),
                transaction_id,
                account,
                cfg.max_ambiguous_positions,
            )
            .await;
            (report.record, report.outcome, report.attempts)
        }
        _ => {
            let record = verifier.verify(transaction_id, account).await;
            let outcome = if record.status.is_success() {
                RetryOutcome::Verified
            } else {
                RetryOutcome::Failed
            };
            (record, outcome, 1)
        }
    };
    store_and_print(cfg, bank, EvidenceKind::Reference, outcome, attempts, &record)
}

async fn run_verify_image(
    cfg: &AppConfig,
    gemini: &Arc<GeminiClient>,
    bank: BankKind,
    image_path: &PathBuf,
    account: Option<&str>,
) -> Result<()> {
    let image = std::fs::read(image_path)
        .with_context(|| format!("failed to read image {}", image_path.display()))?;

    let (qr, ocr): (Arc<dyn QrDecoder>, Arc<dyn OcrIdExtractor>) = if cfg.provider.kind == "mock" {
        (Arc::new(MockQrDecoder::default()), Arc::new(MockOcr::default()))
    } else {
        (Arc::new(RqrrDecoder), Arc::clone(gemini) as Arc<dyn OcrIdExtractor>)
    };

    let verifier = create_verifier(cfg, bank, gemini)?;
    let flow = ImageVerifier::new(qr, ocr, cfg.max_ambiguous_positions);
    let report = flow.verify_image(verifier.as_ref(), &image, account).await;

    store_and_print(
        cfg,
        bank,
        EvidenceKind::Image,
        report.outcome,
        report.attempts,
        &report.record,
    )
}

fn run_history(cfg: &AppConfig, limit: usize) -> Result<()> {
    let store = VerificationStore::open(&cfg.history_path, &cfg.audit_path)?;
    let listed = store.list()?;
    let page: Vec<_> = listed.into_iter().take(limit).collect();
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = app_config::load().unwrap_or_default();
    let gemini = Arc::new(GeminiClient::new(app_config::gemini_api_key())?);
    if !gemini.is_configured() {
        tracing::info!("no Gemini API key configured, AI-assisted extraction disabled");
    }

    match cli.command {
        Command::Verify {
            bank,
            transaction_id,
            account,
        } => {
            run_verify(&cfg, &gemini, bank.into(), &transaction_id, account.as_deref()).await?;
        }
        Command::VerifyImage {
            bank,
            image,
            account,
        } => {
            run_verify_image(&cfg, &gemini, bank.into(), &image, account.as_deref()).await?;
        }
        Command::History { limit } => run_history(&cfg, limit)?,
        Command::SetGeminiKey { key } => {
            app_config::store_secret(app_config::GEMINI_KEY_NAME, &key)?;
            println!("Gemini API key stored in the OS keychain.");
        }
    }
    Ok(())
}
