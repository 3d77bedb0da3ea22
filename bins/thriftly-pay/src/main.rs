//! thriftly-pay: eSewa signing and callback verification from the terminal.
//!
//! Used to produce test payments against the eSewa sandbox and to check
//! callbacks captured from production logs.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use thriftly_esewa::prelude::*;
use thriftly_esewa::{StatusQuery, VerifiedCallback};
use thriftly_telemetry::{Event, LogFormat, TelemetryConfig};

/// eSewa payment signing toolkit
#[derive(Parser)]
#[command(name = "thriftly-pay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// TOML gateway configuration (defaults to ESEWA_* environment variables)
    #[arg(short, long, global = true, conflicts_with = "sandbox")]
    config: Option<PathBuf>,

    /// Use eSewa's public test merchant
    #[arg(long, global = true)]
    sandbox: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign arbitrary fields in the given order
    Sign {
        /// Field as name=value, repeatable, order preserved
        #[arg(short, long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Build a signed payment form
    Initiate {
        /// Item amount, e.g. 150.00
        #[arg(short, long)]
        amount: Amount,

        /// Tax amount
        #[arg(long, default_value = "0")]
        tax: Amount,

        /// Service charge
        #[arg(long, default_value = "0")]
        service_charge: Amount,

        /// Delivery charge
        #[arg(long, default_value = "0")]
        delivery_charge: Amount,

        /// Unsigned extra field as name=value
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Print an auto-submitting HTML form
        #[arg(long)]
        html: bool,
    },

    /// Verify a callback `data` value
    Verify {
        /// Base64 envelope, or a full `data=...` query string
        data: String,

        /// Also reconcile against this transaction uuid
        #[arg(long, requires = "expect_amount")]
        expect_uuid: Option<String>,

        /// Also reconcile against this amount
        #[arg(long, requires = "expect_uuid")]
        expect_amount: Option<Amount>,
    },

    /// Print the status-check URL for an attempt
    StatusUrl {
        /// Transaction uuid
        #[arg(long)]
        uuid: String,

        /// Total amount
        #[arg(long)]
        amount: Amount,
    },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

/// Accept either a captured redirect query or a bare base64 envelope
fn callback_query(data: &str) -> String {
    let data = data.trim();
    if data.starts_with("data=") || data.starts_with('?') || data.contains('&') {
        data.trim_start_matches('?').to_string()
    } else {
        format!("data={}", data.replace('+', "%2B"))
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    if cli.sandbox {
        return Ok(GatewayConfig::sandbox());
    }
    match &cli.config {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None => GatewayConfig::from_env().context("reading ESEWA_* environment"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    };
    let format = if cli.json { LogFormat::Json } else { LogFormat::Compact };
    if let Err(e) = thriftly_telemetry::init_with_config(telemetry.with_format(format)) {
        eprintln!("{} {e}", "warning:".yellow());
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Sign { fields } => {
            let signer = Signer::from_config(&config)?;
            let fields: SignedFields = fields.iter().cloned().collect();
            let signature = signer.sign_fields(&fields)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "message": fields.message(),
                        "signed_field_names": fields.field_names(),
                        "signature": signature,
                    })
                );
            } else {
                println!("Message:   {}", fields.message());
                println!("Signature: {}", signature.green());
            }
        }

        Commands::Initiate {
            amount,
            tax,
            service_charge,
            delivery_charge,
            fields,
            html,
        } => {
            let initiator = PaymentInitiator::new(&config)?;
            let mut request = PaymentRequest::new(*amount)
                .with_tax(*tax)
                .with_service_charge(*service_charge)
                .with_delivery_charge(*delivery_charge);
            for (name, value) in fields {
                request = request.with_field(name, value);
            }
            let form = initiator.initiate(&request)?;

            if *html {
                print!("{}", form.to_html());
            } else if cli.json {
                println!("{}", serde_json::to_string_pretty(&form)?);
            } else {
                println!("POST {}", form.action.cyan());
                for (name, value) in &form.fields {
                    println!("  {name:<24} {value}");
                }
                println!(
                    "\nRecord before redirecting: transaction_uuid={} total_amount={}",
                    form.transaction_uuid.bold(),
                    form.total_amount.bold()
                );
            }
        }

        Commands::Verify {
            data,
            expect_uuid,
            expect_amount,
        } => {
            let handler = CallbackHandler::new(CallbackVerifier::from_config(&config)?);
            let query = callback_query(data);

            let verified = match handler.handle(CallbackRoute::Success, &query) {
                Ok(verified) => verified,
                Err(failure) => return Ok(report_failure(cli.json, &failure)),
            };

            if let (Some(uuid), Some(amount)) = (expect_uuid, expect_amount) {
                let expected = ExpectedOrder::new(TransactionUuid::parse(uuid.clone())?, *amount);
                if let Err(e) = verified.reconcile(&expected) {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::json!({"code": "reconcile_failed", "detail": e.to_string()})
                        );
                    } else {
                        eprintln!("{} {e}", "rejected:".red().bold());
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }

            report_success(cli.json, &verified);
        }

        Commands::StatusUrl { uuid, amount } => {
            let query = StatusQuery {
                product_code: config.product_code.clone(),
                total_amount: *amount,
                transaction_uuid: TransactionUuid::parse(uuid.clone())?,
            };
            println!("{}", query.url(&config.status_url)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_failure(json: bool, failure: &CallbackFailure) -> ExitCode {
    if json {
        println!("{}", serde_json::json!(failure));
    } else {
        eprintln!("{} {} ({})", "rejected:".red().bold(), failure, failure.code());
    }
    ExitCode::FAILURE
}

fn report_success(json: bool, verified: &VerifiedCallback) {
    let fields: serde_json::Map<String, serde_json::Value> = verified
        .signed_fields()
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    let event = Event::new("callback_verified", serde_json::Value::Object(fields));
    event.log();

    if json {
        println!("{}", serde_json::json!({"code": "accepted", "fields": event.data}));
    } else {
        println!("{}", "accepted".green().bold());
        for (name, value) in verified.signed_fields().iter() {
            println!("  {name:<20} {value}");
        }
    }
}
