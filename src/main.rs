//! `spectre-pse` probe: runs one contract query or transaction from env config.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use spectre_pse_client::abi::{from_hex, to_hex};
use spectre_pse_client::app::{Constructor, SpectrePse};
use spectre_pse_client::config::ClientConfig;
use spectre_pse_client::domain::{
    AccountId, CallOptions, ContractRpc, ContractVersion, ExtrinsicSigner, InstantiateOptions,
    MessageResult, Network, SigningResult,
};
use spectre_pse_client::infra::Ed25519ExtrinsicSigner;

const USAGE: &str = "usage: spectre-pse <command>

commands:
  health                       check the node is reachable
  test                         call the contract's `test` message
  public-keys                  caller's trading keys
  sign <network> <0xhex>       sign with the caller's trading key
  sign-text <text>             v1 contract-wide signature
  verify <text> <0xsig>        v1 signature check
  register <0xhex>             register_trading_account_to_spectre
  generate [--submit]          dry-run (or submit) key generation
  address [<0xseed>]           address the configured signer would deploy to
  deploy [<0xseed>]            instantiate from SPECTRE_CODE_HASH";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Render a two-layer result with byte payloads as hex.
fn signing_json(result: &MessageResult<SigningResult<Vec<u8>>>) -> Value {
    match result {
        Ok(Ok(bytes)) => json!({ "ok": to_hex(bytes) }),
        Ok(Err(error)) => json!({ "error": format!("{error:?}") }),
        Err(lang) => json!({ "lang_error": format!("{lang:?}") }),
    }
}

fn constructor_for(version: ContractVersion, seed: Option<&String>) -> Result<Constructor> {
    match (version, seed) {
        (ContractVersion::V3, Some(seed)) => Ok(Constructor::Seeding {
            seed: from_hex(seed).context("seed must be hex")?,
        }),
        (ContractVersion::V3, None) => bail!("v3 contracts need a seed"),
        (_, None) => Ok(Constructor::Default),
        (_, Some(_)) => bail!("{version} contracts take no constructor arguments"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{USAGE}");
        return Ok(());
    };

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    info!(
        rpc_url = %config.rpc_url,
        version = %config.version,
        "Spectre PSE client v{}",
        env!("CARGO_PKG_VERSION")
    );

    let rpc: Arc<dyn ContractRpc> = Arc::new(config.rpc_client()?);
    let signer = config.signer()?;
    if signer.is_none() {
        warn!("SPECTRE_SIGNER_SEED not set; transactions are unavailable");
    }
    let origin = config
        .origin
        .or_else(|| signer.as_ref().map(Ed25519ExtrinsicSigner::account_id));

    let require_origin = || -> Result<AccountId> {
        origin.context("set SPECTRE_ORIGIN or SPECTRE_SIGNER_SEED to choose a caller")
    };
    let require_signer = || {
        signer
            .as_ref()
            .context("SPECTRE_SIGNER_SEED is required for this command")
    };
    let contract = || -> Result<SpectrePse> { Ok(config.contract(Arc::clone(&rpc))?) };
    let options = CallOptions::default();

    match (command, &args[1..]) {
        ("health", []) => {
            rpc.health_check().await?;
            print_json(json!({ "healthy": true }))
        }
        ("test", []) => {
            let outcome = contract()?.query().test(&require_origin()?, &options).await?;
            print_json(json!({
                "ok": outcome.output.is_ok(),
                "gas_required": outcome.gas_required,
            }))
        }
        ("public-keys", []) => {
            let outcome = contract()?
                .query()
                .get_public_keys(&require_origin()?, &options)
                .await?;
            print_json(serde_json::to_value(&outcome)?)
        }
        ("sign", [network, message]) => {
            let network: Network = network.parse().map_err(anyhow::Error::msg)?;
            let message = from_hex(message).context("message must be hex")?;
            let outcome = contract()?
                .query()
                .sign(&require_origin()?, &options, network, &message)
                .await?;
            print_json(signing_json(&outcome.output))
        }
        ("sign-text", [text]) => {
            let outcome = contract()?
                .query()
                .sign_text(&require_origin()?, &options, text)
                .await?;
            print_json(signing_json(&outcome.output.map(Ok)))
        }
        ("verify", [text, signature]) => {
            let signature = from_hex(signature).context("signature must be hex")?;
            let outcome = contract()?
                .query()
                .verify(&require_origin()?, &options, text, &signature)
                .await?;
            print_json(serde_json::to_value(&outcome.output)?)
        }
        ("register", [message]) => {
            let message = from_hex(message).context("message must be hex")?;
            let outcome = contract()?
                .query()
                .register_trading_account_to_spectre(&require_origin()?, &options, &message)
                .await?;
            print_json(signing_json(&outcome.output))
        }
        ("generate", rest) => {
            let contract = contract()?;
            let submit = matches!(rest, [flag] if flag == "--submit");
            if submit {
                let tx = contract.tx();
                let submittable = match contract.version() {
                    ContractVersion::V2 => tx.generate_onchain_trader_keys(&config.tx_options())?,
                    _ => tx.generate_onchain_trading_account(&config.tx_options())?,
                };
                let hash = contract.submit(&submittable, require_signer()?).await?;
                print_json(json!({ "tx_hash": hash }))
            } else {
                let query = contract.query();
                let origin = require_origin()?;
                let raw = match contract.version() {
                    ContractVersion::V2 => {
                        query.generate_onchain_trader_keys(&origin, &options).await?
                    }
                    _ => {
                        query
                            .generate_onchain_trading_account(&origin, &options)
                            .await?
                    }
                };
                let decoded: MessageResult<SigningResult<()>> = raw.decode()?;
                print_json(json!({
                    "reverted": raw.did_revert(),
                    "result": format!("{decoded:?}"),
                }))
            }
        }
        ("address", rest) => {
            let factory = config.factory(Arc::clone(&rpc))?;
            let constructor = constructor_for(config.version, rest.first())?;
            let address = factory.address_for(&require_origin()?, &constructor, &[])?;
            print_json(json!({ "address": address, "hex": address.to_hex() }))
        }
        ("deploy", rest) => {
            let factory = config.factory(Arc::clone(&rpc))?;
            let constructor = constructor_for(config.version, rest.first())?;
            let deployed = factory
                .instantiate(require_signer()?, constructor, InstantiateOptions::default())
                .await?;
            print_json(json!({ "address": deployed.address() }))
        }
        _ => {
            eprintln!("{USAGE}");
            bail!("unknown command or wrong arguments: {}", args.join(" "))
        }
    }
}
