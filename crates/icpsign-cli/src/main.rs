//! Command-line interface for icpsign.
//!
//! Produces a detached CAdES-BES (`.p7s`) or PAdES-BES signature over a file
//! using a PKCS#12 certificate.

use clap::{Parser, ValueEnum};
use icpsign::{AttributeOrder, CadesSigner, ExternalSigner, PadesSigner, SignContent};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    /// Detached CAdES-BES with signingTime
    Cades,
    /// PAdES-BES CMS for a PDF byte range, without signingTime
    Pades,
}

#[derive(Parser)]
#[command(name = "icpsign")]
#[command(about = "ICP-Brasil CAdES/PAdES signature tool")]
struct Cli {
    /// Content to sign (whole document for CAdES, PDF byte range for PAdES)
    input: PathBuf,

    /// PKCS#12 file (.p12/.pfx)
    #[arg(short = 'p', long)]
    pkcs12: PathBuf,

    /// Password for the PKCS#12 file
    #[arg(long)]
    password: Option<String>,

    /// Signature profile
    #[arg(long, value_enum, default_value = "cades")]
    profile: ProfileArg,

    /// Output file (default: <INPUT>.p7s)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sort signed attributes canonically instead of insertion order
    #[arg(long)]
    canonical_attrs: bool,

    /// Require the PKCS#12 file to be a single DER value
    #[arg(long)]
    strict: bool,

    /// Write uppercase hex (for /Contents) instead of DER
    #[arg(long)]
    hex: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let content = std::fs::read(&cli.input)?;
    let p12_data = std::fs::read(&cli.pkcs12)?;
    let password = cli.password.clone().unwrap_or_default();
    let order = if cli.canonical_attrs {
        AttributeOrder::Canonical
    } else {
        AttributeOrder::Insertion
    };

    let cms = match cli.profile {
        ProfileArg::Cades => CadesSigner::new()
            .pkcs12(p12_data)
            .password(password)
            .strict(cli.strict)
            .attribute_order(order)
            .sign_detached(&content)?,
        ProfileArg::Pades => PadesSigner::new(p12_data, password)
            .strict(cli.strict)
            .attribute_order(order)
            .sign(SignContent::Bytes(&content))?,
    };

    let output = cli.output.clone().unwrap_or_else(|| {
        let mut out = cli.input.clone().into_os_string();
        out.push(".p7s");
        PathBuf::from(out)
    });

    if cli.hex {
        std::fs::write(&output, icpsign::placeholder_hex(&cms, cms.len())?)?;
    } else {
        std::fs::write(&output, &cms)?;
    }

    log::info!("Wrote {} bytes of CMS", cms.len());
    println!("Signed: {}", output.display());
    Ok(())
}
