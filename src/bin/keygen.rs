//! Key generator: produces a compatible RSA-style key pair and writes
//! the public and private composite-key files a node (or wallet) needs.

use std::path::PathBuf;

use clap::Parser;

/// Generates a composite key pair and writes `<out>.pub` / `<out>.priv`.
#[derive(Parser, Debug)]
#[command(name = "simplecoin-keygen", version, about)]
struct Cli {
    /// Output path prefix; writes `<prefix>.pub` and `<prefix>.priv`.
    #[arg(long, default_value = "wallet")]
    out: PathBuf,

    /// Prime bit length for each of the two factors of the modulus.
    #[arg(long, default_value_t = 2048)]
    bits: u32,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (public, private) = simplecoin::keys::generate_keypair(cli.bits);

    let pub_path = cli.out.with_extension("pub");
    let priv_path = cli.out.with_extension("priv");

    if let Err(e) = std::fs::write(&pub_path, public.to_wire()) {
        eprintln!("failed to write {}: {e}", pub_path.display());
        return std::process::ExitCode::FAILURE;
    }
    if let Err(e) = std::fs::write(&priv_path, private.to_wire()) {
        eprintln!("failed to write {}: {e}", priv_path.display());
        return std::process::ExitCode::FAILURE;
    }

    println!("wrote {}", pub_path.display());
    println!("wrote {}", priv_path.display());
    std::process::ExitCode::SUCCESS
}
