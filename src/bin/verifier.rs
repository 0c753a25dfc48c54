//! Minimal CLI verifier
//!
//! Reads a strict, versioned proof file:
//!   magic: b"GKRPRF1\0" (8 bytes) + u16 version (=1) + ark-compressed `Proof`
//!
//! The public statement is rebuilt from the same configuration the prover
//! used (the demo inputs are seeded), then checked with
//! `gkrzkp::verify_statement`. The proof header is compared against the
//! configuration first so mismatches are reported in plain terms.

#![forbid(unsafe_code)]

use std::env;

use gkrzkp::{api::io, config::DemoConfig, demo, hash::HashRegistry, verify_statement};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "gkrzkp=info,verifier=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let cfg = DemoConfig::load(&args).map_err(|e| anyhow::anyhow!("config: {e}"))?;
    info!(proof = %cfg.proof_path.display(), hash = %cfg.hash, nonce = cfg.nonce, "verifier starting");

    let proof = io::read_proof(&cfg.proof_path)?;
    if proof.header.lanes != cfg.lanes as u64 {
        warn!(header = proof.header.lanes, config = cfg.lanes, "lane count differs from configuration");
    }

    let demo = demo::pairwise_add(&cfg).map_err(|e| anyhow::anyhow!("rebuild statement: {e}"))?;
    let circuit = demo.solution.circuit();
    let statement = demo.solution.statement();

    eprintln!();
    eprintln!("Proof parameters:");
    eprintln!("  Version:          {}", proof.header.version);
    eprintln!("  Lanes:            {}", proof.header.lanes);
    eprintln!("  Variables:        {}", proof.header.num_vars);
    eprintln!("  Wire proofs:      {}", proof.wire_proofs.len());
    eprintln!("  Sum-check rounds: {}", proof.round_count());
    eprintln!();
    eprintln!("Running verification...");

    let registry = HashRegistry::with_defaults();
    verify_statement(circuit, &statement, &registry, &cfg.hash, cfg.nonce, &proof)
        .map_err(|e| anyhow::anyhow!("verification failed: {e}"))?;

    eprintln!("✓ VERIFICATION SUCCESSFUL");
    println!("Verifier result: ok");
    Ok(())
}
