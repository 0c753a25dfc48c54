//! Minimal CLI prover
//!
//! Builds the demo pairwise-add sub-circuit, checks its exports natively,
//! proves it, and writes a strict, versioned proof file:
//!   magic: b"GKRPRF1\0" (8 bytes) + u16 version (=1) + ark-compressed `Proof`
//!
//! Configuration: `--config <json>`, `GKR_*` env vars, then the flags
//! `--lanes`, `--hash`, `--nonce`, `--seed`, `--proof` (see `gkrzkp::config`).

#![forbid(unsafe_code)]

use std::env;

use ark_serialize::CanonicalSerialize;
use gkrzkp::{api::io, config::DemoConfig, demo, hash::HashRegistry, F};
use tracing::info;

fn digest_hex(d: &F) -> anyhow::Result<String> {
    let mut bytes = Vec::new();
    d.serialize_compressed(&mut bytes).map_err(|e| anyhow::anyhow!("serialize digest: {e}"))?;
    bytes.reverse();
    Ok(hex::encode(bytes))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "gkrzkp=info,prover=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let cfg = DemoConfig::load(&args).map_err(|e| anyhow::anyhow!("config: {e}"))?;
    info!(lanes = cfg.lanes, hash = %cfg.hash, nonce = cfg.nonce, seed = cfg.seed, "prover starting");

    let registry = HashRegistry::with_defaults();
    if !registry.contains(&cfg.hash) {
        let known: Vec<&str> = registry.names().collect();
        return Err(anyhow::anyhow!("unknown hash `{}` (registered: {})", cfg.hash, known.join(", ")));
    }

    let demo = demo::pairwise_add(&cfg).map_err(|e| anyhow::anyhow!("build demo circuit: {e}"))?;
    let engine = demo.check_exports_natively().map_err(|e| anyhow::anyhow!("export check: {e}"))?;

    eprintln!("Generating proof...");
    let proof = demo
        .solution
        .prove(&registry, &cfg.hash, cfg.nonce)
        .map_err(|e| anyhow::anyhow!("prover failed: {e}"))?;
    let written = io::write_proof(&cfg.proof_path, &proof)?;

    let circuit = demo.solution.circuit();
    eprintln!();
    eprintln!("Sub-circuit:");
    eprintln!("  Gates:            {}", circuit.len());
    eprintln!("  Lanes:            {} (padded to 2^{})", circuit.lanes(), circuit.num_vars());
    eprintln!("  Depth:            {}", circuit.depth());
    eprintln!("  Outputs:          {}", circuit.outputs().len());
    eprintln!("  Assertions:       {}", engine.assertions());
    eprintln!("Proof:");
    eprintln!("  Wire proofs:      {}", proof.wire_proofs.len());
    eprintln!("  Sum-check rounds: {}", proof.round_count());
    eprintln!("  Circuit digest:   0x{}", digest_hex(&proof.header.circuit_digest)?);
    eprintln!();
    eprintln!("✓ Wrote {} (v{}, {} bytes)", cfg.proof_path.display(), io::FILE_VERSION, written);
    eprintln!();
    eprintln!("To verify this proof, run the verifier with the same configuration.");

    println!("{}", circuit.len());
    println!("{}", circuit.lanes());
    println!("{}", proof.round_count());
    Ok(())
}
