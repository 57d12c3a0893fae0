//! Token signing seed generation utility.
//!
//! Generates the 32-byte Ed25519 seed the server signs session tokens with
//! and writes it base64-encoded to a file with 0600 permissions.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_token_seed -- --out <path> [--force]
//! ```
//!
//! Point `DOCTORONCALL_TOKEN_SEED_B64_FILE` at the output, or mount it as the
//! `doctoroncall_token_seed_b64` Docker secret.

use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use doctoroncall::adapters::TokenSeed;
use zeroize::Zeroizing;

const USAGE: &str = "Usage: generate_token_seed --out <path> [--force]";

fn fail(code: i32, message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(code);
}

fn main() {
    let mut args = std::env::args().skip(1);
    let mut out_path: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => match args.next().filter(|p| !p.is_empty()) {
                Some(p) => out_path = Some(PathBuf::from(p)),
                None => fail(2, USAGE),
            },
            "--force" => force = true,
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nWrites a base64 token signing seed to <path> with 0600 permissions. Prints only the key fingerprint."
                );
                return;
            }
            _ => fail(2, &format!("Unknown arg: {arg}\n{USAGE}")),
        }
    }

    let out_path = out_path.unwrap_or_else(|| fail(2, USAGE));
    if out_path.exists() && !force {
        fail(
            3,
            &format!("Refusing to overwrite existing file {out_path:?}. Use --force."),
        );
    }

    let seed = TokenSeed::generate();
    let seed_b64 = Zeroizing::new(seed.to_b64());

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            fail(4, &format!("Failed to create directory {parent:?}: {e}"));
        }
    }

    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(0o600);
    }

    let mut file = opts
        .open(&out_path)
        .unwrap_or_else(|e| fail(4, &format!("Failed to open {out_path:?}: {e}")));
    let mut line = Zeroizing::new(seed_b64.as_bytes().to_vec());
    line.push(b'\n');
    if let Err(e) = file.write_all(&line) {
        fail(4, &format!("Failed to write {out_path:?}: {e}"));
    }

    // Print only non-secret material.
    println!("Wrote token signing seed (base64) to {out_path:?}");
    println!("KEY_FINGERPRINT={}", seed.fingerprint());
}
