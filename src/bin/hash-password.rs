//! Prints an `ADMIN_PASSWORD_HASH` line for `.env`.
//!
//! Usage: hash-password [--cost N] [PASSWORD]
//! Without PASSWORD the first line of stdin is used, keeping it out of shell history.

use std::{env, io, process};

use bcrypt::{hash, DEFAULT_COST};

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin hash-password -- [--cost N] [PASSWORD]");
    process::exit(1);
}

fn main() {
    let mut cost = DEFAULT_COST;
    let mut password = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cost" => {
                cost = args
                    .next()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or_else(|| usage());
            }
            "-h" | "--help" => usage(),
            _ => password = Some(arg),
        }
    }

    let password = match password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            if let Err(e) = io::stdin().read_line(&mut line) {
                eprintln!("Failed to read password from stdin: {}", e);
                process::exit(1);
            }
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        usage();
    }

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("# cost {cost}; paste into your .env:");
            println!("ADMIN_PASSWORD_HASH={hashed}");
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            process::exit(1);
        }
    }
}
