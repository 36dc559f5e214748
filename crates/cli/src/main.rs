//! # CLI — the SiltKV shell
//!
//! A line-oriented front end for the storage engine. With no arguments it
//! runs a REPL; with a file argument it executes the file's commands in
//! batch mode and exits.
//!
//! ## REPL commands
//!
//! ```text
//! SET key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key (writes a tombstone)
//! FLUSH              Force-flush the memtable to a Level 1 run
//! COMPACT            Run one compaction cycle
//! STATS              Print engine debug info
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Batch file format
//!
//! One command per line, `|`-separated: `c|key|value`, `r|key|/`,
//! `u|key|value`, `d|key|/`.
//!
//! ## Configuration
//!
//! ```text
//! SILT_DATA_DIR   database root directory      (default: ".")
//! SILT_CONFIG     path to the JSON config file (default: "silt.json")
//! ```

use anyhow::{Context, Result};
use config::Config;
use engine::Engine;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let root = env_or("SILT_DATA_DIR", ".");
    let config_path = env_or("SILT_CONFIG", "silt.json");
    let config = Config::load(Path::new(&config_path));

    let mut engine = Engine::open(&root, config).context("failed to open database")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(batch) = args.first() {
        return run_batch(&mut engine, batch);
    }

    repl(&mut engine)
}

fn repl(engine: &mut Engine) -> Result<()> {
    println!(
        "SiltKV started (root={}, memtable={}/{})",
        engine.root().display(),
        engine.memtable_len(),
        engine.config().memtable_capacity
    );
    println!("Commands: SET key value | GET key | DEL key | FLUSH | COMPACT | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(key) = parts.next() {
                        let value: String = parts.collect::<Vec<&str>>().join(" ");
                        if value.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match engine.create(key, value.as_bytes()) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR set failed: {e}"),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => {
                    if let Some(key) = parts.next() {
                        match engine.read(key) {
                            Ok(Some(rec)) => println!("{}", String::from_utf8_lossy(&rec.value)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {e}"),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(key) = parts.next() {
                        match engine.delete(key) {
                            Ok(_) => println!("OK"),
                            Err(e) => println!("ERR del failed: {e}"),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "FLUSH" => match engine.flush() {
                    Ok(()) => println!("OK (memtable={})", engine.memtable_len()),
                    Err(e) => println!("ERR flush failed: {e}"),
                },
                "COMPACT" => match engine.compact() {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR compact failed: {e}"),
                },
                "STATS" => println!("{engine:?}"),
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => println!("unknown command: {other}"),
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}

/// Executes a batch file of `op|key|value` lines.
fn run_batch(engine: &mut Engine, path: &str) -> Result<()> {
    let file = std::fs::File::open(path).with_context(|| format!("cannot open batch file {path}"))?;
    let reader = io::BufReader::new(file);

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut fields = trimmed.splitn(3, '|');
        let (op, key, value) = (
            fields.next().unwrap_or(""),
            fields.next().unwrap_or(""),
            fields.next().unwrap_or(""),
        );
        if key.is_empty() {
            println!("line {}: malformed command: {trimmed}", line_number + 1);
            continue;
        }

        match op {
            "c" => engine.create(key, value.as_bytes())?,
            "u" => engine.update(key, value.as_bytes())?,
            "d" => {
                engine.delete(key)?;
            }
            "r" => match engine.read(key)? {
                Some(rec) => println!("{key} -> {}", String::from_utf8_lossy(&rec.value)),
                None => println!("{key} -> (nil)"),
            },
            other => println!("line {}: unknown op {other:?}", line_number + 1),
        }
    }

    Ok(())
}
