//! Build script for framelink-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates link.toml at compile time and emits it as Rust constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = load_config();
    let link = validate_config(&config);
    write_constants(&link);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated link settings
struct LinkSettings {
    baudrate: u32,
    tx_queue: usize,
    rx_queue: usize,
    pool_size: usize,
    process_interval_us: u64,
}

/// Read and parse link.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=link.toml");

    let config_path = Path::new("link.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: link.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a link.toml configuration file in the     ║\n\
            ║  framelink-firmware directory.                                   ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read link.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in link.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch an integer field and check its range
fn integer_field(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) if range.contains(value) => *value,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            *range.start()
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            *range.start()
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            *range.start()
        }
    }
}

/// Validate every field, collecting all errors before failing
fn validate_config(config: &toml::Value) -> LinkSettings {
    let mut errors = Vec::new();

    let baudrate = integer_field(config, "uart", "baudrate", 1200..=3_000_000, &mut errors);
    let tx_queue = integer_field(config, "link", "tx_queue", 1..=64, &mut errors);
    let rx_queue = integer_field(config, "link", "rx_queue", 1..=64, &mut errors);
    let pool_size = integer_field(config, "link", "pool_size", 1..=256, &mut errors);
    let process_interval_us =
        integer_field(config, "link", "process_interval_us", 10..=1_000_000, &mut errors);

    // Every queued packet plus one frame in flight per direction needs a buffer
    if errors.is_empty() && pool_size < tx_queue + rx_queue + 2 {
        errors.push(format!(
            "[link] pool_size must be at least tx_queue + rx_queue + 2 ({})",
            tx_queue + rx_queue + 2
        ));
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid settings in link.toml                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=link.toml validated successfully");

    LinkSettings {
        baudrate: baudrate as u32,
        tx_queue: tx_queue as usize,
        rx_queue: rx_queue as usize,
        pool_size: pool_size as usize,
        process_interval_us: process_interval_us as u64,
    }
}

/// Emit validated settings as constants for `include!`
fn write_constants(link: &LinkSettings) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("link_config.rs")).unwrap();
    writeln!(f, "/// UART line rate").unwrap();
    writeln!(f, "pub const BAUDRATE: u32 = {};", link.baudrate).unwrap();
    writeln!(f, "/// Outbound queue length").unwrap();
    writeln!(f, "pub const TX_QUEUE_LEN: usize = {};", link.tx_queue).unwrap();
    writeln!(f, "/// Inbound queue length").unwrap();
    writeln!(f, "pub const RX_QUEUE_LEN: usize = {};", link.rx_queue).unwrap();
    writeln!(f, "/// Packet buffers in the shared pool").unwrap();
    writeln!(f, "pub const POOL_SIZE: usize = {};", link.pool_size).unwrap();
    writeln!(f, "/// Foreground process() period").unwrap();
    writeln!(
        f,
        "pub const PROCESS_INTERVAL_US: u64 = {};",
        link.process_interval_us
    )
    .unwrap();
}
