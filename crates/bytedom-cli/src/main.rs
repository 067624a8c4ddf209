//! `bytedom` CLI: inspect, execute and patch bytecode programs
//!
//! - `bytedom disasm <file>` - Print one line per instruction
//! - `bytedom run <file>` - Execute on an in-memory document, print the HTML
//! - `bytedom patch <old> <new> <out>` - Write the patch of two programs
//!
//! Set `BYTEDOM_LOG` (`error`, `warn`, `info`, `debug`, `trace`) to see the
//! VM's log on stderr.

mod commands;

use std::env;
use std::process;

const USAGE: &str = "usage: bytedom <disasm <file> | run <file> | patch <old> <new> <out>>";

fn main() {
    if let Err(e) = bytedom_log::init_from_env() {
        eprintln!("warning: {e}");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["disasm", path] => commands::disasm(path),
        ["run", path] => commands::run(path),
        ["patch", old, new, out] => commands::patch(old, new, out),
        ["help" | "-h" | "--help"] => {
            println!("{USAGE}");
            return;
        }
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    match result {
        Ok(output) => print!("{output}"),
        Err(failure) => {
            eprintln!("{failure}");
            process::exit(failure.exit_code());
        }
    }
}
