// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! User-facing CLI helpers shared with the daemon binary.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use log::info;
use nexus_msgq::{Hwnd, WM_CLOSE, WM_USER};

use crate::abi::{decode_msg, MSG_WIRE_SIZE};
use crate::config::Config;
use crate::memory::{Protection, UserAddr};
use crate::server::Win32k;

const SELFCHECK_BUF: UserAddr = 0x0001_0000;

/// Returns the CLI usage string for the win32k service.
pub fn help() -> &'static str {
    "win32kd serves window message queues. Usage: win32kd [--help] [--config PATH] [--selfcheck]"
}

/// Executes the CLI using provided arguments.
pub fn execute(args: &[&str]) -> String {
    if args.iter().any(|arg| *arg == "--help") {
        return help().to_string();
    }

    let config = match config_arg(args) {
        Ok(Some(path)) => match Config::load(Path::new(path)) {
            Ok(config) => config,
            Err(err) => return format!("win32kd: {err}"),
        },
        Ok(None) => Config::default(),
        Err(msg) => return format!("win32kd: {msg}"),
    };

    if args.iter().any(|arg| *arg == "--selfcheck") {
        return match selfcheck(config) {
            Ok(delivered) => format!("win32kd: ready (selfcheck delivered {delivered} messages)"),
            Err(msg) => format!("win32kd: selfcheck failed: {msg}"),
        };
    }
    info!("win32kd: max_pending={} trace={}", config.queue.max_pending, config.trace.messages);
    "win32kd: ready".to_string()
}

/// Parses `std::env::args` and prints the execution result.
pub fn run() {
    let owned: Vec<String> = std::env::args().skip(1).collect();
    let refs: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
    println!("{}", execute(&refs));
}

fn config_arg<'a>(args: &[&'a str]) -> Result<Option<&'a str>, &'static str> {
    match args.iter().position(|arg| *arg == "--config") {
        Some(index) => args.get(index + 1).copied().map(Some).ok_or("--config needs a path"),
        None => Ok(None),
    }
}

/// Runs a guest dispatch loop on its own thread and feeds it from this one.
fn selfcheck(config: Config) -> Result<usize, String> {
    let server = Arc::new(Win32k::new(config));
    server
        .memory()
        .map(SELFCHECK_BUF, 0x1000, Protection::READ | Protection::WRITE)
        .map_err(|err| err.to_string())?;

    let guest = server.create_thread(true);
    let hwnd = server.create_window(guest).map_err(|err| err.to_string())?;

    let pump = {
        let server = Arc::clone(&server);
        thread::spawn(move || {
            let mut delivered = 0usize;
            while server.nt_user_get_message(guest, SELFCHECK_BUF, Hwnd::NULL, 0, 0) {
                let mut raw = [0u8; MSG_WIRE_SIZE];
                if server.memory().read(SELFCHECK_BUF, &mut raw).is_err() {
                    break;
                }
                delivered += 1;
                if decode_msg(&raw).message == WM_CLOSE {
                    server.nt_user_post_quit_message(guest, 0);
                }
            }
            delivered
        })
    };

    for message in [WM_USER, WM_USER + 1, WM_CLOSE] {
        if !server.nt_user_post_message(hwnd, message, 0, 0) {
            // Termination alone keeps the loop pumping; dropping the queue ends it.
            server.terminate_thread(guest).map_err(|err| err.to_string())?;
            server.destroy_thread(guest).map_err(|err| err.to_string())?;
            let _ = pump.join();
            return Err(format!("post of {message:#06x} refused"));
        }
    }

    let delivered = pump.join().map_err(|_| "dispatch thread panicked".to_string())?;
    server.destroy_thread(guest).map_err(|err| err.to_string())?;
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::{execute, help};

    #[test]
    fn help_contains_name() {
        assert!(help().contains("win32kd"));
    }

    #[test]
    fn exec_default() {
        assert_eq!(execute(&[]), "win32kd: ready");
    }

    #[test]
    fn missing_config_path_is_reported() {
        assert!(execute(&["--config"]).contains("needs a path"));
    }

    #[test]
    fn selfcheck_pumps_until_quit() {
        assert_eq!(execute(&["--selfcheck"]), "win32kd: ready (selfcheck delivered 3 messages)");
    }
}
