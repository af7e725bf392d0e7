// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = vocaprep_lib::run() {
        eprintln!("VocaPrep failed to start: {:#}", e);
        std::process::exit(1);
    }
}
