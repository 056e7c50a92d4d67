mod benchmark;

use std::path::Path;

use log::error;
use tsingest::config::Config;

use benchmark::run_benchmarks;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match Config::from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    run_benchmarks(config);
}
