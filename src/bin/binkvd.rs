use log::info;
use std::env;
use std::process;

extern crate binkv;

fn main() {
    let cli_config = match binkv::server::cli::parse(env::args().collect()) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(cli_config.log_level())
        .init();

    info!("Listen address: {}", cli_config.listen_address);
    info!("Listen port: {}", cli_config.port);
    info!("Connection limit: {}", cli_config.connection_limit);
    info!("Number of threads: {}", cli_config.threads);

    binkv::server::runtime::start_server(cli_config);
}
