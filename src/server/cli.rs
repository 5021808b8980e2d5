use clap::{command, Parser};
use std::net::IpAddr;
use std::ops::RangeInclusive;

const DEFAULT_PORT: u16 = 3333;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const CONNECTION_LIMIT: u32 = 1024;
const DEFAULT_VERBOSITY: u8 = 1;

fn get_default_threads_number() -> usize {
    num_cpus::get_physical()
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// memcached binary protocol cache server
pub struct BinkvdConfig {
    #[arg(short, long, value_name = "PORT", value_parser = port_in_range, default_value_t = DEFAULT_PORT)]
    /// TCP port to listen on
    pub port: u16,

    #[arg(short, long, value_name = "CONNECTION-LIMIT", default_value_t = CONNECTION_LIMIT)]
    /// max simultaneous connections
    pub connection_limit: u32,

    #[arg(short, long, value_name = "THREADS", default_value_t = get_default_threads_number())]
    /// number of worker threads (defaults to number of physical cores)
    pub threads: usize,

    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = DEFAULT_VERBOSITY)]
    /// sets the level of verbosity
    pub verbose: u8,

    #[arg(short, long, value_name = "listen", default_value_t = String::from(DEFAULT_ADDRESS).parse::<IpAddr>().unwrap())]
    /// interface to listen on
    pub listen_address: IpAddr,
}

const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

impl BinkvdConfig {
    fn from_args(args: Vec<String>) -> Result<BinkvdConfig, String> {
        let binkvd_args = BinkvdConfig::parse_from(args.iter());
        Ok(binkvd_args)
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

pub fn parse(args: Vec<String>) -> Result<BinkvdConfig, String> {
    BinkvdConfig::from_args(args)
}
