#[macro_use]
extern crate log;

pub mod cache;
pub mod protocol;
pub mod server;
pub mod version;

#[cfg(test)]
mod mock;
