use lazy_static::lazy_static;

use std::sync::Mutex;

const STARTING_PORT: u16 = 10000;

pub struct PseudoRandomPort {
    port: u16,
}

impl PseudoRandomPort {
    pub fn new() -> PseudoRandomPort {
        PseudoRandomPort {
            port: STARTING_PORT,
        }
    }

    pub fn get_next_port(&mut self) -> u16 {
        self.port += 10;
        self.port
    }
}

lazy_static! {
    pub static ref PSEUDO_RANDOM_PORT: Mutex<PseudoRandomPort> =
        Mutex::new(PseudoRandomPort::new());
}
