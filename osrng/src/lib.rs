pub mod channel;
pub mod config;
pub mod error;
pub mod rand_adapter;
pub mod rng;

pub use channel::{DeviceChannel, EntropyChannel, RawRead};
pub use config::{ConfigError, RngConfig, DEFAULT_DEVICE};
pub use error::{OpenFailure, RngError, RngResult, Stall};
pub use rng::{open, OsRng, SELF_TEST_SAMPLE_LEN};
