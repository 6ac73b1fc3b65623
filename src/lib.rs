pub mod calibrate;
pub mod cli;
pub mod dicts;
pub mod fuzzer;
pub mod metrics;
pub mod options;
pub mod output;
pub mod probe;
pub mod resolver;
pub mod similarity;
pub mod transport;
