use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ruvhost - virtual host discovery by Host-header fuzzing against a single IP",
    long_about = "NAME:\n  ruvhost - virtual host discovery by Host-header fuzzing against a single IP\n\nUSAGE:\n  ruvhost <SUBCOMMAND> [OPTIONS]\n\nCOMMANDS:\n  fuzz (f)       calibrate a baseline, then probe the whole dictionary\n  calibrate (c)  calibration round only: print the derived similarity threshold\n\nNotes:\n  - All probes are forced to the target IP regardless of DNS; the Host/SNI value\n    is what varies per candidate.\n  - Certificate validation is disabled and at most one redirect is followed.\n\nQuick examples:\n  ruvhost fuzz --target-ip 203.0.113.7 --domain example.com -f words.txt\n  ruvhost fuzz --ip 203.0.113.7 --domain example.com -o found.jsonl --output-type jsonl\n  ruvhost calibrate --ip 203.0.113.7 --domain example.com --debug"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fuzz (fuzz) - main flow: baseline calibration, bounded-concurrency dictionary pass, findings output
    #[command(alias = "f")]
    Fuzz(FuzzArgs),
    /// Calibrate (calibrate) - run only the random-host calibration round and report the threshold
    #[command(alias = "c")]
    Calibrate(CalibrateArgs),
}

/// Common args reused by both subcommands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// IP address of the http(s) server
    #[arg(long = "target-ip", alias = "ip", value_name = "IP")]
    pub target_ip: String,

    /// Base domain candidates are prefixed to
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN")]
    pub base_domain: String,

    /// URL scheme: http or https
    #[arg(long = "scheme", default_value = "https")]
    pub scheme: String,

    /// HTTP method
    #[arg(long = "method", default_value = "GET")]
    pub method: String,

    /// Request path
    #[arg(long = "path", default_value = "/")]
    pub path: String,

    /// Target port (defaults to the scheme's conventional port)
    #[arg(long = "port")]
    pub port: Option<u16>,

    /// User-Agent header sent with every probe
    #[arg(long = "user-agent")]
    pub user_agent: Option<String>,

    /// Maximum simultaneously in-flight probes
    #[arg(short = 'c', long = "concurrency", default_value_t = 50)]
    pub concurrency: usize,

    /// Connect timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 10_000)]
    pub connect_timeout: u64,

    /// Request timeout in milliseconds
    #[arg(long = "timeout", default_value_t = 10_000)]
    pub timeout: u64,

    /// Multiplier applied to the minimum pairwise calibration similarity
    #[arg(long = "threshold-multiplier", default_value_t = 0.9)]
    pub threshold_multiplier: f64,

    /// Number of random hosts probed during calibration
    #[arg(long = "random-hosts", default_value_t = 5)]
    pub random_hosts: usize,

    /// Length of each random calibration label
    #[arg(long = "random-host-length", default_value_t = 10)]
    pub random_host_length: usize,

    /// Per-pair calibration similarities and per-candidate completion on stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Suppress banners; results only
    #[arg(long = "silent")]
    pub silent: bool,
}

#[derive(Args, Debug)]
pub struct FuzzArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Dictionary file, one candidate label per line (default: embedded list)
    #[arg(short = 'f', long = "filename")]
    pub filename: Option<PathBuf>,

    /// Output file path; a .gz suffix enables gzip automatically
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output type: txt/json/jsonl/csv
    #[arg(long = "output-type", alias = "oy", default_value = "txt")]
    pub output_type: String,

    /// Force gzip compression of the output file
    #[arg(long = "gzip")]
    pub gzip: bool,

    /// Append to the output file instead of truncating
    #[arg(long = "append")]
    pub append: bool,

    /// Do not print findings to stdout
    #[arg(long = "not-print", alias = "np")]
    pub not_print: bool,

    /// Disable the progress line on stderr
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Progress refresh interval in seconds
    #[arg(long = "progress-interval", default_value_t = 1)]
    pub progress_interval: u64,
}

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}
