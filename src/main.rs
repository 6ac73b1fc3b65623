use anyhow::Result;
use clap::Parser;
use ruvhost::cli::{CalibrateArgs, Cli, Commands, CommonArgs, FuzzArgs};
use ruvhost::dicts;
use ruvhost::fuzzer;
use ruvhost::options::{Options, DEFAULT_USER_AGENT};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;

fn read_wordlist(path: &Option<PathBuf>) -> Result<Vec<String>> {
    if let Some(p) = path {
        let mut words = Vec::new();
        let f = File::open(p)?;
        for line in BufReader::new(f).lines() {
            let l = line?;
            let s = l.trim();
            if s.is_empty() || s.starts_with('#') {
                continue;
            }
            words.push(s.to_string());
        }
        Ok(words)
    } else {
        Ok(dicts::default_wordlist())
    }
}

fn common_options(common: &CommonArgs, dictionary: Vec<String>) -> Options {
    Options {
        target_ip: common.target_ip.clone(),
        base_domain: common.base_domain.clone(),
        dictionary,
        method: common.method.clone(),
        scheme: common.scheme.clone(),
        path: common.path.clone(),
        port: common.port,
        user_agent: common.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
        threshold_multiplier: common.threshold_multiplier,
        random_hosts_count: common.random_hosts,
        random_hosts_length: common.random_host_length,
        max_connections: common.concurrency,
        connect_timeout_ms: common.connect_timeout,
        read_timeout_ms: common.timeout,
        debug: common.debug,
        silent: common.silent,
        ..Options::default()
    }
}

async fn run_fuzz(args: FuzzArgs) -> Result<()> {
    let dictionary = read_wordlist(&args.filename)?;
    if !args.common.silent {
        println!("Loaded dictionary of {} entries", dictionary.len());
    }

    let mut gzip_flag = args.gzip;
    if !gzip_flag {
        if let Some(ref p) = args.output {
            if let Some(os) = p.as_os_str().to_str() {
                if os.ends_with(".gz") {
                    gzip_flag = true;
                }
            }
        }
    }

    let silent = args.common.silent;
    let total = dictionary.len();
    let opt = Options {
        output: args.output.clone(),
        output_type: args.output_type.clone(),
        gzip: gzip_flag,
        append: args.append,
        not_print: args.not_print,
        progress: !args.no_progress,
        progress_interval: args.progress_interval,
        ..common_options(&args.common, dictionary)
    };

    let start = Instant::now();
    let outcome = fuzzer::run(opt).await?;
    let elapsed = start.elapsed().as_secs_f64();

    if !silent {
        println!(
            "Probed {} candidates ({} findings, {} transport failures)",
            outcome.probed,
            outcome.findings.len(),
            outcome.failed
        );
        println!("Execution time is {:.3}s", elapsed);
        if elapsed > 0.0 {
            println!("Average speed is {:.1} candidates/sec", total as f64 / elapsed);
        }
    }
    Ok(())
}

async fn run_calibrate(args: CalibrateArgs) -> Result<()> {
    // the dictionary is not probed here; the embedded default satisfies validation
    let opt = common_options(&args.common, dicts::default_wordlist());
    let baseline = fuzzer::run_calibration(opt).await?;
    if args.common.silent {
        println!("{}", baseline.threshold);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Fuzz(args) => run_fuzz(args).await?,
        Commands::Calibrate(args) => run_calibrate(args).await?,
    }
    Ok(())
}
