use clap::Parser;

use ffmpeg_replace::replace;

mod cli;

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("ffmpeg_replace", level)
        .filter_module("frame_replace", level)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> ! {
    let args = match cli::Args::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    init_logging(args.verbose);

    if let Err(e) = ffmpeg_replace::init() {
        eprintln!("Error: {:#}", e);
        std::process::exit(4);
    }
    let config = args.into_config().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    });

    let outcome = tokio::task::spawn_blocking(move || replace::run(&config)).await;
    match outcome {
        Ok(Ok(summary)) => {
            log::info!(
                "done: {} frames replaced with {}, {} video packets, {} passthrough packets, {} dropped",
                summary.report.frames,
                summary.codec,
                summary.report.video_packets,
                summary.report.passthrough_packets,
                summary.report.dropped_packets
            );
            std::process::exit(0);
        }
        Ok(Err(e)) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(e.exit_code());
        }
        Err(e) => {
            eprintln!("Error: replacement run aborted: {}", e);
            std::process::exit(4);
        }
    }
}
