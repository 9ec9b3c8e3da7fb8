use clap::Parser;
use site_mirror::{Mirror, MirrorConfig, MirrorStatus, cleanup, watch};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let exit_code = match args.command {
        Command::Watch { config, interval } => run_watch(config, interval).await,
        Command::Mirror {
            url,
            output_dir,
            webdriver_url,
            resource_limit,
        } => run_mirror(url, output_dir, webdriver_url, resource_limit).await,
        Command::Cleanup { dir } => run_cleanup(dir),
    };

    std::process::exit(exit_code);
}

async fn run_watch(config_path: Option<std::path::PathBuf>, interval: Option<u64>) -> i32 {
    let mut config = match config_path {
        Some(path) => match MirrorConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return 1;
            }
        },
        None => {
            let mut config = MirrorConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Some(interval) = interval {
        config.poll_interval_secs = interval;
    }

    println!("Note: mirroring requires a WebDriver server (e.g. ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    ::log::info!(
        "Watching feed, polling every {} seconds",
        config.poll_interval_secs
    );

    match watch::run(config).await {
        Ok(()) => 0,
        Err(e) => {
            ::log::error!("Watch loop terminated: {}", e);
            1
        }
    }
}

async fn run_mirror(
    url: String,
    output_dir: Option<std::path::PathBuf>,
    webdriver_url: Option<String>,
    resource_limit: usize,
) -> i32 {
    let mut config = MirrorConfig::default();
    config.apply_env_overrides();
    config.resource_limit = resource_limit;
    if let Some(webdriver_url) = webdriver_url {
        config.webdriver_url = webdriver_url;
    }

    let mut mirror = Mirror::new(&url).with_config(config);
    if let Some(output_dir) = output_dir {
        mirror = mirror.with_output_dir(output_dir);
    }

    match mirror.run().await {
        Ok(MirrorStatus::Completed) => {
            ::log::info!("Mirror completed");
            0
        }
        Ok(MirrorStatus::Aborted) => {
            ::log::warn!("Mirror aborted: too many resources on one page");
            1
        }
        Ok(MirrorStatus::Skipped) => {
            ::log::info!("Mirror skipped: output directory already populated");
            0
        }
        Err(e) => {
            ::log::error!("Mirror failed: {}", e);
            1
        }
    }
}

fn run_cleanup(dir: std::path::PathBuf) -> i32 {
    match cleanup::clean(&dir) {
        Ok(removed) => {
            ::log::info!("Removed {} invalid mirrors", removed);
            0
        }
        Err(e) => {
            ::log::error!("Cleanup failed: {}", e);
            1
        }
    }
}
