use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use traffic_dashboard::bootstrap::on_content_loaded;
use traffic_dashboard::cctv::{load_cctv_streams, CctvOptions, StreamOutcome};
use traffic_dashboard::config::Config;
use traffic_dashboard::errors::DashboardError;
use traffic_dashboard::page::{DashboardPage, TerminalPrompt};
use traffic_dashboard::panels::{
    get_health, get_recent_traffic, get_traffic_by_link, get_traffic_stats,
};

#[derive(Parser, Debug)]
#[command(name = "traffic-dashboard")]
#[command(about = "Traffic API dashboard with live CCTV playback")]
struct Args {
    /// Config file path
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Page host the API address is derived from
    #[arg(long)]
    host: Option<String>,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recent traffic records
    Recent {
        #[arg(long)]
        minutes: Option<String>,
        #[arg(long)]
        limit: Option<String>,
    },
    /// Traffic records of one link
    Link { link_id: String },
    /// Per-link speed statistics
    Stats,
    /// Backend health check
    Health,
    /// Load the CCTV streams into the video slots
    Cctv {
        /// Seconds to keep the players running
        #[arg(long, default_value_t = 0)]
        watch: u64,
    },
    /// Render the whole page after the startup hook
    Page {
        #[arg(long, default_value_t = 0)]
        watch: u64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logger(level: &str) -> Result<(), DashboardError> {
    let level: LevelFilter = level.parse()?;
    let config = ConfigBuilder::new()
        .add_filter_allow_str("traffic_dashboard")
        .add_filter_allow_str("hls_stream")
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)?;
    Ok(())
}

fn print_outcomes(outcomes: &[StreamOutcome]) {
    for outcome in outcomes {
        match outcome {
            StreamOutcome::Attached {
                name,
                slot,
                mode,
                playing,
            } => println!(
                "cctv{}: {} ({:?}, {})",
                slot,
                name,
                mode,
                if *playing { "playing" } else { "paused" }
            ),
            StreamOutcome::Unsupported { name, slot } => {
                println!("cctv{}: {} (unsupported)", slot, name)
            }
            StreamOutcome::Skipped { name } => println!("skipped: {}", name),
            StreamOutcome::Failed { name, slot, reason } => {
                println!("cctv{}: {} failed: {}", slot, name, reason)
            }
        }
    }
}

async fn watch(seconds: u64) {
    if seconds > 0 {
        log::info!("Watching streams for {}s", seconds);
        tokio::time::sleep(Duration::from_secs(seconds)).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    let mut config = Config::load(&args.config)?;
    if let Some(host) = args.host {
        config.page_host = host;
        config.api_base_url.clear();
    }
    let api = config.api_client()?;
    log::info!("API base URL: {}", api.base_url());

    let mut page = DashboardPage::new(config.cctv_slots, config.media_capabilities());

    match args.command {
        Command::Recent { minutes, limit } => {
            if let Some(minutes) = minutes {
                page.recent_form.minutes.set_value(&minutes);
            }
            if let Some(limit) = limit {
                page.recent_form.limit.set_value(&limit);
            }
            get_recent_traffic(&api, &page.recent_form, &mut page.recent).await;
            println!("{}", page.recent.render());
        }
        Command::Link { link_id } => {
            page.link_form.link_id.set_value(&link_id);
            get_traffic_by_link(&api, &page.link_form, &mut page.link, &TerminalPrompt).await;
            println!("{}", page.link.render());
        }
        Command::Stats => {
            get_traffic_stats(&api, &mut page.stats).await;
            println!("{}", page.stats.render());
        }
        Command::Health => {
            get_health(&api, &mut page.health).await;
            println!("{}", page.health.render());
        }
        Command::Cctv { watch: seconds } => {
            let outcomes =
                load_cctv_streams(&api, &mut page.cctv, CctvOptions::from(&config)).await;
            println!("{}", page.cctv.status.text());
            print_outcomes(&outcomes);
            watch(seconds).await;
            println!("{}", page.cctv.render().await);
        }
        Command::Page {
            watch: seconds,
            output,
        } => {
            if let Some(outcomes) = on_content_loaded(&config, &api, &mut page).await {
                for outcome in &outcomes {
                    log::info!("{:?}", outcome);
                }
            }
            watch(seconds).await;
            let html = page.render_html().await;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, html).await?;
                    log::info!("Page written to {}", path.display());
                }
                None => println!("{}", html),
            }
        }
    }

    page.cctv.shutdown().await;
    Ok(())
}
