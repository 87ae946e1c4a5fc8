use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use log::info;
use sightcore::processing::Granularity;
use sightcore::record::CategoryKey;
use sightcore::selection::Focus;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;
use workflow::session::Session;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Detection browsing session driver")]
struct Args {
    /// Print the current view once and append it to the offline report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Directory holding <category>_detection.csv / .json tables
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Category to open instead of the configured default
    #[arg(long)]
    category: Option<String>,
    /// Identity to focus; omit for the overview
    #[arg(long)]
    focus: Option<String>,
    /// hourly, daily, weekly or monthly
    #[arg(long)]
    granularity: Option<Granularity>,
    /// Seed for generated sample data
    #[arg(long)]
    seed: Option<u64>,
    /// Keep the HTTP bridge alive for rendering clients
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.data_dir, args.seed)
    };

    let runner = Runner::new(workflow_config);
    let mut session = Session::start(runner).context("opening session")?;

    if let Some(category) = args.category {
        session
            .select_category(CategoryKey::new(category))
            .context("selecting category")?;
    }
    if let Some(granularity) = args.granularity {
        session.select_granularity(granularity);
    }
    if let Some(identity) = args.focus {
        session
            .select_focus(Focus::Identity(identity.into()))
            .context("selecting focus")?;
    }

    info!("selection: {:?}", session.selection());

    if args.offline {
        let model = session.model()?;
        let summary = model.summary();
        println!("Offline view -> {}", summary);

        let report_path = PathBuf::from("tools/data/offline_view.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_path)
            .with_context(|| format!("opening {}", report_path.display()))?;
        writeln!(file, "{}", summary)?;
    }

    if args.serve {
        let bridge = GuiBridge::new(session);
        bridge.spawn(gui_bind_address())?;
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
        info!("bridge stopped");
    }

    Ok(())
}
