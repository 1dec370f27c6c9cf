//! foia-dispatch CLI: runs the submission queue worker and inspects requests.

use clap::{Parser, Subcommand};
use foia_dispatch::channel::ChannelRegistry;
use foia_dispatch::channel::outbox::OutboxChannel;
use foia_dispatch::config::Config;
use foia_dispatch::db::Db;
use foia_dispatch::engine::control::SUBMISSION_QUEUE;
use foia_dispatch::engine::{ControlConfig, ControlPlane, Disposition, QueueItem, SubmissionWorker};
use foia_dispatch::model::RequestId;
use foia_dispatch::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "foia-dispatch", about = "Deliver queued FOIA requests to agency components")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the queue worker until Ctrl-C
    Serve {
        #[command(flatten)]
        channels: ChannelArgs,
        /// Queue to consume
        #[arg(long, default_value = SUBMISSION_QUEUE)]
        queue: String,
        /// Seconds before a retried request is redelivered
        #[arg(long, default_value_t = 300)]
        retry_delay: i32,
        /// Reads after which an erroring item is dead-lettered
        #[arg(long, default_value_t = 10)]
        max_deliveries: i32,
    },
    /// Dispatch one request now, bypassing the queue
    Process {
        #[command(flatten)]
        channels: ChannelArgs,
        /// FOIA request ID
        id: i64,
    },
    /// FOIA request operations
    Request {
        #[command(subcommand)]
        action: RequestAction,
    },
}

#[derive(clap::Args)]
struct ChannelArgs {
    /// TOML file routing agency components to channels
    #[arg(long, default_value = "routes.toml")]
    routes: PathBuf,
    /// Drop directory for the outbox channel
    #[arg(long, default_value = "outbox")]
    outbox_dir: PathBuf,
}

#[derive(Subcommand)]
enum RequestAction {
    /// Show a request's workflow fields
    Show {
        /// FOIA request ID
        id: i64,
    },
    /// Put a request on the submission queue
    Enqueue {
        /// FOIA request ID
        id: i64,
        /// Queue to push onto
        #[arg(long, default_value = SUBMISSION_QUEUE)]
        queue: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "foia-dispatch".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = Arc::new(Db::connect(config.database_url.expose_secret()).await?);
    db.migrate().await?;

    match cli.command {
        Command::Serve {
            channels,
            queue,
            retry_delay,
            max_deliveries,
        } => {
            let registry = Arc::new(build_registry(&channels)?);
            let worker = Arc::new(SubmissionWorker::new(Arc::clone(&db), registry, config.worker));
            let control = ControlPlane::new(
                db,
                worker,
                ControlConfig {
                    queue_name: queue,
                    retry_delay,
                    max_deliveries,
                    ..ControlConfig::default()
                },
            );

            let ctrl = control.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                ctrl.shutdown();
            });

            control.run().await?;
            Ok(())
        }
        Command::Process { channels, id } => {
            let registry = Arc::new(build_registry(&channels)?);
            let worker = SubmissionWorker::new(Arc::clone(&db), registry, config.worker);
            match worker.process(QueueItem { id: RequestId(id) }).await? {
                Disposition::Done => println!("Done."),
                Disposition::Retry(reason) => println!("Retry: {reason}"),
            }
            cmd_request_show(&db, id).await
        }
        Command::Request { action } => match action {
            RequestAction::Show { id } => cmd_request_show(&db, id).await,
            RequestAction::Enqueue { id, queue } => {
                db.create_queue(&queue).await?;
                let payload = serde_json::to_value(QueueItem { id: RequestId(id) })?;
                let msg_id = db.send_to_queue(&queue, &payload, 0).await?;
                println!("Enqueued request {id} on {queue} (msg {msg_id})");
                Ok(())
            }
        },
    }
}

fn build_registry(args: &ChannelArgs) -> anyhow::Result<ChannelRegistry> {
    let registry = ChannelRegistry::empty()
        .register("outbox", Arc::new(OutboxChannel::new(&args.outbox_dir)))
        .default_channel("outbox");

    if Path::new(&args.routes).exists() {
        Ok(registry.load_routes(&args.routes)?)
    } else {
        tracing::warn!(
            routes = %args.routes.display(),
            "route file not found, sending everything to the outbox"
        );
        Ok(registry)
    }
}

async fn cmd_request_show(db: &Db, id: i64) -> anyhow::Result<()> {
    let request = db.get_request(RequestId(id)).await?;
    let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    println!("ID:            {}", request.id);
    println!("Agency comp.:  {}", request.agency_component);
    println!("Status:        {}", request.status());
    println!(
        "Method:        {}",
        if request.submission_method.is_empty() {
            "-"
        } else {
            &request.submission_method
        }
    );
    println!(
        "Submitted at:  {}",
        request
            .submission_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Failures:      {}", request.failure_count());
    println!("Response code: {}", dash(&request.response_code));
    println!("Case ID:       {}", dash(&request.case_management_id));
    println!("Tracking no.:  {}", dash(&request.tracking_number));
    if request.error_code.is_some() || request.error_message.is_some() {
        println!("---");
        println!("Error code:    {}", dash(&request.error_code));
        println!("Error message: {}", dash(&request.error_message));
        println!("Description:   {}", dash(&request.error_description));
    }
    println!(
        "Webform sub.:  {}",
        request
            .webform_submission_id
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}
