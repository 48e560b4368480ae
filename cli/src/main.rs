mod render;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use common::{Job, JobId, JobStatus, UploadProfile, VideoFile};
use sportsvoice_client::config::LoggingConfig;
use sportsvoice_client::{poller, ApiClient, Config, JobApi, Selection, Session};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Upload videos to the SportsVoice job API and follow the result", long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// More log output; repeat for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload videos and follow the job until it finishes
    Submit {
        /// Upload profile (see `profiles`)
        #[arg(short, long)]
        profile: Option<String>,
        /// Video files, in the profile's input order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Text prompt for prompt-driven profiles
        #[arg(long)]
        prompt: Option<String>,
        /// Declared media type instead of guessing from the extension
        #[arg(long)]
        mime: Option<String>,
        /// Download the result here once the job completes
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the job id and exit without polling
        #[arg(long)]
        detach: bool,
    },
    /// Show the current state of a job
    Status {
        id: String,
        #[arg(short, long)]
        profile: Option<String>,
        /// Print the raw job record
        #[arg(long)]
        json: bool,
    },
    /// Poll an existing job until it finishes
    Watch {
        id: String,
        #[arg(short, long)]
        profile: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download the output of a completed job
    Download {
        id: String,
        /// Destination file; defaults to the server's file name
        dest: Option<PathBuf>,
    },
    /// Check videos against the upload limits without submitting
    Validate {
        #[arg(short, long)]
        profile: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        mime: Option<String>,
        /// Also ask the server for its validation and guidance
        #[arg(long)]
        remote: bool,
    },
    /// Check that the backend is reachable
    Health,
    /// List upload profiles
    Profiles,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = Config::locate(cli.config.as_deref());
    let config = Config::load(cli.config.as_deref())?;
    setup_logging(&config.logging, cli.verbose, cli.quiet)?;
    match &config_path {
        Some(path) => log::debug!("Loaded config from {:?}", path),
        None => log::debug!("No config file, using defaults"),
    }
    log::debug!("Using API at {}", config.server.base_url);

    let api = Arc::new(ApiClient::new(&config.server)?);

    match cli.command {
        Commands::Submit { profile, files, prompt, mime, output, detach } => {
            let profile = resolve_profile(&config, profile.as_deref())?;
            let mut session = Session::new(
                api.clone(),
                profile.clone(),
                config.upload.max_file_size,
                config.poll.interval(),
            );
            session.select_all(load_files(&files, mime.as_deref())?)?;
            if let Some(p) = prompt {
                session.set_prompt(p);
            }

            println!("🚀 {}", profile.labels.submit);
            let job_id = session.submit().await?;
            println!("Job {} submitted", job_id);
            if detach {
                return Ok(());
            }
            let job = follow(&session, &profile).await?;
            finish(&api, &profile, job, output.as_deref()).await
        }
        Commands::Status { id, profile, json } => {
            let profile = resolve_profile(&config, profile.as_deref())?;
            let job = api.job(&JobId(id)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                print!("{}", render::job_view(&job, &profile, |f| api.media_url(f)));
            }
            Ok(())
        }
        Commands::Watch { id, profile, output } => {
            let profile = resolve_profile(&config, profile.as_deref())?;
            let mut session = Session::new(
                api.clone(),
                profile.clone(),
                config.upload.max_file_size,
                config.poll.interval(),
            );
            session.track(JobId(id));
            let job = follow(&session, &profile).await?;
            finish(&api, &profile, job, output.as_deref()).await
        }
        Commands::Download { id, dest } => {
            let job = api.job(&JobId(id)).await?;
            if job.status != JobStatus::Completed {
                anyhow::bail!("Job {} is {}, nothing to download", job.id, job.status);
            }
            download(&api, &job, dest.as_deref()).await
        }
        Commands::Validate { profile, files, mime, remote } => {
            let profile = resolve_profile(&config, profile.as_deref())?;
            let mut selection = Selection::new(profile, config.upload.max_file_size);
            selection.select_all(load_files(&files, mime.as_deref())?)?;
            for (field, file) in selection.build()?.files() {
                println!("✅ {} ({}, {} bytes) -> {}", file.name, file.mime, file.size, field);
            }
            if remote {
                ensure_pair_profile(selection.profile())?;
                let report = api.validate_remote(&selection.build()?).await?;
                print!("{}", render::remote_validation(&report));
                if !report.valid {
                    anyhow::bail!("Server validation failed");
                }
            }
            Ok(())
        }
        Commands::Health => {
            let health = api.health().await?;
            if !health.is_healthy() {
                anyhow::bail!("Backend reports status '{}'", health.status);
            }
            println!("Backend at {} is {}", config.server.base_url, health.status);
            Ok(())
        }
        Commands::Profiles => {
            println!("{}", render::profiles_table(&config.profiles(), &config.upload.default_profile));
            Ok(())
        }
    }
}

fn resolve_profile(config: &Config, name: Option<&str>) -> Result<UploadProfile> {
    let name = name.unwrap_or(&config.upload.default_profile);
    config
        .profile(name)
        .with_context(|| format!("Unknown profile '{}'. Run `sportsvoice profiles` to list them", name))
}

/// The server-side check only knows the character/reference pair.
fn ensure_pair_profile(profile: &UploadProfile) -> Result<()> {
    let fields: Vec<&str> = profile.inputs.iter().map(|s| s.field.as_str()).collect();
    if fields != ["character_file", "reference_file"] || profile.requires_prompt() {
        anyhow::bail!(
            "Remote validation only supports character/reference uploads; profile '{}' sends {:?}",
            profile.name,
            fields
        );
    }
    Ok(())
}

fn load_files(paths: &[PathBuf], mime: Option<&str>) -> Result<Vec<VideoFile>> {
    paths
        .iter()
        .map(|p| VideoFile::from_path(p, mime).map_err(anyhow::Error::from))
        .collect()
}

/// Waits for the tracked job to finish. Ctrl-C stops polling; the job keeps
/// running server-side.
async fn follow<A: JobApi>(session: &Session<A>, profile: &UploadProfile) -> Result<Option<Job>> {
    let handle = session.poll_handle().context("No job is being tracked")?;
    println!("⏳ {} (Ctrl-C to stop watching)", profile.labels.processing);

    tokio::select! {
        job = poller::wait_terminal(handle.subscribe()) => Ok(job),
        _ = tokio::signal::ctrl_c() => {
            handle.cancel();
            eprintln!("Stopped watching job {}", handle.job_id());
            Ok(None)
        }
    }
}

async fn finish(api: &ApiClient, profile: &UploadProfile, job: Option<Job>, output: Option<&Path>) -> Result<()> {
    let Some(job) = job else {
        return Ok(());
    };
    print!("{}", render::job_view(&job, profile, |f| api.media_url(f)));
    match job.status {
        JobStatus::Completed => match output {
            Some(dest) => download(api, &job, Some(dest)).await,
            None => Ok(()),
        },
        JobStatus::Failed => anyhow::bail!("Job {} failed", job.id),
        _ => anyhow::bail!("Job {} ended with status {}", job.id, job.status),
    }
}

async fn download(api: &ApiClient, job: &Job, dest: Option<&Path>) -> Result<()> {
    let dest = match dest {
        Some(d) => d.to_path_buf(),
        None => {
            let name = job.output_file.as_deref().context("Job has no output file")?;
            // The server name is used verbatim for the URL, but only its last
            // component for a local path.
            let local = Path::new(name).file_name().context("Output file name is empty")?;
            PathBuf::from(local)
        }
    };
    let bytes = api
        .download_output(job, &dest)
        .await
        .with_context(|| format!("Failed to download output of job {}", job.id))?;
    println!("📥 Saved {} bytes to {}", bytes, dest.display());
    Ok(())
}

fn adjust_level(base: log::LevelFilter, verbose: u8, quiet: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Error;
    }
    let levels = [
        log::LevelFilter::Off,
        log::LevelFilter::Error,
        log::LevelFilter::Warn,
        log::LevelFilter::Info,
        log::LevelFilter::Debug,
        log::LevelFilter::Trace,
    ];
    let idx = levels.iter().position(|l| *l == base).unwrap_or(3);
    levels[(idx + verbose as usize).min(levels.len() - 1)]
}

fn setup_logging(config: &LoggingConfig, verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let base: log::LevelFilter = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.level))?;
    let level = adjust_level(base, verbose, quiet);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Some(path) = &config.output {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
