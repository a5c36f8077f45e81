use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crash_triage::api::client::ApiClient;
use crash_triage::config::config::Config;
use crash_triage::model::id::EntityId;
use crash_triage::repository::snapshot::Repository;
use crash_triage::screen::crashes_screen::CrashesScreen;
use crash_triage::screen::main_screen::MainScreen;
use crash_triage::screen::notify::TracingNotifier;
use crash_triage::view::crash::CrashView;
use crash_triage::view::group::CrashGroupDetails;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crash-triage", about = "Triage crash reports into crash groups")]
struct Cli {
    /// Settings file; defaults to config/settings.toml
    #[arg(long, env = "CRASH_TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Snapshot of groups, reports and solutions to start from
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Replace the snapshot's reports with the service's current list
    #[arg(long)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List crash groups with their member counts
    Groups,
    /// List reports that belong to no group
    Unassigned,
    /// List every report the service knows about
    Crashes,
    /// Show one group with its crashes and solution
    Group { group_id: EntityId },
    /// Assign an unassigned report to a group
    Assign {
        report_id: EntityId,
        group_id: EntityId,
    },
    /// Submit a new crash report
    Submit {
        #[arg(long, default_value = "")]
        app_name: String,
        #[arg(long, default_value = "")]
        app_version: String,
        #[arg(long, default_value = "")]
        system_version: String,
        #[arg(long)]
        exit_code: Option<i64>,
        #[arg(long, default_value = "")]
        stderr: String,
    },
    /// Create an empty crash group
    CreateGroup,
    /// Delete a crash report
    Delete { report_id: EntityId },
}

impl Command {
    fn changes_snapshot(&self) -> bool {
        matches!(
            self,
            Command::Assign { .. } | Command::Submit { .. } | Command::CreateGroup
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .pretty()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let client =
        ApiClient::from_config(&config).context("Failed to set up crash service client")?;
    let notifier = Arc::new(TracingNotifier);

    let snapshot_path = cli.snapshot.clone().unwrap_or_else(|| config.snapshot.clone());

    match cli.command {
        Command::Crashes => {
            let screen = CrashesScreen::new(client, notifier);
            screen.load().await?;
            for crash in screen.crashes().borrow().iter() {
                print_crash(crash);
            }
        }
        Command::Delete { report_id } => {
            let screen = CrashesScreen::new(client, notifier);
            screen.load().await?;
            let key = screen
                .crashes()
                .find(|c| c.report_id.as_ref() == Some(&report_id), |c| c.key())
                .with_context(|| format!("Crash report {} not found", report_id))?;
            screen.remove(key).await?;
            println!("Deleted crash report {}", report_id);
        }
        command => {
            let persist = cli.refresh || command.changes_snapshot();
            let mut repo = Repository::load(&snapshot_path)?;
            if cli.refresh {
                repo.refresh_reports(&client).await?;
                info!("Refreshed {} crash reports", repo.crash_reports.len());
            }
            let mut screen = MainScreen::new(repo, client, notifier);
            run_main_screen(&mut screen, command).await?;

            if persist {
                screen.repository().save(&snapshot_path)?;
            }
        }
    }

    info!("Done");

    Ok(())
}

async fn run_main_screen(screen: &mut MainScreen, command: Command) -> Result<()> {
    match command {
        Command::Groups => {
            for group in screen.crash_groups().borrow().iter() {
                print_group(group);
            }
        }
        Command::Unassigned => {
            for crash in screen.crash_reports().borrow().iter() {
                print_crash(crash);
            }
        }
        Command::Group { group_id } => {
            screen.view_crash_group(&group_id).await?;
            if let Some(group) = screen.group_to_view().borrow().as_ref() {
                print_group(group);
                for crash in &group.crashes {
                    print!("  ");
                    print_crash(crash);
                }
            }
        }
        Command::Assign {
            report_id,
            group_id,
        } => {
            let key = screen
                .crash_reports()
                .find(|c| c.report_id.as_ref() == Some(&report_id), |c| c.key())
                .with_context(|| format!("Crash report {} is not unassigned", report_id))?;
            screen.select_group(Some(group_id.clone()));
            screen.assign_report(key).await?;
            println!("Assigned crash report {} to group {}", report_id, group_id);
        }
        Command::Submit {
            app_name,
            app_version,
            system_version,
            exit_code,
            stderr,
        } => {
            screen.add_crash();
            screen.composer().edit(|draft| {
                draft.application_name = app_name;
                draft.application_version = app_version;
                draft.system_version = system_version;
                draft.exit_code = exit_code;
                draft.stderr_output = stderr;
            });
            screen.send_crash().await?;
            if let Some(crash) = screen.crash_reports().borrow().last() {
                print_crash(crash);
            }
        }
        Command::CreateGroup => {
            let group_id = screen.send_crash_group().await?;
            println!(
                "Created crash group {}",
                group_id.map(|id| id.to_string()).unwrap_or_default()
            );
        }
        Command::Crashes | Command::Delete { .. } => {
            anyhow::bail!("{:?} is not a triage page command", command)
        }
    }

    Ok(())
}

fn print_group(group: &CrashGroupDetails) {
    let id = group
        .group_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    println!(
        "group {:<8} crashes {:<4} solution {}",
        id,
        group.count,
        group.solution_name.as_deref().unwrap_or("-")
    );
}

fn print_crash(crash: &CrashView) {
    let group = crash
        .group_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "report {:<8} group {:<6} {} {} exit {} {}",
        crash.display_id(),
        group,
        crash.application.name,
        crash.application.version,
        crash
            .exit_code
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        crash.stderr_output.lines().next().unwrap_or("")
    );
}
