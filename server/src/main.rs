mod config;
mod http;
mod view;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use entity::{EmployeeField, EmployeeFields, EmployeeId};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{CreateOutcome, DashboardView, Directory, Notice, NoticeLevel, NoticeReceiver};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "staff-dashboard", version, about = "Employee directory dashboard")]
struct Cli {
    /// Use a process-local store instead of the hosted table.
    #[arg(long, global = true, env = "STAFF_IN_MEMORY")]
    in_memory: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP dashboard.
    Serve(ServeCommand),
    /// Print the employee count and table.
    List,
    /// Add an employee and send the notification email.
    Add(FieldArgs),
    /// Change fields of an existing employee.
    Edit {
        id: EmployeeId,
        #[command(flatten)]
        fields: EditArgs,
    },
    /// Delete an employee.
    Remove { id: EmployeeId },
    /// Send the notification email for an existing employee.
    Notify { id: EmployeeId },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[derive(Args, Debug)]
struct FieldArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    role: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
}

impl From<FieldArgs> for EmployeeFields {
    fn from(value: FieldArgs) -> Self {
        EmployeeFields::new(value.name, value.role, value.email, value.phone)
    }
}

#[derive(Args, Debug)]
struct EditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

impl EditArgs {
    fn changes(self) -> Vec<(EmployeeField, String)> {
        [
            (EmployeeField::Name, self.name),
            (EmployeeField::Role, self.role),
            (EmployeeField::Email, self.email),
            (EmployeeField::Phone, self.phone),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let config = AppConfig::load(cli.in_memory)?;
    let (mut directory, notices) = config.build_directory()?;

    match cli.command {
        Command::Serve(cmd) => run_server(cmd, &config, directory, notices).await,
        Command::List => {
            directory.refresh().await?;
            print!("{}", DashboardView::from(&directory).render_text());
            Ok(())
        }
        Command::Add(fields) => add(&mut directory, notices, fields.into()).await,
        Command::Edit { id, fields } => edit(&mut directory, notices, id, fields).await,
        Command::Remove { id } => {
            directory.refresh().await?;
            directory.remove(&id).await?;
            print!("{}", DashboardView::new(&directory).render_text());
            Ok(())
        }
        Command::Notify { id } => notify(&mut directory, notices, id).await,
    }
}

async fn run_server(
    cmd: ServeCommand,
    config: &AppConfig,
    mut directory: Directory,
    notices: NoticeReceiver,
) -> Result<()> {
    if let Err(err) = directory.refresh().await {
        warn!(error = %err, "initial fetch failed; starting with an empty list");
    }
    let state = AppState::new(directory, notices, config.cors_allowed_origins.clone());
    http::serve(cmd.into(), state).await
}

async fn add(directory: &mut Directory, mut notices: NoticeReceiver, fields: EmployeeFields) -> Result<()> {
    match directory.create(fields).await? {
        CreateOutcome::Skipped => bail!("every field is required"),
        CreateOutcome::Created {
            employee,
            notification,
        } => {
            info!(employee = %employee.id, "created");
            notification.join().await;
        }
    }
    print_notices(&mut notices);
    print!("{}", DashboardView::new(directory).render_text());
    Ok(())
}

async fn edit(
    directory: &mut Directory,
    mut notices: NoticeReceiver,
    id: EmployeeId,
    fields: EditArgs,
) -> Result<()> {
    directory.refresh().await?;
    directory.begin_edit(&id)?;
    for (field, value) in fields.changes() {
        directory.update_edit_field(field, value)?;
    }
    directory.save_edit(&id).await?;
    print_notices(&mut notices);
    print!("{}", DashboardView::new(directory).render_text());
    Ok(())
}

async fn notify(directory: &mut Directory, mut notices: NoticeReceiver, id: EmployeeId) -> Result<()> {
    directory.refresh().await?;
    let Some(employee) = directory.get(&id).cloned() else {
        bail!("employee {id} not found");
    };
    let delivery = directory.notify(employee).join().await;
    print_notices(&mut notices);
    if !delivery.is_sent() {
        bail!("notification for employee {id} was not delivered");
    }
    Ok(())
}

fn print_notices(notices: &mut NoticeReceiver) {
    while let Ok(Notice { level, message, .. }) = notices.try_recv() {
        match level {
            NoticeLevel::Success => println!("{message}"),
            NoticeLevel::Failure => eprintln!("{message}"),
        }
    }
}
