//! DigiWorkHub - command-line front end for the DigiWorkHub service.
//!
//! Each subcommand stands in for one screen of the mobile client and prints
//! its result as plain text.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use digiworkhub::api::types::{NewMessage, TaskStatus};
use digiworkhub::api::{ApiError, FilePart, Mailbox, TaskFilter, WorkHubClient};
use digiworkhub::calendar;
use digiworkhub::config::{self, Settings};
use digiworkhub::error::{AppError, Result};
use digiworkhub::logging;
use digiworkhub::push::{LogNotificationSink, PushHandler, DevicePushToken};
use digiworkhub::session::{SessionCipher, SessionStore};
use digiworkhub::tasks::{create_task_channel, ApiMessage};

#[derive(Debug, Parser)]
#[command(name = "digiworkhub", about = "DigiWorkHub tasks and messages from the terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and remember the session. The password is read from stdin.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account and log in. The password is read from stdin.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Request a password reset email.
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// List tasks.
    Tasks {
        #[arg(long, default_value = "all", value_name = "all|assigned|created")]
        filter: TaskFilter,
    },
    /// Show one task in detail.
    Task { id: String },
    /// Change the status of a task.
    Status { id: String, status: TaskStatus },
    /// Show the month calendar of assigned tasks.
    Calendar {
        /// Months away from the current one.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// List received messages.
    Inbox,
    /// List sent messages.
    Sent,
    /// Send a message.
    Send {
        /// Recipient user ids.
        #[arg(long = "to", required = true, value_delimiter = ',')]
        to: Vec<String>,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        /// Files to attach.
        #[arg(long = "attach", value_name = "path")]
        attachments: Vec<PathBuf>,
    },
    /// Fetch assigned tasks, inbox and users concurrently.
    Dashboard,
    /// Register a refreshed push token for this device.
    RegisterDevice { token: String },
    /// Show a notification built from `key=value` push data.
    Notify {
        #[arg(value_name = "key=value")]
        data: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = Settings::load();
    let log_settings = loaded.as_ref().cloned().unwrap_or_default();
    if let Err(e) = logging::init(&log_settings) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let result = match loaded {
        Ok(settings) => run(settings, cli.command).await,
        Err(e) => Err(e.into()),
    };

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            ExitCode::FAILURE
        }
    };

    logging::shutdown();
    code
}

fn open_session(settings: &Settings) -> Result<Arc<SessionStore>> {
    let path = match &settings.session_file {
        Some(path) => path.clone(),
        None => SessionStore::default_path()?,
    };
    let cipher = SessionCipher::from_keyring()?;
    Ok(Arc::new(SessionStore::open(path, cipher)?))
}

fn build_client(settings: &Settings) -> Result<WorkHubClient> {
    let session = open_session(settings)?;
    let client = WorkHubClient::from_settings(settings, session)?
        .with_push_tokens(Arc::new(DevicePushToken::new(settings.device_token.clone())));
    Ok(client)
}

async fn run(settings: Settings, command: Command) -> Result<()> {
    let client = build_client(&settings)?;
    info!(base_url = %client.base_url(), "Client ready");

    match command {
        Command::Login { email } => {
            let password = read_password().await?;
            let auth = client.login(&email, &password).await?;
            println!("Logged in as {} <{}>", auth.user.name, auth.user.email);
        }
        Command::Signup { name, email } => {
            let password = read_password().await?;
            let auth = client.signup(&name, &email, &password).await?;
            println!("Welcome, {}", auth.user.name);
        }
        Command::ResetPassword { email } => {
            let ack = client.reset_password(&email).await?;
            println!("{}", non_empty_or(&ack.message, "Password reset requested"));
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = client.current_user().await?;
            println!("{} <{}> ({})", user.name, user.email, user.id);
        }
        Command::Tasks { filter } => {
            for task in client.list_tasks(filter).await? {
                println!(
                    "{:<12} {:<12} {:<8} {}",
                    task.id,
                    task.status.label(),
                    task.priority.label(),
                    task.title
                );
            }
        }
        Command::Task { id } => print_task(&client, &id).await?,
        Command::Status { id, status } => {
            let task = client.change_task_status(&id, status).await?;
            println!("{} is now {}", task.title, task.status);
        }
        Command::Calendar { offset } => {
            let tasks = client.list_tasks(TaskFilter::Assigned).await?;
            let month = calendar::build_month_from_today(&tasks, offset)?;
            println!("{}", month.title());
            for day in month.days.iter().filter(|d| !d.tasks.is_empty()) {
                let titles: Vec<&str> = day.tasks.iter().map(|t| t.title.as_str()).collect();
                println!("  {}  {}", day.date.format("%a %d %b"), titles.join(", "));
            }
            println!("{} task(s) in view", month.task_count());
        }
        Command::Inbox => print_mailbox(&client, Mailbox::Inbox).await?,
        Command::Sent => print_mailbox(&client, Mailbox::Sent).await?,
        Command::Send {
            to,
            subject,
            body,
            attachments,
        } => {
            let mut parts = Vec::with_capacity(attachments.len());
            for path in &attachments {
                parts.push(FilePart::from_path("attachments", path).await?);
            }
            let message = NewMessage {
                recipient_ids: to,
                subject,
                body,
            };
            let sent = client.send_message(&message, parts).await?;
            println!("Sent \"{}\" ({})", sent.subject, sent.id);
        }
        Command::Dashboard => dashboard(client).await?,
        Command::RegisterDevice { token } => {
            Settings::save_device_token(&config::config_path()?, &token)?;
            let handler = PushHandler::new(client, Arc::new(LogNotificationSink));
            if handler.on_new_token(&token).await? {
                println!("Device token registered");
            } else {
                println!("Not logged in; token saved and will be sent with the next login");
            }
        }
        Command::Notify { data } => {
            let payload: HashMap<String, String> = data
                .iter()
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let handler = PushHandler::new(client, Arc::new(LogNotificationSink));
            handler.on_message(&payload);
            println!("Notification shown");
        }
    }

    Ok(())
}

async fn print_task(client: &WorkHubClient, id: &str) -> Result<()> {
    let task = client.get_task(id).await?;
    println!("{} [{}] {}", task.title, task.status, task.priority);
    if !task.description.is_empty() {
        println!("{}", task.description);
    }
    if let Some(due) = task.due_date {
        println!("Due: {}", digiworkhub::api::dates::format(&due));
    }
    println!("Assignees: {}", task.assignee_names());

    let (done, total) = task.checklist_progress();
    if total > 0 {
        println!("Checklist: {}/{}", done, total);
        for item in &task.checklist {
            println!("  [{}] {}", if item.checked { "x" } else { " " }, item.text);
        }
    }
    for subtask in &task.subtasks {
        println!("  - {} ({})", subtask.title, subtask.status);
    }
    for comment in &task.comments {
        println!("  {}: {}", comment.author.name, comment.text);
    }
    for attachment in &task.attachments {
        println!("  @ {}", attachment.file_name);
    }
    Ok(())
}

async fn print_mailbox(client: &WorkHubClient, mailbox: Mailbox) -> Result<()> {
    for message in client.list_messages(mailbox).await? {
        let marker = if message.read { " " } else { "*" };
        println!(
            "{} {}  {:<20} {}",
            marker,
            digiworkhub::api::dates::format(&message.sent_at),
            message.sender.name,
            message.subject
        );
    }
    Ok(())
}

async fn dashboard(client: WorkHubClient) -> Result<()> {
    let (mut rx, spawner) = create_task_channel(client);
    spawner.spawn_fetch_tasks(TaskFilter::Assigned);
    spawner.spawn_fetch_messages(Mailbox::Inbox);
    spawner.spawn_fetch_users();
    drop(spawner);

    let mut first_error: Option<ApiError> = None;
    while let Some(message) = rx.recv().await {
        match message {
            ApiMessage::TasksFetched { result: Ok(tasks), .. } => {
                let open = tasks.iter().filter(|t| t.status != TaskStatus::Done).count();
                println!("Assigned tasks: {} ({} open)", tasks.len(), open);
            }
            ApiMessage::MessagesFetched { result: Ok(messages), .. } => {
                let unread = messages.iter().filter(|m| !m.read).count();
                println!("Inbox: {} ({} unread)", messages.len(), unread);
            }
            ApiMessage::UsersFetched(Ok(users)) => println!("Team members: {}", users.len()),
            ApiMessage::TasksFetched { result: Err(e), .. }
            | ApiMessage::MessagesFetched { result: Err(e), .. }
            | ApiMessage::UsersFetched(Err(e)) => {
                eprintln!("{}", AppError::from(e.clone()).user_message());
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            _ => {}
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Read a password from stdin, prompting when attached to a terminal.
async fn read_password() -> Result<String> {
    if std::io::stdin().is_terminal() {
        eprint!("Password: ");
    }

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(AppError::other("A password is required on stdin."));
    }
    Ok(password)
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
