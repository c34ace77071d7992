//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use coursehub_core::config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "coursehub")]
#[command(version)]
#[command(about = "Command-line client for the coursehub learning platform")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        #[arg(long, env = "COURSEHUB_USERNAME")]
        username: Option<String>,
        /// Prompted on stdin when omitted
        #[arg(long, env = "COURSEHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and log in
    Signup(commands::auth::SignupArgs),
    /// Clear the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Browse courses
    Courses {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Enroll in a course
    Enroll {
        #[arg(value_name = "COURSE_ID")]
        course_id: u64,
    },
    /// List your enrollments and progress
    Enrollments,
    /// List the lessons of a course
    Lessons {
        #[arg(value_name = "COURSE_ID")]
        course_id: u64,
    },
    /// Mark a lesson complete
    Complete {
        #[arg(value_name = "LESSON_ID")]
        lesson_id: u64,
        /// Show course progress afterwards
        #[arg(long, value_name = "COURSE_ID")]
        course: Option<u64>,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum CourseCommands {
    /// Lists all courses
    List,
    /// Shows a course with its instructor and lessons
    Show {
        #[arg(value_name = "COURSE_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Shows your profile
    Show,
    /// Updates profile fields; only the given fields change
    Update(commands::profile::UpdateArgs),
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when the config file is broken.
    if let Commands::Config { command } = &cli.command {
        return config_command(command);
    }

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config)?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &config::Config) -> Result<()> {
    let client = commands::client(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&client, username, password).await
        }
        Commands::Signup(args) => commands::auth::signup(&client, args).await,
        Commands::Logout => {
            commands::auth::logout(&client);
            Ok(())
        }
        Commands::Status => {
            commands::auth::status(&client);
            Ok(())
        }

        Commands::Courses { command } => match command {
            CourseCommands::List => commands::courses::list(&client).await,
            CourseCommands::Show { id } => commands::courses::show(&client, id).await,
        },
        Commands::Enroll { course_id } => commands::enrollments::enroll(&client, course_id).await,
        Commands::Enrollments => commands::enrollments::list(&client).await,
        Commands::Lessons { course_id } => commands::lessons::list(&client, course_id).await,
        Commands::Complete { lesson_id, course } => {
            commands::lessons::complete(&client, lesson_id, course).await
        }

        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile::show(&client).await,
            ProfileCommands::Update(args) => commands::profile::update(&client, args).await,
        },

        Commands::Config { command } => config_command(&command),
    }
}

fn config_command(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::Generate => commands::config::generate(),
    }
}
