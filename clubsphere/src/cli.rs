//! CLI driver over the application core.
//!
//! A thin shell for development and smoke-testing against a real backend:
//! each subcommand resolves the initial session check, runs one operation
//! end-to-end, and prints whatever the core returned, including any queued
//! notifications.

use clap::Subcommand;

use crate::App;
use crate::backend::models::clubs::ClubFilter;
use crate::backend::models::pagination::PageQuery;
use crate::backend::models::users::Role;
use crate::notify::NotificationQueue;
use crate::session::SessionRead;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with email + password and print the resolved role
    Login {
        email: String,
        password: String,
    },
    /// Create an account and the matching member record
    Register {
        name: String,
        email: String,
        password: String,
        /// Requested role for the member record
        #[arg(long, value_enum, default_value = "member")]
        role: CliRole,
    },
    /// Clear the session
    Logout,
    /// Print the current principal and role
    Whoami,
    /// Evaluate a navigation against the guards and print the outcome
    Navigate {
        path: String,
    },
    /// List clubs with optional filtering
    Clubs {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

/// Role values accepted on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum CliRole {
    Member,
    Moderator,
    Admin,
}

impl From<CliRole> for Role {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::Member => Role::Member,
            CliRole::Moderator => Role::Moderator,
            CliRole::Admin => Role::Admin,
        }
    }
}

pub async fn run(app: &App, queue: &mut NotificationQueue, command: Command) -> anyhow::Result<()> {
    // The CLI has no persisted session; every invocation starts anonymous.
    app.session.restore_session(None).await;

    let result = dispatch(app, command).await;
    for note in queue.drain() {
        println!("[{:?}] {}", note.level, note.message);
    }
    result
}

async fn dispatch(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            app.session.login_with_credentials(&email, &password).await?;
            print_identity(app).await;
        }
        Command::Register {
            name,
            email,
            password,
            role,
        } => {
            app.session
                .register_with_credentials(&name, &email, &password, role.into(), None)
                .await?;
            println!("registered {email}");
        }
        Command::Logout => {
            app.session.logout().await;
            println!("logged out");
        }
        Command::Whoami => print_identity(app).await,
        Command::Navigate { path } => {
            let outcome = app.navigator.navigate(&path).await;
            println!("{path} -> {outcome:?}");
        }
        Command::Clubs { search, category, page } => {
            let filter = ClubFilter {
                search,
                category,
                sort_by: None,
                order: None,
            };
            let page = PageQuery {
                page: Some(page),
                limit: None,
            };
            let clubs = app.backend.clubs().list(&filter, page).await?;
            for club in &clubs.data {
                println!("{:<30} {:<15} ${:.2}", club.club_name, club.category, club.membership_fee);
            }
            println!("({} of {} pages)", page.page(), clubs.total_pages);
        }
    }
    Ok(())
}

async fn print_identity(app: &App) {
    match app.session.context().read() {
        SessionRead::Pending => println!("session check unresolved"),
        SessionRead::Anonymous => println!("anonymous"),
        SessionRead::Authenticated(principal) => {
            print!("{} ({})", principal.email, principal.uid);
            match app.backend.users().get_by_email(&principal.email).await {
                Ok(Some(record)) => println!(" role={:?}", record.role),
                Ok(None) => println!(" (no member record)"),
                Err(e) => println!(" (role lookup failed: {e})"),
            }
        }
    }
}
