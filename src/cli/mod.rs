//! CLI module for the `qms` command-line interface.
//!
//! Each invocation is one "page visit": it loads the durable session scope,
//! runs a single command and exits. The transient scope does not outlive the
//! process, so a login without `--remember` only lasts for that command.
//!
//! - `login` / `logout` / `whoami` - Session lifecycle
//! - `can <token>` - Check a permission on the current session
//! - `register` - Self-registration
//! - `strength <password>` - Password strength meter
//! - `forgot-password <email>` - Request a reset notice
//! - `visit <page>` - Evaluate the navigation guard for a page
//! - `users ...` - Administrator user directory
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::validation::password_strength;
use crate::api::{
    check_access, has_permission, Access, ApiError, Page, RegistrationForm, UserFilter, UserForm,
};
use crate::config::Config;
use crate::db::{Account, AccountId, AccountStatus, Role, Session};
use crate::AppState;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "qms")]
#[command(author, version, about = "Quality management system sign-in and user administration", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "QMS_CONFIG", default_value = "qms.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        email: String,
        #[arg(long, env = "QMS_PASSWORD", hide_env_values = true)]
        password: String,
        /// Keep the session across runs
        #[arg(long)]
        remember: bool,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the current session
    Whoami,

    /// Check whether the current session grants a permission
    Can {
        /// Permission token, e.g. manage_users
        token: String,
    },

    /// Create a new account with the default role
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
        #[arg(long, env = "QMS_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Score a password the way the registration form does
    Strength { password: String },

    /// Request a password reset link
    ForgotPassword { email: String },

    /// Check whether a page may be shown for the current session
    Visit {
        /// Page path, e.g. pages/dashboard.html
        page: String,
    },

    /// User directory commands (administrators only)
    #[command(subcommand)]
    Users(UsersCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Users subcommands
#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List users, optionally filtered
    List {
        /// Match against name or email
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        status: Option<AccountStatus>,
    },
    /// Add a user without a password
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
        #[arg(long, default_value = "user")]
        role: Role,
        #[arg(long, default_value = "active")]
        status: AccountStatus,
    },
    /// Edit a user; omitted fields keep their value
    Edit {
        id: AccountId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        status: Option<AccountStatus>,
    },
    /// Mark a user inactive
    Deactivate { id: AccountId },
    /// Send a password reset link to a user
    ResetPassword { id: AccountId },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a command against a fully wired state
pub fn run_command(cli: &Cli, state: &AppState) -> Result<()> {
    match &cli.command {
        Commands::Login {
            email,
            password,
            remember,
        } => cmd_login(state, email, password, *remember),
        Commands::Logout => cmd_logout(state),
        Commands::Whoami => cmd_whoami(state),
        Commands::Can { token } => cmd_can(state, token),
        Commands::Register {
            name,
            email,
            department,
            password,
            confirm_password,
        } => {
            let mut form = RegistrationForm::new(name, email, department, password);
            if let Some(confirm) = confirm_password {
                form.confirm_password = confirm.clone();
            }
            cmd_register(state, &form)
        }
        Commands::Strength { password } => cmd_strength(password),
        Commands::ForgotPassword { email } => cmd_forgot_password(state, email),
        Commands::Visit { page } => cmd_visit(state, page),
        Commands::Users(command) => cmd_users(state, command),
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

fn cmd_login(state: &AppState, email: &str, password: &str, remember: bool) -> Result<()> {
    let session = state
        .auth
        .login(email, password, remember)
        .map_err(ApiError::from)?;

    println!("Signed in as {} ({})", session.full_name, session.role);
    if !remember {
        println!("Session is not remembered and ends with this command.");
    }
    Ok(())
}

fn cmd_logout(state: &AppState) -> Result<()> {
    state.auth.logout();
    println!("Signed out.");
    Ok(())
}

fn cmd_whoami(state: &AppState) -> Result<()> {
    match state.auth.current_session() {
        Some(session) => print_session(&session),
        None => println!("Not signed in."),
    }
    Ok(())
}

fn print_session(session: &Session) {
    let permissions: Vec<&str> = session.permissions.iter().map(|p| p.as_str()).collect();

    println!("ID:          {}", session.id);
    println!("Name:        {}", session.full_name);
    println!("Email:       {}", session.email);
    println!("Department:  {}", session.department);
    println!("Role:        {}", session.role);
    println!("Permissions: {}", permissions.join(", "));
}

fn cmd_can(state: &AppState, token: &str) -> Result<()> {
    let session = state.auth.current_session();
    let allowed = has_permission(session.as_ref(), token);
    println!("{}", if allowed { "yes" } else { "no" });
    Ok(())
}

fn cmd_register(state: &AppState, form: &RegistrationForm) -> Result<()> {
    let account = state.auth.register(form).map_err(ApiError::from)?;
    println!("Registered {} as {} (id {})", account.email, account.role, account.id);
    Ok(())
}

fn cmd_strength(password: &str) -> Result<()> {
    let strength = password_strength(password);
    println!("{}% {}", strength.score, strength.label);
    Ok(())
}

fn cmd_forgot_password(state: &AppState, email: &str) -> Result<()> {
    let notice = state.auth.request_password_reset(email)?;
    println!("{}", notice);
    Ok(())
}

fn cmd_visit(state: &AppState, page: &str) -> Result<()> {
    let session = state.auth.current_session();
    match check_access(session.as_ref(), &Page::from_path(page)) {
        Access::Allow => println!("allow"),
        Access::Redirect(target) => println!("redirect {}", target),
    }
    Ok(())
}

fn require_session(state: &AppState) -> Result<Session> {
    state
        .auth
        .current_session()
        .ok_or_else(|| ApiError::unauthorized("Sign in with --remember first").into())
}

fn cmd_users(state: &AppState, command: &UsersCommands) -> Result<()> {
    let session = require_session(state)?;

    match command {
        UsersCommands::List {
            search,
            role,
            department,
            status,
        } => {
            let filter = UserFilter {
                search: search.clone(),
                role: *role,
                department: department.clone(),
                status: *status,
            };
            let accounts = state.users.list(&session, &filter)?;
            print_accounts(&accounts);
        }
        UsersCommands::Add {
            name,
            email,
            department,
            role,
            status,
        } => {
            let form = UserForm {
                id: None,
                name: name.clone(),
                email: email.clone(),
                department: department.clone(),
                role: *role,
                status: *status,
            };
            let account = state.users.save(&session, &form)?;
            println!("User added successfully (id {})", account.id);
        }
        UsersCommands::Edit {
            id,
            name,
            email,
            department,
            role,
            status,
        } => {
            let existing = state.users.get(&session, *id)?;
            let form = UserForm {
                id: Some(*id),
                name: name.clone().unwrap_or(existing.full_name),
                email: email.clone().unwrap_or(existing.email),
                department: department.clone().unwrap_or(existing.department),
                role: role.unwrap_or(existing.role),
                status: status.unwrap_or(existing.status),
            };
            state.users.save(&session, &form)?;
            println!("User updated successfully");
        }
        UsersCommands::Deactivate { id } => {
            let account = state.users.deactivate(&session, *id)?;
            println!("User {} deactivated", account.email);
        }
        UsersCommands::ResetPassword { id } => {
            let notice = state.users.send_password_reset(&session, *id)?;
            println!("{}", notice);
        }
    }
    Ok(())
}

fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No users found.");
        return;
    }

    println!();
    println!(
        "{:<4}  {:<20}  {:<30}  {:<8}  {:<12}  {:<8}  {:<16}",
        "ID", "NAME", "EMAIL", "ROLE", "DEPARTMENT", "STATUS", "LAST LOGIN"
    );
    println!("{}", "-".repeat(110));

    for account in accounts {
        println!(
            "{:<4}  {:<20}  {:<30}  {:<8}  {:<12}  {:<8}  {:<16}",
            account.id,
            truncate(&account.full_name, 20),
            truncate(&account.email, 30),
            account.role,
            truncate(&account.department, 12),
            account.status,
            account.last_login_display()
        );
    }
    println!();
    println!("Total: {} user(s)", accounts.len());
}

/// Validate the config file without touching storage
pub fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("The default configuration will be used.");
        return Ok(());
    }

    let config = Config::load(config_path)
        .with_context(|| format!("[!!] Invalid configuration: {}", config_path.display()))?;

    println!("[OK] Configuration file is valid!");
    println!();
    println!("=== Configuration Summary ===");
    println!();
    println!("Auth:");
    println!("  Min Password Length: {}", config.auth.min_password_length);
    println!("  Hash Memory (KiB):   {}", config.auth.hash_memory_kib);
    println!("  Hash Iterations:     {}", config.auth.hash_iterations);
    println!(
        "  Demo Accounts:       {}",
        if config.auth.seed_demo_accounts {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!();
    println!("Storage:");
    println!("  Data Dir:     {}", config.storage.data_dir.display());
    println!("  Session Key:  {}", config.storage.session_key);
    println!();
    println!("Permissions:");
    let permissions = config.permission_map()?;
    for role in Role::ALL {
        let tokens: Vec<&str> = permissions
            .permissions_for(role)
            .iter()
            .map(|p| p.as_str())
            .collect();
        println!("  {:<8} {}", role.as_str(), tokens.join(", "));
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
