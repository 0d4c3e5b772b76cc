//! Sable CLI
//!
//! A local, zero-knowledge credential vault: everything is encrypted
//! on this machine under a key derived from your master password, which
//! never leaves memory.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use sable_core::{
    default_vault_dir, generate, load_config, score, Credential, CredentialUpdate, FileBlobStore,
    FileTokenStore, LocalIdentity, MemorySessionStore, PasswordPolicy, VaultSession,
};

#[derive(Parser)]
#[command(name = "sable")]
#[command(version)]
#[command(about = "Sable - zero-knowledge credential vault")]
#[command(after_help = "EXAMPLES:
  sable init                        Set up a master password
  sable add GitHub -u octocat       Add a credential (prompts for password)
  sable list                        List stored credentials
  sable generate -l 20              Generate a strong password
  sable strength                    Score a password (prompts securely)")]
struct Cli {
    /// Vault directory (defaults to ~/.sable-vault)
    #[arg(long, global = true)]
    vault_dir: Option<PathBuf>,

    /// Account the vault is partitioned under
    #[arg(long, global = true, default_value = "local", env = "SABLE_USER")]
    user: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the master password for this vault
    Init,

    /// Add a credential (prompts for the password)
    Add {
        /// Title of the credential (e.g., "GitHub")
        title: String,
        /// Login username or email
        #[arg(short, long)]
        username: String,
        /// Site URL
        #[arg(long)]
        url: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Generate the password instead of prompting
        #[arg(long)]
        generate: bool,
    },

    /// List credentials (never shows passwords)
    List,

    /// Show one credential
    Show {
        /// Credential id (from `sable list`)
        id: Uuid,
        /// Print the password in the clear
        #[arg(long)]
        reveal: bool,
    },

    /// Update fields of a credential
    Update {
        /// Credential id
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },

    /// Remove a credential
    Remove {
        /// Credential id
        id: Uuid,
    },

    /// Search credentials by title, username or URL
    Search {
        /// Search term (case-insensitive)
        term: String,
    },

    /// Generate a password from a character-class policy
    #[command(after_help = "EXAMPLES:
  sable generate                    16 chars, all classes
  sable generate -l 24 --no-symbols
  sable generate --exclude-similar  Drop 0/O, 1/l/I lookalikes")]
    Generate {
        /// Password length
        #[arg(short, long, default_value = "16")]
        length: usize,
        #[arg(long)]
        no_uppercase: bool,
        #[arg(long)]
        no_lowercase: bool,
        #[arg(long)]
        no_numbers: bool,
        #[arg(long)]
        no_symbols: bool,
        /// Exclude visually similar characters
        #[arg(long)]
        exclude_similar: bool,
    },

    /// Estimate the strength of a password (prompts securely)
    Strength,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let vault_dir = cli.vault_dir.clone().unwrap_or_else(default_vault_dir);

    match cli.command {
        None => {
            println!("Sable - zero-knowledge credential vault");
            println!();
            println!("Run 'sable --help' for usage information.");
            println!("Run 'sable init' to set up a master password.");
        }
        Some(cmd) => {
            if let Err(e) = handle_command(cmd, &vault_dir, &cli.user).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn handle_command(
    cmd: Commands,
    vault_dir: &PathBuf,
    user: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Init => handle_init(vault_dir, user).await,
        Commands::Add {
            title,
            username,
            url,
            notes,
            generate,
        } => handle_add(vault_dir, user, title, username, url, notes, generate).await,
        Commands::List => handle_list(vault_dir, user).await,
        Commands::Show { id, reveal } => handle_show(vault_dir, user, &id, reveal).await,
        Commands::Update {
            id,
            title,
            username,
            url,
            notes,
            password,
        } => handle_update(vault_dir, user, &id, title, username, url, notes, password).await,
        Commands::Remove { id } => handle_remove(vault_dir, user, &id).await,
        Commands::Search { term } => handle_search(vault_dir, user, &term).await,
        Commands::Generate {
            length,
            no_uppercase,
            no_lowercase,
            no_numbers,
            no_symbols,
            exclude_similar,
        } => handle_generate(PasswordPolicy {
            length,
            include_uppercase: !no_uppercase,
            include_lowercase: !no_lowercase,
            include_numbers: !no_numbers,
            include_symbols: !no_symbols,
            exclude_similar,
        }),
        Commands::Strength => handle_strength(),
    }
}

// === Command Handlers ===

async fn handle_init(vault_dir: &PathBuf, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = build_session(vault_dir, user).await?;

    if session.has_master_password().await? {
        println!("A master password already exists for '{}'.", user);
        return Ok(());
    }

    println!("Setting up vault at {}", vault_dir.display());
    println!();

    let password = prompt_password("Choose a master password: ")?;
    let confirm = prompt_password("Confirm master password: ")?;

    if password != confirm {
        return Err("Passwords do not match".into());
    }
    if password.len() < 8 {
        return Err("Master password must be at least 8 characters".into());
    }

    let report = score(&password);
    if report.score < 60 {
        println!("Warning: weak master password (score {}/100)", report.score);
        for hint in &report.feedback {
            println!("  - {}", hint);
        }
        println!();
    }

    session.create_master_password(&password).await?;

    println!("Vault created.");
    println!();
    println!("Next steps:");
    println!("  sable add <title> -u <username>   Add a credential");
    println!("  sable generate                    Generate a password");

    Ok(())
}

async fn handle_add(
    vault_dir: &PathBuf,
    user: &str,
    title: String,
    username: String,
    url: Option<String>,
    notes: Option<String>,
    generate_password: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = unlock_session(vault_dir, user).await?;

    let password = if generate_password {
        let generated = generate(&PasswordPolicy::default())?;
        println!("Generated password: {}", generated);
        generated
    } else {
        let value = prompt_password("Password for this credential: ")?;
        let report = score(&value);
        if report.score < 40 {
            println!("Note: weak password (score {}/100, crack time: {})", report.score, report.crack_time);
        }
        value
    };

    let credential = Credential::new(title.clone(), username, password, url, notes);
    let id = credential.id;
    session.add(credential).await?;

    println!("Added '{}' ({})", title, id);
    Ok(())
}

async fn handle_list(vault_dir: &PathBuf, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = unlock_session(vault_dir, user).await?;
    let collection = session.list().await?;

    if collection.is_empty() {
        println!("Vault is empty. Add a credential with 'sable add'.");
        return Ok(());
    }

    println!("{} credential(s):", collection.len());
    println!();
    for credential in &collection.credentials {
        println!(
            "  {}  {:24} {}",
            credential.id, credential.title, credential.username
        );
    }

    Ok(())
}

async fn handle_show(
    vault_dir: &PathBuf,
    user: &str,
    id: &Uuid,
    reveal: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = unlock_session(vault_dir, user).await?;
    let credential = session.get(id).await?;

    println!("Title:    {}", credential.title);
    println!("Username: {}", credential.username);
    if reveal {
        println!("Password: {}", credential.password);
    } else {
        println!("Password: {}  (use --reveal to print)", mask_value(&credential.password));
    }
    if let Some(url) = &credential.url {
        println!("URL:      {}", url);
    }
    if let Some(notes) = &credential.notes {
        println!("Notes:    {}", notes);
    }
    println!("Created:  {}", credential.created_at.format("%Y-%m-%d %H:%M UTC"));
    println!("Updated:  {}", credential.updated_at.format("%Y-%m-%d %H:%M UTC"));

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_update(
    vault_dir: &PathBuf,
    user: &str,
    id: &Uuid,
    title: Option<String>,
    username: Option<String>,
    url: Option<String>,
    notes: Option<String>,
    prompt_new_password: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = unlock_session(vault_dir, user).await?;

    let password = if prompt_new_password {
        Some(prompt_password("New password: ")?)
    } else {
        None
    };

    let update = CredentialUpdate {
        title,
        username,
        password,
        url: url.map(Some),
        notes: notes.map(Some),
    };

    let updated = session.update(id, update).await?;
    println!("Updated '{}'", updated.title);
    Ok(())
}

async fn handle_remove(
    vault_dir: &PathBuf,
    user: &str,
    id: &Uuid,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = unlock_session(vault_dir, user).await?;
    session.remove(id).await?;
    println!("Removed {}", id);
    Ok(())
}

async fn handle_search(
    vault_dir: &PathBuf,
    user: &str,
    term: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = unlock_session(vault_dir, user).await?;
    let matches = session.search(term).await?;

    if matches.is_empty() {
        println!("No credentials match '{}'.", term);
        return Ok(());
    }

    for credential in matches {
        println!(
            "  {}  {:24} {}",
            credential.id, credential.title, credential.username
        );
    }

    Ok(())
}

fn handle_generate(policy: PasswordPolicy) -> Result<(), Box<dyn std::error::Error>> {
    let password = generate(&policy)?;
    let report = score(&password);

    println!("{}", password);
    println!();
    println!("Strength:   {}/100", report.score);
    println!("Crack time: {}", report.crack_time);

    Ok(())
}

fn handle_strength() -> Result<(), Box<dyn std::error::Error>> {
    let password = prompt_password("Password to score: ")?;
    let report = score(&password);

    println!();
    println!("Score:      {}/100", report.score);
    println!("Crack time: {}", report.crack_time);
    if !report.feedback.is_empty() {
        println!();
        println!("Suggestions:");
        for hint in &report.feedback {
            println!("  - {}", hint);
        }
    }

    Ok(())
}

// === Helper Functions ===

async fn build_session(
    vault_dir: &PathBuf,
    user: &str,
) -> Result<VaultSession, Box<dyn std::error::Error>> {
    let config = load_config(vault_dir).await?;

    Ok(VaultSession::new(
        config,
        Arc::new(LocalIdentity::new(user)),
        Arc::new(FileTokenStore::new(vault_dir.clone())),
        Arc::new(FileBlobStore::new(vault_dir.clone())),
        Arc::new(MemorySessionStore::new()),
    ))
}

/// Build a session and unlock it with a prompted master password
async fn unlock_session(
    vault_dir: &PathBuf,
    user: &str,
) -> Result<VaultSession, Box<dyn std::error::Error>> {
    let mut session = build_session(vault_dir, user).await?;

    if !session.has_master_password().await? {
        return Err("No vault found. Run 'sable init' first.".into());
    }

    let password = prompt_password("Master password: ")?;
    session.unlock(&password).await?;

    Ok(session)
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let password = rpassword::read_password()?;
    Ok(password)
}

/// Mask a password for display: first and last character with asterisks
fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= 4 {
        "*".repeat(len.max(1))
    } else {
        format!("{}{}{}", chars[0], "*".repeat(len - 2), chars[len - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value(""), "*");
        assert_eq!(mask_value("abcd"), "****");
        assert_eq!(mask_value("abcdef"), "a****f");
    }
}
