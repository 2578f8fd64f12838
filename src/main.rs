use std::path::PathBuf;

use clap::{Parser, Subcommand};
use srclib::{Result, cmd};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the srclib application
#[derive(Parser)]
#[command(name = "srclib")]
#[command(about = "Offline source-content library synchronized from a remote catalog")]
#[command(version)]
struct Cli {
   #[command(subcommand)]
   command: Cmd,
}

/// Available subcommands for srclib
#[derive(Subcommand)]
enum Cmd {
   #[command(about = "Refresh the server catalog and list available updates")]
   Check {
      #[arg(long, help = "Print the update set as JSON")]
      json: bool,
   },

   #[command(about = "Download pending updates into the library")]
   Download {
      #[arg(long, help = "Download every resource the server offers")]
      all: bool,
   },

   #[command(about = "Download a single {project}-{language}-{resource}")]
   Get {
      #[arg(help = "Source translation id, e.g. gen-en-ulb")]
      id: String,
   },

   #[command(name = "update-all", about = "Download sources, catalogs and chunk markers")]
   UpdateAll,

   #[command(about = "List projects with localized titles")]
   Projects {
      #[arg(short, long, default_value = "en", help = "Preferred language for titles")]
      lang: String,

      #[arg(long, help = "Browse the server catalog instead of the library")]
      preview: bool,

      #[arg(long)]
      json: bool,
   },

   #[command(about = "Browse the category tree")]
   Categories {
      #[arg(short, long, default_value = "en", help = "Preferred language for titles")]
      lang: String,

      #[arg(help = "Category ids from the top level down")]
      path: Vec<String>,

      #[arg(long)]
      json: bool,
   },

   #[command(about = "Export the library to a timestamped archive")]
   Export {
      #[arg(default_value = ".", help = "Directory to write the archive to")]
      dest: PathBuf,

      #[arg(long, help = "Export the server catalog instead of the library")]
      preview: bool,
   },

   #[command(about = "Replace the library with an exported archive")]
   Import {
      #[arg(help = "Archive produced by `srclib export`")]
      archive: PathBuf,
   },

   #[command(about = "Install a bundled library")]
   Deploy {
      #[arg(help = "Target-language catalog (JSON array)")]
      languages: PathBuf,

      #[arg(help = "Library archive")]
      archive: PathBuf,
   },

   #[command(about = "Remove a project from the library")]
   Delete {
      #[arg(help = "Project id")]
      project: String,
   },

   #[command(about = "Remove all indexes, keeping target languages")]
   Destroy,

   #[command(about = "Show library status")]
   Status,
}

#[tokio::main]
async fn main() {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
      .init();

   let cli = Cli::parse();
   if let Err(err) = run(cli).await {
      eprintln!("{err}");
      std::process::exit(err.exit_code());
   }
}

async fn run(cli: Cli) -> Result<()> {
   match cli.command {
      Cmd::Check { json } => cmd::check::execute(json).await,
      Cmd::Download { all } => cmd::download::execute(all).await,
      Cmd::Get { id } => cmd::download::execute_one(&id).await,
      Cmd::UpdateAll => cmd::maintenance::update_all().await,
      Cmd::Projects { lang, preview, json } => cmd::browse::projects(&lang, preview, json),
      Cmd::Categories { lang, path, json } => cmd::browse::categories(&lang, &path, json),
      Cmd::Export { dest, preview } => cmd::archive::export(&dest, preview),
      Cmd::Import { archive } => cmd::archive::import(&archive),
      Cmd::Deploy { languages, archive } => cmd::archive::deploy(&languages, &archive),
      Cmd::Delete { project } => cmd::maintenance::delete_project(&project),
      Cmd::Destroy => cmd::maintenance::destroy(),
      Cmd::Status => cmd::maintenance::status(),
   }
}
