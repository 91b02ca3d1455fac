use anyhow::{Context, Result};
use api_client::{ApiClient, DEFAULT_API_BASE};
use clap::{Parser, Subcommand};
use doc_model::SourceRef;
use pdf_engine::{default_engine, OpenSource};
use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use storage::{AuthGate, FileFlagStore};
use viewer_core::{DocumentFetcher, EngineCapability, LocalFiles, Viewer};

pub mod display;
pub mod interactive;

pub use interactive::ViewerCommand;

#[derive(Debug, Parser)]
#[command(name = "page-analyzer")]
#[command(about = "Browse shared documents and see where readers spend their time")]
pub struct Cli {
    /// Base URL of the document API.
    #[arg(long, global = true, env = "PAGE_ANALYZER_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
    /// Directory holding the admin flag.
    #[arg(long, global = true, env = "PAGE_ANALYZER_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List documents available on the server.
    List,
    /// Record an access, download a document and view it.
    Open {
        filename: String,
        /// Write each rendered page as PNG into this directory.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// View a local document.
    ViewFile {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Log in as admin.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "PAGE_ANALYZER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the admin login.
    Logout,
    /// Print access totals per document (admin).
    Analytics,
    /// Print the access history of one document (admin).
    Details { filename: String },
    /// Print CLI version.
    Version,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Commands::List => run_list(&ApiClient::new(cli.api_base)),
        Commands::Open { filename, output_dir } => {
            run_open(ApiClient::new(cli.api_base), &filename, output_dir.as_deref())
        }
        Commands::ViewFile { file, output_dir } => run_view_file(&file, output_dir.as_deref()),
        Commands::Login { username, password } => {
            run_login(&ApiClient::new(cli.api_base), data_dir, &username, &password)
        }
        Commands::Logout => {
            auth_gate(data_dir)?.logout().context("failed to clear admin login")?;
            println!("Logged out");
            Ok(())
        }
        Commands::Analytics => {
            require_admin(data_dir)?;
            let analytics =
                ApiClient::new(cli.api_base).analytics().context("failed to load analytics")?;
            display::write_analytics(&mut io::stdout().lock(), &analytics)?;
            Ok(())
        }
        Commands::Details { filename } => {
            require_admin(data_dir)?;
            let details = ApiClient::new(cli.api_base)
                .pdf_details(&filename)
                .with_context(|| format!("failed to load access history for {filename}"))?;
            display::write_details(&mut io::stdout().lock(), &filename, &details)?;
            Ok(())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_list(client: &ApiClient) -> Result<()> {
    let pdfs = client.list_pdfs().context("failed to load document list")?;
    display::write_document_list(&mut io::stdout().lock(), &pdfs)?;
    Ok(())
}

fn run_open(client: ApiClient, filename: &str, output_dir: Option<&Path>) -> Result<()> {
    if let Err(err) = client.track_access(filename) {
        log::warn!("could not record access to {filename}: {err}");
    }

    let source = SourceRef::new(client.document_url(filename));
    let viewer = Viewer::new(EngineCapability::new(default_engine(), ApiFetcher { client }));
    block_on(interactive::run_viewer(
        &viewer,
        source,
        io::stdin().lock(),
        &mut io::stdout().lock(),
        output_dir,
    ))
}

fn run_view_file(file: &Path, output_dir: Option<&Path>) -> Result<()> {
    ensure_file_exists(file)?;

    let source = SourceRef::new(file.display().to_string());
    let viewer = Viewer::new(EngineCapability::new(default_engine(), LocalFiles));
    block_on(interactive::run_viewer(
        &viewer,
        source,
        io::stdin().lock(),
        &mut io::stdout().lock(),
        output_dir,
    ))
}

fn run_login(
    client: &ApiClient,
    data_dir: Option<&Path>,
    username: &str,
    password: &str,
) -> Result<()> {
    let mut gate = auth_gate(data_dir)?;
    let response = client.login(username, password).context("login request failed")?;

    if !gate.apply_login(response).context("failed to persist admin login")? {
        anyhow::bail!("invalid credentials");
    }

    println!("Logged in as admin");
    Ok(())
}

fn auth_gate(data_dir: Option<&Path>) -> Result<AuthGate<FileFlagStore>> {
    let store = match data_dir {
        Some(dir) => FileFlagStore::with_root(dir),
        None => FileFlagStore::from_default_project().context("failed to locate data directory")?,
    };

    Ok(AuthGate::restore(store))
}

fn require_admin(data_dir: Option<&Path>) -> Result<()> {
    if !auth_gate(data_dir)?.is_admin() {
        anyhow::bail!("login required: run `page-analyzer login` first");
    }
    Ok(())
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(future)
}

/// Downloads documents through the API off the runtime thread.
struct ApiFetcher {
    client: ApiClient,
}

impl DocumentFetcher for ApiFetcher {
    type Error = anyhow::Error;

    async fn fetch(&self, source: &SourceRef) -> Result<OpenSource, anyhow::Error> {
        let client = self.client.clone();
        let url = source.as_str().to_owned();

        let bytes = tokio::task::spawn_blocking(move || client.download(&url))
            .await
            .context("download task failed")??;

        Ok(OpenSource::Bytes(bytes))
    }
}
