use anyhow::{bail, Context, Result};
use chatbox_core::{
    ChatController, ChatSurface, Config, FileStore, HttpResponder, KeyValueStore, MemoryStore,
    TurnOutcome,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod app;
mod handler;
mod logging;
mod surface;
mod tui;
mod ui;

use app::App;
use surface::{PrintSurface, TuiSurface};
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "chatbox", version)]
#[command(about = "Terminal chat client for a remote responder service")]
struct Cli {
    /// Responder base URL (overrides CHATBOX_ENDPOINT and the config file)
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// History store file
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Keep history in memory only for this run
    #[arg(long, global = true, conflicts_with = "store")]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
    },
    /// Print the stored conversation
    History {
        /// Print the rendered HTML fragments instead of plain text
        #[arg(long)]
        markup: bool,
    },
    /// Show the config file, saving any of --endpoint, --store or --trust-markup into it
    Config {
        /// Render responder replies without escaping
        #[arg(long, value_name = "BOOL")]
        trust_markup: Option<bool>,
    },
}

/// Settings after CLI flags, environment and config file are merged.
struct Settings {
    config: Config,
    store: Option<PathBuf>,
    ephemeral: bool,
}

impl Settings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = Config::load()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "could not read config; using defaults");
                Config::default()
            })
            .with_env_overrides();
        if let Some(endpoint) = &cli.endpoint {
            config.endpoint = endpoint.clone();
        }

        Ok(Self {
            store: cli.store.clone().or_else(|| config.store_path.clone()),
            ephemeral: cli.ephemeral,
            config,
        })
    }

    fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        if self.ephemeral {
            tracing::info!("history kept in memory only");
            return Ok(Box::new(MemoryStore::new()));
        }

        let path = match &self.store {
            Some(path) => path.clone(),
            None => FileStore::default_path()?,
        };
        tracing::info!(path = %path.display(), "using history store");
        Ok(Box::new(FileStore::new(path)))
    }

    fn controller<V: ChatSurface>(
        &self,
        view: V,
    ) -> Result<ChatController<HttpResponder, Box<dyn KeyValueStore>, V>> {
        let chat = ChatController::new(
            HttpResponder::new(&self.config.endpoint),
            self.open_store()?,
            view,
            self.config.markup_policy(),
        )
        .context("failed to load chat history")?;
        Ok(chat)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Chat) => {
            logging::init_file(&logging::default_log_path())?;
            let settings = Settings::resolve(&cli)?;
            run_tui(&settings).await
        }
        Some(Command::Send { ref message }) => {
            logging::init_stderr()?;
            let settings = Settings::resolve(&cli)?;
            send_once(&settings, message).await
        }
        Some(Command::History { markup }) => {
            logging::init_stderr()?;
            let settings = Settings::resolve(&cli)?;
            settings.controller(PrintSurface { history: true, markup })?;
            Ok(())
        }
        Some(Command::Config { trust_markup }) => {
            logging::init_stderr()?;
            edit_config(&cli, trust_markup)
        }
    }
}

/// Copy the persistable flags onto `config`. Returns whether anything changed.
fn apply_config_flags(config: &mut Config, cli: &Cli, trust_markup: Option<bool>) -> bool {
    let mut changed = false;
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
        changed = true;
    }
    if let Some(store) = &cli.store {
        config.store_path = Some(store.clone());
        changed = true;
    }
    if let Some(trust) = trust_markup {
        config.trust_responder_markup = trust;
        changed = true;
    }
    changed
}

fn edit_config(cli: &Cli, trust_markup: Option<bool>) -> Result<()> {
    let path = Config::get_config_path()?;
    // The file as written, without CHATBOX_ENDPOINT applied
    let mut config = Config::load().context("failed to read config")?;

    if apply_config_flags(&mut config, cli, trust_markup) {
        config.save().context("failed to save config")?;
        tracing::info!(path = %path.display(), "config saved");
    }

    println!("config: {}", path.display());
    println!("endpoint = {}", config.endpoint);
    match &config.store_path {
        Some(store) => println!("store_path = {}", store.display()),
        None => println!("store_path = (default)"),
    }
    println!("trust_responder_markup = {}", config.trust_responder_markup);
    Ok(())
}

async fn send_once(settings: &Settings, message: &str) -> Result<()> {
    let mut chat = settings.controller(PrintSurface::default())?;

    match chat.submit(message).await? {
        None => bail!("nothing to send: the message is blank"),
        Some(TurnOutcome::Replied) => Ok(()),
        Some(TurnOutcome::Failed) => bail!("responder at {} did not answer", settings.config.endpoint),
    }
}

async fn run_tui(settings: &Settings) -> Result<()> {
    let chat = settings.controller(TuiSurface::new())?;
    let mut app = App::new(chat, settings.config.endpoint.clone());
    tracing::info!(endpoint = %app.endpoint, "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run_loop(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event)?,
            Some(joined) = app.turns.join_next() => app.complete_turn(joined)?,
            else => break,
        }
    }

    if !app.turns.is_empty() {
        tracing::info!(
            pending = app.turns.len(),
            "quitting with replies still pending; those turns are discarded"
        );
    }
    Ok(())
}
