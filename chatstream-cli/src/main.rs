//! chatstream CLI - print a streaming chat completion as it arrives.
//!
//! Sends a system + user seed conversation, prints every fragment as
//! `Received: <content>`, and closes the stream on Ctrl-C.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitCode;

use chatstream::prelude::*;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Stream a chat completion and print each fragment as it arrives
#[derive(Parser)]
#[command(name = "chatstream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Model to use
    #[arg(short, long, env = "OPENAI_MODEL", default_value = ChatRequest::DEFAULT_MODEL)]
    model: String,

    /// System instruction sent first
    #[arg(long, default_value = ChatRequest::DEFAULT_SYSTEM)]
    system: String,

    /// User prompt
    #[arg(short, long, default_value = ChatRequest::DEFAULT_PROMPT)]
    prompt: String,

    /// API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Read fragments from `delta.content` instead of `message.content`
    #[arg(long)]
    delta: bool,

    /// Cap on generated tokens
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Seconds to wait for the connection or for the next chunk of the stream
    /// (default: wait indefinitely). The stream as a whole has no deadline.
    #[arg(long)]
    timeout: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(outcome) => {
            tracing::debug!(?outcome, "session finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
///
/// Logs go to stderr; stdout only carries fragment lines.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chatstream={level},{}",
            if verbosity >= 3 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .init();
}

/// Resolves when Ctrl-C is pressed.
///
/// If the handler cannot be installed the session simply runs to completion.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

impl Cli {
    /// Applies the connection flags on top of `config`.
    fn client_config(&self, config: ClientConfig) -> ClientConfig {
        let mut config = config.with_model(self.model.clone());
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(secs);
        }
        config
    }

    /// The seed conversation described by the flags.
    fn request(&self) -> ChatRequest {
        let request = ChatRequest::seed(&*self.model, &*self.system, &*self.prompt);
        match self.max_tokens {
            Some(max_tokens) => request.with_max_tokens(max_tokens),
            None => request,
        }
    }

    const fn content_mode(&self) -> ContentMode {
        if self.delta {
            ContentMode::Delta
        } else {
            ContentMode::Message
        }
    }
}

/// Opens the stream unless `shutdown` fires first.
///
/// Returns `Ok(None)` when interrupted; there is no stream to close then.
async fn open_or_interrupt<F>(
    client: &ChatClient,
    request: &ChatRequest,
    shutdown: Pin<&mut F>,
) -> Result<Option<CompletionStream>>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        () = shutdown => {
            tracing::info!("interrupted before the stream opened");
            Ok(None)
        }
        stream = client.open_stream(request) => stream.map(Some),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<SessionOutcome> {
    let client = ChatClient::new(cli.client_config(ClientConfig::from_env()?))?;
    let request = cli.request();

    let shutdown = interrupted();
    tokio::pin!(shutdown);

    let Some(mut stream) = open_or_interrupt(&client, &request, shutdown.as_mut()).await? else {
        return Ok(SessionOutcome {
            events: 0,
            fragments: 0,
            end: SessionEnd::Interrupted,
        });
    };

    let mut stdout = std::io::stdout();
    run_session(&mut stream, &mut stdout, shutdown, cli.content_mode()).await
}
