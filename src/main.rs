//! CLI entry point for `emltree`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};

use emltree::config::Config;
use emltree::export::{self, json, text};
use emltree::{Message, MessageParser};

/// Decode MIME messages into a tree of parts with decoded headers and bodies.
#[derive(Parser)]
#[command(name = "emltree", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Deepest multipart nesting accepted
    #[arg(long, value_name = "N", global = true)]
    max_depth: Option<usize>,

    /// Treat parts without Content-Type as text/plain; charset=us-ascii
    #[arg(long, global = true)]
    default_content_type: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an outline of the MIME tree
    Tree {
        /// Message file, or `-` for stdin
        file: PathBuf,
    },
    /// Print the decoded tree as JSON
    Json {
        /// Message file, or `-` for stdin
        file: PathBuf,
        /// Include raw headers and bodies
        #[arg(long)]
        raw: bool,
    },
    /// Print the headers of one part
    Headers {
        /// Message file, or `-` for stdin
        file: PathBuf,
        /// Dotted index path of the part, e.g. `1.0`
        #[arg(short, long, default_value = "root")]
        part: String,
        /// Print undecoded header values
        #[arg(long)]
        raw: bool,
    },
    /// Write the decoded body of one part to stdout
    Body {
        /// Message file, or `-` for stdin
        file: PathBuf,
        /// Dotted index path of the part, e.g. `1.0`
        #[arg(short, long, default_value = "root")]
        part: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = emltree::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let mut options = config.decode.options();
    if let Some(depth) = cli.max_depth {
        options.max_depth = depth;
    }
    if cli.default_content_type {
        options.default_content_type = true;
    }
    let parser = MessageParser::with_options(options);

    match cli.command {
        Commands::Tree { file } => cmd_tree(&parser, &file),
        Commands::Json { file, raw } => {
            cmd_json(&parser, &file, raw || config.output.show_raw, &config)
        }
        Commands::Headers { file, part, raw } => {
            cmd_headers(&parser, &file, &part, raw || config.output.show_raw)
        }
        Commands::Body { file, part } => cmd_body(&parser, &file, &part),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_file = emltree::config::log_file_path(config);
    let log_dir = log_file.parent().map(Path::to_path_buf).unwrap_or_default();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "emltree.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Parse `file`, reading stdin when it is `-`.
fn load_message(parser: &MessageParser, file: &Path) -> anyhow::Result<Message> {
    if file == Path::new("-") {
        return parser
            .parse(std::io::stdin().lock())
            .context("failed to decode message from stdin");
    }
    parser
        .parse_file(file)
        .with_context(|| format!("failed to decode {}", file.display()))
}

fn select_part<'a>(message: &'a Message, part: &str) -> anyhow::Result<&'a Message> {
    let path = export::parse_path(part).with_context(|| format!("invalid part path {part:?}"))?;
    message
        .part(&path)
        .with_context(|| format!("no part at {part}"))
}

fn cmd_tree(parser: &MessageParser, file: &Path) -> anyhow::Result<()> {
    let message = load_message(parser, file)?;
    print!("{}", text::render_tree(&message));
    Ok(())
}

fn cmd_json(
    parser: &MessageParser,
    file: &Path,
    raw: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let message = load_message(parser, file)?;
    let out = json::to_json(&message, raw, config.output.pretty_json)?;
    println!("{out}");
    Ok(())
}

fn cmd_headers(parser: &MessageParser, file: &Path, part: &str, raw: bool) -> anyhow::Result<()> {
    let message = load_message(parser, file)?;
    let node = select_part(&message, part)?;
    let headers = if raw {
        &node.raw_headers
    } else {
        &node.decoded_headers
    };
    print!("{}", text::render_headers(headers));
    Ok(())
}

fn cmd_body(parser: &MessageParser, file: &Path, part: &str) -> anyhow::Result<()> {
    let message = load_message(parser, file)?;
    let node = select_part(&message, part)?;
    let mut stdout = std::io::stdout().lock();
    match &node.decoded_body {
        Some(body) => stdout.write_all(body.as_bytes())?,
        None if node.is_multipart() => {
            anyhow::bail!(
                "part {part} is {} with {} part(s); select one of them",
                node.content_type.media_type,
                node.parts.len()
            )
        }
        None => {
            let bytes = node
                .decoded_bytes()
                .with_context(|| format!("failed to decode body of part {part}"))?;
            stdout.write_all(&bytes)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "emltree", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}
