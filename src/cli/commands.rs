//! Command execution

use std::io;
use std::rc::Rc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info, instrument};

use crate::application::counter::{counter_app, CounterState};
use crate::application::{Root, TaskQueue};
use crate::cli::args::{Cli, Commands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, OutputFormat, Settings};
use crate::infrastructure::MemoryDocument;

/// Event fired by `--click`.
const CLICK: &str = "click";

/// Dispatch the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    output::set_color(settings.output.color);
    debug!(?settings, "settings loaded");

    match &cli.command {
        Some(Commands::Demo { clicks, format }) => {
            let format = format.unwrap_or(settings.output.format);
            let rendered = run_demo(&settings, clicks, format)?;
            output::info(&rendered);
            Ok(())
        }
        Some(Commands::Config) => show_config(&settings),
        Some(Commands::Completion { shell }) => {
            print_completions(*shell);
            Ok(())
        }
        None => Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        )),
    }
}

/// Mounts the counter app, clicks `clicks` in order and returns the rendered document.
///
/// The mount point is a `div` whose id comes from an `#id` root selector
/// (`app` otherwise), so the app resolves its root through the selector.
#[instrument(skip(settings))]
pub fn run_demo(settings: &Settings, clicks: &[String], format: OutputFormat) -> CliResult<String> {
    let doc = Rc::new(MemoryDocument::new());
    let queue = Rc::new(TaskQueue::new());
    let id = settings.root_selector.strip_prefix('#').unwrap_or("app");
    let mount = doc.mount_point("div", id)?;

    let app = counter_app(
        Rc::clone(&doc),
        Rc::clone(&queue),
        Root::Selector(settings.root_selector.clone()),
        CounterState::default(),
    )?;
    queue.run_until_idle(settings.max_turns)?;
    debug!(mutations = doc.take_mutations().len(), "first render");

    for label in clicks {
        let target = doc
            .find_by_text(mount, label)?
            .ok_or_else(|| CliError::InvalidArgs(format!("no element with text {:?}", label)))?;
        let fired = doc.dispatch_event(target, CLICK)?;
        queue.run_until_idle(settings.max_turns)?;
        debug!(mutations = doc.take_mutations().len(), "patched");
        output::action("clicked", &format!("{} ({} listener(s))", label, fired));
    }
    info!(
        count = app.state().count,
        renders = app.flush_count(),
        "demo finished"
    );

    let rendered = match format {
        OutputFormat::Html => doc.outer_html(mount)?,
        OutputFormat::Tree => doc.to_tree_string(mount)?.to_string(),
    };
    Ok(rendered)
}

fn show_config(settings: &Settings) -> CliResult<()> {
    match global_config_path() {
        Some(path) => output::header(&format!("# global config: {}", path.display())),
        None => output::header("# global config: <unavailable>"),
    }
    output::info(&settings.to_toml()?);
    Ok(())
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
