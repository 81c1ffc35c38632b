//! A tiny command host wired through Chauffeur.
//!
//! ```text
//! cargo run --example basic -- publish rb deploy quit
//! CHAUFFEUR_LOG=chauffeur=trace cargo run --example basic -- pub
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use chauffeur::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// === Services ===

#[derive(Default)]
struct Console {
    lines: RefCell<Vec<String>>,
}

impl Console {
    fn say(&self, line: impl Into<String>) {
        let line = line.into();
        println!("  {line}");
        self.lines.borrow_mut().push(line);
    }
}

#[derive(Clone)]
struct Config {
    target: String,
    dry_run: bool,
}

// === Deliverables ===

#[derive(Injectable, Describe)]
#[deliverable(name = "publish", alias = "pub", discover)]
struct Publish {
    console: Option<Rc<Console>>,
    config: Option<Config>,
}

impl Deliverable for Publish {
    fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
        let (Some(console), Some(config)) = (&self.console, &self.config) else {
            return DeliverableResponse::FinishedWithError;
        };
        let mode = if config.dry_run { " (dry run)" } else { "" };
        console.say(format!("publishing to {}{mode}", config.target));
        DeliverableResponse::Continue
    }
}

#[derive(Injectable, Describe)]
#[deliverable(name = "rollback", alias = "rb", discover)]
struct Rollback {
    console: Option<Rc<Console>>,
}

impl Deliverable for Rollback {
    fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
        if let Some(console) = &self.console {
            console.say("rolling back the last release");
        }
        DeliverableResponse::Continue
    }
}

#[derive(Injectable, Describe)]
#[deliverable(name = "quit", alias = "exit", discover)]
struct Quit;

impl Deliverable for Quit {
    fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
        DeliverableResponse::Shutdown
    }
}

#[derive(Injectable, Describe)]
#[deliverable(name = "unknown", discover)]
struct Unknown {
    console: Option<Rc<Console>>,
}

impl Deliverable for Unknown {
    fn run(&mut self, command: &str, _args: &[String]) -> DeliverableResponse {
        if let Some(console) = &self.console {
            console.say(format!("no such command: {command}"));
        }
        DeliverableResponse::FinishedWithError
    }
}

// === Plugins ===

struct HostPlugin;

impl BuildDependencies for HostPlugin {
    fn build(&self, builder: &mut ContainerBuilder) -> Result<()> {
        builder.register_lazy(|| Rc::new(Console::default()))?;
        builder
            .register_instance(Config {
                target: "staging".to_string(),
                dry_run: false,
            })?
            .alias("config")?
            .on_created(|config| {
                if std::env::var_os("CHAUFFEUR_DRY_RUN").is_some() {
                    config.dry_run = true;
                }
            });
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CHAUFFEUR_LOG")
                .unwrap_or_else(|_| EnvFilter::new("chauffeur=debug")),
        )
        .init();

    let container = Container::bootstrap(&Catalog::discover(), &[&HostPlugin])?;
    println!("✅ Container built: {container:?}");

    let mut names: Vec<&str> = container
        .deliverables()
        .iter()
        .filter_map(|d| d.name())
        .collect();
    names.sort_unstable();
    println!("📋 Commands: {}", names.join(", "));

    let commands: Vec<String> = std::env::args().skip(1).collect();
    let commands = if commands.is_empty() {
        Vec::from(["pub", "publsh", "rb", "exit"].map(String::from))
    } else {
        commands
    };

    info!(commands = commands.len(), "Running commands");
    for command in &commands {
        println!("▶ {command}");
        let mut deliverable = container.resolve_command_by_name(command)?;
        match deliverable.run(command, &[]) {
            DeliverableResponse::Continue => {}
            DeliverableResponse::FinishedWithError => {
                let suggestions = container.suggest(command);
                if !suggestions.is_empty() {
                    println!("  did you mean: {}?", suggestions.join(", "));
                }
            }
            DeliverableResponse::Shutdown => break,
        }
    }

    if let Some(console) = container.resolve::<Rc<Console>>()? {
        println!("\n🎉 {} line(s) written", console.lines.borrow().len());
    }
    Ok(())
}
