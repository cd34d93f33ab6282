mod cli;

use anyhow::{anyhow, Context, Result};
use mailbridge::{
    bridge::Bridge,
    config::{self, Config},
    operations::Registry,
    printer::TextPrinter,
    server::{self, MailServer},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol traffic in serve mode; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("mailbridge=info".parse()?))
        .init();

    let args = cli::Cli::parse();

    // Load config once; CLI flags override it.
    let mut cfg = Config::load();
    if let Some(program) = &args.interpreter {
        cfg.set(config::INTERPRETER, program.clone());
    }
    if let Some(root) = &args.script_root {
        cfg.set(config::SCRIPT_ROOT, root.to_string_lossy().into_owned());
    }
    if let Some(secs) = args.timeout {
        cfg.set(config::TIMEOUT, secs.to_string());
    }

    let registry = Registry::with_catalog(cfg.preferences());
    let bridge = Bridge::from_config(&cfg);
    let printer = TextPrinter::default();

    if args.list_operations {
        printer.operation_list(&registry)?;
        return Ok(());
    }
    if let Some(name) = &args.show_operation {
        let op = registry
            .get(name)
            .ok_or_else(|| anyhow!("unknown operation: {}", name))?;
        printer.operation_detail(&registry, op)?;
        return Ok(());
    }
    if let Some(name) = &args.call {
        let call_args: serde_json::Value = serde_json::from_str(&args.args)
            .with_context(|| format!("invalid --args json: {}", args.args))?;
        let output = registry
            .call(&bridge, name, call_args)
            .await
            .with_context(|| format!("operation '{name}' failed"))?;
        printer.print(&output.render())?;
        return Ok(());
    }

    tracing::info!(
        interpreter = %cfg.interpreter(),
        script_root = %bridge.store().root().display(),
        timeout = ?bridge.timeout(),
        "starting mail bridge server"
    );
    server::serve_stdio(MailServer::new(registry, bridge))
        .await
        .context("server stopped")?;
    tracing::info!("server shutdown complete");
    Ok(())
}
