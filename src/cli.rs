use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "mailbridge", about = "Mail.app operations over osascript", version)]
#[command(group(ArgGroup::new("mode").args(["serve", "call", "list_operations", "show_operation"]).multiple(false)))]
pub struct Cli {
    /// Serve operations as MCP tools on stdin/stdout (default mode).
    #[arg(long)]
    pub serve: bool,

    /// Call one operation and print its result.
    #[arg(long, value_name = "OPERATION")]
    pub call: Option<String>,

    /// JSON object with the operation's arguments (used with --call).
    #[arg(long, value_name = "JSON", default_value = "{}", requires = "call")]
    pub args: String,

    /// List registered operations.
    #[arg(short = 'l', long = "list-operations", visible_alias = "lo")]
    pub list_operations: bool,

    /// Show an operation's description and parameters.
    #[arg(long = "show-operation", value_name = "OPERATION")]
    pub show_operation: Option<String>,

    /// Interpreter binary (overrides MAIL_BRIDGE_INTERPRETER).
    #[arg(long)]
    pub interpreter: Option<String>,

    /// Root directory of file-based scripts (overrides MAIL_BRIDGE_SCRIPT_ROOT).
    #[arg(long = "script-root")]
    pub script_root: Option<PathBuf>,

    /// Seconds before a script is killed (overrides MAIL_BRIDGE_TIMEOUT).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
