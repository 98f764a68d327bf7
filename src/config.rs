use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "todo-pages")]
#[command(about = "A small TODO list served as HTML pages")]
pub struct Config {
    /// SQLite file holding the TODOs. Created on first start.
    #[arg(long, env = "TODO_DATABASE", default_value = "todo.db")]
    pub database: PathBuf,

    #[arg(long, env = "TODO_LISTEN", default_value = "0.0.0.0:5876")]
    pub listen: SocketAddr,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
