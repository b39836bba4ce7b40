mod animation;
mod app;
mod clock;
mod command;
mod config;
mod input;
mod model;
mod render;
mod session;
mod vitals;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = config::Args::parse();
    let settings = config::resolve(&args)?;
    app::run(settings)
}
