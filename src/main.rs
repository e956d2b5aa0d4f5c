mod actions;
mod cli;
mod config;
mod draw;
mod error;
mod flight;
mod geometry;
mod gestures;
mod input;
mod landmarks;
mod logging;
mod minimap;
mod path;
mod session;
mod tracker;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
