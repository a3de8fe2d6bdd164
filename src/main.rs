mod app;
mod audio;
mod config;
mod error;
mod runtime;
mod show;
mod sync;
mod timeline;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
