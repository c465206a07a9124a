use rusty_forest::config::WorkflowConfig;
use rusty_forest::data::iris;
use rusty_forest::{report, workflow};

/// Headless run of the full workflow on the built-in iris table; prints
/// every intermediate table to stdout.
fn main() {
    env_logger::init();

    let config = match WorkflowConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };

    let rendered = workflow::run(&config, iris::dataset()).and_then(|r| report::render(&r));
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => {
            log::error!("Workflow failed: {e:#}");
            std::process::exit(1);
        }
    }
}
