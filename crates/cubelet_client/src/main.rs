mod app;
mod camera;
mod input;
mod materials;
mod player;
mod scene;
mod script;
mod session;
mod settings;

use std::env;
use std::path::PathBuf;

use app::RunConfig;

const USAGE: &str =
    "Usage: cubelet_client [--settings <path>] [--script <path>] [--frames <n>] [--realtime]";

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut config = RunConfig::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let Some(value) = args.next() else {
                    eprintln!("--settings expects a path argument");
                    std::process::exit(2);
                };
                config.settings_path = PathBuf::from(value);
            }
            "--script" => {
                let Some(value) = args.next() else {
                    eprintln!("--script expects a path argument");
                    std::process::exit(2);
                };
                config.script_path = Some(PathBuf::from(value));
            }
            "--frames" => {
                let Some(value) = args.next() else {
                    eprintln!("--frames expects a numeric argument");
                    std::process::exit(2);
                };
                match value.parse::<u64>() {
                    Ok(parsed) => config.frame_limit = Some(parsed),
                    Err(err) => {
                        eprintln!("invalid frame count '{value}': {err}");
                        std::process::exit(2);
                    }
                }
            }
            "--realtime" => config.realtime = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("{USAGE}");
                std::process::exit(2);
            }
        }
    }

    match app::run(&config) {
        Ok(summary) => println!("{summary}"),
        Err(err) => {
            eprintln!("cubelet_client failed: {err}");
            std::process::exit(1);
        }
    }
}
