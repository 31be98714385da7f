//! Main application entry point.

use mindcanvas_app::{AppError, AppResult, Session, ShortcutRegistry};
use mindcanvas_core::EngineConfig;
use std::process::ExitCode;

const USAGE: &str = "usage: mindcanvas [--config <engine.json>] <session.json>\n       mindcanvas --shortcuts";

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Mind Canvas");

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("mindcanvas: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> AppResult<()> {
    let mut config_path = None;
    let mut session_path = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--shortcuts" => {
                print!("{}", ShortcutRegistry::table());
                return Ok(());
            }
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| AppError::Usage(format!("--config needs a path\n{USAGE}")))?;
                config_path = Some(path);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if session_path.is_none() => session_path = Some(arg),
            _ => return Err(AppError::Usage(format!("unexpected argument '{arg}'\n{USAGE}"))),
        }
    }

    let session_path = session_path.ok_or_else(|| AppError::Usage(USAGE.to_string()))?;
    let config = match config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let session = Session::load(&session_path)?;
    log::info!("Replaying {} steps from {session_path}", session.steps.len());
    let controller = session.replay(config)?;

    println!("{}", controller.scene().to_json()?);
    Ok(())
}
