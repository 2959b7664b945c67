// #![forbid(unsafe_code)]
// #![deny(non_upper_case_globals)]
// #![deny(non_camel_case_types)]
// #![deny(non_snake_case)]
// #![deny(unused_mut)]
// #![deny(unused_variables)]
// #![deny(dead_code)]
// #![deny(unused_imports)]
//#![deny(missing_docs)]
//#![deny(warnings)]

extern crate chrono;
extern crate derivative;
extern crate lazy_static;
extern crate serde_derive;

#[macro_use]
extern crate log;

macro_rules! lock {
    ($name: expr) => {
        match $name.lock() {
            Ok(locked) => locked,
            Err(e) => panic!("{:#?}", e),
        }
    };
}

mod app;
mod configuration;
mod connection;
mod time;
mod view;

use log::LevelFilter;
use signal_hook::{iterator::Signals, SIGINT, SIGTERM};
use std::fmt::Display;
use std::io::Write;
use std::{path::PathBuf, process::exit, thread};
use structopt::StructOpt;

use self::app::capture::Capture;
use self::app::{App, Interrupt};
use self::connection::{hook, mssql::Session};
use self::{
    configuration::command_line::{LogLevel, Opt},
    configuration::settings::Settings,
    configuration::test_list,
};

#[tokio::main]
async fn main() {
    let options = Opt::from_args();

    if let Err(e) = init_logging(
        options.logging.unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    ) {
        fatal(format!("Cannot set up logging: {}", e));
    }

    let settings = Settings::load(&options).unwrap_or_else(|e| fatal(e));
    debug!("Initiated configuration {:#?}", settings);
    let tests = test_list::load(options.test_file.as_deref()).unwrap_or_else(|e| fatal(e));

    let capture = Capture::new();
    if let Err(e) = hook::install(capture.clone()) {
        fatal(format!("Cannot attach to driver messages: {}", e));
    }

    print!("Connecting to server {}...\r", settings.server);
    let _ = std::io::stdout().flush();
    let session = Session::connect(&settings)
        .await
        .unwrap_or_else(|e| fatal(e));

    let app = App::new(tests, session, capture, &settings);
    spawn_signal_listener(app.interrupt());

    if let Err(e) = app.run().await {
        fatal(format!("Alas, there's been an error: {}", e));
    }
}

fn fatal<T: Display>(message: T) -> ! {
    error!("{}", message);
    eprintln!("{}", message);
    exit(1)
}

fn spawn_signal_listener(interrupt: Interrupt) {
    let signals = match Signals::new(&[SIGINT, SIGTERM]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Signals are not handled: {}", e);
            return;
        }
    };

    thread::spawn(move || {
        for sig in signals.forever() {
            info!("Received signal {:?}, stopping", sig);
            interrupt.trigger();
        }
    });
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<(), fern::InitError> {
    let mut dispatcher = fern::Dispatch::new()
        // Perform allocation-free log formatting
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level);

    // The terminal belongs to the view, so records only ever go to a file.
    match output {
        Some(log_file) => dispatcher = dispatcher.chain(fern::log_file(log_file)?),
        None => dispatcher = dispatcher.level(LevelFilter::Off),
    }
    dispatcher.apply()?;
    info!("Logging level {} enabled", level);
    Ok(())
}
