use std::process;
use log::error;

use geoslicer::commands::{build_cli, CommandFactory, GeoslicerCommandFactory};
use geoslicer::utils::logger::Logger;

fn main() {
    let matches = build_cli().get_matches();
    let verbose = matches.get_flag("verbose");

    let log_file = matches.get_one::<String>("log-file")
        .map(String::as_str)
        .unwrap_or("geoslicer.log");
    let logger = match Logger::new(log_file) {
        Ok(l) => l.quiet(),
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = Logger::init_global_logger("geoslicer-global.log", verbose) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let factory = GeoslicerCommandFactory::new();

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            process::exit(1);
        }
    };
}
