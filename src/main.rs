enum Command {
    Daemon,
    Capture(String),
    Export,
    Unknown(String),
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Command {
    match args.next().as_deref() {
        None => Command::Daemon,
        Some("capture") => Command::Capture(args.collect::<Vec<_>>().join(" ")),
        Some("export") => Command::Export,
        Some(other) => Command::Unknown(other.to_string()),
    }
}

fn main() {
    match parse_args(std::env::args().skip(1)) {
        Command::Daemon => caseclip::run(),
        Command::Capture(text) => {
            if text.trim().is_empty() {
                eprintln!("Usage: caseclip capture <text>");
                std::process::exit(2);
            }
            if let Err(err) = caseclip::capture::send_selection_to_running_instance(&text) {
                eprintln!("caseclip: {err}; start the daemon first by running `caseclip`");
                std::process::exit(1);
            }
        }
        Command::Export => match caseclip::run_export() {
            Ok(path) => println!("{}", path.display()),
            Err(err) => {
                eprintln!("caseclip: {err}");
                std::process::exit(1);
            }
        },
        Command::Unknown(command) => {
            eprintln!("caseclip: unknown command `{command}`");
            eprintln!("Usage: caseclip [capture <text> | export]");
            std::process::exit(2);
        }
    }
}
