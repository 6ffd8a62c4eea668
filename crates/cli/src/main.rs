use std::process::ExitCode;

fn main() -> ExitCode {
    quizlite_cli::run()
}
