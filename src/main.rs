use std::process::ExitCode;

fn main() -> ExitCode {
    rampload::entry::run()
}
