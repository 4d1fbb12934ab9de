//! Binary entrypoint of the `ragdesk` terminal client.

use std::process::ExitCode;

use ragdesk::start;

fn main() -> ExitCode {
    start::run()
}
