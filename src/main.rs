//! Binary entrypoint for the entity API.

use std::process::ExitCode;

use sidecar_crud::start;

/// Serve contacts, sessions and tasks on `SIDECAR_CRUD_PORT`.
fn main() -> ExitCode {
    start::run_api()
}
