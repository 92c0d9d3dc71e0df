//! Development sidecar binary.
//! Run with: cargo run --bin sidecar-crud-sidecar

use std::process::ExitCode;

use sidecar_crud::start;

fn main() -> ExitCode {
    start::run_sidecar()
}
