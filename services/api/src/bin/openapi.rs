//! services/api/src/bin/openapi.rs
//!
//! Dumps the OpenAPI document of the program API (tracking, gating, sessions and
//! answer profiles) so client code can be generated without a running server.
//!
//! Usage: `openapi [OUTPUT_PATH]`, defaulting to `openapi.json`.

use std::path::PathBuf;

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let document = ApiDoc::openapi();
    let paths = document.paths.paths.len();
    std::fs::write(&output, document.to_pretty_json()?)?;

    println!("Wrote OpenAPI document with {paths} paths to {}", output.display());
    Ok(())
}
