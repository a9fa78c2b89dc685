//! Export every extension in the account to `ext.json`, then stream the site
//! list to stdout.
//!
//! Credentials are read from `RC_CLIENT_ID`, `RC_CLIENT_SECRET` and `RC_JWT`
//! (and optionally `RC_SERVER_URL`).
//!
//! ```text
//! cargo run -p core-extract --example extensions --features desktop-shims
//! ```

use core_auth::BearerToken;
use core_extract::{Endpoint, Extractor, JsonContent};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_runtime::ExtractConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default())?;

    let config = ExtractConfig::from_env()?;
    let extractor = Extractor::desktop(&config)?;

    let mut token = BearerToken::from_config(&config);
    let mut json = JsonContent::from_config(&config);

    let extensions = Endpoint::Extension
        .url(&config.server_url)
        .ok_or_else(|| anyhow::anyhow!("extension endpoint needs an id"))?;

    match extractor.json_to_buffer(&mut token, &mut json, &extensions) {
        Ok(()) => match json.write_file("ext.json") {
            Some(path) => println!("{} bytes written to {}", json.len(), path.display()),
            None => println!("nothing written"),
        },
        Err(_) => println!("{}", token.error_message()),
    }

    if let Some(sites) = Endpoint::Sites.url(&config.server_url) {
        if extractor.json_to_file(&mut token, None, &sites).is_none() {
            eprintln!("{}", token.error_message());
        }
    }

    Ok(())
}
