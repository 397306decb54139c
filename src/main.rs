//! Host-side helper: `cargo run` builds the WASM site, starts a local HTTP
//! server for `static/`, and (if available) exposes it via ngrok.

use std::process::{Command, Stdio};
use std::{env, thread, time::Duration};

use anyhow::{bail, Context, Result};
use log::{info, warn};

fn main() -> Result<()> {
    // Only meaningful on non-wasm targets.
    if env::var("TARGET").unwrap_or_default() == "wasm32-unknown-unknown" {
        return Ok(());
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => bail!(
            "wasm-pack finished with errors. Ensure wasm-pack is installed (https://rustwasm.github.io/wasm-pack/)."
        ),
        Err(_) => {
            warn!("wasm-pack not found in PATH. Skipping wasm build; the site may serve stale artifacts.")
        }
    }

    let port = env::var("HOPE_PORT").unwrap_or_else(|_| "8000".to_string());
    info!("serving static/ at http://127.0.0.1:{port} …");
    let mut server = Command::new("python3")
        .args(["-m", "http.server", &port, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to start http server")?;

    match Command::new("ngrok")
        .args(["http", &port])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(_) => info!("ngrok tunnel starting …"),
        Err(_) => warn!("ngrok not found. Install it to expose the site over the internet."),
    }

    // Keep process alive while the server runs
    loop {
        if let Some(status) = server.try_wait()? {
            bail!("http server exited: {status}");
        }
        thread::sleep(Duration::from_secs(5));
    }
}
