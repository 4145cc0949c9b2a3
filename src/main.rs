use std::io::Write;

use anyhow::Context;
use herald::http::request::{Method, RequestBuilder};
use herald::{Client, Config};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: herald [METHOD] <url>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (method, url) = match args.as_slice() {
        [url] => (Method::GET, url.as_str()),
        [method, url] => (
            Method::from_str(&method.to_ascii_uppercase())
                .with_context(|| format!("unknown method {}", method))?,
            url.as_str(),
        ),
        _ => anyhow::bail!(USAGE),
    };

    let cfg = Config::load()?;
    let client = Client::new(cfg).context("building client")?;
    let request = RequestBuilder::new().method(method).url(url).build()?;

    tokio::select! {
        res = client.execute(request) => {
            let response = res.with_context(|| format!("{} {} failed", method, url))?;

            eprintln!("{} {} {}", response.version(), response.status(), response.reason());
            for (name, value) in response.headers().iter() {
                eprintln!("{}: {}", name, value);
            }

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(response.body())?;
            stdout.flush()?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    Ok(())
}
