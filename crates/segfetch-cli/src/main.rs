mod cli;
mod config;
mod logging;
mod runtime;
mod tracker;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use segfetch::{
    ClientSetting, DownloadReport, DownloadSession, Error, FetchOptions, FileSink, ReqwestClient,
};
use tracing::{debug, info, warn};

use crate::cli::App;
use crate::config::Config;
use crate::tracker::SegmentTracker;

fn main() -> Result<()> {
    let app = App::parse();
    logging::init(app.verbose, app.quiet).context("failed to install logger")?;

    let config = match &app.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let setting = config.client_setting(&app)?;
    let options = config.into_options(&app)?;
    debug!(?options, ?setting, "resolved options");

    let runtime = runtime::build().context("failed to start async runtime")?;
    let report = runtime.block_on(fetch(&app, setting, options))?;

    if !app.quiet {
        println!("{}", summary(&app, &report));
    }
    Ok(())
}

async fn fetch(app: &App, setting: ClientSetting, options: FetchOptions) -> Result<DownloadReport> {
    let client = ReqwestClient::with_setting(setting).context("failed to build http client")?;
    let sink = FileSink::create(&app.file)
        .with_context(|| format!("failed to create {}", app.file.display()))?;

    let open = DownloadSession::open(client, app.url.as_str(), sink, options);
    let mut session = interruptible(open, interrupted())
        .await
        .ok_or_else(|| anyhow!("interrupted while probing {}", app.url))?
        .with_context(|| format!("failed to probe {}", app.url))?;
    info!(
        url = session.url(),
        total_size = session.total_size(),
        bytes_per_segment = session.bytes_per_segment(),
        "starting download"
    );

    let tracker = Arc::new(SegmentTracker::new(&session.plan()?, app.quiet));

    let cancel = session.cancel_token();
    let interrupt = tokio::spawn(async move {
        interrupted().await;
        warn!("interrupted, cancelling download");
        cancel.cancel();
    });

    let result = session.download(Arc::clone(&tracker)).await;
    interrupt.abort();

    match &result {
        Ok(_) => tracker.finish("done"),
        Err(Error::Cancelled) => tracker.abandon("cancelled"),
        Err(e) => tracker.abandon(&e.to_string()),
    }

    let closed = session.close().await;
    let report = result.with_context(|| format!("download of {} failed", app.url))?;
    closed.with_context(|| format!("failed to flush {}", app.file.display()))?;
    Ok(report)
}

/// Resolves on Ctrl-C, or never when no handler can be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// `None` when `interrupt` resolves before `work`. Dropping `work` releases
/// whatever it owns.
async fn interruptible<T>(
    work: impl Future<Output = T>,
    interrupt: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        biased;
        _ = interrupt => None,
        out = work => Some(out),
    }
}

fn summary(app: &App, report: &DownloadReport) -> String {
    let rate = report
        .average_rate_bps()
        .map(|bps| format!(", {:.1} KiB/s", bps / 1024.0))
        .unwrap_or_default();
    format!(
        "{} -> {}: {} bytes in {:.2?} over {} segments ({} retries{rate})",
        app.url,
        app.file.display(),
        report.downloaded_total,
        report.elapsed,
        report.segments.len(),
        report.retries(),
    )
}
