use anyhow::Context;
use mosaic_assembly::{Assembled, Assembler, AssemblyError};
use mosaic_fetch::{GatewayFetcher, ReqwestClient};
use mosaic_locator::Locator;
use tracing::{info, warn};

use crate::app::AssembleArgs;
use crate::bundle;
use crate::config::{self, Settings};

pub async fn run(args: &AssembleArgs, settings: &Settings) -> anyhow::Result<()> {
    let mut assembly = settings.assembly_config()?;
    if let Some(secs) = args.deadline_secs {
        assembly = assembly.deadline(config::deadline(secs));
    }

    let client = ReqwestClient::new().context("failed to build the HTTP client")?;
    let fetcher = GatewayFetcher::new(client).with_options(settings.gateway_options());
    let assembler = Assembler::new(fetcher, assembly);

    let attempt = if args.file {
        let bytes = tokio::fs::read(&args.manifest)
            .await
            .with_context(|| format!("failed to read manifest {}", args.manifest))?;
        assembler.begin_with_manifest(bytes)
    } else {
        let locator: Locator = args
            .manifest
            .parse()
            .with_context(|| format!("'{}' is not a manifest location", args.manifest))?;
        info!(%locator, "retrieving manifest");
        assembler.begin(locator)
    };

    let assembled = match attempt.wait().await {
        Ok(assembled) => assembled,
        Err(err) => {
            report_partial(&err);
            return Err(err).context("assembly failed");
        }
    };

    let skipped = skipped(&assembled);
    if !skipped.is_empty() {
        warn!(skipped = ?skipped, "declared sources left out of the bundle");
    }

    let written = bundle::write(&args.out, &assembled, args.force)?;
    println!("wrote {} sources to {}", written.fragments, written.root.display());
    Ok(())
}

fn report_partial(err: &AssemblyError) {
    for name in err.missing() {
        eprintln!("missing: {name}");
    }
    if let Some(partial) = err.partial() {
        eprintln!("{} of {} sources obtained", partial.len(), partial.len() + err.missing().len());
    }
}

/// Declared names that were rejected rather than assembled.
fn skipped(assembled: &Assembled) -> Vec<&str> {
    assembled
        .manifest
        .fragments()
        .iter()
        .map(|spec| spec.name.as_str())
        .filter(|name| !assembled.fragments.contains_key(*name))
        .collect()
}
