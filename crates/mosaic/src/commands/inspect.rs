use std::fmt::Write;

use anyhow::Context;
use mosaic_assembly::{AssemblyState, Manifest, Partition};

use crate::app::InspectArgs;
use crate::config::Settings;

pub fn run(args: &InspectArgs, settings: &Settings) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let manifest = Manifest::from_slice(&bytes)
        .with_context(|| format!("{} is not a manifest", args.file.display()))?;
    let (state, partition) = AssemblyState::partition(
        &manifest,
        settings.algorithm()?,
        settings.assembly.malformed_fragments,
    );

    print!("{}", describe(&state, &partition));
    Ok(())
}

/// One line per source, sorted by kind then name, followed by rejected locations.
fn describe(state: &AssemblyState, partition: &Partition) -> String {
    let mut out = String::new();

    for name in state.satisfied().keys() {
        let _ = writeln!(out, "inline    {name}");
    }

    let mut pending: Vec<_> = state
        .pending()
        .flat_map(|(digest, fragment)| fragment.names.iter().map(move |name| (name, digest, &fragment.locators)))
        .collect();
    pending.sort_by(|a, b| a.0.cmp(b.0));
    for (name, digest, locators) in pending {
        let _ = writeln!(out, "pending   {name} {digest}");
        for locator in locators {
            let _ = writeln!(out, "            {locator}");
        }
    }

    for rejected in &partition.rejected {
        let label = if rejected.rejects_fragment() { "rejected" } else { "warning " };
        let _ = writeln!(out, "{label}  {rejected}");
    }
    if partition.truncated {
        let _ = writeln!(out, "classification stopped at the first malformed source");
    }
    out
}
