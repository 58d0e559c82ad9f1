use anyhow::Context;
use mosaic_verify::Hasher;
use tokio::io::AsyncReadExt;

use crate::app::DigestArgs;
use crate::config::{self, Settings};

const CHUNK: usize = 64 * 1024;

pub async fn run(args: &DigestArgs, settings: &Settings) -> anyhow::Result<()> {
    let algorithm = match &args.algorithm {
        Some(name) => config::parse_algorithm(name)?,
        None => settings.algorithm()?,
    };

    let mut file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; CHUNK];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .with_context(|| format!("failed to read {}", args.file.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    println!("{}  {}", hasher.finish(), args.file.display());
    Ok(())
}
