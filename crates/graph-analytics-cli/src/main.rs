#![cfg_attr(test, allow(unused_crate_dependencies))]

use std::{
    fs::File,
    io::{self, BufReader, BufWriter},
};

use anyhow::Context;
use clap::crate_version;
use graph_analytics::Extractor;

mod args;
mod convert;
mod telemetry;

fn main() -> anyhow::Result<()> {
    let args = args::parse();
    telemetry::init(&args);

    let crate_version = crate_version!();
    tracing::info!("graph-analytics {crate_version}");

    let extractor = Extractor::new(args.config()?);
    let output = BufWriter::new(io::stdout().lock());

    let summary = match args.input() {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            convert::convert(&extractor, BufReader::new(file), output, args.fail_fast())?
        }
        None => convert::convert(&extractor, io::stdin().lock(), output, args.fail_fast())?,
    };

    tracing::info!(
        converted = summary.converted,
        skipped = summary.skipped,
        failed = summary.failed,
        "conversion finished"
    );

    Ok(())
}
