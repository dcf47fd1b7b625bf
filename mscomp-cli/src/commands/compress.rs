//! Compress command implementation.

use crate::utils::{StreamOptions, StreamSummary, compressed_path, create_progress_bar, transcode};
use mscomp::{CompressionLevel, Format, Mode};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tracing::info;

pub fn cmd_compress(
    input: &Path,
    output: Option<&Path>,
    format: Format,
    level: CompressionLevel,
    options: &StreamOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| compressed_path(input, format), Path::to_path_buf);
    info!(input = %input.display(), output = %output.display(), %format, "compressing");

    let file = File::open(input)?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut writer = BufWriter::new(File::create(&output)?);

    let pb = create_progress_bar(len, options.progress);
    let started = Instant::now();
    let mut session = mscomp::start_with_level(Mode::Compress, format, level);
    let (bytes_in, bytes_out) = transcode(&mut session, &mut reader, &mut writer, options, &pb)?;
    pb.finish_with_message("done");

    let mut summary = StreamSummary::new("compress", format, input, bytes_in, bytes_out);
    summary.output = Some(output.display().to_string());
    summary.seconds = started.elapsed().as_secs_f64();
    summary.print(options.json)
}
