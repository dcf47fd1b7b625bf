//! Decompress command implementation.

use crate::utils::{
    StreamOptions, StreamSummary, create_progress_bar, decompressed_path, transcode,
};
use mscomp::{Format, Mode};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tracing::info;

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    format: Format,
    options: &StreamOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| decompressed_path(input, format), Path::to_path_buf);
    if output == input {
        return Err(format!("refusing to overwrite {}", input.display()).into());
    }
    info!(input = %input.display(), output = %output.display(), %format, "decompressing");

    let file = File::open(input)?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut writer = BufWriter::new(File::create(&output)?);

    let pb = create_progress_bar(len, options.progress);
    let started = Instant::now();
    let mut session = mscomp::start(Mode::Decompress, format);
    let result = transcode(&mut session, &mut reader, &mut writer, options, &pb);
    pb.finish_and_clear();

    let (bytes_in, bytes_out) = match result {
        Ok(totals) => totals,
        Err(e) => {
            if let Some(message) = session.message() {
                tracing::error!(%message, "stream rejected");
            }
            return Err(e);
        }
    };

    let mut summary = StreamSummary::new("decompress", format, input, bytes_in, bytes_out);
    summary.output = Some(output.display().to_string());
    summary.seconds = started.elapsed().as_secs_f64();
    summary.print(options.json)
}
