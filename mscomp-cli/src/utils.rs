//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use mscomp::{Flush, Format, Session, Status, StreamIo};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

/// How a file is fed through a session.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Input bytes offered per call.
    pub read_size: usize,
    /// Output space offered per call.
    pub write_size: usize,
    /// Print the summary as JSON.
    pub json: bool,
    /// Show a progress bar.
    pub progress: bool,
}

/// Result of one command, printed as text or JSON.
#[derive(Debug, Serialize, Deserialize)]
pub struct StreamSummary {
    pub operation: String,
    pub format: String,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub ratio: f64,
    pub seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl StreamSummary {
    pub fn new(
        operation: &str,
        format: Format,
        input: &Path,
        bytes_in: u64,
        bytes_out: u64,
    ) -> Self {
        let ratio = if bytes_in > 0 {
            bytes_out as f64 / bytes_in as f64
        } else {
            0.0
        };
        Self {
            operation: operation.to_string(),
            format: format.name().to_string(),
            input: input.display().to_string(),
            output: None,
            bytes_in,
            bytes_out,
            ratio,
            seconds: 0.0,
            verified: None,
        }
    }

    pub fn print(&self, json: bool) -> Result<(), Box<dyn std::error::Error>> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        println!("{} ({})", self.input, self.format);
        if let Some(output) = &self.output {
            println!("  Output:     {}", output);
        }
        println!("  Read:       {} bytes", self.bytes_in);
        println!("  Written:    {} bytes", self.bytes_out);
        println!("  Ratio:      {:.3}", self.ratio);
        println!("  Time:       {:.3}s", self.seconds);
        if let Some(verified) = self.verified {
            println!("  Verified:   {}", if verified { "OK" } else { "FAILED" });
        }
        Ok(())
    }
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

/// Output path for `compress` when none is given: `name.ext` becomes
/// `name.ext.<format>`.
pub fn compressed_path(input: &Path, format: Format) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(format.name());
    PathBuf::from(name)
}

/// Output path for `decompress` when none is given: strips a matching
/// format extension, or appends `.out`.
pub fn decompressed_path(input: &Path, format: Format) -> PathBuf {
    match input.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(format.name()) => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Drive `session` from `reader` to `writer` until the stream ends, then end
/// the session. Returns `(bytes_read, bytes_written)`.
///
/// At most `options.read_size` input bytes and `options.write_size` output
/// bytes are offered per call.
pub fn transcode<R: Read, W: Write>(
    session: &mut Session,
    reader: &mut R,
    writer: &mut W,
    options: &StreamOptions,
    pb: &ProgressBar,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let mut input = vec![0u8; options.read_size.max(1)];
    let mut output = vec![0u8; options.write_size.max(1)];
    let mut eof = false;

    while !eof {
        let filled = read_full(reader, &mut input)?;
        eof = filled < input.len();
        let flush = if eof { Flush::Finish } else { Flush::None };
        trace!(filled, eof, "read");

        let mut pos = 0;
        loop {
            let (consumed, produced, status) =
                session.process(&input[pos..filled], &mut output, flush)?;
            pos += consumed;
            writer.write_all(&output[..produced])?;
            pb.inc(consumed as u64);

            if status == Status::StreamEnd {
                session.end(&mut StreamIo::new(&[], &mut []))?;
                writer.flush()?;
                debug!(
                    total_in = session.total_in(),
                    total_out = session.total_out(),
                    "stream ended"
                );
                return Ok((session.total_in(), session.total_out()));
            }
            if pos == filled && produced < output.len() {
                break;
            }
        }
    }

    Err(Box::new(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "input ended before the stream did",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mscomp::{CompressionLevel, Mode};
    use std::io::Cursor;

    fn options(read_size: usize, write_size: usize) -> StreamOptions {
        StreamOptions {
            read_size,
            write_size,
            json: false,
            progress: false,
        }
    }

    #[test]
    fn test_transcode_roundtrip_small_buffers() {
        let data = b"streaming through tiny buffers, streaming through tiny buffers".repeat(50);
        let pb = ProgressBar::hidden();

        for format in Format::ALL {
            let mut packed: Vec<u8> = Vec::new();
            let mut session =
                mscomp::start_with_level(Mode::Compress, format, CompressionLevel::BEST);
            let (read, written) = transcode(
                &mut session,
                &mut Cursor::new(&data),
                &mut packed,
                &options(10, 7),
                &pb,
            )
            .unwrap();
            assert_eq!(read, data.len() as u64);
            assert_eq!(written, packed.len() as u64);

            let mut restored: Vec<u8> = Vec::new();
            let mut session = mscomp::start(Mode::Decompress, format);
            transcode(
                &mut session,
                &mut Cursor::new(&packed),
                &mut restored,
                &options(3, 1),
                &pb,
            )
            .unwrap();
            assert_eq!(restored, data, "{}", format);
        }
    }

    #[test]
    fn test_transcode_input_multiple_of_read_size() {
        let data = vec![b'q'; 64];
        let mut packed: Vec<u8> = Vec::new();
        let mut session = mscomp::start(Mode::Compress, Format::Xpress);
        transcode(
            &mut session,
            &mut Cursor::new(&data),
            &mut packed,
            &options(16, 64),
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert_eq!(
            mscomp::decompress_to_vec(Format::Xpress, &packed).unwrap(),
            data
        );
    }

    #[test]
    fn test_transcode_reports_corruption() {
        let mut session = mscomp::start(Mode::Decompress, Format::Xpress);
        let err = transcode(
            &mut session,
            &mut Cursor::new([0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]),
            &mut Vec::<u8>::new(),
            &options(64, 64),
            &ProgressBar::hidden(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("distance"), "{}", err);
    }

    #[test]
    fn test_default_paths() {
        let input = Path::new("disk.img");
        assert_eq!(
            compressed_path(input, Format::Lznt1),
            Path::new("disk.img.lznt1")
        );
        assert_eq!(
            decompressed_path(Path::new("disk.img.lznt1"), Format::Lznt1),
            Path::new("disk.img")
        );
        assert_eq!(
            decompressed_path(Path::new("disk.img.lznt1"), Format::Xpress),
            Path::new("disk.img.lznt1.out")
        );
    }
}
