use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader};
use std::path::Path;

/// Buffer size for input readers (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// Set up env_logger. RUST_LOG wins over the -v count.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Open an input for line reading.
///
/// "-" reads stdin; files ending in `.gz` (any case) are decompressed.
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if is_gzip {
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Line scanner using memchr. Reuses the caller's buffer and handles lines
/// split across reader chunks. Line endings (`\n`, `\r\n`) are stripped;
/// blank lines are skipped.
pub struct LineScanner<R: BufRead> {
    reader: R,
    partial: Vec<u8>,
    eof: bool,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
            eof: false,
        }
    }

    fn strip_line_end(bytes: &[u8]) -> &[u8] {
        bytes.strip_suffix(b"\r").unwrap_or(bytes)
    }

    /// Read the next non-blank line into `line_buf`.
    /// Returns Ok(false) at end of input.
    pub fn read_line(&mut self, line_buf: &mut Vec<u8>) -> io::Result<bool> {
        line_buf.clear();

        loop {
            if self.eof {
                let line = Self::strip_line_end(&self.partial);
                let found = !line.is_empty();
                line_buf.extend_from_slice(line);
                self.partial.clear();
                return Ok(found);
            }

            let buffer = self.reader.fill_buf()?;
            if buffer.is_empty() {
                self.eof = true;
                continue;
            }

            match memchr::memchr(b'\n', buffer) {
                Some(newline_pos) => {
                    if self.partial.is_empty() {
                        // Whole line already in the reader's buffer
                        line_buf.extend_from_slice(Self::strip_line_end(&buffer[..newline_pos]));
                    } else {
                        self.partial.extend_from_slice(&buffer[..newline_pos]);
                        line_buf.extend_from_slice(Self::strip_line_end(&self.partial));
                        self.partial.clear();
                    }
                    self.reader.consume(newline_pos + 1);
                    if !line_buf.is_empty() {
                        return Ok(true);
                    }
                }
                None => {
                    self.partial.extend_from_slice(buffer);
                    let consumed = buffer.len();
                    self.reader.consume(consumed);
                }
            }
        }
    }
}

/// Parse a `-j` value: None means 1, "auto" or "0" means all cores
pub fn parse_threads(arg: Option<&str>) -> anyhow::Result<usize> {
    match arg {
        None => Ok(1),
        Some("auto") | Some("0") => Ok(std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)),
        Some(s) => {
            let n = s.parse::<usize>().map_err(|_| {
                anyhow::anyhow!("Invalid thread count '{}', expected a number or 'auto'", s)
            })?;
            Ok(n)
        }
    }
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

pub fn format_qps(qps: f64) -> String {
    if qps >= 1_000_000.0 {
        format!("{:.2}M", qps / 1_000_000.0)
    } else if qps >= 1_000.0 {
        format!("{:.2}K", qps / 1_000.0)
    } else {
        format!("{:.2}", qps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn scan_all<R: BufRead>(reader: R) -> Vec<String> {
        let mut scanner = LineScanner::new(reader);
        let mut buf = Vec::new();
        let mut lines = Vec::new();
        while scanner.read_line(&mut buf).unwrap() {
            lines.push(String::from_utf8(buf.clone()).unwrap());
        }
        lines
    }

    #[test]
    fn test_scanner_strips_line_endings() {
        let input = Cursor::new(b"Mozilla/5.0 (X11)\r\n\nOpera/9.80 \nlast".to_vec());
        assert_eq!(
            scan_all(input),
            vec!["Mozilla/5.0 (X11)", "Opera/9.80 ", "last"]
        );
    }

    #[test]
    fn test_scanner_lines_across_chunks() {
        let reader = BufReader::with_capacity(4, Cursor::new(b"abcdefgh\nij\n".to_vec()));
        assert_eq!(scan_all(reader), vec!["abcdefgh", "ij"]);
    }

    #[test]
    fn test_open_plain_and_gzip() {
        let mut plain = NamedTempFile::new().unwrap();
        writeln!(plain, "ua 1").unwrap();
        plain.flush().unwrap();
        assert_eq!(scan_all(open_input(plain.path()).unwrap()), vec!["ua 1"]);

        let mut gz = NamedTempFile::with_suffix(".GZ").unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        writeln!(encoder, "ua 2").unwrap();
        gz.write_all(&encoder.finish().unwrap()).unwrap();
        gz.flush().unwrap();
        assert_eq!(scan_all(open_input(gz.path()).unwrap()), vec!["ua 2"]);
    }

    #[test]
    fn test_parse_threads() {
        assert_eq!(parse_threads(None).unwrap(), 1);
        assert_eq!(parse_threads(Some("4")).unwrap(), 4);
        assert!(parse_threads(Some("auto")).unwrap() >= 1);
        assert!(parse_threads(Some("many")).is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(12), "12");
    }
}
