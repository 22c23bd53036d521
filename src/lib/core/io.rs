use crate::core::error::Result;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Build a tab-delimited CSV reader for a file (or stdin when the path is `-`).
pub fn get_reader<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
    gzipped: bool,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let path = path.as_ref();
    let raw_reader: Box<dyn Read> = if path.as_os_str() != "-" {
        Box::new(BufReader::new(File::open(path)?))
    } else {
        Box::new(io::stdin())
    };
    let raw_reader: Box<dyn Read> = if gzipped {
        Box::new(MultiGzDecoder::new(raw_reader))
    } else {
        raw_reader
    };

    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(false)
        .from_reader(raw_reader))
}

/// Destination of a table writer: plain or gzip-compressed.
///
/// The gzip trailer is written by [`finish_writer`], which reports any
/// failure instead of leaving it to `Drop`.
pub enum OutputStream {
    Plain(Box<dyn Write>),
    Gzip(GzEncoder<Box<dyn Write>>),
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputStream::Plain(w) => w.write(buf),
            OutputStream::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputStream::Plain(w) => w.flush(),
            OutputStream::Gzip(w) => w.flush(),
        }
    }
}

impl OutputStream {
    /// Flush everything, writing the gzip trailer when compressed.
    pub fn finish(self) -> io::Result<()> {
        match self {
            OutputStream::Plain(mut w) => w.flush(),
            OutputStream::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

/// Build a tab-delimited CSV writer targeting a file or stdout with optional gzip compression.
///
/// Close it with [`finish_writer`].
pub fn get_writer<P: AsRef<Path>>(
    path: Option<P>,
    gzipped: bool,
    compression_level: u32,
) -> Result<csv::Writer<OutputStream>> {
    let raw_writer: Box<dyn Write> = match path {
        Some(path) if path.as_ref().as_os_str() != "-" => {
            Box::new(BufWriter::new(File::create(path)?))
        }
        _ => Box::new(io::stdout()),
    };
    let raw_writer = if gzipped {
        OutputStream::Gzip(GzEncoder::new(
            raw_writer,
            Compression::new(compression_level),
        ))
    } else {
        OutputStream::Plain(raw_writer)
    };

    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(raw_writer))
}

/// Flush a writer from [`get_writer`] and close its stream.
pub fn finish_writer(writer: csv::Writer<OutputStream>) -> Result<()> {
    let stream = writer.into_inner().map_err(|e| e.into_error())?;
    stream.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn gzip_writer_roundtrips_through_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.tsv.gz");
        {
            let mut writer = get_writer(Some(&path), true, 6).unwrap();
            writer.write_record(["id", "value"]).unwrap();
            writer.write_record(["a", "1"]).unwrap();
            finish_writer(writer).unwrap();
        }

        let mut reader = get_reader(&path, true, true).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["id", "value"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "a");
    }

    #[test]
    fn finished_gzip_stream_carries_trailer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.tsv.gz");
        let mut writer = get_writer(Some(&path), true, 6).unwrap();
        writer.write_record(["sample_id"]).unwrap();
        writer.write_record(["hCoV-19/A"]).unwrap();
        finish_writer(writer).unwrap();

        // gzip member ends with CRC32 then ISIZE, the uncompressed length
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let original_len = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
        assert_eq!(original_len as usize, "sample_id\nhCoV-19/A\n".len());
    }
}
