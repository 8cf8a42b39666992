use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

///
/// Read every line of the input_file into memory
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_lines(input_file_path: &str) -> anyhow::Result<Vec<Box<str>>> {
    let buf: Box<dyn BufRead> = open_buf_reader(input_file_path)?;
    let mut lines = vec![];
    for x in buf.lines() {
        lines.push(x?.into_boxed_str());
    }
    Ok(lines)
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file_path: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file_path)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("failed to write {}: {}", output_file_path, e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

pub struct ReadLinesOut {
    pub lines: Vec<Vec<Box<str>>>,
    pub header: Vec<Box<str>>,
}

///
/// Read a delimited text file, splitting every line into words.
/// Lines are split in parallel, but the file order is kept.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - field delimiter
/// * `hdr_line` - location of a header line (`None` = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: &str,
    hdr_line: Option<usize>,
) -> anyhow::Result<ReadLinesOut> {
    let buf_reader: Box<dyn BufRead> = open_buf_reader(input_file)?;

    let lines_raw = buf_reader
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|x| !x.starts_with('#') && !x.is_empty())
        .collect::<Vec<_>>();

    let split = |line: &str| -> Vec<Box<str>> {
        line.split(delim)
            .map(|x| x.to_owned().into_boxed_str())
            .collect()
    };

    let (header, body) = match hdr_line {
        Some(n_skip) => {
            if lines_raw.len() < n_skip + 1 {
                return Err(anyhow::anyhow!("not enough data in {}", input_file));
            }
            (split(&lines_raw[n_skip]), &lines_raw[(n_skip + 1)..])
        }
        None => (vec![], &lines_raw[..]),
    };

    // indexed parallel map keeps the order of the lines
    let lines = body.par_iter().map(|s| split(s)).collect();

    Ok(ReadLinesOut { lines, header })
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match file_ext(input_file) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = File::create(output_file)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", output_file, e))?;
    match file_ext(output_file) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

fn file_ext(file: &str) -> Option<&str> {
    Path::new(file).extension().and_then(|x| x.to_str())
}

///
/// Create a directory (and its parents) if needed
/// * `dir` - directory name
///
pub fn mkdir(dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

///
/// Recursively list files under `dir` whose names end with `suffix`,
/// sorted by path
///
pub fn list_files_with_suffix(dir: &str, suffix: &str) -> anyhow::Result<Vec<Box<str>>> {
    fn visit(dir: &Path, suffix: &str, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                visit(&path, suffix, out)?;
            } else if path
                .file_name()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.ends_with(suffix))
            {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut found = vec![];
    visit(Path::new(dir), suffix, &mut found)?;
    found.sort();

    found
        .into_iter()
        .map(|p| {
            p.to_str()
                .map(|s| s.to_string().into_boxed_str())
                .ok_or_else(|| anyhow::anyhow!("non UTF-8 path: {}", p.display()))
        })
        .collect()
}

///
/// Take the file name without its directory and without `suffix`
/// * `file` - file name
/// * `suffix` - suffix to strip, e.g., `.regions.bed.gz`
///
pub fn basename_without(file: &str, suffix: &str) -> anyhow::Result<Box<str>> {
    let name = Path::new(file)
        .file_name()
        .and_then(|x| x.to_str())
        .ok_or_else(|| anyhow::anyhow!("no file name: {}", file))?;
    Ok(name.strip_suffix(suffix).unwrap_or(name).into())
}

///
/// Create a temporary directory and suggest a file name
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<PathBuf> {
    let temp_dir = tempdir()?.keep();
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(&temp_dir)?
        .path()
        .to_owned();

    Ok(temp_file)
}
