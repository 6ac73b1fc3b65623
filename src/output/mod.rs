use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// A discovered virtual host.
#[derive(Serialize, Debug, Clone)]
pub struct Finding {
    pub host: String,
    pub status: u16,
    pub similarity: f64,
}

pub trait OutputWriter: Send + Sync {
    fn write(&self, f: &Finding) -> Result<()>;
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn open_sink(p: PathBuf, gzip: bool, append: bool) -> Result<Box<dyn Write + Send>> {
    let mut oo = OpenOptions::new();
    oo.create(true).write(true);
    if append { oo.append(true); } else { oo.truncate(true); }
    let f = oo.open(p)?;
    let w: Box<dyn Write + Send> = if gzip {
        Box::new(GzEncoder::new(f, Compression::default()))
    } else {
        Box::new(f)
    };
    Ok(w)
}

pub struct PlainWriter {
    file: Option<Mutex<Box<dyn Write + Send>>>,
    to_stdout: bool,
}

impl PlainWriter {
    pub fn new(path: Option<PathBuf>, to_stdout: bool, gzip: bool, append: bool) -> Result<Self> {
        let file = match path {
            Some(p) => Some(Mutex::new(open_sink(p, gzip, append)?)),
            None => None,
        };
        Ok(PlainWriter { file, to_stdout })
    }
}

impl OutputWriter for PlainWriter {
    fn write(&self, r: &Finding) -> Result<()> {
        let line = format!("{}\t{}\t{:.4}", r.host, r.status, r.similarity);
        if self.to_stdout {
            println!("{}", line);
        }
        if let Some(f) = &self.file {
            let mut guard = f.lock().unwrap();
            writeln!(guard, "{}", line)?;
            guard.flush()?;
        }
        Ok(())
    }
}

pub struct JsonLinesWriter {
    file: Option<Mutex<Box<dyn Write + Send>>>,
    to_stdout: bool,
}

impl JsonLinesWriter {
    pub fn new(path: Option<PathBuf>, to_stdout: bool, gzip: bool, append: bool) -> Result<Self> {
        let file = match path {
            Some(p) => Some(Mutex::new(open_sink(p, gzip, append)?)),
            None => None,
        };
        Ok(JsonLinesWriter { file, to_stdout })
    }
}

impl OutputWriter for JsonLinesWriter {
    fn write(&self, r: &Finding) -> Result<()> {
        let line = serde_json::to_string(r)?;
        if self.to_stdout {
            println!("{}", line);
        }
        if let Some(f) = &self.file {
            let mut guard = f.lock().unwrap();
            writeln!(guard, "{}", line)?;
            guard.flush()?;
        }
        Ok(())
    }
}

pub struct CsvWriter {
    inner: Mutex<csv::Writer<Box<dyn Write + Send>>>,
    to_stdout: bool,
}

impl CsvWriter {
    pub fn new(path: PathBuf, to_stdout: bool, gzip: bool, append: bool) -> Result<Self> {
        let sink = open_sink(path, gzip, append)?;
        let mut w = csv::Writer::from_writer(sink);
        if !append {
            w.write_record(["host", "status", "similarity"])?;
        }
        Ok(CsvWriter { inner: Mutex::new(w), to_stdout })
    }
}

impl OutputWriter for CsvWriter {
    fn write(&self, r: &Finding) -> Result<()> {
        if self.to_stdout {
            println!("{};{};{:.4}", r.host, r.status, r.similarity);
        }
        let mut guard = self.inner.lock().unwrap();
        guard.write_record(&[r.host.clone(), r.status.to_string(), format!("{:.4}", r.similarity)])?;
        guard.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.inner.lock().unwrap().flush()?;
        Ok(())
    }
}

pub fn build_writers(
    path: Option<PathBuf>,
    output_type: &str,
    to_stdout: bool,
    gzip: bool,
    append: bool,
) -> Result<Vec<Box<dyn OutputWriter>>> {
    let mut v: Vec<Box<dyn OutputWriter>> = Vec::new();
    match output_type {
        "txt" => {
            v.push(Box::new(PlainWriter::new(path, to_stdout, gzip, append)?));
        }
        "json" | "jsonl" => {
            if path.is_none() && !to_stdout {
                return Err(anyhow::anyhow!(
                    "jsonl output requires either --output path or enabled stdout (omit --not-print)"
                ));
            }
            v.push(Box::new(JsonLinesWriter::new(path, to_stdout, gzip, append)?));
        }
        "csv" => {
            let p = path.ok_or_else(|| anyhow::anyhow!("csv output requires --output path"))?;
            v.push(Box::new(CsvWriter::new(p, to_stdout, gzip, append)?));
        }
        other => {
            return Err(anyhow::anyhow!("unsupported output type: {}", other));
        }
    }
    Ok(v)
}
