use super::traits::{Exporter, OutputResult};
use crate::leads::Lead;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes leads as a pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_to(&self, leads: &[Lead], path: &Path) -> OutputResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, leads)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_json() {
        let dir = TempDir::new().unwrap();
        let mut lead = Lead::with_email("Jane Doe", "jane@acme.com");
        lead.source_url = "https://acme.com/team".to_string();

        let path = JsonExporter.export(&[lead.clone()], dir.path()).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));

        let written: Vec<Lead> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![lead]);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("runs").join("today");

        let path = JsonExporter.export(&[], &nested).unwrap();
        assert!(path.starts_with(&nested));
        assert_eq!(std::fs::read_to_string(path).unwrap().trim(), "[]");
    }
}
