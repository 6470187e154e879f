use crate::error::Result;
use crate::repository::TableSource;
use crate::schema::RawTable;
use csv::{ReaderBuilder, WriterBuilder};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A directory of CSV files, one per worksheet (`<dir>/<worksheet>.csv`).
/// The first CSV record is the header row.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn worksheet_path(&self, worksheet: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", worksheet))
    }
}

pub fn read_csv(content: &[u8]) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Ok(RawTable::default()),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in records {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

pub fn write_csv(table: &RawTable) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    if !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

impl TableSource for CsvWorkbook {
    fn fetch(&self, worksheet: &str) -> Result<RawTable> {
        let path = self.worksheet_path(worksheet);
        if !path.exists() {
            debug!("{} does not exist yet; reading as empty", path.display());
            return Ok(RawTable::default());
        }
        let content = fs::read(&path)?;
        read_csv(&content)
    }

    fn overwrite(&self, worksheet: &str, table: &RawTable) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.worksheet_path(worksheet);
        let tmp = path.with_extension("csv.tmp");

        fs::write(&tmp, write_csv(table)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv workbook at {}", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_ragged_rows() {
        let content = "ID,Requerente,Status\n1,Ana\n2,\"Silva, Bia\",DECISÃO\n";
        let table = read_csv(content.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["ID", "Requerente", "Status"]);
        assert_eq!(table.rows[0], vec!["1", "Ana"]);
        assert_eq!(table.rows[1][1], "Silva, Bia");
    }

    #[test]
    fn test_overwrite_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = CsvWorkbook::new(dir.path().join("sheets"));
        let table = RawTable::from_strs(
            &["ID", "REQUERENTE", "OBSERVACOES"],
            &[&["1", "Ana", "linha 1\nlinha 2"]],
        );

        workbook.overwrite("NACIONALIDADE", &table).unwrap();
        let read_back = workbook.fetch("NACIONALIDADE").unwrap();

        assert_eq!(read_back, table);
        assert!(workbook.worksheet_path("NACIONALIDADE").exists());
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = CsvWorkbook::new(dir.path());
        assert!(workbook.fetch("NACIONALIDADE").unwrap().is_empty());
    }
}
