use anyhow::Result;
use clap::ValueEnum;
use rust_decimal::Decimal;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// An index-aligned result: one row per input record.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    /// Optional per-row label (the bar timestamp when the input has one).
    pub labels: Option<Vec<String>>,
    pub rows: Vec<Vec<Option<Decimal>>>,
}

impl Table {
    pub fn single(column: &str, values: Vec<Option<Decimal>>) -> Self {
        Self {
            columns: vec![column.to_string()],
            labels: None,
            rows: values.into_iter().map(|v| vec![v]).collect(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    fn label(&self, row: usize) -> Option<&str> {
        self.labels.as_ref().and_then(|l| l.get(row)).map(String::as_str)
    }

    pub fn write<W: Write>(&self, format: OutputFormat, out: W) -> Result<()> {
        match format {
            OutputFormat::Csv => self.write_csv(out),
            OutputFormat::Json => self.write_json(out),
        }
    }

    fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);

        let mut header = vec!["index".to_string()];
        if self.labels.is_some() {
            header.push("timestamp".to_string());
        }
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record = vec![i.to_string()];
            if self.labels.is_some() {
                record.push(self.label(i).unwrap_or_default().to_string());
            }
            record.extend(row.iter().map(|v| v.map(|d| d.to_string()).unwrap_or_default()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json<W: Write>(&self, mut out: W) -> Result<()> {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut object = serde_json::Map::new();
                object.insert("index".to_string(), i.into());
                if let Some(label) = self.label(i) {
                    object.insert("timestamp".to_string(), label.into());
                }
                for (column, value) in self.columns.iter().zip(row) {
                    object.insert(column.clone(), serde_json::to_value(value).unwrap_or_default());
                }
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &rows)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn render(table: &Table, format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        table.write(format, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_csv_leaves_undefined_cells_empty() {
        let table = Table::single("atr", vec![None, Some(dec!(2)), Some(dec!(2.5))]);
        assert_eq!(render(&table, OutputFormat::Csv), "index,atr\n0,\n1,2\n2,2.5\n");
    }

    #[test]
    fn test_csv_with_labels() {
        let table = Table::single("sar", vec![None, Some(dec!(8))])
            .with_labels(vec!["2024-01-02".to_string(), "2024-01-03".to_string()]);
        assert_eq!(
            render(&table, OutputFormat::Csv),
            "index,timestamp,sar\n0,2024-01-02,\n1,2024-01-03,8\n"
        );
    }

    #[test]
    fn test_json_uses_null_for_undefined() {
        let table = Table {
            columns: vec!["bull_power".to_string(), "bear_power".to_string()],
            labels: None,
            rows: vec![vec![None, None], vec![Some(dec!(1)), Some(dec!(-1))]],
        };
        let parsed: serde_json::Value = serde_json::from_str(&render(&table, OutputFormat::Json)).unwrap();
        assert!(parsed[0]["bull_power"].is_null());
        assert_eq!(parsed[1]["bear_power"], "-1");
        assert_eq!(parsed[1]["index"], 1);
    }
}
