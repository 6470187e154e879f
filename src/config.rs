use crate::error::{CaseTrackerError, Result};
use crate::repository::TableSource;
use crate::sources::{CsvWorkbook, InMemorySheet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKSHEET: &str = "NACIONALIDADE";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "R$";

fn default_worksheet() -> String {
    DEFAULT_WORKSHEET.to_string()
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    #[schemars(description = "Process-local sheet, empty at start. Useful for demos and tests.")]
    Memory,

    #[schemars(description = "Directory holding one <worksheet>.csv file per worksheet")]
    Csv {
        #[schemars(description = "Directory path")]
        path: PathBuf,
    },

    #[schemars(description = "Google Sheets spreadsheet, accessed through the v4 values API (requires the 'gsheets' feature)")]
    GoogleSheets {
        #[schemars(description = "Spreadsheet id as found in the sheet URL")]
        spreadsheet_id: String,
        #[schemars(description = "Name of the environment variable holding an OAuth access token")]
        access_token_env: String,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TrackerConfig {
    #[serde(default = "default_worksheet")]
    #[schemars(description = "Worksheet (tab) holding the case table. Defaults to NACIONALIDADE.")]
    pub worksheet: String,

    #[serde(default = "default_currency_symbol")]
    #[schemars(description = "Symbol prefixed to monetary values on the dashboard, e.g. 'R$' or '€'")]
    pub currency_symbol: String,

    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            worksheet: default_worksheet(),
            currency_symbol: default_currency_symbol(),
            source: SourceConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worksheet.trim().is_empty() {
            return Err(CaseTrackerError::ConfigError(
                "worksheet name must not be empty".to_string(),
            ));
        }
        if let SourceConfig::GoogleSheets { spreadsheet_id, .. } = &self.source {
            if spreadsheet_id.trim().is_empty() {
                return Err(CaseTrackerError::ConfigError(
                    "spreadsheet_id must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TrackerConfig)
    }

    pub fn schema_as_json() -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::json_schema())
    }

    /// Instantiates the configured source.
    pub fn build_source(&self) -> Result<Box<dyn TableSource>> {
        match &self.source {
            SourceConfig::Memory => Ok(Box::new(InMemorySheet::new())),
            SourceConfig::Csv { path } => Ok(Box::new(CsvWorkbook::new(path.clone()))),
            #[cfg(feature = "gsheets")]
            SourceConfig::GoogleSheets {
                spreadsheet_id,
                access_token_env,
            } => {
                let token = std::env::var(access_token_env).map_err(|_| {
                    CaseTrackerError::ConfigError(format!(
                        "environment variable {} is not set",
                        access_token_env
                    ))
                })?;
                Ok(Box::new(crate::sources::GoogleSheetsSource::new(
                    spreadsheet_id.clone(),
                    token,
                )?))
            }
            #[cfg(not(feature = "gsheets"))]
            SourceConfig::GoogleSheets { .. } => Err(CaseTrackerError::ConfigError(
                "Google Sheets support requires the 'gsheets' feature".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let config = TrackerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.worksheet, "NACIONALIDADE");
        assert_eq!(config.currency_symbol, "R$");
    }

    #[test]
    fn test_csv_source_parses() {
        let json = r#"{
            "worksheet": "CASOS",
            "currency_symbol": "€",
            "source": { "kind": "csv", "path": "/tmp/sheets" }
        }"#;

        let config = TrackerConfig::from_json_str(json).unwrap();

        assert_eq!(config.worksheet, "CASOS");
        assert_eq!(
            config.source,
            SourceConfig::Csv {
                path: PathBuf::from("/tmp/sheets")
            }
        );
        assert!(config.build_source().is_ok());
    }

    #[test]
    fn test_blank_worksheet_is_rejected() {
        let err = TrackerConfig::from_json_str(r#"{"worksheet": "  "}"#).unwrap_err();
        assert!(matches!(err, CaseTrackerError::ConfigError(_)));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = TrackerConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("worksheet"));
        assert!(schema_json.contains("currency_symbol"));
        assert!(schema_json.contains("spreadsheet_id"));
    }

    #[cfg(not(feature = "gsheets"))]
    #[test]
    fn test_google_sheets_needs_feature() {
        let config = TrackerConfig {
            source: SourceConfig::GoogleSheets {
                spreadsheet_id: "abc".to_string(),
                access_token_env: "SHEETS_TOKEN".to_string(),
            },
            ..Default::default()
        };
        assert!(config.build_source().is_err());
    }
}
