//! Reads the live case sheet and prints the dashboard figures.
//!
//! SHEETS_SPREADSHEET_ID=... SHEETS_ACCESS_TOKEN=... \
//!     cargo run --example sheets_sync --features gsheets

use nationality_case_tracker::{
    format_currency, CaseTracker, SourceConfig, TrackerConfig,
};

fn main() {
    let spreadsheet_id =
        std::env::var("SHEETS_SPREADSHEET_ID").expect("SHEETS_SPREADSHEET_ID must be set");

    let config = TrackerConfig {
        source: SourceConfig::GoogleSheets {
            spreadsheet_id,
            access_token_env: "SHEETS_ACCESS_TOKEN".to_string(),
        },
        ..Default::default()
    };

    let mut tracker = CaseTracker::from_config(&config).expect("source should build");

    match tracker.dashboard() {
        Ok(metrics) => {
            println!("Total de Processos: {}", metrics.total_count);
            println!("Concluídos:         {}", metrics.completed_count);
            println!(
                "Total Recebido:     {}",
                format_currency(metrics.total_paid, &config.currency_symbol)
            );
            println!(
                "Saldo em Aberto:    {}",
                format_currency(metrics.total_outstanding, &config.currency_symbol)
            );
            if !metrics.missing_columns.is_empty() {
                println!("Colunas ausentes:   {:?}", metrics.missing_columns);
            }
        }
        Err(e) if e.is_data_source_unavailable() => {
            eprintln!("Planilha indisponível: {}", e);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Erro: {}", e);
            std::process::exit(1);
        }
    }
}
