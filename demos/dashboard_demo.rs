use chrono::NaiveDate;
use nationality_case_tracker::{
    artigo_chart, format_currency, status_chart, CaseStatus, CaseTracker, InMemorySheet,
    InclusionForm, RawTable,
};

fn main() {
    let sheet = InMemorySheet::with_worksheet(
        "NACIONALIDADE",
        RawTable::from_strs(
            &["", "CONTROLE DE PROCESSOS", "", "", "", "", ""],
            &[
                &["ID", "Requerente", "Artigo", "Status", "Valor Honorários", "Valor Pago", "Saldo Devedor"],
                &["1", "Ana Souza", "Casamento", "CONCLUÍDO", "1500", "1500", "0"],
                &["2", "Bruno Lima", "Art. 1º, nº1, al. d (neto)", "EM ANÁLISE", "2000", "500", "1500"],
                &["", "", "", "", "", "", ""],
            ],
        ),
    );
    let mut tracker = CaseTracker::new(sheet, "NACIONALIDADE");
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");

    let created = tracker
        .include(
            &InclusionForm {
                requerente: "Carla Dias".to_string(),
                aniversario: NaiveDate::from_ymd_opt(1979, 11, 4),
                status: CaseStatus::Diligencia,
                valor_honorarios: 1800.0,
                valor_pago: 600.0,
                ..Default::default()
            },
            today,
        )
        .expect("inclusion should succeed");
    println!(
        "Created record {:?} for {} (balance {})",
        created.id,
        created.requerente,
        format_currency(created.balance(), "R$")
    );

    let mut form = tracker.edit_form("Bruno Lima").expect("record exists");
    form.valor_pago = 2000.0;
    form.status = CaseStatus::Decisao;
    tracker.update("Bruno Lima", &form).expect("update should succeed");

    let metrics = tracker.dashboard().expect("dashboard should load");
    println!("Total de Processos: {}", metrics.total_count);
    println!("Concluídos:         {}", metrics.completed_count);
    println!("Total Recebido:     {}", format_currency(metrics.total_paid, "R$"));
    println!("Saldo em Aberto:    {}", format_currency(metrics.total_outstanding, "R$"));

    println!("\nDistribuição por Status");
    for slice in status_chart(&metrics) {
        println!("  {:<12} {:>3}  {:>5.1}%", slice.label, slice.count, slice.share * 100.0);
    }

    println!("\nProcessos por Artigo");
    for slice in artigo_chart(&metrics) {
        println!("  {:<30} {:>3}", slice.label, slice.count);
    }
}
