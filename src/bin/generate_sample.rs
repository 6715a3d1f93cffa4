use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const HEADER: [&str; 12] = [
    "PROCESSO",
    "SISTEMA",
    "CLASSE",
    "ASSUNTO",
    "TIPO CONCLUSÃO",
    "INÍCIO",
    "DIAS CONCLUSO",
    "ETIQUETAS PJE",
    "TAREFAS PJE",
    "PENDENTE DE META?",
    "PRIORIDADE(S)",
    "FÍSICO / ELETRÔNICO?",
];

const CLASSES: [&str; 6] = [
    "7 - PROCEDIMENTO COMUM CÍVEL",
    "120 - MANDADO DE SEGURANÇA CÍVEL",
    "65 - AÇÃO CIVIL PÚBLICA",
    "66 - AÇÃO POPULAR",
    "1116 - EXECUÇÃO FISCAL",
    "12078 - CUMPRIMENTO DE SENTENÇA CONTRA A FAZENDA PÚBLICA",
];

const SUBJECTS: [&str; 8] = [
    "11884 - Fornecimento de Medicamentos",
    "10064 - Saúde",
    "6101 - Auxílio-Doença Previdenciário",
    "6095 - Aposentadoria por Invalidez",
    "10288 - URV Lei 8.880/1994",
    "10254 - Gratificações e Adicionais",
    "5952 - IPTU/ Imposto Predial e Territorial Urbano",
    "9997 - Concurso Público / Edital",
];

const CONCLUSION_KINDS: [&str; 3] = ["Sentença", "Decisão", "Despacho"];

const TASKS: [&str; 5] = [
    "Minutar sentença",
    "Minutar decisão",
    "Assinar sentença",
    "Emb. Declaração - Minutar",
    "Analisar processo",
];

const LABELS: [&str; 6] = ["", "", "Prioridade", "URV", "3 - SINTE", "Aguardando perícia"];

const PRIORITIES: [&str; 4] = ["", "", "Idoso", "Doença grave"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let today = NaiveDate::from_ymd_opt(2025, 6, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid reference date")?;

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm:ss");
    let sheet = workbook.add_worksheet();
    sheet.set_name("Conclusos")?;

    // Title row above the header, like the court system's report.
    sheet.write_string_with_format(0, 0, "Relatório de Processos Conclusos - Gabinete", &bold)?;
    for (c, name) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(1, c as u16, *name, &bold)?;
        sheet.set_column_width(c as u16, 18.0)?;
    }

    let n_cases = 240;
    let mut total_days = 0u64;
    for i in 0..n_cases {
        let row = (i + 2) as u32;
        let days = (rng.next_f64().powi(2) * 400.0) as i64;
        total_days += days as u64;
        let start: NaiveDateTime = today - Duration::days(days + rng.below(30) as i64);

        let number = format!(
            "08{:05}-{:02}.{}.8.20.0001",
            rng.below(100_000),
            rng.below(100),
            start.format("%Y")
        );
        sheet.write_string(row, 0, &number)?;
        sheet.write_string(row, 1, "PJe")?;
        sheet.write_string(row, 2, rng.pick(&CLASSES))?;
        sheet.write_string(row, 3, rng.pick(&SUBJECTS))?;
        sheet.write_string(row, 4, rng.pick(&CONCLUSION_KINDS))?;
        sheet.write_datetime_with_format(row, 5, &start, &date_format)?;
        sheet.write_number(row, 6, days as f64)?;

        let label = rng.pick(&LABELS);
        if !label.is_empty() {
            sheet.write_string(row, 7, label)?;
        }
        sheet.write_string(row, 8, rng.pick(&TASKS))?;
        if rng.chance(0.2) {
            sheet.write_string(row, 9, "Meta 2")?;
        }
        let priority = rng.pick(&PRIORITIES);
        if !priority.is_empty() {
            sheet.write_string(row, 10, priority)?;
        }
        sheet.write_string(row, 11, "Eletrônico")?;
    }

    // Totals footer, dropped on ingestion.
    let footer = (n_cases + 2) as u32;
    sheet.write_string_with_format(footer, 0, "Total", &bold)?;
    sheet.write_number(footer, 6, total_days as f64)?;

    let output_path = "sample_conclusos.xlsx";
    workbook
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {n_cases} cases to {output_path}");
    Ok(())
}
