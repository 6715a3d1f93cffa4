use thiserror::Error;

/// Shown under every ingestion failure.
pub const RESAVE_HINT: &str = "Dica: problemas de leitura em arquivos baixados de sistemas \
costumam ser resolvidos abrindo o arquivo no Excel e salvando-o novamente \
(Arquivo > Salvar) antes de carregá-lo aqui.";

/// Why a spreadsheet could not be turned into a case table.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Erro ao ler a planilha: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Erro ao ler o CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erro de leitura do arquivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("A planilha não contém nenhuma aba")]
    NoWorksheet,

    #[error("A planilha não tem a linha de cabeçalho esperada (linha {expected})")]
    MissingHeader { expected: usize },

    #[error("Formato de arquivo não suportado: .{0}")]
    UnsupportedExtension(String),
}

impl IngestError {
    /// Remediation shown next to the message.
    pub fn hint(&self) -> &'static str {
        RESAVE_HINT
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_error_names_the_row() {
        let e = IngestError::MissingHeader { expected: 2 };
        assert!(e.to_string().contains("linha 2"));
        assert!(e.hint().contains("salvando-o novamente"));
    }
}
