//! Histórico de auditoria - camada de capacidades
//!
//! Só sabe anexar uma linha ao histórico; não conhece o fluxo. Falhas de
//! escrita são logadas por quem chama e nunca bloqueiam o orquestrador.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::error::AppError;
use crate::models::HistoryEntry;

/// Sumidouro append-only de entradas de histórico
pub trait HistorySink: Send + Sync {
    fn append(&self, entry: &HistoryEntry) -> Result<()>;
}

/// Histórico em arquivo texto, uma linha por tentativa
pub struct FileHistorySink {
    path: PathBuf,
}

impl FileHistorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn format_line(entry: &HistoryEntry) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.grupo,
            entry.cota,
            entry.nome,
            entry.valor,
            entry.status,
            entry.observacao
        )
    }
}

impl HistorySink for FileHistorySink {
    fn append(&self, entry: &HistoryEntry) -> Result<()> {
        debug!(
            "Histórico: grupo {} | cota {} | {}",
            entry.grupo, entry.cota, entry.status
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(AppError::History)?;

        file.write_all(Self::format_line(entry).as_bytes())
            .map_err(AppError::History)?;

        Ok(())
    }
}

/// Sumidouro nulo, para execuções sem auditoria
pub struct NullHistorySink;

impl HistorySink for NullHistorySink {
    fn append(&self, _entry: &HistoryEntry) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryStatus;

    #[test]
    fn appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historico.txt");
        let sink = FileHistorySink::new(&path);

        let entry = HistoryEntry::new(
            "1550",
            "0303",
            "Gil Zanobia",
            "30%",
            HistoryStatus::Success,
            "Lance registrado com sucesso",
        );
        sink.append(&entry).unwrap();
        sink.append(&entry).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("1550\t0303\tGil Zanobia\t30%"));
    }

    #[test]
    fn append_failure_surfaces_history_error() {
        // Diretório pai inexistente: o open falha
        let sink = FileHistorySink::new("/caminho/inexistente/historico.txt");
        let entry = HistoryEntry::new(
            "1550",
            "0303",
            "Gil Zanobia",
            "30%",
            HistoryStatus::Success,
            "Lance registrado com sucesso",
        );

        let err = sink.append(&entry).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::History(_))
        ));
    }

    #[test]
    fn line_carries_status_and_note() {
        let entry = HistoryEntry::new(
            "1550",
            "1123",
            "Sem nome",
            "N/A",
            HistoryStatus::Interrupted,
            "Automação interrompida pelo usuário",
        );
        let line = FileHistorySink::format_line(&entry);
        assert!(line.contains("⏹️ Parado"));
        assert!(line.contains("Automação interrompida"));
        assert!(line.ends_with('\n'));
    }
}
