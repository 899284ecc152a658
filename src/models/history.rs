//! Registro de auditoria (append-only)

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Desfecho de uma tentativa registrado no histórico
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryStatus {
    Success,
    /// Lance já existia; o portal detectou a duplicidade
    SuccessAlreadyExisted,
    Error,
    /// Parada deliberada pelo usuário; nunca misturado com `Error`
    Interrupted,
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::Success => write!(f, "✅ Sucesso"),
            HistoryStatus::SuccessAlreadyExisted => write!(f, "✅ Sucesso (já existia)"),
            HistoryStatus::Error => write!(f, "❌ Erro"),
            HistoryStatus::Interrupted => write!(f, "⏹️ Parado"),
        }
    }
}

/// Uma linha do histórico de auditoria
///
/// Criada exatamente uma vez por tentativa de tarefa (inclusive em
/// interrupção), nunca mutada após o append, nunca apagada por este
/// subsistema.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub grupo: String,
    pub cota: String,
    pub nome: String,
    pub valor: String,
    pub status: HistoryStatus,
    pub observacao: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(
        grupo: impl Into<String>,
        cota: impl Into<String>,
        nome: impl Into<String>,
        valor: impl Into<String>,
        status: HistoryStatus,
        observacao: impl Into<String>,
    ) -> Self {
        Self {
            grupo: grupo.into(),
            cota: cota.into(),
            nome: nome.into(),
            valor: valor.into(),
            status,
            observacao: observacao.into(),
            timestamp: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_including_timestamp() {
        let entry = HistoryEntry::new(
            "1550",
            "0303",
            "Gil Zanobia",
            "30%",
            HistoryStatus::Success,
            "Lance registrado com sucesso",
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"grupo\":\"1550\""));
        assert!(json.contains("\"status\":\"Success\""));
        assert!(json.contains("\"timestamp\""));
    }
}
