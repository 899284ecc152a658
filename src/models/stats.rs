//! Estatísticas de uma execução do ciclo

use serde::Serialize;

/// Resultado de uma tarefa individual dentro do ciclo
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub section: String,
    pub grupo: String,
    pub cota: String,
    pub nome: String,
    pub success: bool,
    pub already_exists: bool,
    pub protocol_number: Option<String>,
    pub error: Option<String>,
}

/// Contadores acumulados de uma execução completa
///
/// Criado no início da execução e devolvido ao chamador no fim; o núcleo
/// não persiste nada disso.
#[derive(Debug, Default, Serialize)]
pub struct CycleStats {
    pub total_sections: usize,
    pub total_tasks: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub interrupted: usize,
    pub results: Vec<TaskResult>,
}

impl CycleStats {
    pub fn success_rate(&self) -> Option<f64> {
        let attempted = self.completed + self.failed;
        if attempted == 0 {
            return None;
        }
        Some(self.completed as f64 / attempted as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_empty_run_is_none() {
        let stats = CycleStats::default();
        assert!(stats.success_rate().is_none());
    }

    #[test]
    fn success_rate_counts_only_attempted() {
        let stats = CycleStats {
            completed: 3,
            failed: 1,
            skipped: 10,
            ..Default::default()
        };
        assert_eq!(stats.success_rate(), Some(75.0));
    }
}
