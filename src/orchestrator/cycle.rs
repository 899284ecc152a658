//! Orquestrador do ciclo completo - camada de orquestração
//!
//! Percorre o board coluna por coluna, linha por linha:
//! aba do Servopa → lance → aba do Todoist → checkbox → histórico; ao fim
//! de cada coluna, varredura forçando os checkboxes que não persistiram.
//!
//! Único componente autorizado a capturar erros de forma ampla, e sempre
//! por tarefa, nunca por execução: uma tarefa ruim não derruba o ciclo e
//! `CycleStats` é sempre devolvido ao chamador.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::sleep;
use tracing::warn;

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::{
    Board, CycleStats, HistoryEntry, HistoryStatus, LanceOutcome, Section, Task, TaskResult,
};
use crate::services::board_extractor;
use crate::services::history::HistorySink;
use crate::services::progress::ProgressReporter;
use crate::utils::logging::truncate_text;
use crate::workflow::{LanceFlow, TaskCtx};

/// Limite do texto de erro gravado no histórico
const HISTORY_ERROR_MAX_LEN: usize = 200;

/// Sinal de cancelamento cooperativo
///
/// Amostrado no topo de cada seção, de cada tarefa e antes/depois da ida
/// ao portal; nunca preemptivo. Uma tarefa já em voo termina (ou falha)
/// antes da próxima checagem.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resultado interno de uma tentativa de tarefa
enum TaskStep {
    Completed(LanceOutcome),
    Interrupted,
}

/// Orquestrador do ciclo completo
pub struct CycleOrchestrator<'a> {
    config: &'a Config,
    history: &'a dyn HistorySink,
    progress: &'a dyn ProgressReporter,
    cancel: CancelFlag,
}

impl<'a> CycleOrchestrator<'a> {
    pub fn new(
        config: &'a Config,
        history: &'a dyn HistorySink,
        progress: &'a dyn ProgressReporter,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            config,
            history,
            progress,
            cancel,
        }
    }

    /// Automação completa: verifica abas, extrai o board e roda o ciclo
    pub async fn run_full_automation(&self, session: &mut Session) -> Result<CycleStats> {
        if session.page_count().await? < 2 {
            bail!("São necessárias 2 abas abertas (Servopa e Todoist)");
        }
        self.progress.notify("✅ Verificado: 2 abas abertas");

        self.progress
            .notify("📋 Mudando para aba do Todoist para extrair dados...");
        if !session.switch_to(&self.config.todoist_url_part).await? {
            bail!("Não foi possível encontrar aba do Todoist");
        }
        sleep(Duration::from_secs(2)).await;

        // Garante que o projeto do board está aberto
        let opened = board_extractor::navigate_to_board_project(
            session.active_page(),
            &self.config.board_project_name,
            self.config.timeout_secs,
            self.progress,
        )
        .await?;
        if !opened {
            self.progress
                .notify("⚠️ Projeto não encontrado na barra lateral, usando a página atual");
        }

        let board = board_extractor::extract_board(session.active_page(), self.progress).await?;

        let board = match board {
            Some(board) if !board.is_empty() => board,
            _ => bail!("Falha ao extrair dados do board ou board vazio"),
        };

        Ok(self.run_cycle(session, &board).await)
    }

    /// Executa o ciclo completo sobre um board já extraído
    ///
    /// Sempre retorna as estatísticas acumuladas, mesmo que toda tarefa
    /// falhe ou a execução seja cancelada no meio.
    pub async fn run_cycle(&self, session: &mut Session, board: &Board) -> CycleStats {
        // Parada pedida antes de qualquer processamento
        if let Some(stats) = self.cancelled_before_start(board) {
            self.progress.notify("⏹️ Automação interrompida pelo usuário");
            return stats;
        }

        let mut stats = Self::initial_stats(board);

        self.progress.notify(&"=".repeat(60));
        self.progress.notify("🚀 INICIANDO CICLO COMPLETO");
        self.progress.notify(&format!(
            "📊 {} colunas, {} tarefas",
            stats.total_sections, stats.total_tasks
        ));
        self.progress.notify(&"=".repeat(60));

        for (section_index, section) in board.sections.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.progress.notify("⏹️ Automação interrompida pelo usuário");
                return stats;
            }

            self.log_section_banner(section, section_index + 1, stats.total_sections);

            for (task_index, task) in section.tasks.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    self.progress.notify("⏹️ Automação interrompida pelo usuário");
                    return stats;
                }

                // Linha já marcada no board: lance de execução anterior
                if task.is_completed {
                    stats.skipped += 1;
                    self.progress.notify(&format!(
                        "⏭️ Cota {} já concluída, pulando...",
                        task.cota
                    ));
                    continue;
                }

                let ctx = TaskCtx::new(
                    section.grupo.clone(),
                    task.cota.clone(),
                    task.nome.clone(),
                    task_index + 1,
                    section.tasks.len(),
                );

                self.log_task_banner(&ctx);

                match self.process_task(session, task, &ctx).await {
                    Ok(TaskStep::Completed(outcome)) => {
                        stats.completed += 1;
                        self.record_success(&ctx, &outcome);
                        stats.results.push(TaskResult {
                            section: section.title.clone(),
                            grupo: ctx.grupo.clone(),
                            cota: ctx.cota.clone(),
                            nome: ctx.nome.clone(),
                            success: true,
                            already_exists: outcome.already_exists,
                            protocol_number: outcome
                                .protocol
                                .as_ref()
                                .and_then(|p| p.protocol_number.clone()),
                            error: None,
                        });

                        self.progress.notify(&format!(
                            "🎉 Tarefa {}/{} concluída com sucesso!",
                            ctx.task_index, ctx.section_total
                        ));
                        self.progress.notify(&format!(
                            "📊 Progresso: {}/{} tarefas",
                            stats.completed, stats.total_tasks
                        ));
                    }
                    Ok(TaskStep::Interrupted) => {
                        stats.interrupted += 1;
                        self.record_interrupted(&ctx);
                        self.progress.notify(
                            "⏹️ Automação interrompida pelo usuário durante processamento",
                        );
                        return stats;
                    }
                    Err(e) => {
                        stats.failed += 1;
                        self.record_error(&ctx, &e);
                        stats.results.push(TaskResult {
                            section: section.title.clone(),
                            grupo: ctx.grupo.clone(),
                            cota: ctx.cota.clone(),
                            nome: ctx.nome.clone(),
                            success: false,
                            already_exists: false,
                            protocol_number: None,
                            error: Some(e.to_string()),
                        });

                        self.progress
                            .notify(&format!("❌ Erro na tarefa {}: {}", ctx.task_index, e));
                        self.progress
                            .notify("⚠️ Tentando continuar com próxima tarefa...");

                        // Tenta restaurar o contexto do portal mesmo após erro
                        if let Err(switch_err) =
                            session.switch_to(&self.config.servopa_url_part).await
                        {
                            warn!("Falha ao restaurar aba do Servopa: {}", switch_err);
                        }
                    }
                }
            }

            self.sweep_section(session, section).await;

            self.progress
                .notify(&format!("✅ Coluna '{}' TOTALMENTE concluída!", section.title));
            self.progress.notify(&format!(
                "📊 Total: {} sucesso, {} falhas",
                stats.completed, stats.failed
            ));
        }

        self.log_final_report(&stats);

        stats
    }

    fn initial_stats(board: &Board) -> CycleStats {
        CycleStats {
            total_sections: board.sections.len(),
            total_tasks: board.total_tasks(),
            ..Default::default()
        }
    }

    /// Curto-circuito do ciclo quando o cancelamento já estava armado
    ///
    /// Nenhuma tarefa é tocada: as estatísticas voltam zeradas, só com os
    /// totais do board preenchidos.
    fn cancelled_before_start(&self, board: &Board) -> Option<CycleStats> {
        if self.cancel.is_cancelled() {
            Some(Self::initial_stats(board))
        } else {
            None
        }
    }

    /// Sequência de uma tarefa: portal → lance → board → checkbox
    async fn process_task(
        &self,
        session: &mut Session,
        task: &Task,
        ctx: &TaskCtx,
    ) -> Result<TaskStep> {
        if self.cancel.is_cancelled() {
            return Ok(TaskStep::Interrupted);
        }

        // ========== PARTE 1: SERVOPA ==========
        self.progress.notify("🌐 [SERVOPA] Mudando para aba do Servopa...");
        if !session.switch_to(&self.config.servopa_url_part).await? {
            bail!("Não foi possível mudar para aba do Servopa");
        }
        sleep(Duration::from_secs(1)).await;

        if self.cancel.is_cancelled() {
            return Ok(TaskStep::Interrupted);
        }

        self.progress.notify(&format!(
            "🎯 [SERVOPA] Processando lance: Grupo {} - Cota {}",
            ctx.grupo, ctx.cota
        ));

        let outcome = LanceFlow::new(self.config)
            .run(session, ctx, self.progress)
            .await;

        if !outcome.success {
            bail!(
                "Falha no processamento do lance: {}",
                outcome
                    .error_message
                    .as_deref()
                    .unwrap_or("Desconhecido")
            );
        }

        if outcome.already_exists {
            self.progress
                .notify(&format!("✅ [SERVOPA] {}", outcome.message));
        } else {
            self.progress
                .notify("✅ [SERVOPA] Lance registrado com sucesso!");
        }

        if self.cancel.is_cancelled() {
            return Ok(TaskStep::Interrupted);
        }

        // ========== PARTE 2: TODOIST ==========
        self.progress.notify("📋 [TODOIST] Mudando para aba do Todoist...");
        if !session.switch_to(&self.config.todoist_url_part).await? {
            bail!("Não foi possível mudar para aba do Todoist");
        }
        sleep(Duration::from_secs(1)).await;

        self.progress
            .notify("✅ [TODOIST] Marcando tarefa como concluída...");
        if !board_extractor::mark_task_completed(&task.handle, self.progress).await {
            bail!("Falha ao marcar checkbox no Todoist");
        }
        self.progress.notify("✅ [TODOIST] Tarefa marcada com sucesso!");

        // ========== RETORNA PARA SERVOPA ==========
        self.progress
            .notify("🔄 Retornando para aba do Servopa para próxima tarefa...");
        if let Err(e) = session.switch_to(&self.config.servopa_url_part).await {
            warn!("Falha ao voltar para aba do Servopa: {}", e);
        }
        sleep(Duration::from_secs(1)).await;

        Ok(TaskStep::Completed(outcome))
    }

    /// Varredura de fim de coluna: garante todos os checkboxes marcados
    ///
    /// Compensa marcações individuais que a UI não persistiu. Idempotente:
    /// linhas já marcadas não são tocadas nem recontadas.
    async fn sweep_section(&self, session: &mut Session, section: &Section) {
        self.progress.notify(&"=".repeat(60));
        self.progress
            .notify(&format!("📋 FINALIZANDO COLUNA: {}", section.title));
        self.progress.notify(&"=".repeat(60));

        let result = async {
            if session.switch_to(&self.config.todoist_url_part).await? {
                let marked = board_extractor::mark_all_section_tasks(
                    session.active_page(),
                    &section.title,
                    self.progress,
                )
                .await?;

                self.progress.notify(&format!(
                    "✅ {} checkboxes garantidos na coluna '{}'",
                    marked, section.title
                ));
            }

            // Volta para o portal para a próxima coluna
            session.switch_to(&self.config.servopa_url_part).await?;
            sleep(Duration::from_secs(1)).await;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Err(e) = result {
            self.progress
                .notify(&format!("⚠️ Erro ao marcar checkboxes finais: {}", e));
        }
    }

    // ========== Histórico (falha de escrita nunca bloqueia o ciclo) ==========

    fn record_success(&self, ctx: &TaskCtx, outcome: &LanceOutcome) {
        let (status, observacao) = if outcome.already_exists {
            (
                HistoryStatus::SuccessAlreadyExisted,
                "Lance já existia (protocolo anterior detectado)",
            )
        } else {
            (HistoryStatus::Success, "Lance registrado com sucesso")
        };

        let mut observacao = observacao.to_string();
        if let Some(protocol) = outcome
            .protocol
            .as_ref()
            .and_then(|p| p.protocol_number.as_deref())
        {
            observacao.push_str(&format!(" | protocolo {}", protocol));
        }

        self.append_entry(HistoryEntry::new(
            ctx.grupo.clone(),
            ctx.cota.clone(),
            ctx.nome.clone(),
            format!("{}%", outcome.valor_lance),
            status,
            observacao,
        ));
    }

    fn record_error(&self, ctx: &TaskCtx, error: &anyhow::Error) {
        self.append_entry(HistoryEntry::new(
            ctx.grupo.clone(),
            ctx.cota.clone(),
            ctx.nome.clone(),
            "N/A",
            HistoryStatus::Error,
            truncate_text(&error.to_string(), HISTORY_ERROR_MAX_LEN),
        ));
    }

    fn record_interrupted(&self, ctx: &TaskCtx) {
        self.append_entry(HistoryEntry::new(
            ctx.grupo.clone(),
            ctx.cota.clone(),
            ctx.nome.clone(),
            "N/A",
            HistoryStatus::Interrupted,
            "Automação interrompida pelo usuário",
        ));
    }

    fn append_entry(&self, entry: HistoryEntry) {
        if let Err(e) = self.history.append(&entry) {
            self.progress.notify(&format!(
                "⚠️ Aviso: Não foi possível registrar no histórico: {}",
                e
            ));
        }
    }

    // ========== Logs de banner ==========

    fn log_section_banner(&self, section: &Section, index: usize, total: usize) {
        self.progress.notify(&format!("┌{}┐", "─".repeat(58)));
        self.progress
            .notify(&format!("│ COLUNA {}/{}: {}", index, total, section.title));
        self.progress.notify(&format!("│ Grupo: {}", section.grupo));
        self.progress
            .notify(&format!("│ Tarefas: {}", section.tasks.len()));
        self.progress.notify(&format!("└{}┘", "─".repeat(58)));
    }

    fn log_task_banner(&self, ctx: &TaskCtx) {
        self.progress.notify(&format!(
            "┌─ Tarefa {}/{} {}",
            ctx.task_index,
            ctx.section_total,
            "─".repeat(40)
        ));
        self.progress.notify(&format!("│  📝 Cota: {}", ctx.cota));
        self.progress.notify(&format!("│  👤 Nome: {}", ctx.nome));
        self.progress.notify(&format!("└{}", "─".repeat(50)));
    }

    fn log_final_report(&self, stats: &CycleStats) {
        self.progress.notify(&"=".repeat(60));
        self.progress.notify("🎉 CICLO COMPLETO FINALIZADO!");
        self.progress.notify(&"=".repeat(60));
        if stats.skipped > 0 {
            self.progress
                .notify(&format!("⏭️ Tarefas puladas (continuação): {}", stats.skipped));
        }
        self.progress.notify(&format!(
            "✅ Tarefas concluídas: {}/{}",
            stats.completed, stats.total_tasks
        ));
        self.progress.notify(&format!(
            "❌ Tarefas com falha: {}/{}",
            stats.failed, stats.total_tasks
        ));
        if let Some(rate) = stats.success_rate() {
            self.progress
                .notify(&format!("📊 Taxa de sucesso: {:.1}%", rate));
        }
        self.progress.notify(&"=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::history::NullHistorySink;
    use crate::services::progress::NullReporter;

    #[test]
    fn cancel_flag_starts_clear_and_latches() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        flag.cancel();
        assert!(flag.is_cancelled());

        // Clones compartilham o mesmo estado
        let clone = flag.clone();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancel_flag_clone_propagates_to_origin() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    fn test_orchestrator<'a>(
        config: &'a Config,
        history: &'a NullHistorySink,
        progress: &'a NullReporter,
        cancel: CancelFlag,
    ) -> CycleOrchestrator<'a> {
        CycleOrchestrator::new(config, history, progress, cancel)
    }

    fn board_with_one_section() -> Board {
        Board {
            sections: vec![Section {
                grupo: "1550".to_string(),
                title: "1550 - dia 8".to_string(),
                tasks: Vec::new(),
            }],
        }
    }

    #[test]
    fn pre_armed_cancel_processes_nothing() {
        let config = Config::default();
        let history = NullHistorySink;
        let progress = NullReporter;
        let cancel = CancelFlag::new();
        cancel.cancel();

        let orchestrator = test_orchestrator(&config, &history, &progress, cancel);
        let board = board_with_one_section();

        let stats = orchestrator
            .cancelled_before_start(&board)
            .expect("parada armada deveria curto-circuitar o ciclo");

        assert_eq!(stats.total_sections, 1);
        assert_eq!(
            stats.completed + stats.failed + stats.skipped + stats.interrupted,
            0
        );
        assert!(stats.results.is_empty());
    }

    #[test]
    fn clear_flag_lets_the_cycle_start() {
        let config = Config::default();
        let history = NullHistorySink;
        let progress = NullReporter;

        let orchestrator = test_orchestrator(&config, &history, &progress, CancelFlag::new());
        let board = board_with_one_section();

        assert!(orchestrator.cancelled_before_start(&board).is_none());
    }
}
