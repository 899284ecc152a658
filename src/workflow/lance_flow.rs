//! Fluxo de um lance - camada de fluxo
//!
//! Define a sequência completa de uma tarefa no portal:
//! alterar consórcio (se preciso) → buscar grupo → selecionar cota →
//! navegar para lances → executar lance. Qualquer falha de passo vira um
//! `LanceOutcome` com `error_message`; nada escapa como exceção daqui.

use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::LanceOutcome;
use crate::services::lance_executor;
use crate::services::progress::ProgressReporter;
use crate::workflow::task_ctx::TaskCtx;

/// Fluxo de processamento de um lance
///
/// Não segura recurso nenhum; só encadeia as capacidades de negócio.
pub struct LanceFlow<'a> {
    config: &'a Config,
}

impl<'a> LanceFlow<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Processa um lance completo do início ao fim
    ///
    /// A aba ativa da sessão deve ser a do portal. Nunca retorna `Err`:
    /// falha é dado (`success=false` + `error_message`).
    pub async fn run(
        &self,
        session: &Session,
        ctx: &TaskCtx,
        progress: &dyn ProgressReporter,
    ) -> LanceOutcome {
        info!("{} iniciando lance", ctx);

        match self.run_steps(session, ctx, progress).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} falha no lance: {}", ctx, e);
                progress.notify(&format!("❌ Erro ao executar lance: {}", e));
                LanceOutcome::failed(e.to_string())
            }
        }
    }

    async fn run_steps(
        &self,
        session: &Session,
        ctx: &TaskCtx,
        progress: &dyn ProgressReporter,
    ) -> anyhow::Result<LanceOutcome> {
        let page = session.active_page();

        // Passo 1: voltar à seleção de consórcio se não for o primeiro lance
        let current_url = session.current_url().await?;
        if !current_url.contains("painel") {
            lance_executor::alterar_consorcio(page, self.config, progress).await?;
        }

        // Passo 2: buscar o grupo
        lance_executor::buscar_grupo(page, self.config, &ctx.grupo, progress).await?;

        // Passo 3: selecionar a cota na tabela
        let cota_data =
            lance_executor::selecionar_cota(page, self.config, &ctx.cota, progress).await?;

        if self.config.verbose_logging {
            info!(
                "{} cota selecionada: contrato {} | valor {}",
                ctx, cota_data.contrato, cota_data.valor
            );
        }

        // Passo 4: navegar para a página de lances
        lance_executor::navegar_para_lances(page, self.config, progress).await?;

        // Passo 5: executar e classificar o lance
        lance_executor::executar_lance(session, self.config, progress).await
    }
}
