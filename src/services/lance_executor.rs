//! Execução de lances no portal - camada de capacidades
//!
//! Cada passo é pré-condição do seguinte e nenhum tem retry interno: quem
//! chama decide repetir. Falhas viram `Err` aqui e são convertidas em
//! `LanceOutcome` com `error_message` na camada de fluxo.

use std::time::{Duration, Instant};

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{waits, Session};
use crate::models::{CotaData, LanceOutcome, ProtocolRecord};
use crate::services::progress::ProgressReporter;
use crate::services::protocol_extractor;
use crate::utils::normalize_cota;

const GRUPO_INPUT_ID: &str = "grupofrm";
const BUSCAR_BUTTON_SELECTOR: &str = "#btn_representante_cota";
const RESULT_ROW_SELECTOR: &str = "table tbody tr";
const LANCES_LINK_SELECTOR: &str = "a[href*='/vendas/lances']";
const PAINEL_LINK_SELECTOR: &str = "a[href*='/vendas/painel']";
const LANFIX_INPUT_ID: &str = "tx_lanfix";
const LANFIX_EMB_INPUT_ID: &str = "tx_lanfix_emb";
const SIMULAR_SELECTOR: &str = "a#btn_simular, a[name='btn_simular']";
const REGISTRAR_SELECTOR: &str = "a.printBt";
const DOCPARSER_MARKER: &str = "docparser/view";

/// Volta à tela de seleção de consórcio ("Alterar Consórcio")
pub async fn alterar_consorcio(
    page: &Page,
    config: &Config,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.notify("🔄 Clicando em 'Alterar Consórcio'...");

    match waits::wait_for_element(page, PAINEL_LINK_SELECTOR, config.timeout_secs).await {
        Ok(link) => {
            link.click().await?;
        }
        Err(_) => {
            // Sem o link (layout mudou), navega direto para o painel
            progress.notify("⚠️ Link do painel não encontrado, navegando direto...");
            page.goto(config.servopa_painel_url.as_str()).await?;
        }
    }
    sleep(Duration::from_secs(3)).await; // carregamento do painel

    progress.notify("✅ Retornado à seleção de consórcio");
    Ok(())
}

/// Preenche o número do grupo com digitação simulada e dispara a busca
pub async fn buscar_grupo(
    page: &Page,
    config: &Config,
    grupo: &str,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.notify(&format!("🔍 Buscando grupo {}...", grupo));

    let grupo_input =
        waits::wait_for_element(page, &format!("#{}", GRUPO_INPUT_ID), config.timeout_secs).await?;

    waits::clear_input(page, GRUPO_INPUT_ID).await?;
    sleep(Duration::from_millis(500)).await;

    grupo_input.click().await?;
    waits::type_slow(&grupo_input, grupo, config.typing_delay_ms).await?;
    sleep(Duration::from_secs(1)).await;

    let buscar_button =
        waits::wait_for_element(page, BUSCAR_BUTTON_SELECTOR, config.timeout_secs).await?;
    buscar_button.click().await?;
    sleep(Duration::from_secs(4)).await; // busca carregar

    progress.notify(&format!("✅ Grupo {} buscado com sucesso", grupo));
    Ok(())
}

/// Seleciona a cota na tabela de resultados
///
/// A cota é normalizada para 4 dígitos antes da comparação (o portal
/// zero-preenche internamente). Se nenhuma linha corresponder, o erro
/// enumera as cotas que estavam presentes, para diagnóstico.
pub async fn selecionar_cota(
    page: &Page,
    config: &Config,
    cota: &str,
    progress: &dyn ProgressReporter,
) -> Result<CotaData> {
    let cota_normalizada = normalize_cota(cota);

    progress.notify(&format!(
        "🔍 Procurando cota {} (normalizada: {}) na tabela...",
        cota, cota_normalizada
    ));

    let rows = waits::wait_for_elements(page, RESULT_ROW_SELECTOR, config.timeout_secs).await?;

    progress.notify(&format!(
        "📊 {} linhas encontradas, procurando cota {}...",
        rows.len(),
        cota_normalizada
    ));

    // Para diagnóstico quando a cota não aparece
    let mut cotas_encontradas = Vec::new();

    for row in rows {
        let cells = match row.find_elements("td").await {
            Ok(cells) => cells,
            Err(_) => continue,
        };

        // A cota fica na 5ª coluna
        if cells.len() < 5 {
            continue;
        }

        let cota_value = cell_text(&cells, 4).await;
        cotas_encontradas.push(cota_value.clone());

        if cota_value == cota_normalizada {
            let data = CotaData {
                cota: cota.to_string(),
                nome: cell_text(&cells, 0).await,
                valor: cell_text(&cells, 1).await,
                grupo: cell_text(&cells, 3).await,
                digito: cell_text(&cells, 5).await,
                contrato: cell_text(&cells, 6).await,
            };

            progress.notify(&format!("✅ Cota {} encontrada: {}", cota, data.nome));

            row.click().await?;
            sleep(Duration::from_secs(3)).await; // redirecionamento

            return Ok(data);
        }
    }

    progress.notify(&format!(
        "❌ Cota {} não encontrada na tabela",
        cota_normalizada
    ));

    let preview: Vec<&str> = cotas_encontradas.iter().take(10).map(|s| s.as_str()).collect();
    let mut listing = format!("cotas disponíveis: {}", preview.join(", "));
    if cotas_encontradas.len() > 10 {
        listing.push_str(&format!(" ... e mais {}", cotas_encontradas.len() - 10));
    }
    progress.notify(&format!("📋 {}", listing));

    Err(AppError::Extraction(format!(
        "cota {} não encontrada na tabela ({})",
        cota_normalizada, listing
    ))
    .into())
}

/// Texto de uma célula da linha, vazio se a coluna não existe
async fn cell_text(cells: &[chromiumoxide::Element], idx: usize) -> String {
    match cells.get(idx) {
        Some(cell) => cell
            .inner_text()
            .await
            .ok()
            .flatten()
            .map(|t| t.trim().to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// Navega para a página de lances
pub async fn navegar_para_lances(
    page: &Page,
    config: &Config,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.notify("🎯 Navegando para página de Lances...");

    match waits::wait_for_element(page, LANCES_LINK_SELECTOR, config.timeout_secs).await {
        Ok(link) => {
            link.click().await?;
        }
        Err(_) => {
            progress.notify("⚠️ Link de lances não encontrado, navegando direto...");
            page.goto(config.servopa_lances_url.as_str()).await?;
        }
    }
    sleep(Duration::from_secs(3)).await;

    progress.notify("✅ Página de lances carregada");
    Ok(())
}

/// Executa o lance: copia o valor fixo, simula, registra e classifica
///
/// Classificação após o "Registrar":
/// - mensagem inline de protocolo anterior obrigatório → o lance já
///   existia; o guarda de duplicidade do próprio portal é o sinal de
///   idempotência e isso conta como sucesso
/// - nova aba ou mudança de URL apontando para o documento de protocolo →
///   extrai o protocolo, fecha a aba extra e restaura a aba original
/// - nenhum dos dois dentro do timeout → sucesso sem protocolo capturado
pub async fn executar_lance(
    session: &Session,
    config: &Config,
    progress: &dyn ProgressReporter,
) -> Result<LanceOutcome> {
    let page = session.active_page();

    // Passo 1: copiar o valor do lance fixo
    progress.notify("📋 Copiando valor do lance fixo...");

    waits::wait_for_element(page, &format!("#{}", LANFIX_INPUT_ID), config.timeout_secs).await?;
    let valor_lanfix = waits::read_input_value(page, LANFIX_INPUT_ID).await?;

    progress.notify(&format!("📋 Valor do lance fixo: {}%", valor_lanfix));

    // Passo 2: colar no campo embutido com digitação simulada
    let emb_input = waits::wait_for_element(
        page,
        &format!("#{}", LANFIX_EMB_INPUT_ID),
        config.timeout_secs,
    )
    .await?;

    waits::clear_input(page, LANFIX_EMB_INPUT_ID).await?;
    sleep(Duration::from_millis(500)).await;

    emb_input.click().await?;
    waits::type_slow(&emb_input, &valor_lanfix, config.typing_delay_ms).await?;
    sleep(Duration::from_secs(1)).await;

    progress.notify(&format!(
        "✅ Valor {}% preenchido no campo embutido",
        valor_lanfix
    ));

    // Passo 3: simular
    progress.notify("🎲 Simulando lance...");

    let simular = waits::wait_for_element(page, SIMULAR_SELECTOR, config.timeout_secs).await?;
    simular.click().await?;
    sleep(Duration::from_secs(3)).await; // simulação processar

    progress.notify("✅ Simulação concluída");

    // Passo 4: registrar, guardando as abas abertas antes do clique
    progress.notify("💾 Registrando lance...");

    let registrar = waits::wait_for_element(page, REGISTRAR_SELECTOR, config.timeout_secs).await?;

    let handles_before: Vec<TargetId> = session
        .pages()
        .await?
        .iter()
        .map(|p| p.target_id().clone())
        .collect();

    registrar.click().await?;

    progress.notify("🔍 Verificando resultado do registro...");
    sleep(Duration::from_secs(3)).await; // popup aparecer, se houver

    // Passo 5: classificar
    let already_exists = detect_previous_protocol_message(page).await.unwrap_or(false);

    if already_exists {
        progress.notify("⚠️ Popup detectado: 'Número do Protocolo Anterior é obrigatório'");
        progress.notify("✅ Lance JÁ FOI REGISTRADO anteriormente - considerando sucesso!");
    }

    let protocol = capture_protocol(session, config, &handles_before, progress).await;

    if already_exists {
        dismiss_ok_button(page).await;

        return Ok(LanceOutcome {
            success: true,
            already_exists: true,
            valor_lance: valor_lanfix,
            message: "Lance já foi registrado anteriormente".to_string(),
            protocol,
            error_message: None,
        });
    }

    progress.notify("✅ Lance registrado com sucesso!");

    Ok(LanceOutcome {
        success: true,
        already_exists: false,
        valor_lance: valor_lanfix,
        message: "Lance registrado com sucesso".to_string(),
        protocol,
        error_message: None,
    })
}

/// Procura a mensagem inline de protocolo anterior obrigatório
async fn detect_previous_protocol_message(page: &Page) -> Result<bool> {
    let js = r#"
        (() => {
            for (const el of document.querySelectorAll('body *')) {
                const own = Array.from(el.childNodes)
                    .filter(n => n.nodeType === 3)
                    .map(n => n.textContent)
                    .join('');
                if (!own.includes('Protocolo Anterior') || !own.includes('obrigat')) continue;
                const style = window.getComputedStyle(el);
                if (style.display === 'none' || style.visibility === 'hidden') continue;
                return true;
            }
            return false;
        })()
    "#;

    Ok(page.evaluate(js).await?.into_value()?)
}

/// Fecha o popup clicando em OK, se existir (melhor esforço)
async fn dismiss_ok_button(page: &Page) {
    let js = r#"
        (() => {
            for (const btn of document.querySelectorAll('button')) {
                const text = (btn.textContent || '').trim();
                if (text === 'OK' || text === 'Ok') {
                    btn.click();
                    return true;
                }
            }
            return false;
        })()
    "#;

    if let Err(e) = page.evaluate(js).await {
        debug!("Falha ao fechar popup de OK: {}", e);
    }
    sleep(Duration::from_secs(1)).await;
}

/// Captura o protocolo da aba gerada pelo registro
///
/// Faz poll limitado por nova aba ou mudança de URL para o documento;
/// extrai, fecha a aba extra e restaura a aba original. Qualquer falha
/// degrada para `None`: protocolo ausente não é falha do lance.
async fn capture_protocol(
    session: &Session,
    config: &Config,
    handles_before: &[TargetId],
    progress: &dyn ProgressReporter,
) -> Option<ProtocolRecord> {
    let original = session.active_page();
    let deadline = Instant::now() + Duration::from_secs(config.window_poll_timeout_secs);

    let mut new_pages: Vec<Page> = Vec::new();

    loop {
        match session.pages().await {
            Ok(pages) => {
                new_pages = pages
                    .into_iter()
                    .filter(|p| !handles_before.iter().any(|id| id == p.target_id()))
                    .collect();
            }
            Err(e) => {
                warn!("Falha ao listar abas: {}", e);
            }
        }

        let current_url = original.url().await.ok().flatten().unwrap_or_default();

        if !new_pages.is_empty() || current_url.contains(DOCPARSER_MARKER) {
            break;
        }
        if Instant::now() >= deadline {
            break;
        }
        sleep(Duration::from_secs(1)).await;
    }

    let mut record = None;

    for candidate in new_pages {
        let url = candidate.url().await.ok().flatten().unwrap_or_default();
        if !url.contains(DOCPARSER_MARKER) {
            continue;
        }

        progress.notify("📄 Documento de protocolo detectado, extraindo dados...");
        record = Some(protocol_extractor::extract_protocol(&candidate, &url, config, progress).await);

        if let Err(e) = candidate.close().await {
            debug!("Falha ao fechar aba do documento: {}", e);
        }
        break;
    }

    // A própria aba pode ter navegado para o documento
    if record.is_none() {
        let url = original.url().await.ok().flatten().unwrap_or_default();
        if url.contains(DOCPARSER_MARKER) {
            progress.notify("📄 Documento de protocolo detectado, extraindo dados...");
            record = Some(protocol_extractor::extract_protocol(original, &url, config, progress).await);

            // Volta para a página de lances
            let back = async {
                original.evaluate("window.history.back()").await?;
                waits::wait_for_url_contains(
                    original,
                    config.lances_path(),
                    config.window_poll_timeout_secs,
                )
                .await
            }
            .await;
            if let Err(e) = back {
                debug!("Falha ao voltar para a página de lances: {}", e);
            }
        }
    }

    // Restaura a aba original como ativa (melhor esforço)
    if let Err(e) = original.bring_to_front().await {
        debug!("Falha ao restaurar aba original: {}", e);
    }

    record
}
