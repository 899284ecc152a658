//! Extrator do board - camada de capacidades
//!
//! Lê o DOM renderizado do Todoist e produz o `Board` em memória: colunas
//! com grupo numérico, tarefas com cota, nome, estado do checkbox e um
//! handle vivo para marcar depois. Erros de linha são logados e a linha
//! pulada; uma linha malformada nunca aborta a extração inteira.

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::{Element, Page};
use tokio::time::sleep;

use crate::models::{Board, Section, Task, TaskHandle};
use crate::services::progress::ProgressReporter;

const SECTION_SELECTOR: &str = "section.board_section";
const SECTION_HEADER_SELECTOR: &str = "header.board_section__header";
const SECTION_TITLE_SELECTOR: &str = "h3.board_section__title span.simple_content";
const TASK_LIST_SELECTOR: &str = "div.board_section__task_list";
const TASK_SELECTOR: &str = "div.board_task";
const TASK_CONTENT_SELECTOR: &str = "div.task_content";
const TASK_DESCRIPTION_SELECTOR: &str = "div.task_description p";
const TASK_CHECKBOX_SELECTOR: &str = "button.task_checkbox";

/// Extrai o número do grupo do título da seção (dígitos iniciais)
pub(crate) fn parse_group_number(title: &str) -> Option<String> {
    let digits: String = title.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Extrai todas as colunas e tarefas do board
///
/// Deve ser chamada com a aba ativa já no board. Retorna `None` somente se
/// nenhuma seção existir no DOM (falha dura); um board cujas seções todas
/// ficaram vazias é um `Board` vazio válido.
pub async fn extract_board(page: &Page, progress: &dyn ProgressReporter) -> Result<Option<Board>> {
    progress.notify("📊 Extraindo estrutura completa do board...");

    // Aguarda o board terminar de renderizar
    sleep(Duration::from_secs(3)).await;

    progress.notify("🔍 Localizando todas as colunas (seções)...");

    let sections = page.find_elements(SECTION_SELECTOR).await.unwrap_or_default();

    if sections.is_empty() {
        progress.notify("❌ Nenhuma seção encontrada no board");
        return Ok(None);
    }

    progress.notify(&format!("📋 Encontradas {} colunas no board", sections.len()));

    let mut board = Board::default();

    // Processa cada seção (coluna) na ordem do documento
    for (section_index, section) in sections.iter().enumerate() {
        match extract_section(section, progress).await {
            Ok(Some(section_data)) => board.sections.push(section_data),
            Ok(None) => {}
            Err(e) => {
                progress.notify(&format!(
                    "⚠️ Erro ao processar coluna {}: {}",
                    section_index + 1,
                    e
                ));
            }
        }
    }

    progress.notify(&format!(
        "✅ Extração completa: {} colunas, {} tarefas",
        board.sections.len(),
        board.total_tasks()
    ));

    Ok(Some(board))
}

/// Extrai uma coluna; `None` quando ela deve ser omitida do board
async fn extract_section(
    section: &Element,
    progress: &dyn ProgressReporter,
) -> Result<Option<Section>> {
    let header = section.find_element(SECTION_HEADER_SELECTOR).await?;
    let title_element = header.find_element(SECTION_TITLE_SELECTOR).await?;
    let title = title_element
        .inner_text()
        .await?
        .unwrap_or_default()
        .trim()
        .to_string();

    progress.notify(&format!("📂 Coluna: '{}'", title));

    let grupo = match parse_group_number(&title) {
        Some(grupo) => grupo,
        None => {
            progress.notify(&format!(
                "⚠️ Coluna '{}' não contém número de grupo, pulando...",
                title
            ));
            return Ok(None);
        }
    };

    let task_list = section.find_element(TASK_LIST_SELECTOR).await?;
    let rows = task_list.find_elements(TASK_SELECTOR).await.unwrap_or_default();

    progress.notify(&format!("   └─ {} tarefas encontradas", rows.len()));

    let mut tasks = Vec::new();

    for (task_index, row) in rows.into_iter().enumerate() {
        match extract_task(row).await {
            Ok(task) => {
                progress.notify(&format!(
                    "      └─ Tarefa {}: Cota {} - {}",
                    task_index + 1,
                    task.cota,
                    task.nome
                ));
                tasks.push(task);
            }
            Err(e) => {
                progress.notify(&format!(
                    "⚠️ Erro ao processar tarefa {}: {}",
                    task_index + 1,
                    e
                ));
            }
        }
    }

    // Seções sem tarefa alguma ficam de fora do board
    if tasks.is_empty() {
        return Ok(None);
    }

    Ok(Some(Section { grupo, title, tasks }))
}

async fn extract_task(row: Element) -> Result<Task> {
    let task_id = row.attribute("id").await?.unwrap_or_default();

    let cota_element = row.find_element(TASK_CONTENT_SELECTOR).await?;
    let cota = cota_element
        .inner_text()
        .await?
        .unwrap_or_default()
        .trim()
        .to_string();

    // Nome é campo secundário: ausência nunca é erro
    let nome = match row.find_element(TASK_DESCRIPTION_SELECTOR).await {
        Ok(el) => el
            .inner_text()
            .await
            .ok()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Sem nome".to_string()),
        Err(_) => "Sem nome".to_string(),
    };

    let checkbox = row.find_element(TASK_CHECKBOX_SELECTOR).await?;
    let is_completed = checkbox
        .attribute("aria-checked")
        .await?
        .map(|v| v == "true")
        .unwrap_or(false);

    Ok(Task {
        cota,
        nome,
        task_id,
        is_completed,
        handle: TaskHandle::new(checkbox),
    })
}

/// Marca uma tarefa como concluída clicando no checkbox dela
///
/// Usa o handle vivo capturado na extração; só vale na mesma passada.
pub async fn mark_task_completed(handle: &TaskHandle, progress: &dyn ProgressReporter) -> bool {
    progress.notify("✅ Marcando tarefa como concluída...");

    let result = async {
        let checkbox = handle.element();
        checkbox.scroll_into_view().await?;
        sleep(Duration::from_millis(500)).await;
        checkbox.click().await?;
        sleep(Duration::from_secs(1)).await; // animação do checkbox
        Ok::<(), anyhow::Error>(())
    }
    .await;

    match result {
        Ok(()) => {
            progress.notify("✅ Tarefa marcada como concluída no Todoist");
            true
        }
        Err(e) => {
            progress.notify(&format!("❌ Erro ao marcar tarefa: {}", e));
            false
        }
    }
}

/// Varredura da coluna: força todos os checkboxes ainda desmarcados
///
/// Re-localiza a seção pelo título (único por execução) e clica em cada
/// checkbox com `aria-checked="false"`. Idempotente: linhas já marcadas
/// não são tocadas nem contadas. Retorna quantos foram marcados agora.
pub async fn mark_all_section_tasks(
    page: &Page,
    section_title: &str,
    progress: &dyn ProgressReporter,
) -> Result<usize> {
    progress.notify(&format!(
        "🔄 Marcando TODOS os checkboxes da coluna '{}'...",
        section_title
    ));

    // Aguarda a página assentar depois das marcações individuais
    sleep(Duration::from_secs(2)).await;

    let sections = page.find_elements(SECTION_SELECTOR).await.unwrap_or_default();

    let mut target_section = None;
    for section in sections {
        let title = async {
            let header = section.find_element(SECTION_HEADER_SELECTOR).await?;
            let title_element = header.find_element(SECTION_TITLE_SELECTOR).await?;
            Ok::<String, anyhow::Error>(
                title_element
                    .inner_text()
                    .await?
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            )
        }
        .await;

        match title {
            Ok(title) if title == section_title => {
                target_section = Some(section);
                break;
            }
            _ => continue,
        }
    }

    let Some(target_section) = target_section else {
        progress.notify(&format!("⚠️ Seção '{}' não encontrada", section_title));
        return Ok(0);
    };

    let task_list = target_section.find_element(TASK_LIST_SELECTOR).await?;
    let checkboxes = task_list
        .find_elements(TASK_CHECKBOX_SELECTOR)
        .await
        .unwrap_or_default();

    progress.notify(&format!(
        "📋 Encontrados {} checkboxes na coluna",
        checkboxes.len()
    ));

    let total = checkboxes.len();
    let mut marked_count = 0;

    for (index, checkbox) in checkboxes.into_iter().enumerate() {
        let result = async {
            let aria_checked = checkbox.attribute("aria-checked").await?.unwrap_or_default();

            if aria_checked == "false" {
                checkbox.scroll_into_view().await?;
                sleep(Duration::from_millis(300)).await;
                checkbox.click().await?;
                sleep(Duration::from_millis(500)).await; // delay entre cliques
                Ok::<bool, anyhow::Error>(true)
            } else {
                Ok(false)
            }
        }
        .await;

        match result {
            Ok(true) => {
                marked_count += 1;
                progress.notify(&format!("   ✅ Checkbox {}/{} marcado", index + 1, total));
            }
            Ok(false) => {
                progress.notify(&format!(
                    "   ⏭️  Checkbox {}/{} já estava marcado",
                    index + 1,
                    total
                ));
            }
            Err(e) => {
                progress.notify(&format!("   ⚠️ Erro ao marcar checkbox {}: {}", index + 1, e));
            }
        }
    }

    progress.notify(&format!(
        "✅ Total de {} checkboxes marcados na coluna '{}'",
        marked_count, section_title
    ));

    Ok(marked_count)
}

/// Abre o projeto do board a partir da barra lateral do Todoist
pub async fn navigate_to_board_project(
    page: &Page,
    project_name: &str,
    timeout_secs: u64,
    progress: &dyn ProgressReporter,
) -> Result<bool> {
    progress.notify(&format!("🔍 Procurando projeto '{}'...", project_name));

    // Sem seletor estável para o link: procura o span com o nome exato
    let js = format!(
        r#"
        (() => {{
            const spans = document.querySelectorAll('span');
            for (const span of spans) {{
                if ((span.textContent || '').includes({name})) {{
                    span.scrollIntoView({{block: 'center'}});
                    span.click();
                    return true;
                }}
            }}
            return false;
        }})()
        "#,
        name = serde_json::to_string(project_name)?
    );

    let deadline = std::time::Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        let clicked: bool = page.evaluate(js.clone()).await?.into_value()?;
        if clicked {
            progress.notify("📂 Abrindo projeto do board...");
            sleep(Duration::from_secs(4)).await; // carregamento completo
            progress.notify("✅ Board aberto com sucesso");
            return Ok(true);
        }
        if std::time::Instant::now() >= deadline {
            progress.notify("❌ Timeout ao procurar projeto");
            return Ok(false);
        }
        sleep(Duration::from_millis(500)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leading_digit_run_as_group() {
        assert_eq!(parse_group_number("1550 - dia 8"), Some("1550".to_string()));
        assert_eq!(parse_group_number("0042"), Some("0042".to_string()));
    }

    #[test]
    fn title_without_leading_digits_is_dropped() {
        assert_eq!(parse_group_number("Notes"), None);
        assert_eq!(parse_group_number(""), None);
        // Dígitos no meio não contam: a regra é prefixo
        assert_eq!(parse_group_number("grupo 1550"), None);
    }

    #[test]
    fn group_stops_at_first_non_digit() {
        assert_eq!(parse_group_number("1550-extra"), Some("1550".to_string()));
        assert_eq!(parse_group_number("9 de outubro"), Some("9".to_string()));
    }
}
