//! Esperas com timeout limitado
//!
//! Todas as esperas do sistema são polls bloqueantes com limite: elemento
//! aparecer, URL mudar, tabela renderizar. Nada de timers em background.

use std::time::{Duration, Instant};

use anyhow::Result;
use chromiumoxide::{Element, Page};
use tokio::time::sleep;

use crate::error::AppError;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Aguarda um elemento aparecer na página
pub async fn wait_for_element(page: &Page, selector: &str, timeout_secs: u64) -> Result<Element> {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(AppError::timeout(format!("elemento '{}'", selector), timeout_secs).into());
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Aguarda ao menos um elemento do seletor existir e retorna todos
pub async fn wait_for_elements(
    page: &Page,
    selector: &str,
    timeout_secs: u64,
) -> Result<Vec<Element>> {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        if let Ok(elements) = page.find_elements(selector).await {
            if !elements.is_empty() {
                return Ok(elements);
            }
        }
        if Instant::now() >= deadline {
            return Err(AppError::timeout(format!("elementos '{}'", selector), timeout_secs).into());
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Aguarda a URL da página conter o fragmento dado
pub async fn wait_for_url_contains(page: &Page, part: &str, timeout_secs: u64) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        let url = page.url().await?.unwrap_or_default();
        if url.contains(part) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(AppError::timeout(format!("URL contendo '{}'", part), timeout_secs).into());
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Digitação simulada, caractere a caractere
///
/// O portal rejeita colagem instantânea; o delay fixo entre teclas imita
/// digitação humana.
pub async fn type_slow(element: &Element, text: &str, delay_ms: u64) -> Result<()> {
    for ch in text.chars() {
        element.type_str(ch.to_string()).await?;
        sleep(Duration::from_millis(delay_ms)).await;
    }
    Ok(())
}

/// Limpa o valor de um campo de entrada identificado por id
pub async fn clear_input(page: &Page, input_id: &str) -> Result<()> {
    page.evaluate(format!(
        "(() => {{ const el = document.getElementById('{}'); if (el) el.value = ''; }})()",
        input_id
    ))
    .await?;
    Ok(())
}

/// Lê o valor atual de um campo de entrada identificado por id
pub async fn read_input_value(page: &Page, input_id: &str) -> Result<String> {
    let value: String = page
        .evaluate(format!(
            "(() => {{ const el = document.getElementById('{}'); return el ? el.value : ''; }})()",
            input_id
        ))
        .await?
        .into_value()?;
    Ok(value)
}
