//! Normalização de número de cota
//!
//! O portal preenche cotas com zeros à esquerda até 4 dígitos. A mesma
//! regra é usada na extração do board e na seleção da cota, então vive
//! aqui como função pura única.

/// Normaliza a cota para comparação com a tabela do portal
///
/// "303" vira "0303"; valores com 4+ caracteres ficam como estão.
/// Idempotente.
pub fn normalize_cota(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() >= 4 {
        trimmed.to_string()
    } else {
        format!("{:0>4}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_cota_to_four_digits() {
        assert_eq!(normalize_cota("303"), "0303");
        assert_eq!(normalize_cota("7"), "0007");
    }

    #[test]
    fn is_idempotent() {
        assert_eq!(normalize_cota(&normalize_cota("303")), "0303");
        assert_eq!(normalize_cota("0303"), "0303");
    }

    #[test]
    fn leaves_long_ids_unchanged() {
        assert_eq!(normalize_cota("12345"), "12345");
        assert_eq!(normalize_cota("1123"), "1123");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(normalize_cota(" 303 "), "0303");
    }
}
