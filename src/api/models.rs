//! PNCP wire types
//!
//! The consultation API is loose about response shape: some endpoints return
//! a bare array, others wrap it in `data`/`content`/`items`. Every field is
//! optional here and the raw JSON is kept alongside the typed view. Fields
//! are decoded one by one: a value of the wrong type becomes `None` without
//! taking the rest of the record with it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::modality::Modality;

/// Contracting agency (órgão/entidade)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Agency {
    #[serde(deserialize_with = "lenient::string")]
    pub cnpj: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub razao_social: Option<String>,
}

/// Agency unit; carries the municipality code on newer payloads
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgencyUnit {
    pub codigo_ibge: Option<Value>,
    #[serde(deserialize_with = "lenient::string")]
    pub municipio_nome: Option<String>,
}

/// One procurement as published by `/contratacoes/publicacao`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProcurement {
    #[serde(deserialize_with = "lenient::string")]
    pub numero_compra: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pub ano_compra: Option<i32>,
    #[serde(deserialize_with = "lenient::integer")]
    pub sequencial_compra: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub objeto_compra: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    pub valor_total_estimado: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub valor_total_homologado: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub data_publicacao_pncp: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub situacao_compra_nome: Option<String>,
    pub situacao_compra: Option<Value>,
    pub codigo_municipio_ibge: Option<Value>,
    #[serde(deserialize_with = "lenient::nested")]
    pub orgao_entidade: Option<Agency>,
    #[serde(deserialize_with = "lenient::nested")]
    pub unidade_orgao: Option<AgencyUnit>,
}

impl RawProcurement {
    pub fn agency_cnpj(&self) -> Option<&str> {
        self.orgao_entidade
            .as_ref()
            .and_then(|a| a.cnpj.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn agency_name(&self) -> Option<&str> {
        self.orgao_entidade.as_ref().and_then(|a| a.razao_social.as_deref())
    }

    /// Status label, preferring the descriptive name over the raw id
    pub fn status(&self) -> Option<String> {
        if let Some(name) = self.situacao_compra_nome.as_ref().filter(|s| !s.is_empty()) {
            return Some(name.clone());
        }
        self.situacao_compra.as_ref().and_then(scalar_to_string)
    }

    pub fn ibge_code(&self) -> Option<String> {
        self.codigo_municipio_ibge
            .as_ref()
            .and_then(scalar_to_string)
            .or_else(|| {
                self.unidade_orgao
                    .as_ref()
                    .and_then(|u| u.codigo_ibge.as_ref())
                    .and_then(scalar_to_string)
            })
    }
}

/// A record fetched under a specific modality query
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedProcurement {
    pub record: RawProcurement,
    pub modality: Modality,
    /// Untouched payload, persisted for later inspection
    pub raw: Value,
}

impl FetchedProcurement {
    /// Build from one element of a response page. Fields that fail to
    /// deserialize are left empty; a non-object element yields an empty record.
    pub fn from_value(raw: Value, modality: Modality) -> Self {
        let record = match serde_json::from_value::<RawProcurement>(raw.clone()) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Lenient decode of procurement failed: {}", e);
                RawProcurement::default()
            }
        };
        Self { record, modality, raw }
    }

    /// Portal page for this record, when it carries a full key
    pub fn portal_link(&self, portal_base: &str) -> Option<String> {
        portal_link(
            portal_base,
            self.record.agency_cnpj(),
            self.record.ano_compra,
            self.record.sequencial_compra,
        )
    }
}

/// Pagination block of a response page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub number: Option<u32>,
    pub total_pages: Option<u32>,
    pub remaining: Option<u32>,
}

impl PageInfo {
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };
        Self {
            number: field("numeroPagina"),
            total_pages: field("totalPaginas"),
            remaining: field("paginasRestantes"),
        }
    }

    /// Whether a page after `current` exists
    pub fn has_more(&self, current: u32) -> bool {
        if let Some(remaining) = self.remaining {
            return remaining > 0;
        }
        match self.total_pages {
            Some(total) => current < total,
            None => false,
        }
    }
}

/// Pull the record array out of a response body
pub fn extract_records(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            for key in ["data", "content", "items"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.clone();
                }
            }
            map.values()
                .find_map(|v| match v {
                    Value::Array(items) if !items.is_empty() => Some(items.clone()),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// `https://pncp.gov.br/app/editais/{cnpj}/{ano}/{sequencial}`
pub fn portal_link(
    portal_base: &str,
    cnpj: Option<&str>,
    year: Option<i32>,
    sequential: Option<i64>,
) -> Option<String> {
    match (cnpj, year, sequential) {
        (Some(cnpj), Some(year), Some(seq)) if !cnpj.is_empty() => Some(format!(
            "{}/{}/{}/{}",
            portal_base.trim_end_matches('/'),
            cnpj,
            year,
            seq
        )),
        _ => None,
    }
}

/// Per-field decoders that map unexpected shapes to `None`
mod lenient {
    use super::*;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_to_string(&Value::deserialize(d)?))
    }

    /// Integer from a number or a numeric string
    pub fn integer<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        let n = match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        Ok(n.and_then(|n| T::try_from(n).ok()))
    }

    /// Float from a number or a numeric string (decimal comma accepted)
    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        })
    }

    pub fn nested<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(d)? {
            value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
            _ => Ok(None),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PORTAL: &str = "https://pncp.gov.br/app/editais";

    fn sample() -> Value {
        json!({
            "numeroCompra": "00017/2025",
            "anoCompra": 2025,
            "sequencialCompra": 17,
            "objetoCompra": "Aquisição de Artefatos de Cimento",
            "valorTotalEstimado": 7631669.79,
            "dataPublicacaoPncp": "2025-05-12T08:16:48",
            "situacaoCompraId": 1,
            "situacaoCompraNome": "Divulgada no PNCP",
            "orgaoEntidade": { "cnpj": "29138448000198", "razaoSocial": "MUNICIPIO DE SANTO ANTONIO DE PADUA" },
            "unidadeOrgao": { "codigoIbge": "3304706", "municipioNome": "Santo Antônio de Pádua" }
        })
    }

    #[test]
    fn test_extract_bare_array() {
        let body = json!([sample(), sample()]);
        assert_eq!(extract_records(&body).len(), 2);
    }

    #[test]
    fn test_extract_wrapped_keys() {
        for key in ["data", "content", "items"] {
            let body = json!({ key: [sample()], "totalRegistros": 1 });
            assert_eq!(extract_records(&body).len(), 1, "key {}", key);
        }
    }

    #[test]
    fn test_extract_fallback_first_non_empty_array() {
        let body = json!({ "empty": [], "resultado": [sample()] });
        assert_eq!(extract_records(&body).len(), 1);
        assert!(extract_records(&json!({ "x": 1 })).is_empty());
        assert!(extract_records(&json!("nada")).is_empty());
    }

    #[test]
    fn test_decode_sample() {
        let fetched = FetchedProcurement::from_value(sample(), Modality::PregaoEletronico);
        assert_eq!(fetched.record.numero_compra.as_deref(), Some("00017/2025"));
        assert_eq!(fetched.record.agency_cnpj(), Some("29138448000198"));
        assert_eq!(fetched.record.status().as_deref(), Some("Divulgada no PNCP"));
        assert_eq!(fetched.record.ibge_code().as_deref(), Some("3304706"));
        assert_eq!(
            fetched.portal_link(PORTAL).as_deref(),
            Some("https://pncp.gov.br/app/editais/29138448000198/2025/17")
        );
    }

    #[test]
    fn test_decode_tolerates_wrong_types() {
        let fetched = FetchedProcurement::from_value(json!({ "anoCompra": "dois mil" }), Modality::Concurso);
        assert_eq!(fetched.record, RawProcurement::default());
        assert_eq!(fetched.portal_link(PORTAL), None);

        let fetched = FetchedProcurement::from_value(json!("nada"), Modality::Concurso);
        assert_eq!(fetched.record, RawProcurement::default());
    }

    #[test]
    fn test_one_bad_field_keeps_the_key() {
        let fetched = FetchedProcurement::from_value(
            json!({
                "numeroCompra": 17,
                "anoCompra": "2025",
                "sequencialCompra": 17,
                "objetoCompra": ["lista"],
                "valorTotalEstimado": "1234,50",
                "orgaoEntidade": { "cnpj": "29138448000198", "razaoSocial": false },
                "unidadeOrgao": "3304706"
            }),
            Modality::Concurso,
        );
        let record = &fetched.record;
        assert_eq!(record.numero_compra.as_deref(), Some("17"));
        assert_eq!(record.ano_compra, Some(2025));
        assert_eq!(record.sequencial_compra, Some(17));
        assert_eq!(record.objeto_compra, None);
        assert_eq!(record.valor_total_estimado, Some(1234.5));
        assert_eq!(record.agency_cnpj(), Some("29138448000198"));
        assert_eq!(record.agency_name(), None);
        assert_eq!(record.unidade_orgao, None);
        assert_eq!(
            fetched.portal_link(PORTAL).as_deref(),
            Some("https://pncp.gov.br/app/editais/29138448000198/2025/17")
        );
    }

    #[test]
    fn test_portal_link_requires_full_key() {
        assert_eq!(portal_link(PORTAL, Some(""), Some(2025), Some(1)), None);
        assert_eq!(portal_link(PORTAL, Some("1"), None, Some(1)), None);
        assert_eq!(
            portal_link("https://x/", Some("1"), Some(2024), Some(3)).as_deref(),
            Some("https://x/1/2024/3")
        );
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::from_value(&json!({ "numeroPagina": 1, "totalPaginas": 3, "paginasRestantes": 2 }));
        assert!(info.has_more(1));
        let last = PageInfo::from_value(&json!({ "numeroPagina": 3, "totalPaginas": 3, "paginasRestantes": 0 }));
        assert!(!last.has_more(3));
        let no_remaining = PageInfo::from_value(&json!({ "totalPaginas": 2 }));
        assert!(no_remaining.has_more(1));
        assert!(!PageInfo::default().has_more(1));
    }
}
