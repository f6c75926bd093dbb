//! Procurement modalities (modalidades de contratação)

use serde::{Deserialize, Serialize};

/// Legal category of a procurement process, keyed by the PNCP numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Modality {
    LeilaoEletronico,
    DialogoCompetitivo,
    Concurso,
    ConcorrenciaEletronica,
    ConcorrenciaPresencial,
    PregaoEletronico,
    PregaoPresencial,
    DispensaDeLicitacao,
    Inexigibilidade,
    ManifestacaoDeInteresse,
    PreQualificacao,
    Credenciamento,
    LeilaoPresencial,
}

impl Modality {
    /// Every modality in code order
    pub const ALL: [Modality; 13] = [
        Self::LeilaoEletronico,
        Self::DialogoCompetitivo,
        Self::Concurso,
        Self::ConcorrenciaEletronica,
        Self::ConcorrenciaPresencial,
        Self::PregaoEletronico,
        Self::PregaoPresencial,
        Self::DispensaDeLicitacao,
        Self::Inexigibilidade,
        Self::ManifestacaoDeInteresse,
        Self::PreQualificacao,
        Self::Credenciamento,
        Self::LeilaoPresencial,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=13 => Some(Self::ALL[(code - 1) as usize]),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::LeilaoEletronico => 1,
            Self::DialogoCompetitivo => 2,
            Self::Concurso => 3,
            Self::ConcorrenciaEletronica => 4,
            Self::ConcorrenciaPresencial => 5,
            Self::PregaoEletronico => 6,
            Self::PregaoPresencial => 7,
            Self::DispensaDeLicitacao => 8,
            Self::Inexigibilidade => 9,
            Self::ManifestacaoDeInteresse => 10,
            Self::PreQualificacao => 11,
            Self::Credenciamento => 12,
            Self::LeilaoPresencial => 13,
        }
    }

    /// Label as published by PNCP
    pub fn label(self) -> &'static str {
        match self {
            Self::LeilaoEletronico => "Leilão - Eletrônico",
            Self::DialogoCompetitivo => "Diálogo Competitivo",
            Self::Concurso => "Concurso",
            Self::ConcorrenciaEletronica => "Concorrência - Eletrônica",
            Self::ConcorrenciaPresencial => "Concorrência - Presencial",
            Self::PregaoEletronico => "Pregão - Eletrônico",
            Self::PregaoPresencial => "Pregão - Presencial",
            Self::DispensaDeLicitacao => "Dispensa de Licitação",
            Self::Inexigibilidade => "Inexigibilidade",
            Self::ManifestacaoDeInteresse => "Manifestação de Interesse",
            Self::PreQualificacao => "Pré-qualificação",
            Self::Credenciamento => "Credenciamento",
            Self::LeilaoPresencial => "Leilão - Presencial",
        }
    }

    /// Family name without the electronic/in-person qualifier
    pub fn family(self) -> &'static str {
        label_family(self.label())
    }

    /// Label for a stored code that may not map to a known modality
    pub fn label_for_code(code: Option<i64>) -> &'static str {
        code.and_then(|c| u8::try_from(c).ok())
            .and_then(Self::from_code)
            .map(Self::label)
            .unwrap_or("Desconhecida")
    }
}

/// `"Pregão - Eletrônico"` -> `"Pregão"`
pub fn label_family(label: &str) -> &str {
    label.split(" - ").next().unwrap_or(label)
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<u8> for Modality {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown modality code {}", code))
    }
}

impl From<Modality> for u8 {
    fn from(m: Modality) -> Self {
        m.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_in_order() {
        for (i, m) in Modality::ALL.iter().enumerate() {
            assert_eq!(m.code() as usize, i + 1);
            assert_eq!(Modality::from_code(m.code()), Some(*m));
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(Modality::from_code(0), None);
        assert_eq!(Modality::from_code(14), None);
        assert_eq!(Modality::label_for_code(Some(99)), "Desconhecida");
        assert_eq!(Modality::label_for_code(None), "Desconhecida");
        assert_eq!(Modality::label_for_code(Some(6)), "Pregão - Eletrônico");
    }

    #[test]
    fn test_family() {
        assert_eq!(Modality::PregaoEletronico.family(), "Pregão");
        assert_eq!(Modality::Inexigibilidade.family(), "Inexigibilidade");
        assert_eq!(label_family("Concorrência - Presencial"), "Concorrência");
    }
}
