//! Factor and fact lookup lists for selection controls.

use reglas_api::{Factor, Hecho};
use tracing::warn;

use crate::backend::RulesBackend;
use crate::banner::Banner;
use crate::ApiError;

pub const FACTOR_PLACEHOLDER: &str = "-- Seleccione factor --";
pub const HECHO_PLACEHOLDER: &str = "-- Seleccione hecho --";

/// Fact labels longer than this many characters are truncated.
pub const LABEL_MAX_CHARS: usize = 40;
pub const ELLIPSIS: char = '…';

const LOAD_FAILED: &str = "No fue posible cargar factores/hechos. Verifica la API.";

/// One entry of a selection control. `value` is `None` for the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SelectOption {
    pub value: Option<i64>,
    pub label: String,
}

impl SelectOption {
    fn placeholder(label: &str) -> Self {
        Self {
            value: None,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub factores: Vec<Factor>,
    pub hechos: Vec<Hecho>,
}

impl ReferenceData {
    pub fn factor(&self, id: i64) -> Option<&Factor> {
        self.factores.iter().find(|f| f.id == id)
    }
}

/// Fetch factors and facts concurrently. Fails if either fetch fails.
pub async fn load_reference_data<B>(backend: &B) -> Result<ReferenceData, ApiError>
where
    B: RulesBackend + ?Sized,
{
    let (factores, hechos) = tokio::try_join!(backend.list_factores(), backend.list_hechos())?;
    Ok(ReferenceData { factores, hechos })
}

/// Cut `text` to `max` characters followed by [`ELLIPSIS`] when longer.
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max).collect();
        cut.push(ELLIPSIS);
        cut
    } else {
        text.to_string()
    }
}

pub fn factor_label(factor: &Factor) -> String {
    if factor.nombre.is_empty() {
        format!("Factor #{}", factor.id)
    } else {
        factor.nombre.clone()
    }
}

pub fn hecho_label(hecho: &Hecho) -> String {
    if hecho.descripcion.is_empty() {
        format!("Hecho #{}", hecho.id)
    } else {
        truncate_label(&hecho.descripcion, LABEL_MAX_CHARS)
    }
}

pub fn factor_options(factores: &[Factor]) -> Vec<SelectOption> {
    std::iter::once(SelectOption::placeholder(FACTOR_PLACEHOLDER))
        .chain(factores.iter().map(|f| SelectOption {
            value: Some(f.id),
            label: factor_label(f),
        }))
        .collect()
}

pub fn hecho_options(hechos: &[Hecho]) -> Vec<SelectOption> {
    std::iter::once(SelectOption::placeholder(HECHO_PLACEHOLDER))
        .chain(hechos.iter().map(|h| SelectOption {
            value: Some(h.id),
            label: hecho_label(h),
        }))
        .collect()
}

/// Owns the lookup lists of one screen.
#[derive(Debug, Clone)]
pub struct ReferenceLoader {
    data: ReferenceData,
    factor_options: Vec<SelectOption>,
    hecho_options: Vec<SelectOption>,
    pub banner: Option<Banner>,
}

impl Default for ReferenceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceLoader {
    /// Placeholders only, nothing loaded.
    pub fn new() -> Self {
        Self {
            data: ReferenceData::default(),
            factor_options: factor_options(&[]),
            hecho_options: hecho_options(&[]),
            banner: None,
        }
    }

    /// Fetch and repopulate. Returns false (with an error banner) on failure.
    pub async fn load<B: RulesBackend + ?Sized>(&mut self, backend: &B) -> bool {
        let result = load_reference_data(backend).await;
        self.apply(result)
    }

    pub fn apply(&mut self, result: Result<ReferenceData, ApiError>) -> bool {
        match result {
            Ok(data) => {
                self.factor_options = factor_options(&data.factores);
                self.hecho_options = hecho_options(&data.hechos);
                self.data = data;
                self.banner = None;
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to load factors/facts");
                *self = Self::new();
                self.banner = Some(Banner::danger(LOAD_FAILED));
                false
            }
        }
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn factor_options(&self) -> &[SelectOption] {
        &self.factor_options
    }

    pub fn hecho_options(&self) -> &[SelectOption] {
        &self.hecho_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(id: i64, nombre: &str) -> Factor {
        Factor {
            id,
            nombre: nombre.to_string(),
            categoria: "general".to_string(),
        }
    }

    fn hecho(id: i64, descripcion: &str) -> Hecho {
        Hecho {
            id,
            descripcion: descripcion.to_string(),
        }
    }

    #[test]
    fn test_factor_options_with_fallback() {
        let options = factor_options(&[factor(1, "Edad"), factor(7, "")]);
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].value, None);
        assert_eq!(options[0].label, FACTOR_PLACEHOLDER);
        assert_eq!(options[1].label, "Edad");
        assert_eq!(options[2].value, Some(7));
        assert_eq!(options[2].label, "Factor #7");
    }

    #[test]
    fn test_long_description_truncated() {
        let long = "a".repeat(41);
        let label = hecho_label(&hecho(2, &long));
        assert_eq!(label, format!("{}…", "a".repeat(40)));

        let exact = "b".repeat(40);
        assert_eq!(hecho_label(&hecho(3, &exact)), exact);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let accented = "é".repeat(45);
        let label = truncate_label(&accented, LABEL_MAX_CHARS);
        assert_eq!(label.chars().count(), 41);
        assert!(label.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_empty_description_fallback() {
        let options = hecho_options(&[hecho(9, "")]);
        assert_eq!(options[1].label, "Hecho #9");
    }

    #[test]
    fn test_each_id_appears_once() {
        let hechos: Vec<Hecho> = (1..=5).map(|i| hecho(i, &format!("Hecho {i}"))).collect();
        let options = hecho_options(&hechos);
        for h in &hechos {
            let count = options.iter().filter(|o| o.value == Some(h.id)).count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_failed_load_keeps_placeholders() {
        let mut loader = ReferenceLoader::new();
        assert!(!loader.apply(Err(ApiError::Network("down".into()))));
        assert_eq!(loader.factor_options().len(), 1);
        assert_eq!(loader.hecho_options().len(), 1);
        assert_eq!(loader.banner, Some(Banner::danger(LOAD_FAILED)));
    }
}
