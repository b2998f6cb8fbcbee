//! Rule, factor and fact mutation forms.
//!
//! Dialog confirmations return a [`DialogResult`]: `Ok` carries the
//! acknowledgment to show after closing, `Err` the text to show inside the
//! still-open dialog.

use reglas_api::{Factor, Hecho, NewFactor, NewHecho, Regla, ReglaPayload};
use tracing::{info, warn};

use crate::backend::RulesBackend;
use crate::banner::{describe_error, Banner};
use crate::operator::{is_range_value, Operador, RangeEncoding};
use crate::reference::{factor_label, hecho_label, ReferenceData};
use crate::rules_view::RuleListView;
use crate::ApiError;

pub type DialogResult = Result<String, String>;

/// A selectable entity in a dialog dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}

fn sort_choices(mut choices: Vec<Choice>) -> Vec<Choice> {
    choices.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
    choices
}

/// Factor choices, alphabetical by name.
pub fn sorted_factor_choices(factores: &[Factor]) -> Vec<Choice> {
    sort_choices(
        factores
            .iter()
            .map(|f| Choice {
                id: f.id,
                label: factor_label(f),
            })
            .collect(),
    )
}

/// Fact choices, alphabetical by description.
pub fn sorted_hecho_choices(hechos: &[Hecho]) -> Vec<Choice> {
    sort_choices(
        hechos
            .iter()
            .map(|h| Choice {
                id: h.id,
                label: hecho_label(h),
            })
            .collect(),
    )
}

/// Step `current` through `choices`; `None` is the unselected position.
fn cycle_choice(choices: &[Choice], current: Option<i64>, forward: bool) -> Option<i64> {
    if choices.is_empty() {
        return None;
    }
    let pos = current.and_then(|id| choices.iter().position(|c| c.id == id));
    let next = match (pos, forward) {
        (None, true) => 0,
        (None, false) => choices.len() - 1,
        (Some(i), true) => (i + 1) % choices.len(),
        (Some(i), false) => (i + choices.len() - 1) % choices.len(),
    };
    Some(choices[next].id)
}

fn choice_label(choices: &[Choice], id: Option<i64>) -> Option<&str> {
    let id = id?;
    choices
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.label.as_str())
}

// ============================================================================
// Create / edit rule dialog
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit(i64),
}

#[derive(Debug, Clone)]
pub struct RuleDialog {
    pub mode: DialogMode,
    factor_choices: Vec<Choice>,
    hecho_choices: Vec<Choice>,
    pub factor_id: Option<i64>,
    pub hecho_id: Option<i64>,
    pub operador: String,
    pub valor: String,
    pub message: Option<Banner>,
}

impl RuleDialog {
    pub fn create(reference: &ReferenceData) -> Self {
        Self {
            mode: DialogMode::Create,
            factor_choices: sorted_factor_choices(&reference.factores),
            hecho_choices: sorted_hecho_choices(&reference.hechos),
            factor_id: None,
            hecho_id: None,
            operador: Operador::Eq.as_str().to_string(),
            valor: String::new(),
            message: None,
        }
    }

    /// Pre-populated with `regla`'s current values.
    pub fn edit(regla: &Regla, reference: &ReferenceData) -> Self {
        Self {
            mode: DialogMode::Edit(regla.id),
            factor_id: Some(regla.factor_id),
            hecho_id: Some(regla.hecho_id),
            operador: regla.operador.clone(),
            valor: regla.valor.clone(),
            ..Self::create(reference)
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            DialogMode::Create => "Nueva regla".to_string(),
            DialogMode::Edit(id) => format!("Editar regla #{id}"),
        }
    }

    pub fn factor_choices(&self) -> &[Choice] {
        &self.factor_choices
    }

    pub fn hecho_choices(&self) -> &[Choice] {
        &self.hecho_choices
    }

    pub fn factor_label(&self) -> Option<&str> {
        choice_label(&self.factor_choices, self.factor_id)
    }

    pub fn hecho_label(&self) -> Option<&str> {
        choice_label(&self.hecho_choices, self.hecho_id)
    }

    pub fn cycle_factor(&mut self, forward: bool) {
        self.factor_id = cycle_choice(&self.factor_choices, self.factor_id, forward);
    }

    pub fn cycle_hecho(&mut self, forward: bool) {
        self.hecho_id = cycle_choice(&self.hecho_choices, self.hecho_id, forward);
    }

    /// Build the request body, or the warning to show.
    pub fn validate(&self) -> Result<ReglaPayload, Banner> {
        let operador = self.operador.trim();
        let valor = self.valor.trim();
        match (self.factor_id, self.hecho_id) {
            (Some(factor_id), Some(hecho_id))
                if factor_id != 0 && hecho_id != 0 && !operador.is_empty() && !valor.is_empty() =>
            {
                Ok(ReglaPayload {
                    factor_id,
                    hecho_id,
                    operador: operador.to_string(),
                    valor: valor.to_string(),
                })
            }
            _ => Err(Banner::warning("Completa todos los campos.")),
        }
    }

    /// Send the rule and, on success, reload `list`.
    pub async fn confirm<B: RulesBackend + ?Sized>(
        &mut self,
        backend: &B,
        list: &mut RuleListView,
    ) -> DialogResult {
        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(banner) => {
                let text = banner.message.clone();
                self.message = Some(banner);
                return Err(text);
            }
        };

        let result = match self.mode {
            DialogMode::Create => backend.create_regla(&payload).await,
            DialogMode::Edit(id) => backend.update_regla(id, &payload).await,
        };

        match result {
            Ok(regla) => {
                info!(id = regla.id, mode = ?self.mode, "rule saved");
                self.message = None;
                list.load(backend).await;
                Ok(match self.mode {
                    DialogMode::Create => format!("Regla creada (ID: {}).", regla.id),
                    DialogMode::Edit(_) => "Regla actualizada.".to_string(),
                })
            }
            Err(err) => {
                warn!(error = %err, "saving rule failed");
                let text = format!("No se pudo guardar la regla. {}", describe_error(&err));
                self.message = Some(Banner::danger(text.clone()));
                Err(text)
            }
        }
    }
}

// ============================================================================
// Delete confirmation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDialog {
    pub regla_id: i64,
    /// `#id factor → hecho`
    pub label: String,
    /// Server error from the last attempt.
    pub error: Option<String>,
}

impl DeleteDialog {
    pub fn new(regla: &Regla) -> Self {
        let factor = regla.factor.as_deref().unwrap_or("N/A");
        let hecho = regla.hecho.as_deref().unwrap_or("N/A");
        Self {
            regla_id: regla.id,
            label: format!("#{} {factor} → {hecho}", regla.id),
            error: None,
        }
    }

    pub fn prompt(&self) -> String {
        format!("¿Eliminar la regla {}?", self.label)
    }

    /// Delete the rule. On success it is dropped from `list` without a refetch.
    pub async fn confirm<B: RulesBackend + ?Sized>(
        &mut self,
        backend: &B,
        list: &mut RuleListView,
    ) -> DialogResult {
        match backend.delete_regla(self.regla_id).await {
            Ok(()) => {
                info!(id = self.regla_id, "rule deleted");
                list.remove(self.regla_id);
                self.error = None;
                Ok(format!("Regla #{} eliminada.", self.regla_id))
            }
            Err(err) => {
                warn!(id = self.regla_id, error = %err, "delete failed");
                let text = describe_error(&err);
                self.error = Some(text.clone());
                Err(text)
            }
        }
    }
}

// ============================================================================
// Static create-rule form
// ============================================================================

/// The inline create form with range validation.
#[derive(Debug, Clone)]
pub struct QuickRuleForm {
    pub factor_id: Option<i64>,
    pub hecho_id: Option<i64>,
    pub operador: Operador,
    pub valor: String,
    pub message: Option<Banner>,
    range_encoding: RangeEncoding,
}

impl QuickRuleForm {
    pub fn new(range_encoding: RangeEncoding) -> Self {
        Self {
            factor_id: None,
            hecho_id: None,
            operador: Operador::Eq,
            valor: String::new(),
            message: None,
            range_encoding,
        }
    }

    pub fn validate(&self) -> Result<ReglaPayload, Banner> {
        let valor = self.valor.trim();
        let (Some(factor_id), Some(hecho_id)) = (self.factor_id, self.hecho_id) else {
            return Err(Banner::warning("Completa Factor, Hecho y Valor."));
        };
        if valor.is_empty() {
            return Err(Banner::warning("Completa Factor, Hecho y Valor."));
        }
        if self.operador == Operador::Range && !is_range_value(valor) {
            return Err(Banner::warning("Formato de rango inválido. Ej: 1000-2000"));
        }

        Ok(ReglaPayload {
            factor_id,
            hecho_id,
            operador: self.operador.wire(self.range_encoding).to_string(),
            valor: valor.to_string(),
        })
    }

    /// Create the rule. Returns it on success; the outcome banner is in
    /// `message` either way.
    pub async fn submit<B: RulesBackend + ?Sized>(&mut self, backend: &B) -> Option<Regla> {
        self.message = None;
        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(banner) => {
                self.message = Some(banner);
                return None;
            }
        };

        match backend.create_regla(&payload).await {
            Ok(created) => {
                info!(id = created.id, "rule created");
                self.message = Some(Banner::success(format!(
                    "Regla creada (ID: {}).",
                    created.id
                )));
                self.valor.clear();
                self.operador = Operador::Eq;
                Some(created)
            }
            Err(err) => {
                warn!(error = %err, "creating rule failed");
                let text = err
                    .body()
                    .filter(|b| !b.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        if matches!(err, ApiError::Api { .. }) {
                            "Error creando regla".to_string()
                        } else {
                            describe_error(&err)
                        }
                    });
                self.message = Some(Banner::danger(format!("No se pudo crear la regla. {text}")));
                None
            }
        }
    }
}

// ============================================================================
// New factor / new fact dialogs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactorDialog {
    pub nombre: String,
    pub categoria: String,
    pub message: Option<Banner>,
}

impl FactorDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<NewFactor, Banner> {
        let nombre = self.nombre.trim();
        let categoria = self.categoria.trim();
        if nombre.is_empty() || categoria.is_empty() {
            return Err(Banner::warning("Nombre y categoría son requeridos."));
        }
        Ok(NewFactor {
            nombre: nombre.to_string(),
            categoria: categoria.to_string(),
        })
    }

    /// Create the factor. `Err` keeps the dialog open with `message` set.
    pub async fn confirm<B: RulesBackend + ?Sized>(&mut self, backend: &B) -> Result<Factor, String> {
        let factor = match self.validate() {
            Ok(factor) => factor,
            Err(banner) => {
                let text = banner.message.clone();
                self.message = Some(banner);
                return Err(text);
            }
        };

        match backend.create_factor(&factor).await {
            Ok(created) => {
                info!(id = created.id, "factor created");
                self.message = None;
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "creating factor failed");
                let banner = Banner::danger("No se pudo crear factor.");
                let text = banner.message.clone();
                self.message = Some(banner);
                Err(text)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HechoDialog {
    pub descripcion: String,
    pub message: Option<Banner>,
}

impl HechoDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<NewHecho, Banner> {
        let descripcion = self.descripcion.trim();
        if descripcion.is_empty() {
            return Err(Banner::warning("Descripción requerida."));
        }
        Ok(NewHecho {
            descripcion: descripcion.to_string(),
        })
    }

    pub async fn confirm<B: RulesBackend + ?Sized>(&mut self, backend: &B) -> Result<Hecho, String> {
        let hecho = match self.validate() {
            Ok(hecho) => hecho,
            Err(banner) => {
                let text = banner.message.clone();
                self.message = Some(banner);
                return Err(text);
            }
        };

        match backend.create_hecho(&hecho).await {
            Ok(created) => {
                info!(id = created.id, "fact created");
                self.message = None;
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "creating fact failed");
                let banner = Banner::danger("No se pudo crear hecho.");
                let text = banner.message.clone();
                self.message = Some(banner);
                Err(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData {
            factores: vec![
                Factor {
                    id: 1,
                    nombre: "suelo".into(),
                    categoria: "terreno".into(),
                },
                Factor {
                    id: 2,
                    nombre: "Altitud".into(),
                    categoria: "terreno".into(),
                },
                Factor {
                    id: 3,
                    nombre: "Clima".into(),
                    categoria: "ambiente".into(),
                },
            ],
            hechos: vec![Hecho {
                id: 9,
                descripcion: "Cultivo de papa".into(),
            }],
        }
    }

    #[test]
    fn test_choices_sorted_alphabetically() {
        let dialog = RuleDialog::create(&reference());
        let labels: Vec<&str> = dialog
            .factor_choices()
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, ["Altitud", "Clima", "suelo"]);
        assert_eq!(dialog.operador, "=");
    }

    #[test]
    fn test_cycle_choices() {
        let mut dialog = RuleDialog::create(&reference());
        dialog.cycle_factor(true);
        assert_eq!(dialog.factor_id, Some(2));
        dialog.cycle_factor(false);
        assert_eq!(dialog.factor_id, Some(1));
        dialog.cycle_factor(true);
        assert_eq!(dialog.factor_id, Some(2));
        assert_eq!(dialog.factor_label(), Some("Altitud"));
    }

    #[test]
    fn test_rule_dialog_requires_all_fields() {
        let mut dialog = RuleDialog::create(&reference());
        assert!(dialog.validate().is_err());
        dialog.factor_id = Some(1);
        dialog.hecho_id = Some(9);
        dialog.valor = "  ".into();
        assert!(dialog.validate().is_err());
        dialog.valor = "arcilloso".into();
        dialog.operador = String::new();
        assert!(dialog.validate().is_err());
        dialog.operador = "=".into();
        assert_eq!(dialog.validate().unwrap().valor, "arcilloso");
    }

    #[test]
    fn test_edit_prepopulates() {
        let regla = Regla {
            id: 4,
            factor_id: 3,
            hecho_id: 9,
            operador: ">=".into(),
            valor: "2500".into(),
            factor: None,
            hecho: None,
        };
        let dialog = RuleDialog::edit(&regla, &reference());
        assert_eq!(dialog.mode, DialogMode::Edit(4));
        assert_eq!(dialog.factor_label(), Some("Clima"));
        assert_eq!(dialog.hecho_label(), Some("Cultivo de papa"));
        assert_eq!(dialog.operador, ">=");
        assert_eq!(dialog.title(), "Editar regla #4");
    }

    #[test]
    fn test_quick_form_range_validation() {
        let mut form = QuickRuleForm::new(RangeEncoding::Equals);
        form.factor_id = Some(2);
        form.hecho_id = Some(9);
        form.operador = Operador::Range;
        form.valor = "abc".into();
        assert_eq!(
            form.validate().unwrap_err(),
            Banner::warning("Formato de rango inválido. Ej: 1000-2000")
        );

        form.valor = " 1000-2000 ".into();
        let payload = form.validate().unwrap();
        assert_eq!(payload.operador, "=");
        assert_eq!(payload.valor, "1000-2000");
    }

    #[test]
    fn test_quick_form_preserve_encoding() {
        let mut form = QuickRuleForm::new(RangeEncoding::Preserve);
        form.factor_id = Some(2);
        form.hecho_id = Some(9);
        form.operador = Operador::Range;
        form.valor = "1000-2000".into();
        assert_eq!(form.validate().unwrap().operador, "range");
    }

    #[test]
    fn test_factor_dialog_validation() {
        let mut dialog = FactorDialog::new();
        dialog.nombre = "Suelo".into();
        assert_eq!(
            dialog.validate().unwrap_err(),
            Banner::warning("Nombre y categoría son requeridos.")
        );
        dialog.categoria = " terreno ".into();
        assert_eq!(dialog.validate().unwrap().categoria, "terreno");
    }

    #[test]
    fn test_delete_dialog_label() {
        let regla = Regla {
            id: 5,
            factor_id: 1,
            hecho_id: 2,
            operador: "=".into(),
            valor: "x".into(),
            factor: Some("Edad".into()),
            hecho: None,
        };
        let dialog = DeleteDialog::new(&regla);
        assert_eq!(dialog.label, "#5 Edad → N/A");
        assert_eq!(dialog.prompt(), "¿Eliminar la regla #5 Edad → N/A?");
    }
}
