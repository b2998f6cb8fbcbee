//! Rule list: cache, client-side join and free-text filtering.
//!
//! The cache is a read-through copy of `GET /reglas/`. It is rebuilt by
//! [`RuleListView::load`] and only edited in place by
//! [`RuleListView::remove`] after a confirmed delete.

use std::collections::HashMap;

use reglas_api::{Factor, Hecho, Regla};
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::RulesBackend;
use crate::reference::ReferenceData;
use crate::ApiError;

/// Shown for names that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

pub const LOAD_FAILED: &str = "No se pudieron cargar las reglas. Verifica la API.";

/// Which list flavour a screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListVariant {
    /// Rules only; names as supplied by the server. Read-only.
    Plain,
    /// Rules joined with factor/fact names; rows carry edit/delete actions.
    Joined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Loading,
    Ready,
    /// Loaded, zero rules.
    Empty,
    Failed(String),
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRow {
    pub id: i64,
    pub factor: String,
    pub factor_id: i64,
    pub operador: String,
    pub valor: String,
    pub hecho: String,
    pub hecho_id: i64,
    /// Whether edit/delete controls are shown.
    pub actions: bool,
}

impl RuleRow {
    fn from_regla(regla: &Regla, actions: bool) -> Self {
        Self {
            id: regla.id,
            factor: regla.factor.clone().unwrap_or_else(|| NOT_AVAILABLE.into()),
            factor_id: regla.factor_id,
            operador: regla.operador.clone(),
            valor: regla.valor.clone(),
            hecho: regla.hecho.clone().unwrap_or_else(|| NOT_AVAILABLE.into()),
            hecho_id: regla.hecho_id,
            actions,
        }
    }
}

pub fn factor_names(factores: &[Factor]) -> HashMap<i64, String> {
    factores
        .iter()
        .filter(|f| !f.nombre.is_empty())
        .map(|f| (f.id, f.nombre.clone()))
        .collect()
}

pub fn hecho_names(hechos: &[Hecho]) -> HashMap<i64, String> {
    hechos
        .iter()
        .filter(|h| !h.descripcion.is_empty())
        .map(|h| (h.id, h.descripcion.clone()))
        .collect()
}

/// Attach resolved factor/fact names, `"N/A"` when unresolved.
pub fn decorate(
    reglas: Vec<Regla>,
    factores: &HashMap<i64, String>,
    hechos: &HashMap<i64, String>,
) -> Vec<Regla> {
    reglas
        .into_iter()
        .map(|mut r| {
            r.factor = Some(
                factores
                    .get(&r.factor_id)
                    .cloned()
                    .unwrap_or_else(|| NOT_AVAILABLE.into()),
            );
            r.hecho = Some(
                hechos
                    .get(&r.hecho_id)
                    .cloned()
                    .unwrap_or_else(|| NOT_AVAILABLE.into()),
            );
            r
        })
        .collect()
}

/// Whether any searchable field of `regla` contains `needle`.
///
/// `needle` must already be trimmed and lower-cased.
pub fn matches(regla: &Regla, needle: &str) -> bool {
    let text_fields = [
        regla.factor.as_deref().unwrap_or(""),
        regla.hecho.as_deref().unwrap_or(""),
        regla.operador.as_str(),
        regla.valor.as_str(),
    ];

    [regla.id, regla.factor_id, regla.hecho_id]
        .iter()
        .any(|n| n.to_string().contains(needle))
        || text_fields
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Rows for the rules matching `filter`, in cache order.
///
/// An empty or whitespace-only filter yields every rule.
pub fn filter_rows(reglas: &[Regla], filter: &str, actions: bool) -> Vec<RuleRow> {
    let needle = filter.trim().to_lowercase();
    reglas
        .iter()
        .filter(|r| needle.is_empty() || matches(r, &needle))
        .map(|r| RuleRow::from_regla(r, actions))
        .collect()
}

/// Rule list state for one mounted screen.
#[derive(Debug, Clone)]
pub struct RuleListView {
    variant: ListVariant,
    actions: bool,
    reglas: Vec<Regla>,
    factor_names: HashMap<i64, String>,
    hecho_names: HashMap<i64, String>,
    filter: String,
    rows: Vec<RuleRow>,
    state: ListState,
}

impl RuleListView {
    pub fn new(variant: ListVariant) -> Self {
        Self {
            variant,
            actions: variant == ListVariant::Joined,
            reglas: Vec::new(),
            factor_names: HashMap::new(),
            hecho_names: HashMap::new(),
            filter: String::new(),
            rows: Vec::new(),
            state: ListState::Loading,
        }
    }

    /// Override whether rows carry edit/delete actions.
    pub fn with_actions(mut self, actions: bool) -> Self {
        self.actions = actions;
        self
    }

    /// Drop everything and return to the loading state.
    pub fn reset(&mut self) {
        *self = Self::new(self.variant).with_actions(self.actions);
    }

    /// Refetch the cache (and lookup maps for [`ListVariant::Joined`]).
    pub async fn load<B: RulesBackend + ?Sized>(&mut self, backend: &B) {
        self.state = ListState::Loading;
        let result = match self.variant {
            ListVariant::Plain => backend.list_reglas().await.map(|r| (r, None)),
            ListVariant::Joined => tokio::try_join!(
                backend.list_reglas(),
                backend.list_factores(),
                backend.list_hechos()
            )
            .map(|(r, f, h)| (r, Some((f, h)))),
        };
        self.apply(result);
    }

    /// Refetch only the rules, joining against lookups that are already
    /// loaded.
    pub async fn load_with<B: RulesBackend + ?Sized>(
        &mut self,
        backend: &B,
        reference: &ReferenceData,
    ) {
        self.state = ListState::Loading;
        let variant = self.variant;
        let result = backend.list_reglas().await.map(|reglas| match variant {
            ListVariant::Plain => (reglas, None),
            ListVariant::Joined => (
                reglas,
                Some((reference.factores.clone(), reference.hechos.clone())),
            ),
        });
        self.apply(result);
    }

    fn apply(&mut self, result: Result<(Vec<Regla>, Option<(Vec<Factor>, Vec<Hecho>)>), ApiError>) {
        match result {
            Ok((reglas, lookups)) => {
                self.reglas = match lookups {
                    Some((factores, hechos)) => {
                        self.factor_names = factor_names(&factores);
                        self.hecho_names = hecho_names(&hechos);
                        decorate(reglas, &self.factor_names, &self.hecho_names)
                    }
                    None => reglas,
                };
                debug!(count = self.reglas.len(), "rules loaded");
                self.refresh();
            }
            Err(err) => {
                warn!(error = %err, "failed to load rules");
                self.reglas.clear();
                self.rows.clear();
                self.state = ListState::Failed(LOAD_FAILED.to_string());
            }
        }
    }

    /// Replace the filter and re-render rows.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        if !matches!(self.state, ListState::Failed(_) | ListState::Loading) {
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.rows = filter_rows(&self.reglas, &self.filter, self.actions);
        self.state = if self.reglas.is_empty() {
            ListState::Empty
        } else {
            ListState::Ready
        };
    }

    /// Remove a rule from the cache and re-apply the current filter.
    pub fn remove(&mut self, id: i64) -> Option<Regla> {
        let idx = self.reglas.iter().position(|r| r.id == id)?;
        let removed = self.reglas.remove(idx);
        self.refresh();
        Some(removed)
    }

    pub fn get(&self, id: i64) -> Option<&Regla> {
        self.reglas.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    pub fn reglas(&self) -> &[Regla] {
        &self.reglas
    }

    pub fn rows(&self) -> &[RuleRow] {
        &self.rows
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn variant(&self) -> ListVariant {
        self.variant
    }

    pub fn has_actions(&self) -> bool {
        self.actions
    }

    pub fn factor_name(&self, id: i64) -> Option<&str> {
        self.factor_names.get(&id).map(String::as_str)
    }

    pub fn hecho_name(&self, id: i64) -> Option<&str> {
        self.hecho_names.get(&id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regla(id: i64, factor: &str, hecho: &str, operador: &str, valor: &str) -> Regla {
        Regla {
            id,
            factor_id: id * 10,
            hecho_id: id * 10 + 1,
            operador: operador.to_string(),
            valor: valor.to_string(),
            factor: Some(factor.to_string()),
            hecho: Some(hecho.to_string()),
        }
    }

    fn sample() -> Vec<Regla> {
        vec![
            regla(1, "Edad", "Riesgo alto", "=", "100"),
            regla(2, "Altitud", "Cultivo de papa", ">=", "2500"),
            regla(3, "Clima", "Cultivo de café", "=", "Húmedo"),
        ]
    }

    #[test]
    fn test_filter_case_insensitive() {
        let rows = filter_rows(&sample(), "RIESGO", true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[test]
    fn test_filter_matches_ids_and_values() {
        let reglas = sample();
        // factor_id 20
        assert_eq!(filter_rows(&reglas, "20", false)[0].id, 2);
        assert_eq!(filter_rows(&reglas, ">=", false).len(), 1);
        assert_eq!(filter_rows(&reglas, "húmedo", false)[0].id, 3);
        assert_eq!(filter_rows(&reglas, "cultivo", false).len(), 2);
    }

    #[test]
    fn test_empty_filter_shows_all() {
        let reglas = sample();
        assert_eq!(filter_rows(&reglas, "", true).len(), 3);
        assert_eq!(filter_rows(&reglas, "   ", true).len(), 3);
    }

    #[test]
    fn test_filter_idempotent() {
        let reglas = sample();
        let once = filter_rows(&reglas, "cultivo", true);
        let twice = filter_rows(&reglas, "cultivo", true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_decorate_falls_back_to_na() {
        let mut factores = HashMap::new();
        factores.insert(10, "Edad".to_string());
        let reglas = vec![Regla {
            factor: None,
            hecho: None,
            ..regla(1, "", "", "=", "1")
        }];
        let decorated = decorate(reglas, &factores, &HashMap::new());
        assert_eq!(decorated[0].factor.as_deref(), Some("Edad"));
        assert_eq!(decorated[0].hecho.as_deref(), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_missing_names_render_na() {
        let mut r = regla(4, "", "", "<=", "10");
        r.factor = None;
        let rows = filter_rows(&[r], "", false);
        assert_eq!(rows[0].factor, NOT_AVAILABLE);
        assert!(!rows[0].actions);
    }

    #[test]
    fn test_remove_reapplies_filter() {
        let mut view = RuleListView::new(ListVariant::Joined);
        view.apply(Ok((sample(), None)));
        view.set_filter("cultivo");
        assert_eq!(view.rows().len(), 2);

        assert!(view.remove(2).is_some());
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].id, 3);
        assert!(view.remove(2).is_none());
    }

    #[test]
    fn test_empty_and_failed_states() {
        let mut view = RuleListView::new(ListVariant::Plain);
        assert_eq!(view.state(), &ListState::Loading);

        view.apply(Ok((Vec::new(), None)));
        assert_eq!(view.state(), &ListState::Empty);

        view.apply(Err(ApiError::Network("refused".into())));
        assert_eq!(view.state(), &ListState::Failed(LOAD_FAILED.to_string()));
    }

    #[test]
    fn test_removing_last_rule_empties_view() {
        let mut view = RuleListView::new(ListVariant::Joined);
        view.apply(Ok((vec![regla(1, "Edad", "Riesgo", "=", "1")], None)));
        view.remove(1);
        assert_eq!(view.state(), &ListState::Empty);
    }
}
