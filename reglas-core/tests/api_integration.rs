//! Integration tests that call a running Reglas API.
//!
//! These tests require REGLAS_API_URL to be set (via .env file or environment).
//! Run with: `cargo test -p reglas-core --test api_integration -- --ignored`
//!
//! They create real rows on the server, so they are marked #[ignore].

use reglas_core::{
    ClientConfig, DeleteDialog, FactorDialog, HechoDialog, ListState, ListVariant,
    ReferenceLoader, RuleDialog, RuleListView,
};

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

fn has_api_url() -> bool {
    std::env::var("REGLAS_API_URL").is_ok()
}

#[tokio::test]
#[ignore] // Run with: cargo test -p reglas-core --test api_integration -- --ignored
async fn test_rule_lifecycle_against_server() {
    setup();
    if !has_api_url() {
        eprintln!("Skipping test: REGLAS_API_URL not set");
        return;
    }

    let config = ClientConfig::from_env().expect("valid config");
    let api = config.build_client().expect("client");

    let mut factor = FactorDialog::new();
    factor.nombre = "Prueba integración".to_string();
    factor.categoria = "pruebas".to_string();
    let factor = factor.confirm(&api).await.expect("factor created");

    let mut hecho = HechoDialog::new();
    hecho.descripcion = "Hecho de integración".to_string();
    let hecho = hecho.confirm(&api).await.expect("fact created");

    let mut loader = ReferenceLoader::new();
    assert!(loader.load(&api).await);

    let mut list = RuleListView::new(ListVariant::Joined);
    list.load(&api).await;
    assert!(!matches!(list.state(), ListState::Failed(_)));

    let mut dialog = RuleDialog::create(loader.data());
    dialog.factor_id = Some(factor.id);
    dialog.hecho_id = Some(hecho.id);
    dialog.valor = "42".to_string();
    let created = dialog.confirm(&api, &mut list).await;
    println!("create: {created:?}");
    assert!(created.is_ok());

    let regla = list
        .reglas()
        .iter()
        .find(|r| r.factor_id == factor.id && r.hecho_id == hecho.id)
        .cloned()
        .expect("new rule listed");
    assert_eq!(list.factor_name(regla.factor_id), Some("Prueba integración"));

    let mut delete = DeleteDialog::new(&regla);
    assert!(delete.confirm(&api, &mut list).await.is_ok());
    assert!(!list.contains(regla.id));
}

#[tokio::test]
#[ignore]
async fn test_unknown_rule_is_not_found() {
    setup();
    if !has_api_url() {
        eprintln!("Skipping test: REGLAS_API_URL not set");
        return;
    }

    let api = ClientConfig::from_env()
        .expect("valid config")
        .build_client()
        .expect("client");

    let err = api.get_regla(i64::MAX).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
