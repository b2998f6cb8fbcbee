//! Headless mode for the Reglas client.
//!
//! A line-oriented interface over the same controllers the TUI uses,
//! designed for scripting and automated testing.

use reglas_core::{
    Banner, BannerKind, ClientConfig, DeleteDialog, FactorDialog, HechoDialog, Landing, ListState,
    ListVariant, LoginController, Operador, QuickRuleForm, ReferenceLoader, RegisterController,
    ReglasApi, RuleDialog, RuleListView, RuleRow, RulesBackend, Session,
};
use std::io::{self, BufRead, Write};

use crate::app::READ_ONLY;

/// Commands that change server data.
const MUTATIONS: &[&str] = &["create", "new", "edit", "delete", "factor", "hecho"];

const COMMANDS: &[(&str, &str)] = &[
    ("#login <email> <password>", "Log in (employee first, then user)"),
    ("#register <email> <password> <confirm> <name...>", "Create an account"),
    ("#logout", "Forget the current session"),
    ("#whoami", "Show the logged-in user"),
    ("#list [json]", "Show the rules, optionally as JSON"),
    ("#filter [text]", "Filter the rules (empty clears)"),
    ("#show <id>", "Fetch one rule from the server"),
    ("#options", "List factor and fact choices"),
    ("#create <factor> <hecho> <op> <valor>", "Quick-create a rule (op: =, <=, >=, range)"),
    ("#new <factor> <hecho> <op> <valor>", "Create a rule through the rule dialog"),
    ("#edit <id> <factor> <hecho> <op> <valor>", "Edit a rule"),
    ("#delete <id>", "Delete a rule"),
    ("#factor <categoria> <nombre...>", "Create a factor"),
    ("#hecho <descripcion...>", "Create a fact"),
    ("#help", "Show this help"),
    ("#quit", "Exit"),
];

/// State carried between headless commands.
pub struct HeadlessSession {
    login: LoginController,
    register: RegisterController,
    reference: ReferenceLoader,
    rules: RuleListView,
    quick: QuickRuleForm,
    session: Option<Session>,
}

impl HeadlessSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            login: LoginController::new(config.redirect_delay),
            register: RegisterController::new(),
            reference: ReferenceLoader::new(),
            rules: RuleListView::new(ListVariant::Joined),
            quick: QuickRuleForm::new(config.range_encoding),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn variant(&self) -> ListVariant {
        self.rules.variant()
    }

    /// An admin session on a list with edit/delete actions.
    pub fn can_mutate(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_admin) && self.rules.has_actions()
    }

    /// Run one input line. Returns `false` once the session should end.
    ///
    /// Lines without a leading `#` are taken as a filter.
    pub async fn execute<B, W>(&mut self, line: &str, backend: &B, out: &mut W) -> io::Result<bool>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }

        let Some(command) = line.strip_prefix('#') else {
            self.filter(line, backend, out).await?;
            return Ok(true);
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        let args = parts.get(1..).unwrap_or_default();
        let name = parts.first().copied();
        if name.is_some_and(|n| MUTATIONS.contains(&n)) && !self.can_mutate() {
            writeln!(out, "[ERROR] {READ_ONLY}")?;
            return Ok(true);
        }
        match name {
            Some("quit") | Some("exit") => {
                writeln!(out, "Hasta luego.")?;
                return Ok(false);
            }
            Some("help") => print_commands(out)?,
            Some("login") => self.login(args, backend, out).await?,
            Some("register") => self.register(args, backend, out).await?,
            Some("logout") => {
                self.session = None;
                self.login.reset();
                self.rules = RuleListView::new(ListVariant::Joined);
                writeln!(out, "[OK] Sesión cerrada.")?;
            }
            Some("whoami") => match self.session() {
                Some(session) => writeln!(
                    out,
                    "[SESSION] {} admin={} list={:?}",
                    session.display_name,
                    session.is_admin,
                    self.variant()
                )?,
                None => writeln!(out, "[SESSION] Sin sesión")?,
            },
            Some("list") => {
                self.ensure_rules(backend).await;
                if args.first() == Some(&"json") {
                    let json = serde_json::to_string_pretty(self.rules.rows())
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    writeln!(out, "{json}")?;
                } else {
                    self.print_rows(out)?;
                }
            }
            Some("filter") => self.filter(&args.join(" "), backend, out).await?,
            Some("show") => match parse_id(args.first()) {
                Some(id) => match backend.get_regla(id).await {
                    Ok(regla) => writeln!(
                        out,
                        "[RULE] #{} factor={} hecho={} {} {}",
                        regla.id, regla.factor_id, regla.hecho_id, regla.operador, regla.valor
                    )?,
                    Err(e) => writeln!(out, "[ERROR] {}", reglas_core::describe_error(&e))?,
                },
                None => writeln!(out, "[ERROR] Usage: #show <id>")?,
            },
            Some("options") => {
                if !self.reference.load(backend).await {
                    print_banner(out, self.reference.banner.as_ref())?;
                }
                writeln!(out, "[FACTORES]")?;
                for option in self.reference.factor_options() {
                    writeln!(out, "  {}", option.label)?;
                }
                writeln!(out, "[HECHOS]")?;
                for option in self.reference.hecho_options() {
                    writeln!(out, "  {}", option.label)?;
                }
            }
            Some("create") => self.quick_create(args, backend, out).await?,
            Some("new") => self.save_rule(None, args, backend, out).await?,
            Some("edit") => match (parse_id(args.first()), args.get(1..)) {
                (Some(id), Some(rest)) => self.save_rule(Some(id), rest, backend, out).await?,
                _ => writeln!(out, "[ERROR] Usage: #edit <id> <factor> <hecho> <op> <valor>")?,
            },
            Some("delete") => self.delete(args, backend, out).await?,
            Some("factor") => {
                let mut dialog = FactorDialog::new();
                dialog.categoria = args.first().copied().unwrap_or_default().to_string();
                dialog.nombre = args.get(1..).unwrap_or_default().join(" ");
                match dialog.confirm(backend).await {
                    Ok(factor) => {
                        writeln!(out, "[OK] Factor creado (ID: {}).", factor.id)?;
                        self.reference.load(backend).await;
                    }
                    Err(text) => writeln!(out, "[ERROR] {text}")?,
                }
            }
            Some("hecho") => {
                let mut dialog = HechoDialog::new();
                dialog.descripcion = args.join(" ");
                match dialog.confirm(backend).await {
                    Ok(hecho) => {
                        writeln!(out, "[OK] Hecho creado (ID: {}).", hecho.id)?;
                        self.reference.load(backend).await;
                    }
                    Err(text) => writeln!(out, "[ERROR] {text}")?,
                }
            }
            Some(other) => writeln!(out, "[ERROR] Unknown command: #{other}")?,
            None => writeln!(out, "[ERROR] Empty command")?,
        }
        Ok(true)
    }

    async fn login<B, W>(&mut self, args: &[&str], backend: &B, out: &mut W) -> io::Result<()>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        let [email, password] = args else {
            return writeln!(out, "[ERROR] Usage: #login <email> <password>");
        };
        self.login.form.email = email.to_string();
        self.login.form.password = password.to_string();

        let redirect = self.login.submit(backend).await;
        print_banner(out, self.login.banner.as_ref())?;
        if let Some(redirect) = redirect {
            let variant = match redirect.landing {
                Landing::Admin => ListVariant::Joined,
                Landing::User => ListVariant::Plain,
            };
            self.rules = RuleListView::new(variant);
            self.session = Some(redirect.session);
            writeln!(out, "[REDIRECT] {}", redirect.landing.path())?;
        }
        Ok(())
    }

    async fn register<B, W>(&mut self, args: &[&str], backend: &B, out: &mut W) -> io::Result<()>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        let [email, password, confirm, name @ ..] = args else {
            return writeln!(out, "[ERROR] Usage: #register <email> <password> <confirm> <name...>");
        };
        self.register.form.email = email.to_string();
        self.register.form.password = password.to_string();
        self.register.form.confirm = confirm.to_string();
        self.register.form.name = name.join(" ");

        self.register.submit(backend).await;
        print_banner(out, self.register.banner.as_ref())
    }

    async fn filter<B, W>(&mut self, text: &str, backend: &B, out: &mut W) -> io::Result<()>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        self.ensure_rules(backend).await;
        self.rules.set_filter(text);
        self.print_rows(out)
    }

    async fn quick_create<B, W>(&mut self, args: &[&str], backend: &B, out: &mut W) -> io::Result<()>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        let Some((factor_id, hecho_id, operador, valor)) = parse_rule_args(args) else {
            return writeln!(out, "[ERROR] Usage: #create <factor> <hecho> <op> <valor>");
        };
        let operador = match operador.parse::<Operador>() {
            Ok(op) => op,
            Err(e) => return writeln!(out, "[ERROR] {e}"),
        };

        self.quick.factor_id = Some(factor_id);
        self.quick.hecho_id = Some(hecho_id);
        self.quick.operador = operador;
        self.quick.valor = valor;
        if self.quick.submit(backend).await.is_some() && self.rules.state() != &ListState::Loading {
            self.rules.load(backend).await;
        }
        print_banner(out, self.quick.message.as_ref())
    }

    async fn save_rule<B, W>(
        &mut self,
        id: Option<i64>,
        args: &[&str],
        backend: &B,
        out: &mut W,
    ) -> io::Result<()>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        let Some((factor_id, hecho_id, operador, valor)) = parse_rule_args(args) else {
            return writeln!(out, "[ERROR] Usage: #new|#edit [id] <factor> <hecho> <op> <valor>");
        };

        self.ensure_rules(backend).await;
        self.reference.load(backend).await;
        let mut dialog = match id {
            Some(id) => match self.rules.get(id) {
                Some(regla) => RuleDialog::edit(regla, self.reference.data()),
                None => return writeln!(out, "[ERROR] Regla #{id} no encontrada."),
            },
            None => RuleDialog::create(self.reference.data()),
        };
        dialog.factor_id = Some(factor_id);
        dialog.hecho_id = Some(hecho_id);
        dialog.operador = operador.to_string();
        dialog.valor = valor;

        match dialog.confirm(backend, &mut self.rules).await {
            Ok(text) => writeln!(out, "[OK] {text}"),
            Err(text) => writeln!(out, "[ERROR] {text}"),
        }
    }

    async fn delete<B, W>(&mut self, args: &[&str], backend: &B, out: &mut W) -> io::Result<()>
    where
        B: RulesBackend + ?Sized,
        W: Write,
    {
        let Some(id) = parse_id(args.first()) else {
            return writeln!(out, "[ERROR] Usage: #delete <id>");
        };
        self.ensure_rules(backend).await;
        let Some(regla) = self.rules.get(id) else {
            return writeln!(out, "[ERROR] Regla #{id} no encontrada.");
        };

        let mut dialog = DeleteDialog::new(regla);
        match dialog.confirm(backend, &mut self.rules).await {
            Ok(text) => writeln!(out, "[OK] {text}"),
            Err(text) => writeln!(out, "[ERROR] {text}"),
        }
    }

    /// Load the rule list the first time it is needed.
    async fn ensure_rules<B: RulesBackend + ?Sized>(&mut self, backend: &B) {
        if matches!(self.rules.state(), ListState::Loading | ListState::Failed(_)) {
            self.rules.load(backend).await;
        }
    }

    fn print_rows<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.rules.state() {
            ListState::Loading => return writeln!(out, "[RULES] Cargando reglas…"),
            ListState::Failed(text) => return writeln!(out, "[ERROR] {text}"),
            ListState::Empty => return writeln!(out, "[RULES] No hay reglas registradas."),
            ListState::Ready => {}
        }

        let rows = self.rules.rows();
        writeln!(
            out,
            "[RULES] {} de {}",
            rows.len(),
            self.rules.reglas().len()
        )?;
        for row in rows {
            writeln!(out, "{}", format_row(row))?;
        }
        Ok(())
    }
}

fn format_row(row: &RuleRow) -> String {
    format!(
        "  #{:<4} {} {} {} → {}",
        row.id, row.factor, row.operador, row.valor, row.hecho
    )
}

fn parse_id(arg: Option<&&str>) -> Option<i64> {
    arg.and_then(|s| s.parse().ok())
}

/// `<factor> <hecho> <op> <valor...>`
fn parse_rule_args<'a>(args: &[&'a str]) -> Option<(i64, i64, &'a str, String)> {
    let [factor, hecho, operador, valor @ ..] = args else {
        return None;
    };
    Some((
        factor.parse().ok()?,
        hecho.parse().ok()?,
        *operador,
        valor.join(" "),
    ))
}

fn print_banner<W: Write>(out: &mut W, banner: Option<&Banner>) -> io::Result<()> {
    let Some(banner) = banner else {
        return Ok(());
    };
    let prefix = match banner.kind {
        BannerKind::Success => "[OK]",
        BannerKind::Info => "[INFO]",
        BannerKind::Warning => "[WARN]",
        BannerKind::Danger => "[ERROR]",
    };
    writeln!(out, "{prefix} {}", banner.message)
}

fn print_commands<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    for (usage, description) in COMMANDS {
        writeln!(out, "  {usage:<50} - {description}")?;
    }
    Ok(())
}

/// Run the client in headless mode.
///
/// This provides a simple line-oriented protocol:
/// - Lines starting with `#` are commands
/// - All other lines filter the rule list
/// - Output lines are tagged `[OK]`, `[ERROR]`, `[RULES]` and so on
pub async fn run_headless(config: &ClientConfig, api: &ReglasApi) -> io::Result<()> {
    let mut session = HeadlessSession::new(config);
    let mut stdout = io::stdout();

    writeln!(stdout, "=== Reglas Headless Mode ===")?;
    writeln!(stdout, "API: {}", api.base_url())?;
    writeln!(stdout)?;
    print_commands(&mut stdout)?;
    writeln!(stdout)?;
    stdout.flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let keep_going = session.execute(&line, api, &mut stdout).await?;
        stdout.flush()?;
        if !keep_going {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reglas_core::testing::rejection;
    use reglas_core::{Endpoint, Factor, Hecho, LoginResponse, MockBackend, Regla};

    fn seeded() -> MockBackend {
        MockBackend::new()
            .with_factores(vec![Factor {
                id: 1,
                nombre: "Ingreso".to_string(),
                categoria: "finanzas".to_string(),
            }])
            .with_hechos(vec![Hecho {
                id: 2,
                descripcion: "Aprobar crédito".to_string(),
            }])
            .with_reglas(vec![Regla {
                id: 3,
                factor_id: 1,
                hecho_id: 2,
                operador: ">=".to_string(),
                valor: "2000".to_string(),
                factor: None,
                hecho: None,
            }])
    }

    async fn admin(backend: &MockBackend) -> HeadlessSession {
        let mut session = HeadlessSession::new(&ClientConfig::default());
        let output = run(&mut session, backend, "#login marta@empresa.com clave").await;
        assert!(output.contains("[REDIRECT] /admin"));
        session
    }

    async fn run(session: &mut HeadlessSession, backend: &MockBackend, line: &str) -> String {
        let mut out = Vec::new();
        session.execute(line, backend, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_list_joins_names() {
        let backend = seeded();
        let mut session = HeadlessSession::new(&ClientConfig::default());

        let output = run(&mut session, &backend, "#list").await;

        assert!(output.starts_with("[RULES] 1 de 1"));
        assert!(output.contains("Ingreso >= 2000 → Aprobar crédito"));
    }

    #[tokio::test]
    async fn test_list_json() {
        let backend = seeded();
        let mut session = HeadlessSession::new(&ClientConfig::default());

        let output = run(&mut session, &backend, "#list json").await;
        let rows: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(rows[0]["id"], 3);
        assert_eq!(rows[0]["factor"], "Ingreso");
        assert_eq!(rows[0]["actions"], true);
    }

    #[tokio::test]
    async fn test_plain_line_filters() {
        let backend = seeded();
        let mut session = HeadlessSession::new(&ClientConfig::default());

        let output = run(&mut session, &backend, "edad").await;

        assert!(output.starts_with("[RULES] 0 de 1"));
    }

    #[tokio::test]
    async fn test_user_login_switches_to_plain_list() {
        let backend = MockBackend::new().with_user_login(LoginResponse {
            name: Some("Ana".to_string()),
            ..LoginResponse::default()
        });
        backend.fail(Endpoint::EmployeeLogin, rejection(401, "No es empleado"));
        let mut session = HeadlessSession::new(&ClientConfig::default());

        let output = run(&mut session, &backend, "#login ana@example.com secreto").await;

        assert!(output.contains("[OK] ✅ Bienvenido, Ana"));
        assert!(output.contains("[REDIRECT] /home"));
        assert_eq!(session.variant(), ListVariant::Plain);
        assert_eq!(session.session().unwrap().display_name, "Ana");
    }

    #[tokio::test]
    async fn test_login_usage() {
        let backend = MockBackend::new();
        let mut session = HeadlessSession::new(&ClientConfig::default());

        let output = run(&mut session, &backend, "#login solo@correo.com").await;

        assert!(output.starts_with("[ERROR] Usage"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let backend = seeded();
        let mut session = admin(&backend).await;
        run(&mut session, &backend, "#list").await;

        let output = run(&mut session, &backend, "#create 1 2 = 500").await;
        assert!(output.starts_with("[OK] Regla creada"));
        assert_eq!(backend.reglas().len(), 2);

        let output = run(&mut session, &backend, "#delete 3").await;
        assert_eq!(output, "[OK] Regla #3 eliminada.\n");
        assert_eq!(backend.reglas().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_operator_rejected() {
        let backend = seeded();
        let mut session = admin(&backend).await;

        let output = run(&mut session, &backend, "#create 1 2 != 5").await;

        assert!(output.starts_with("[ERROR] Operador desconocido"));
        assert!(backend.calls_to(Endpoint::CreateRegla).is_empty());
    }

    #[tokio::test]
    async fn test_edit_missing_rule() {
        let backend = seeded();
        let mut session = admin(&backend).await;

        let output = run(&mut session, &backend, "#edit 99 1 2 = 5").await;

        assert_eq!(output, "[ERROR] Regla #99 no encontrada.\n");
    }

    #[tokio::test]
    async fn test_user_session_is_read_only() {
        let backend = seeded().with_user_login(LoginResponse {
            name: Some("Ana".to_string()),
            ..LoginResponse::default()
        });
        backend.fail(Endpoint::EmployeeLogin, rejection(401, "No es empleado"));
        let mut session = HeadlessSession::new(&ClientConfig::default());
        run(&mut session, &backend, "#login ana@example.com secreto").await;

        let output = run(&mut session, &backend, "#delete 3").await;

        assert_eq!(output, format!("[ERROR] {READ_ONLY}\n"));
        assert!(backend.calls_to(Endpoint::DeleteRegla).is_empty());
        assert_eq!(backend.reglas().len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_need_login() {
        let backend = seeded();
        let mut session = admin(&backend).await;
        run(&mut session, &backend, "#logout").await;

        for line in ["#create 1 2 = 5", "#new 1 2 = 5", "#edit 3 1 2 = 5", "#factor f x", "#hecho x"] {
            let output = run(&mut session, &backend, line).await;
            assert!(output.starts_with("[ERROR] Solo lectura"), "{line}: {output}");
        }
        assert!(backend.calls_to(Endpoint::CreateRegla).is_empty());
        assert!(backend.calls_to(Endpoint::CreateFactor).is_empty());
        assert_eq!(backend.reglas().len(), 1);
    }

    #[tokio::test]
    async fn test_quit() {
        let backend = MockBackend::new();
        let mut session = HeadlessSession::new(&ClientConfig::default());
        let mut out = Vec::new();

        let keep_going = session.execute("#quit", &backend, &mut out).await.unwrap();

        assert!(!keep_going);
    }
}
