pub mod auth;
pub mod debounce;
pub mod form;
pub mod money_flow;
pub mod pagination;
pub mod reference_list;
pub mod requests;
pub mod validate;

#[cfg(test)]
mod testing;

use std::{
    future::Future,
    time::{Duration, Instant},
};

use api_types::{money_flow::MoneyFlowFilter, reference::EntityKind, user::User};
use chrono::{Local, NaiveDate};
use client::{Client, ClientError};
use crossterm::event::{self, Event, KeyEvent};

use crate::{
    app::{
        auth::{AccountPanel, AccountState, FieldForm, LoginState, SignUpState},
        form::{Form, SubmitStart},
        money_flow::{
            MoneyFlowForm,
            create::CreateFlowState,
            detail::FlowDetailState,
            edit::EditFlowState,
            list::{MoneyFlowBrowser, MoneyFlowListView},
        },
        reference_list::{FieldKind, ReferenceListState},
        requests::{RequestKind, Requests},
    },
    config::AppConfig,
    error::{AppError, Result},
    local_state::LocalState,
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    SignUp,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    MoneyFlows,
    Statuses,
    Types,
    Categories,
    Subcategories,
    Account,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Self::MoneyFlows,
        Self::Statuses,
        Self::Types,
        Self::Categories,
        Self::Subcategories,
        Self::Account,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::MoneyFlows => "Money flows",
            Self::Statuses => "Statuses",
            Self::Types => "Types",
            Self::Categories => "Categories",
            Self::Subcategories => "Subcategories",
            Self::Account => "Account",
        }
    }

    /// The reference collection edited in this section, if any.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Statuses => Some(EntityKind::Status),
            Self::Types => Some(EntityKind::Type),
            Self::Categories => Some(EntityKind::Category),
            Self::Subcategories => Some(EntityKind::Subcategory),
            Self::MoneyFlows | Self::Account => None,
        }
    }

    /// `'1'` is the first tab.
    pub fn from_digit(ch: char) -> Option<Self> {
        let index = ch.to_digit(10)?.checked_sub(1)?;
        Self::ALL.get(index as usize).copied()
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|section| *section == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug)]
pub enum FlowMode {
    List,
    Create(Box<CreateFlowState>),
    Edit(Box<EditFlowState>),
    Detail(FlowDetailState),
}

#[derive(Debug)]
pub struct FlowsState {
    pub mode: FlowMode,
    pub browser: MoneyFlowBrowser,
    pub view: MoneyFlowListView,
}

impl FlowsState {
    fn new(config: &AppConfig) -> Self {
        Self {
            mode: FlowMode::List,
            browser: MoneyFlowBrowser::new(),
            view: MoneyFlowListView::new(Duration::from_millis(config.debounce_ms)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    shown_at: Instant,
}

/// Destructive actions waiting for a yes/no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    DeleteReference(i64),
    DeleteFlow(i64),
    DeleteAvatar,
    Logout,
}

impl Confirm {
    pub fn prompt(self) -> String {
        match self {
            Self::DeleteReference(id) => format!("Delete item #{id}?"),
            Self::DeleteFlow(id) => format!("Delete money flow #{id}?"),
            Self::DeleteAvatar => "Remove your avatar?".to_string(),
            Self::Logout => "Log out?".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub section: Section,
    pub login: LoginState,
    pub signup: SignUpState,
    pub flows: FlowsState,
    pub references: ReferenceListState,
    pub account: AccountState,
    pub toast: Option<ToastState>,
    pub confirm: Option<Confirm>,
    /// A request of the current view is in flight.
    pub busy: bool,
    pub income_type_names: Vec<String>,
    pub base_url: String,
}

impl AppState {
    /// Whether keys currently go into a text input.
    pub fn is_typing(&self) -> bool {
        match self.screen {
            Screen::Login | Screen::SignUp => true,
            Screen::Main => match self.section {
                Section::MoneyFlows => match self.flows.mode {
                    FlowMode::List => self.flows.view.editing,
                    FlowMode::Create(_) | FlowMode::Edit(_) => true,
                    FlowMode::Detail(_) => false,
                },
                Section::Account => self.account.editing.is_some(),
                _ => self.references.is_drafting(),
            },
        }
    }

    fn release_forms(&mut self) {
        for form in [
            self.login.form.form_mut(),
            self.signup.form.form_mut(),
            self.account.password.form_mut(),
            self.account.avatar.form_mut(),
        ] {
            form.abandon_submit();
        }
    }

    /// Whether typed text would be lost when a pending request comes back
    /// and replaces the screen's controller. The money-flow filter inputs
    /// live outside the list they filter, so they never are.
    pub fn holds_input(&self) -> bool {
        let filtering = self.screen == Screen::Main
            && self.section == Section::MoneyFlows
            && matches!(self.flows.mode, FlowMode::List);
        self.is_typing() && !filtering
    }
}

/// What a finished request hands back to the event loop: the controller
/// copy it ran on, plus what the loop needs to decide what comes next.
#[derive(Debug)]
enum Update {
    SignedIn(LoginState, Option<String>),
    PasswordReset(LoginState),
    SignedUp(SignUpState, bool),
    Resumed(std::result::Result<User, ClientError>),
    Flows(MoneyFlowBrowser),
    FlowDetail(FlowDetailState, bool),
    FlowCreated(Box<CreateFlowState>, bool),
    FlowEdited(Box<EditFlowState>, bool),
    References(ReferenceListState, Option<&'static str>),
    Account(Box<AccountState>, Option<&'static str>),
}

pub struct App {
    config: AppConfig,
    client: Client,
    local: LocalState,
    requests: Requests<Update>,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let local = LocalState::load(&config.state_path)?;
        let mut client = Client::new(&config.base_url)?;
        client.set_token(local.token.clone());

        let screen = if client.is_authenticated() {
            Screen::Main
        } else {
            Screen::Login
        };
        let state = AppState {
            screen,
            section: Section::MoneyFlows,
            login: LoginState::new(&config.email),
            signup: SignUpState::default(),
            flows: FlowsState::new(&config),
            references: ReferenceListState::new(EntityKind::Status),
            account: AccountState::default(),
            toast: None,
            confirm: None,
            busy: false,
            income_type_names: config.income_type_names.clone(),
            base_url: config.base_url.clone(),
        };

        Ok(Self {
            config,
            client,
            local,
            requests: Requests::new(),
            state,
            should_quit: false,
        })
    }

    /// Must be called from inside a tokio runtime; requests are spawned on it.
    pub fn run(&mut self) -> Result<()> {
        if self.state.screen == Screen::Main {
            self.resume_session();
        }
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        ui::restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(50);

        while !self.should_quit {
            self.state.busy = self.requests.is_busy();
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)?
                && let Event::Key(key) = event::read()?
            {
                self.handle_key(key)?;
            }
            self.tick(Instant::now())?;
        }

        Ok(())
    }

    /// Applies finished requests, fires debounced filters and expires the toast.
    fn tick(&mut self, now: Instant) -> Result<()> {
        while let Some(update) = self.requests.poll() {
            self.apply(update)?;
        }
        if let Some(filter) = self.state.flows.view.poll(now) {
            self.apply_filter(filter);
        }
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| now.duration_since(toast.shown_at) >= TOAST_TTL)
        {
            self.state.toast = None;
        }
        Ok(())
    }

    fn apply(&mut self, update: Update) -> Result<()> {
        match update {
            Update::SignedIn(login, token) => {
                self.state.login = login;
                if let Some(token) = token {
                    self.start_session(token)?;
                }
            }
            Update::PasswordReset(login) => self.state.login = login,
            Update::SignedUp(signup, created) => {
                self.state.signup = signup;
                if created {
                    self.state.screen = Screen::Login;
                    self.state
                        .login
                        .form
                        .set_message("account created, you can log in now");
                }
            }
            Update::Resumed(result) => self.resumed(result)?,
            Update::Flows(browser) => self.state.flows.browser = browser,
            Update::FlowDetail(detail, deleted) => {
                if deleted {
                    self.toast("Money flow deleted", ToastLevel::Success);
                    self.show_flow_list();
                } else {
                    self.state.flows.mode = FlowMode::Detail(detail);
                }
            }
            Update::FlowCreated(create, saved) => {
                if saved {
                    self.toast("Money flow saved", ToastLevel::Success);
                    self.show_flow_list();
                } else {
                    self.state.flows.mode = FlowMode::Create(create);
                }
            }
            Update::FlowEdited(edit, saved) => {
                if saved {
                    self.toast("Money flow updated", ToastLevel::Success);
                    self.open_flow_detail(edit.id());
                } else {
                    self.state.flows.mode = FlowMode::Edit(edit);
                }
            }
            Update::References(references, done) => {
                self.state.references = references;
                if let Some(message) = done {
                    self.toast(message, ToastLevel::Success);
                }
            }
            Update::Account(account, done) => {
                self.state.account = *account;
                if let Some(message) = done {
                    self.toast(message, ToastLevel::Success);
                }
            }
        }
        Ok(())
    }

    fn toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Leaves the current view: its pending result is dropped, and forms
    /// that outlive the view stop waiting for it.
    fn unmount(&mut self) {
        self.requests.unmount();
        self.state.release_forms();
    }

    fn load(&mut self, job: impl Future<Output = Update> + Send + 'static) {
        self.requests.spawn(RequestKind::Load, job);
    }

    /// `false`, with a toast, while another request keeps writes from starting.
    fn ready_to_write(&mut self) -> bool {
        if self.requests.can_start(RequestKind::Write) {
            return true;
        }
        self.toast("Still working, try again in a moment", ToastLevel::Info);
        false
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let action = map_key(key);
        if action == AppAction::Quit {
            self.should_quit = true;
            return Ok(());
        }
        if let Some(confirm) = self.state.confirm {
            return self.handle_confirm(confirm, action);
        }
        if self.requests.is_busy() && self.state.holds_input() && !passes_while_busy(action) {
            return Ok(());
        }

        match self.state.screen {
            Screen::Login => self.handle_login(action),
            Screen::SignUp => {
                self.handle_signup(action);
                Ok(())
            }
            Screen::Main => {
                self.handle_main(action);
                Ok(())
            }
        }
    }

    fn handle_login(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::NextField | AppAction::PrevField | AppAction::Down | AppAction::Up => {
                self.state.login.form.focus_next();
            }
            AppAction::Submit => self.submit_login(),
            AppAction::Control('n') => self.show_screen(Screen::SignUp),
            AppAction::Control('r') => self.request_password_reset(),
            other => edit_field_form(&mut self.state.login.form, other),
        }
        Ok(())
    }

    fn submit_login(&mut self) {
        if !self.ready_to_write() {
            return;
        }
        let Some(mut login) = claim_form(&mut self.state.login, |login| login.form.form_mut())
        else {
            return;
        };
        let client = self.client.clone();
        self.requests.spawn(RequestKind::Write, async move {
            let token = login.sign_in(&client).await;
            Update::SignedIn(login, token)
        });
    }

    fn request_password_reset(&mut self) {
        if !self.ready_to_write() {
            return;
        }
        let mut login = self.state.login.clone();
        let client = self.client.clone();
        self.requests.spawn(RequestKind::Write, async move {
            login.reset_password(&client).await;
            Update::PasswordReset(login)
        });
    }

    fn handle_signup(&mut self, action: AppAction) {
        match action {
            AppAction::NextField | AppAction::Down => self.state.signup.form.focus_next(),
            AppAction::Submit => self.submit_signup(),
            AppAction::Cancel | AppAction::Control('n') => self.show_screen(Screen::Login),
            other => edit_field_form(&mut self.state.signup.form, other),
        }
    }

    fn submit_signup(&mut self) {
        if !self.ready_to_write() {
            return;
        }
        let Some(mut signup) = claim_form(&mut self.state.signup, |signup| signup.form.form_mut())
        else {
            return;
        };
        let client = self.client.clone();
        self.requests.spawn(RequestKind::Write, async move {
            let created = signup.sign_up(&client).await;
            Update::SignedUp(signup, created)
        });
    }

    /// Switches between the login and sign-up screens.
    fn show_screen(&mut self, screen: Screen) {
        self.unmount();
        self.state.screen = screen;
    }

    fn start_session(&mut self, token: String) -> Result<()> {
        self.client.set_token(Some(token.clone()));
        self.local.set_token(Some(token));
        self.local.save(&self.config.state_path)?;
        tracing::info!("logged in");

        self.state.screen = Screen::Main;
        self.enter_section(Section::MoneyFlows);
        self.toast("Logged in", ToastLevel::Success);
        Ok(())
    }

    /// Checks a stored token; the main screen shows meanwhile.
    fn resume_session(&mut self) {
        let client = self.client.clone();
        self.load(async move { Update::Resumed(client.me().await) });
    }

    fn resumed(&mut self, result: std::result::Result<User, ClientError>) -> Result<()> {
        match result {
            Ok(user) => {
                tracing::info!(user = %user.username, "resumed session");
                self.enter_section(Section::MoneyFlows);
            }
            Err(ClientError::Unauthorized) => {
                self.end_session()?;
                self.state
                    .login
                    .form
                    .set_message("session expired, log in again");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to check session");
                self.enter_section(Section::MoneyFlows);
                self.toast(error_message("load profile", &err), ToastLevel::Error);
            }
        }
        Ok(())
    }

    /// Drops the session locally right away; the server is told in the
    /// background.
    fn logout(&mut self) -> Result<()> {
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(err) = client.signout().await {
                tracing::warn!(error = %err, "logout request failed");
            }
        });
        self.end_session()?;
        self.toast("Logged out", ToastLevel::Info);
        Ok(())
    }

    /// Forgets the token and every screen that depended on it.
    fn end_session(&mut self) -> Result<()> {
        self.unmount();
        self.client.set_token(None);
        self.local.set_token(None);
        self.local.save(&self.config.state_path)?;

        self.state.screen = Screen::Login;
        self.state.section = Section::MoneyFlows;
        self.state.login = LoginState::new(&self.config.email);
        self.state.flows = FlowsState::new(&self.config);
        self.state.references = ReferenceListState::new(EntityKind::Status);
        self.state.account = AccountState::default();
        self.state.confirm = None;
        Ok(())
    }

    fn enter_section(&mut self, section: Section) {
        self.unmount();
        self.state.section = section;
        match section {
            Section::MoneyFlows => self.show_flow_list(),
            Section::Account => {
                let mut account = self.state.account.clone();
                let client = self.client.clone();
                self.load(async move {
                    account.load(&client).await;
                    Update::Account(Box::new(account), None)
                });
            }
            _ => {
                if let Some(kind) = section.entity_kind() {
                    self.state.references.set_kind(kind);
                    self.load_references();
                }
            }
        }
    }

    fn handle_main(&mut self, action: AppAction) {
        if self.state.is_typing() {
            self.handle_typing(action);
            return;
        }

        match action {
            AppAction::Input(ch) if Section::from_digit(ch).is_some() => {
                if let Some(section) = Section::from_digit(ch) {
                    self.enter_section(section);
                }
            }
            AppAction::Input('q') => self.should_quit = true,
            AppAction::NextField => self.enter_section(self.state.section.next()),
            AppAction::PrevField => self.enter_section(self.state.section.previous()),
            _ => match self.state.section {
                Section::MoneyFlows => self.handle_flows(action),
                Section::Account => self.handle_account(action),
                _ => self.handle_references(action),
            },
        }
    }

    fn handle_typing(&mut self, action: AppAction) {
        match self.state.section {
            Section::MoneyFlows => match self.state.flows.mode {
                FlowMode::List => self.handle_filter_input(action),
                FlowMode::Create(_) | FlowMode::Edit(_) => self.handle_flow_form(action),
                FlowMode::Detail(_) => {}
            },
            Section::Account => self.handle_account_form(action),
            _ => self.handle_reference_draft(action),
        }
    }

    fn show_flow_list(&mut self) {
        self.unmount();
        self.state.flows.mode = FlowMode::List;
        self.load_flows();
    }

    /// Fetches the browser's current page and filter.
    fn load_flows(&mut self) {
        let mut browser = self.state.flows.browser.clone();
        let client = self.client.clone();
        self.load(async move {
            browser.load(&client).await;
            Update::Flows(browser)
        });
    }

    fn open_flow_detail(&mut self, id: i64) {
        self.unmount();
        let mut detail = FlowDetailState::new(id);
        self.state.flows.mode = FlowMode::Detail(detail.clone());
        let client = self.client.clone();
        self.load(async move {
            detail.mount(&client).await;
            Update::FlowDetail(detail, false)
        });
    }

    fn open_flow_create(&mut self) {
        self.unmount();
        let mut create = CreateFlowState::new(Self::today(), self.config.enforce_positive_amount);
        self.state.flows.mode = FlowMode::Create(Box::new(create.clone()));
        let client = self.client.clone();
        self.load(async move {
            create.mount(&client).await;
            Update::FlowCreated(Box::new(create), false)
        });
    }

    fn open_flow_edit(&mut self, id: i64) {
        self.unmount();
        let mut edit = EditFlowState::new(id, Self::today(), self.config.enforce_positive_amount);
        self.state.flows.mode = FlowMode::Edit(Box::new(edit.clone()));
        let client = self.client.clone();
        self.load(async move {
            edit.mount(&client).await;
            Update::FlowEdited(Box::new(edit), false)
        });
    }

    fn apply_filter(&mut self, filter: MoneyFlowFilter) {
        if self.state.flows.browser.set_filter(filter) {
            self.load_flows();
        }
    }

    fn handle_flows(&mut self, action: AppAction) {
        match &self.state.flows.mode {
            FlowMode::List => self.handle_flow_list(action),
            FlowMode::Detail(detail) => {
                let id = detail.id();
                self.handle_flow_detail(id, action);
            }
            FlowMode::Create(_) | FlowMode::Edit(_) => {}
        }
    }

    fn handle_flow_list(&mut self, action: AppAction) {
        let flows = &mut self.state.flows;
        match action {
            AppAction::Up | AppAction::Input('k') => flows.browser.select_prev(),
            AppAction::Down | AppAction::Input('j') => flows.browser.select_next(),
            AppAction::Right | AppAction::Input('n') => {
                if flows.browser.turn_page(true) {
                    self.load_flows();
                }
            }
            AppAction::Left | AppAction::Input('p') => {
                if flows.browser.turn_page(false) {
                    self.load_flows();
                }
            }
            AppAction::Input('/') => flows.view.editing = true,
            AppAction::Input('x') => {
                let filter = flows.view.clear();
                self.apply_filter(filter);
            }
            AppAction::Input('r') => self.load_flows(),
            AppAction::Input('c') => self.open_flow_create(),
            AppAction::Submit => {
                if let Some(id) = flows.browser.selected_flow().map(|flow| flow.id) {
                    self.open_flow_detail(id);
                }
            }
            _ => {}
        }
    }

    fn handle_flow_detail(&mut self, id: i64, action: AppAction) {
        match action {
            AppAction::Input('e') => self.open_flow_edit(id),
            AppAction::Input('d') => {
                if let FlowMode::Detail(detail) = &mut self.state.flows.mode {
                    detail.request_delete();
                    if detail.is_confirming_delete() {
                        self.state.confirm = Some(Confirm::DeleteFlow(id));
                    }
                }
            }
            AppAction::Input('r') => self.open_flow_detail(id),
            AppAction::Input('b') | AppAction::Cancel => self.show_flow_list(),
            _ => {}
        }
    }

    fn handle_filter_input(&mut self, action: AppAction) {
        let view = &mut self.state.flows.view;
        match action {
            AppAction::Input(ch) => view.push_char(ch, Instant::now()),
            AppAction::Backspace => view.pop_char(Instant::now()),
            AppAction::NextField | AppAction::Down => view.focus_next(),
            AppAction::Submit => {
                if let Some(filter) = view.apply_dates() {
                    view.editing = false;
                    self.apply_filter(filter);
                }
            }
            AppAction::Cancel => view.editing = false,
            _ => {}
        }
    }

    fn handle_flow_form(&mut self, action: AppAction) {
        match action {
            AppAction::Submit | AppAction::Control('s') => self.submit_flow_form(),
            AppAction::Cancel => match &self.state.flows.mode {
                FlowMode::Edit(edit) => {
                    let id = edit.id();
                    self.open_flow_detail(id);
                }
                _ => self.show_flow_list(),
            },
            AppAction::Left | AppAction::Right => {
                let forward = action == AppAction::Right;
                match &mut self.state.flows.mode {
                    FlowMode::Create(create) => create.cycle(forward),
                    FlowMode::Edit(edit) => edit.cycle(forward),
                    FlowMode::List | FlowMode::Detail(_) => {}
                }
            }
            other => match &mut self.state.flows.mode {
                FlowMode::Create(create) => edit_flow_form(&mut create.form, other),
                FlowMode::Edit(edit) => edit_flow_form(&mut edit.form, other),
                FlowMode::List | FlowMode::Detail(_) => {}
            },
        }
    }

    fn submit_flow_form(&mut self) {
        if !self.ready_to_write() {
            return;
        }
        let client = self.client.clone();
        match &mut self.state.flows.mode {
            FlowMode::Create(create) => {
                let Some(mut create) = claim_form(create.as_mut(), |create| create.form.form_mut())
                else {
                    return;
                };
                self.requests.spawn(RequestKind::Write, async move {
                    let saved = create.submit(&client).await;
                    Update::FlowCreated(Box::new(create), saved)
                });
            }
            FlowMode::Edit(edit) => {
                let Some(mut edit) = claim_form(edit.as_mut(), |edit| edit.form.form_mut()) else {
                    return;
                };
                self.requests.spawn(RequestKind::Write, async move {
                    let saved = edit.submit(&client).await;
                    Update::FlowEdited(Box::new(edit), saved)
                });
            }
            FlowMode::List | FlowMode::Detail(_) => {}
        }
    }

    fn load_references(&mut self) {
        let mut references = self.state.references.clone();
        let client = self.client.clone();
        self.load(async move {
            references.mount(&client).await;
            Update::References(references, None)
        });
    }

    fn handle_references(&mut self, action: AppAction) {
        let references = &mut self.state.references;
        match action {
            AppAction::Up | AppAction::Input('k') => references.select_prev(),
            AppAction::Down | AppAction::Input('j') => references.select_next(),
            AppAction::Input('c') => references.start_create(),
            AppAction::Input('e') | AppAction::Submit => {
                if let Some(id) = references.selected_record().map(|record| record.id) {
                    references.start_edit(id);
                }
            }
            AppAction::Input('d') => {
                if let Some(id) = references.selected_record().map(|record| record.id) {
                    references.request_delete(id);
                    self.state.confirm = Some(Confirm::DeleteReference(id));
                }
            }
            AppAction::Input('r') => self.load_references(),
            _ => {}
        }
    }

    fn handle_reference_draft(&mut self, action: AppAction) {
        let references = &mut self.state.references;
        let long_text = references
            .focused_field()
            .is_some_and(|field| field.kind == FieldKind::LongText);
        match action {
            AppAction::Submit if long_text => references.type_char('\n'),
            AppAction::Submit | AppAction::Control('s') => self.submit_reference_draft(),
            AppAction::Cancel => references.cancel_draft(),
            AppAction::NextField | AppAction::Down => references.focus_next(),
            AppAction::PrevField | AppAction::Up => references.focus_prev(),
            AppAction::Left => references.cycle_option(false),
            AppAction::Right => references.cycle_option(true),
            AppAction::Backspace => references.backspace(),
            AppAction::Input(ch) => references.type_char(ch),
            _ => {}
        }
    }

    fn submit_reference_draft(&mut self) {
        if !self.ready_to_write() {
            return;
        }
        let mut references = self.state.references.clone();
        let client = self.client.clone();
        self.requests.spawn(RequestKind::Write, async move {
            let saved = references.submit_draft(&client).await;
            Update::References(references, saved.then_some("Saved"))
        });
    }

    fn handle_account(&mut self, action: AppAction) {
        match action {
            AppAction::Input('p') => self.state.account.start_editing(AccountPanel::Password),
            AppAction::Input('a') => self.state.account.start_editing(AccountPanel::Avatar),
            AppAction::Input('x') => self.state.confirm = Some(Confirm::DeleteAvatar),
            AppAction::Input('o') => self.state.confirm = Some(Confirm::Logout),
            _ => {}
        }
    }

    fn handle_account_form(&mut self, action: AppAction) {
        let account = &mut self.state.account;
        match action {
            AppAction::Submit | AppAction::Control('s') => {
                if let Some(panel) = account.editing {
                    self.submit_account_panel(panel);
                }
            }
            AppAction::Cancel => account.stop_editing(),
            AppAction::NextField | AppAction::Down => {
                if let Some(form) = account.active_form_mut() {
                    form.focus_next();
                }
            }
            other => {
                if let Some(form) = account.active_form_mut() {
                    edit_field_form(form, other);
                }
            }
        }
    }

    fn submit_account_panel(&mut self, panel: AccountPanel) {
        if !self.ready_to_write() {
            return;
        }
        let claimed = claim_form(&mut self.state.account, |account| match panel {
            AccountPanel::Password => account.password.form_mut(),
            AccountPanel::Avatar => account.avatar.form_mut(),
        });
        let Some(mut account) = claimed else {
            return;
        };
        let client = self.client.clone();
        self.requests.spawn(RequestKind::Write, async move {
            let done = match panel {
                AccountPanel::Password => account
                    .change_password(&client)
                    .await
                    .then_some("Password changed"),
                AccountPanel::Avatar => account
                    .upload_avatar(&client)
                    .await
                    .then_some("Avatar updated"),
            };
            Update::Account(Box::new(account), done)
        });
    }

    fn handle_confirm(&mut self, confirm: Confirm, action: AppAction) -> Result<()> {
        let mut accepted = match action {
            AppAction::Input('y' | 'Y') | AppAction::Submit => true,
            AppAction::Input('n' | 'N') | AppAction::Cancel => false,
            _ => return Ok(()),
        };
        self.state.confirm = None;
        if accepted && confirm != Confirm::Logout && !self.ready_to_write() {
            accepted = false;
        }

        if !accepted {
            match confirm {
                Confirm::DeleteReference(_) => self.state.references.cancel_delete(),
                Confirm::DeleteFlow(_) => {
                    if let FlowMode::Detail(detail) = &mut self.state.flows.mode {
                        detail.cancel_delete();
                    }
                }
                Confirm::DeleteAvatar | Confirm::Logout => {}
            }
            return Ok(());
        }

        let client = self.client.clone();
        match confirm {
            Confirm::DeleteReference(_) => {
                let mut references = self.state.references.clone();
                self.requests.spawn(RequestKind::Write, async move {
                    let deleted = references.confirm_delete(&client).await;
                    Update::References(references, deleted.then_some("Deleted"))
                });
            }
            Confirm::DeleteFlow(_) => {
                if let FlowMode::Detail(detail) = &self.state.flows.mode {
                    let mut detail = detail.clone();
                    self.requests.spawn(RequestKind::Write, async move {
                        let deleted = detail.confirm_delete(&client).await;
                        Update::FlowDetail(detail, deleted)
                    });
                }
            }
            Confirm::DeleteAvatar => {
                let mut account = self.state.account.clone();
                self.requests.spawn(RequestKind::Write, async move {
                    let deleted = account.delete_avatar(&client).await;
                    Update::Account(Box::new(account), deleted.then_some("Avatar removed"))
                });
            }
            Confirm::Logout => self.logout()?,
        }
        Ok(())
    }
}

/// Keys that still act while a request is in flight: leaving the view, and
/// submitting again so the user hears it is still running.
fn passes_while_busy(action: AppAction) -> bool {
    matches!(
        action,
        AppAction::Cancel | AppAction::Submit | AppAction::Control('s')
    )
}

/// Marks the form picked by `form` as submitting and returns a copy of its
/// controller taken just before, for the request to run on. `None` when the
/// form is invalid or already submitting.
fn claim_form<S, F>(state: &mut S, form: F) -> Option<S>
where
    S: Clone,
    F: FnOnce(&mut S) -> &mut Form,
{
    let snapshot = state.clone();
    match form(state).begin_submit() {
        SubmitStart::Ready(_) => Some(snapshot),
        SubmitStart::Invalid | SubmitStart::Busy => None,
    }
}

fn edit_field_form(form: &mut FieldForm, action: AppAction) {
    match action {
        AppAction::Input(ch) => form.push_char(ch),
        AppAction::Backspace => form.pop_char(),
        _ => {}
    }
}

fn edit_flow_form(form: &mut MoneyFlowForm, action: AppAction) {
    match action {
        AppAction::Input(ch) => form.push_char(ch),
        AppAction::Backspace => form.pop_char(),
        AppAction::NextField | AppAction::Down => form.focus_next(),
        AppAction::PrevField | AppAction::Up => form.focus_prev(),
        _ => {}
    }
}

/// Turns a client failure into the one line shown on screen.
pub fn error_message(action: &str, err: &ClientError) -> String {
    match err {
        ClientError::Unauthorized => "session expired, log in again".to_string(),
        ClientError::Forbidden => format!("failed to {action}: not allowed"),
        ClientError::NotFound => "not found".to_string(),
        ClientError::Validation(message) => message.clone(),
        ClientError::Server(message) => format!("failed to {action}: {message}"),
        ClientError::Transport(_) if err.is_transport() => {
            format!("failed to {action}: server unreachable")
        }
        ClientError::Transport(_) => format!("failed to {action}: unexpected response"),
        ClientError::InvalidUrl(url) => format!("invalid server url: {url}"),
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, net::TcpListener, path::Path};

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::app::money_flow::list::FilterField;

    /// Points at a port nothing listens on, so every request fails fast.
    fn offline_config(name: &str) -> AppConfig {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let state_path = std::env::temp_dir()
            .join(format!("moneyflow-app-{}-{name}", std::process::id()))
            .join("state.json")
            .display()
            .to_string();
        AppConfig {
            base_url: format!("http://127.0.0.1:{port}/"),
            state_path,
            ..AppConfig::default()
        }
    }

    fn remove_state(path: &str) {
        if let Some(dir) = Path::new(path).parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    async fn settle(app: &mut App) {
        for _ in 0..500 {
            if !app.requests.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.tick(Instant::now()).unwrap();
        }
        panic!("requests never finished");
    }

    #[tokio::test]
    async fn login_persists_token_and_logout_clears_it() {
        let config = offline_config("session");
        let path = config.state_path.clone();
        let mut app = App::new(config).unwrap();
        assert_eq!(app.state.screen, Screen::Login);

        let login = LoginState::new("ann@example.com");
        app.apply(Update::SignedIn(login, Some("t0k3n".to_string())))
            .unwrap();
        assert_eq!(app.state.screen, Screen::Main);
        assert_eq!(app.client.token(), Some("t0k3n"));
        assert_eq!(LocalState::load(&path).unwrap().token.as_deref(), Some("t0k3n"));
        assert!(app.state.toast.is_some());

        app.handle_confirm(Confirm::Logout, AppAction::Input('y'))
            .unwrap();
        assert_eq!(app.state.screen, Screen::Login);
        assert_eq!(app.client.token(), None);
        assert_eq!(LocalState::load(&path).unwrap().token, None);
        assert!(!app.requests.is_busy());
        remove_state(&path);
    }

    #[tokio::test]
    async fn failed_login_keeps_session_closed() {
        let config = offline_config("failed-login");
        let path = config.state_path.clone();
        let mut app = App::new(config).unwrap();

        app.apply(Update::SignedIn(LoginState::new(""), None)).unwrap();
        assert_eq!(app.state.screen, Screen::Login);
        assert!(!app.client.is_authenticated());
        assert_eq!(LocalState::load(&path).unwrap().token, None);
    }

    #[tokio::test]
    async fn result_for_a_screen_left_behind_is_dropped() {
        let config = offline_config("stale");
        let mut app = App::new(config).unwrap();
        app.state.screen = Screen::Main;

        app.open_flow_detail(7);
        assert!(app.requests.is_busy());
        app.show_flow_list();
        settle(&mut app).await;

        assert!(matches!(app.state.flows.mode, FlowMode::List));
        assert_eq!(
            app.state.flows.browser.error(),
            Some("failed to load data: server unreachable")
        );
    }

    #[tokio::test]
    async fn leaving_a_screen_frees_its_pending_form() {
        let config = offline_config("release");
        let path = config.state_path.clone();
        let mut app = App::new(config).unwrap();
        settle(&mut app).await;

        let form = app.state.login.form.form_mut();
        form.set_field("email", "ann@example.com");
        form.set_field("password", "secret1");
        app.submit_login();
        assert!(app.state.login.form.form().is_submitting());

        app.show_screen(Screen::SignUp);
        app.show_screen(Screen::Login);
        assert!(!app.state.login.form.form().is_submitting());
        assert!(!app.requests.is_busy());

        app.submit_login();
        assert!(app.requests.is_writing());
        settle(&mut app).await;
        assert_eq!(app.state.screen, Screen::Login);
        remove_state(&path);
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap();
    }

    #[tokio::test]
    async fn filter_keys_stay_live_while_the_list_loads() {
        let mut app = App::new(offline_config("live")).unwrap();
        app.state.screen = Screen::Main;
        app.show_flow_list();
        assert!(app.requests.is_busy());

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('F'));
        assert!(app.state.flows.view.editing);
        assert_eq!(app.state.flows.view.value(FilterField::Status), "F");
        assert!(app.state.flows.view.is_pending());

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.state.section, Section::Categories);
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn form_input_waits_for_the_pending_request() {
        let mut app = App::new(offline_config("held")).unwrap();
        app.state.screen = Screen::Main;
        app.open_flow_create();
        let date = |app: &App| match &app.state.flows.mode {
            FlowMode::Create(create) => create.form.value("created_at").to_string(),
            _ => panic!("create form expected"),
        };
        let today = date(&app);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(date(&app), today);
        press(&mut app, KeyCode::Enter);
        let toast = app.state.toast.as_ref().map(|toast| toast.message.as_str());
        assert_eq!(toast, Some("Still working, try again in a moment"));

        settle(&mut app).await;
        press(&mut app, KeyCode::Backspace);
        assert_eq!(date(&app).len(), today.len() - 1);
    }

    #[test]
    fn digits_pick_sections() {
        assert_eq!(Section::from_digit('1'), Some(Section::MoneyFlows));
        assert_eq!(Section::from_digit('6'), Some(Section::Account));
        assert_eq!(Section::from_digit('0'), None);
        assert_eq!(Section::from_digit('7'), None);
        assert_eq!(Section::from_digit('x'), None);
    }

    #[test]
    fn sections_cycle() {
        assert_eq!(Section::Account.next(), Section::MoneyFlows);
        assert_eq!(Section::MoneyFlows.previous(), Section::Account);
        assert_eq!(Section::Types.entity_kind(), Some(EntityKind::Type));
        assert_eq!(Section::Account.entity_kind(), None);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            error_message("save", &ClientError::Validation("amount: too big".to_string())),
            "amount: too big"
        );
        assert_eq!(
            error_message("load data", &ClientError::Server("request failed".to_string())),
            "failed to load data: request failed"
        );
        assert_eq!(
            error_message("load data", &ClientError::Unauthorized),
            "session expired, log in again"
        );
    }
}
