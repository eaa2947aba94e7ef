use chrono::Datelike;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::TableState;

use crate::cli::api::Client;
use crate::cli::input::LineEdit;
use crate::cli::util::{parse_money, today};
use crate::database::models::{
    DeceasedTarget, FinancialHealth, NewDependent, NewPayout, NewService, NewTransaction,
    PaymentStatus, Role, Service, ServicePatch, ServiceType, Transaction, TransactionStatus,
};
use crate::domain::dashboard::{AdminDashboard, MemberDashboard};
use crate::domain::death_committee::{CommitteeSummary, MyCommittee, PaymentUpload};
use crate::domain::members::{MemberDirectory, NewMember};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Transactions,
    Services,
    Members,
    Committee,
    Donations,
    Help,
}

impl Tab {
    pub const ADMIN: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Transactions,
        Tab::Services,
        Tab::Members,
        Tab::Committee,
        Tab::Help,
    ];
    pub const MEMBER: [Tab; 5] = [
        Tab::Dashboard,
        Tab::Services,
        Tab::Donations,
        Tab::Committee,
        Tab::Help,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Transactions => "Transactions",
            Tab::Services => "Services",
            Tab::Members => "Members",
            Tab::Committee => "Death Committee",
            Tab::Donations => "My Donations",
            Tab::Help => "Help",
        }
    }
}

#[derive(Default)]
pub struct LoginForm {
    pub email: LineEdit,
    pub password: LineEdit,
    // 0: email, 1: password
    pub focus: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Donate { service_id: i64 },
    NewService,
    EditService { service_id: i64 },
    NewMember,
    EditFee { member_id: i64 },
    Payout { user_id: i64 },
    UploadProof,
    NewDependent,
}

pub struct Field {
    pub label: &'static str,
    pub input: LineEdit,
}

/// Modal form; every field is a line of text parsed on submit.
pub struct Form {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<Field>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, title: impl Into<String>, labels: &[&'static str]) -> Self {
        Self {
            kind,
            title: title.into(),
            fields: labels
                .iter()
                .map(|&label| Field {
                    label,
                    input: LineEdit::default(),
                })
                .collect(),
            focus: 0,
            error: None,
        }
    }

    fn prefill(mut self, idx: usize, value: impl Into<String>) -> Self {
        if let Some(f) = self.fields.get_mut(idx) {
            f.input.set(value);
        }
        self
    }

    fn masked(mut self, idx: usize) -> Self {
        if let Some(f) = self.fields.get_mut(idx) {
            f.input.password = true;
        }
        self
    }

    fn text(&self, idx: usize) -> String {
        self.fields
            .get(idx)
            .map(|f| f.input.value.trim().to_string())
            .unwrap_or_default()
    }

    fn opt_text(&self, idx: usize) -> Option<String> {
        Some(self.text(idx)).filter(|s| !s.is_empty())
    }

    fn money(&self, idx: usize, label: &str) -> AppResult<rust_decimal::Decimal> {
        parse_money(&self.text(idx))
            .ok_or_else(|| AppError::validation(format!("{label} must be a number")))
    }

    fn opt_money(&self, idx: usize, label: &str) -> AppResult<Option<rust_decimal::Decimal>> {
        match self.opt_text(idx) {
            Some(_) => self.money(idx, label).map(Some),
            None => Ok(None),
        }
    }

    fn parsed<T: std::str::FromStr<Err = String>>(&self, idx: usize) -> AppResult<Option<T>> {
        self.opt_text(idx)
            .map(|s| s.parse::<T>().map_err(AppError::validation))
            .transpose()
    }
}

fn next_in<T: Copy + PartialEq>(cycle: &[Option<T>], cur: Option<T>) -> Option<T> {
    let pos = cycle.iter().position(|c| *c == cur).unwrap_or(0);
    cycle[(pos + 1) % cycle.len()]
}

pub struct App {
    pub api: Client,
    pub screen: Screen,
    pub login: LoginForm,
    pub tab: Tab,
    pub status: String,
    pub quit: bool,
    pub sel: TableState,
    pub form: Option<Form>,

    pub tx_filter: Option<TransactionStatus>,
    pub committee_filter: Option<PaymentStatus>,

    pub admin_dash: Option<AdminDashboard>,
    pub member_dash: Option<MemberDashboard>,
    pub transactions: Vec<Transaction>,
    pub services: Vec<Service>,
    pub members: Option<MemberDirectory>,
    pub committee: Vec<CommitteeSummary>,
    pub health: Option<FinancialHealth>,
    pub my_committee: Option<MyCommittee>,
}

impl App {
    pub fn new(api: Client) -> Self {
        Self {
            api,
            screen: Screen::Login,
            login: LoginForm {
                password: LineEdit::masked(),
                ..LoginForm::default()
            },
            tab: Tab::Dashboard,
            status: "Sign in to continue | Esc to quit".into(),
            quit: false,
            sel: TableState::default(),
            form: None,
            tx_filter: None,
            committee_filter: None,
            admin_dash: None,
            member_dash: None,
            transactions: Vec::new(),
            services: Vec::new(),
            members: None,
            committee: Vec::new(),
            health: None,
            my_committee: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.api.is_admin()
    }

    pub fn tabs(&self) -> &'static [Tab] {
        if self.is_admin() {
            &Tab::ADMIN
        } else {
            &Tab::MEMBER
        }
    }

    pub fn tab_index(&self) -> usize {
        self.tabs().iter().position(|t| *t == self.tab).unwrap_or(0)
    }

    fn switch_tab(&mut self, delta: isize) {
        let tabs = self.tabs();
        let n = tabs.len() as isize;
        let next = (self.tab_index() as isize + delta).rem_euclid(n) as usize;
        self.tab = tabs[next];
        self.sel.select(None);
    }

    /// Rows in the table the current tab shows.
    pub fn row_count(&self) -> usize {
        match self.tab {
            Tab::Transactions | Tab::Donations => self.transactions.len(),
            Tab::Services => self.services.len(),
            Tab::Members => self
                .members
                .as_ref()
                .map_or(0, |d| d.members.len() + d.admins.len()),
            Tab::Committee if self.is_admin() => self.committee.len(),
            Tab::Committee => self
                .my_committee
                .as_ref()
                .map_or(0, |c| c.member.subscriptions.len()),
            Tab::Dashboard | Tab::Help => 0,
        }
    }

    fn move_sel(&mut self, delta: isize) {
        let n = self.row_count();
        if n == 0 {
            self.sel.select(None);
            return;
        }
        let cur = self.sel.selected().unwrap_or(0) as isize;
        let next = (cur + delta).rem_euclid(n as isize) as usize;
        self.sel.select(Some(next));
    }

    fn clamp_sel(&mut self) {
        let n = self.row_count();
        match (n, self.sel.selected()) {
            (0, _) => self.sel.select(None),
            (_, None) => self.sel.select(Some(0)),
            (n, Some(i)) if i >= n => self.sel.select(Some(n - 1)),
            _ => {}
        }
    }

    fn selected_service(&self) -> Option<&Service> {
        self.services.get(self.sel.selected()?)
    }

    fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.sel.selected()?)
    }

    fn selected_committee(&self) -> Option<&CommitteeSummary> {
        self.committee.get(self.sel.selected()?)
    }

    /// Reload what the current tab shows. Failures land in the status bar.
    pub async fn refresh(&mut self) {
        if let Err(e) = self.load_tab().await {
            tracing::warn!(tab = self.tab.title(), error = %e, "refresh failed");
            self.status = format!("Error: {}", e.public_message());
        }
        self.clamp_sel();
    }

    async fn load_tab(&mut self) -> AppResult<()> {
        let admin = self.is_admin();
        match self.tab {
            Tab::Dashboard if admin => self.admin_dash = Some(self.api.admin_dashboard().await?),
            Tab::Dashboard => self.member_dash = Some(self.api.member_dashboard().await?),
            Tab::Transactions => self.transactions = self.api.transactions(self.tx_filter).await?,
            Tab::Donations => self.transactions = self.api.transactions(None).await?,
            Tab::Services => self.services = self.api.services().await?,
            Tab::Members => self.members = Some(self.api.members().await?),
            Tab::Committee if admin => {
                self.committee = self.api.committee(self.committee_filter).await?;
                self.health = Some(self.api.financial_health().await?);
            }
            Tab::Committee => self.my_committee = Some(self.api.my_committee().await?),
            Tab::Help => {}
        }
        Ok(())
    }

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }
        match self.screen {
            Screen::Login => self.handle_login_key(k).await,
            Screen::Main if self.form.is_some() => self.handle_form_key(k).await,
            Screen::Main => self.handle_main_key(k).await,
        }
        Ok(())
    }

    async fn handle_login_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.focus = 1 - self.login.focus;
            }
            KeyCode::Enter => self.submit_login().await,
            code => {
                let field = if self.login.focus == 0 {
                    &mut self.login.email
                } else {
                    &mut self.login.password
                };
                field.handle(code);
            }
        }
    }

    async fn submit_login(&mut self) {
        let email = self.login.email.value.clone();
        let password = self.login.password.value.clone();
        match self.api.sign_in(&email, &password).await {
            Ok(actor) => {
                self.status = format!("Signed in as {} ({})", actor.name, actor.role);
                self.screen = Screen::Main;
                self.tab = Tab::Dashboard;
                self.login.error = None;
                self.login.password.clear();
                self.refresh().await;
            }
            Err(e) => {
                self.login.error = Some(e.public_message());
                self.login.password.clear();
            }
        }
    }

    fn sign_out(&mut self) {
        self.api.sign_out();
        let api = self.api.clone();
        *self = App::new(api);
        self.status = "Signed out.".into();
    }

    async fn handle_main_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Char('q') => {
                self.quit = true;
                return;
            }
            KeyCode::Tab | KeyCode::Right => {
                self.switch_tab(1);
                self.refresh().await;
                return;
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.switch_tab(-1);
                self.refresh().await;
                return;
            }
            KeyCode::Up => return self.move_sel(-1),
            KeyCode::Down => return self.move_sel(1),
            KeyCode::Char('r') => {
                self.refresh().await;
                self.status = "Refreshed.".into();
                return;
            }
            KeyCode::Char('o') => return self.sign_out(),
            KeyCode::Char('?') => {
                self.tab = Tab::Help;
                return;
            }
            _ => {}
        }

        if self.is_admin() {
            self.handle_admin_key(k.code).await;
        } else {
            self.handle_member_key(k.code).await;
        }
    }

    async fn handle_admin_key(&mut self, code: KeyCode) {
        match (self.tab, code) {
            (Tab::Transactions, KeyCode::Char('a')) => {
                self.set_selected_status(TransactionStatus::Approved).await
            }
            (Tab::Transactions, KeyCode::Char('x')) => {
                self.set_selected_status(TransactionStatus::Rejected).await
            }
            (Tab::Transactions, KeyCode::Char('f')) => {
                let cycle = [
                    None,
                    Some(TransactionStatus::Pending),
                    Some(TransactionStatus::Approved),
                    Some(TransactionStatus::Rejected),
                ];
                self.tx_filter = next_in(&cycle, self.tx_filter);
                self.refresh().await;
            }

            (Tab::Services, KeyCode::Char('n')) => {
                self.form = Some(Form::new(
                    FormKind::NewService,
                    "New Service",
                    &["Name", "Description", "Type", "Target amount"],
                ));
            }
            (Tab::Services, KeyCode::Char('e')) => {
                if let Some(s) = self.selected_service() {
                    let form = Form::new(
                        FormKind::EditService { service_id: s.id },
                        format!("Edit {}", s.name),
                        &["Name", "Description", "Type", "Target amount"],
                    )
                    .prefill(0, s.name.clone())
                    .prefill(1, s.description.clone().unwrap_or_default())
                    .prefill(2, s.service_type.as_str())
                    .prefill(3, s.target_amount.map(|t| t.to_string()).unwrap_or_default());
                    self.form = Some(form);
                }
            }
            (Tab::Services, KeyCode::Char('t')) => {
                if let Some(s) = self.selected_service() {
                    let (id, active) = (s.id, s.is_active);
                    let patch = ServicePatch {
                        is_active: Some(!active),
                        ..Default::default()
                    };
                    let res = self.api.update_service(id, patch).await.map(|d| d.message);
                    self.report(res).await;
                }
            }
            (Tab::Services, KeyCode::Char('d')) => {
                if let Some(id) = self.selected_service().map(|s| s.id) {
                    let res = self.api.delete_service(id).await.map(|d| d.message);
                    self.report(res).await;
                }
            }

            (Tab::Members, KeyCode::Char('n')) => {
                self.form = Some(
                    Form::new(
                        FormKind::NewMember,
                        "New Member",
                        &[
                            "Name",
                            "Email",
                            "Password",
                            "Phone",
                            "Address",
                            "Role (MEMBER/ADMIN)",
                            "Monthly fee (blank = none)",
                        ],
                    )
                    .masked(2),
                );
            }

            (Tab::Committee, KeyCode::Char('f')) => {
                let cycle = [
                    None,
                    Some(PaymentStatus::Paid),
                    Some(PaymentStatus::Unpaid),
                    Some(PaymentStatus::Overdue),
                ];
                self.committee_filter = next_in(&cycle, self.committee_filter);
                self.refresh().await;
            }
            (Tab::Committee, KeyCode::Char('a')) => {
                let pending = self.selected_committee().and_then(|c| {
                    c.detail
                        .subscriptions
                        .iter()
                        .rev()
                        .find(|s| !s.is_paid && s.payment_proof.is_some())
                        .map(|s| s.id)
                });
                match pending {
                    Some(id) => {
                        let res = self.api.approve_payment(id).await.map(|d| d.message);
                        self.report(res).await;
                    }
                    None => self.status = "No payment waiting for approval.".into(),
                }
            }
            (Tab::Committee, KeyCode::Char('e')) => {
                if let Some(c) = self.selected_committee() {
                    let form = Form::new(
                        FormKind::EditFee {
                            member_id: c.detail.member.id,
                        },
                        format!("Monthly fee for {}", c.detail.user_name),
                        &["Monthly fee"],
                    )
                    .prefill(0, c.detail.member.monthly_fee.to_string());
                    self.form = Some(form);
                }
            }
            (Tab::Committee, KeyCode::Char('p')) => {
                if let Some(c) = self.selected_committee() {
                    let form = Form::new(
                        FormKind::Payout {
                            user_id: c.detail.member.user_id,
                        },
                        format!("Funeral payout: {}", c.detail.user_name),
                        &[
                            "Dependent ID (blank = member)",
                            "Amount",
                            "Receiver name",
                            "Receiver relation",
                            "Notes",
                        ],
                    );
                    self.form = Some(form);
                }
            }
            _ => {}
        }
    }

    async fn handle_member_key(&mut self, code: KeyCode) {
        match (self.tab, code) {
            (Tab::Services, KeyCode::Enter | KeyCode::Char('d')) => {
                if let Some(s) = self.selected_service() {
                    self.form = Some(Form::new(
                        FormKind::Donate { service_id: s.id },
                        format!("Donate to {}", s.name),
                        &["Amount", "Notes", "Payment proof URL"],
                    ));
                }
            }
            (Tab::Committee, KeyCode::Char('u')) => {
                self.form = Some(Form::new(
                    FormKind::UploadProof,
                    "Upload payment proof (current month)",
                    &["Payment proof URL"],
                ));
            }
            (Tab::Committee, KeyCode::Char('n')) => {
                self.form = Some(Form::new(
                    FormKind::NewDependent,
                    "Add dependent",
                    &["Name", "Relation", "Age", "NIC"],
                ));
            }
            _ => {}
        }
    }

    async fn set_selected_status(&mut self, status: TransactionStatus) {
        if let Some(id) = self.selected_transaction().map(|t| t.id) {
            let res = self
                .api
                .set_transaction_status(id, status)
                .await
                .map(|d| d.message);
            self.report(res).await;
        }
    }

    /// Show the outcome of an action and reload the tab.
    async fn report(&mut self, res: AppResult<String>) {
        match res {
            Ok(msg) => {
                self.status = msg;
                self.refresh().await;
            }
            Err(e) => self.status = format!("Error: {}", e.public_message()),
        }
    }

    async fn handle_form_key(&mut self, k: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let n = form.fields.len();
        match k.code {
            KeyCode::Esc => self.form = None,
            KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % n,
            KeyCode::BackTab | KeyCode::Up => form.focus = (form.focus + n - 1) % n,
            KeyCode::Enter => self.submit_form().await,
            code => {
                if let Some(f) = form.fields.get_mut(form.focus) {
                    f.input.handle(code);
                }
            }
        }
    }

    async fn submit_form(&mut self) {
        let Some(mut form) = self.form.take() else {
            return;
        };
        match self.run_form(&form).await {
            Ok(msg) => {
                self.status = msg;
                self.refresh().await;
            }
            Err(e) => {
                form.error = Some(e.public_message());
                self.form = Some(form);
            }
        }
    }

    async fn run_form(&self, form: &Form) -> AppResult<String> {
        let api = &self.api;
        let msg = match form.kind {
            FormKind::Donate { service_id } => {
                let input = NewTransaction {
                    amount: form.money(0, "Amount")?,
                    service_id,
                    notes: form.opt_text(1),
                    payment_proof: form.opt_text(2),
                };
                api.donate(input).await?.message
            }
            FormKind::NewService => {
                let input = NewService {
                    name: form.text(0),
                    description: form.opt_text(1),
                    service_type: form.parsed::<ServiceType>(2)?.unwrap_or_default(),
                    target_amount: form.opt_money(3, "Target amount")?,
                };
                api.create_service(input).await?.message
            }
            FormKind::EditService { service_id } => {
                let patch = ServicePatch {
                    name: Some(form.text(0)),
                    description: Some(form.text(1)),
                    service_type: form.parsed::<ServiceType>(2)?,
                    target_amount: form.opt_money(3, "Target amount")?,
                    is_active: None,
                };
                api.update_service(service_id, patch).await?.message
            }
            FormKind::NewMember => {
                let input = NewMember {
                    name: form.text(0),
                    email: form.text(1),
                    password: form.text(2),
                    phone: form.opt_text(3),
                    address: form.opt_text(4),
                    role: form.parsed::<Role>(5)?.unwrap_or_default(),
                    subscription_fee: form.opt_money(6, "Monthly fee")?,
                };
                api.create_member(input).await?.message
            }
            FormKind::EditFee { member_id } => {
                let fee = form.money(0, "Monthly fee")?;
                api.update_fee(member_id, fee).await?.message
            }
            FormKind::Payout { user_id } => {
                let target = match form.opt_text(0) {
                    Some(id) => DeceasedTarget::Dependent(
                        id.parse()
                            .map_err(|_| AppError::validation("Dependent ID must be a number"))?,
                    ),
                    None => DeceasedTarget::Member(user_id),
                };
                let payout = NewPayout {
                    amount: form.money(1, "Amount")?,
                    receiver_name: form.text(2),
                    receiver_relation: form.text(3),
                    notes: form.opt_text(4),
                };
                api.record_payout(target, payout).await?.message
            }
            FormKind::UploadProof => {
                let now = today();
                let upload = PaymentUpload {
                    member_id: None,
                    month: now.month(),
                    year: now.year(),
                    payment_proof: form.opt_text(0),
                };
                api.upload_payment(upload).await?.message
            }
            FormKind::NewDependent => {
                let age = form
                    .text(2)
                    .parse::<i64>()
                    .map_err(|_| AppError::validation("Age must be a number"))?;
                let input = NewDependent {
                    name: form.text(0),
                    relation: form.text(1),
                    age,
                    nic: form.opt_text(3),
                };
                api.add_dependent(input).await?.message
            }
        };
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_cycle_wraps_back_to_all() {
        let cycle = [None, Some(PaymentStatus::Paid), Some(PaymentStatus::Overdue)];
        assert_eq!(next_in(&cycle, None), Some(PaymentStatus::Paid));
        assert_eq!(next_in(&cycle, Some(PaymentStatus::Overdue)), None);
    }

    #[test]
    fn form_parses_optional_money_and_enums() {
        let form = Form::new(FormKind::NewService, "t", &["Name", "Type", "Target"])
            .prefill(0, "  Zakat  ")
            .prefill(1, "charity");
        assert_eq!(form.text(0), "Zakat");
        assert_eq!(form.parsed::<ServiceType>(1).unwrap(), Some(ServiceType::Charity));
        assert_eq!(form.opt_money(2, "Target").unwrap(), None);

        let bad = form.prefill(2, "ten");
        assert!(bad.opt_money(2, "Target").is_err());
    }

    #[test]
    fn tabs_follow_role() {
        assert!(Tab::ADMIN.contains(&Tab::Members));
        assert!(!Tab::MEMBER.contains(&Tab::Members));
        assert!(Tab::MEMBER.contains(&Tab::Donations));
    }
}
