use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::cli::state::{App, Screen, Tab};
use crate::cli::util::{fmt_date, fmt_money, fmt_month, month_name};
use crate::database::models::DeceasedStatus;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.size();
    match app.screen {
        Screen::Login => draw_login(f, size, app),
        Screen::Main => draw_main(f, size, app),
    }
}

fn draw_login(f: &mut Frame, size: Rect, app: &App) {
    let area = center_rect(size, 56, 10);
    f.render_widget(Clear, area);

    let marker = |i: usize| if app.login.focus == i { "> " } else { "  " };
    let lines = vec![
        String::new(),
        format!("{}Email    : {}", marker(0), app.login.email.rendered()),
        format!("{}Password : {}", marker(1), app.login.password.rendered()),
        String::new(),
        "Tab: switch field | Enter: sign in | Esc: quit".into(),
        app.login.error.clone().unwrap_or_default(),
    ]
    .join("\n");

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("NestFunds | Sign in"));
    f.render_widget(p, area);
}

fn draw_main(f: &mut Frame, size: Rect, app: &mut App) {
    // top tabs | main content | bottom status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8), Constraint::Length(1)])
        .split(size);

    let who = app
        .api
        .actor()
        .map(|a| format!("NestFunds | {} ({})", a.name, a.role))
        .unwrap_or_else(|_| "NestFunds".into());
    let titles = app
        .tabs()
        .iter()
        .map(|t| Line::from(Span::raw(t.title())))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(app.tab_index())
        .block(Block::default().borders(Borders::ALL).title(who))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Dashboard if app.is_admin() => draw_admin_dashboard(f, root[1], app),
        Tab::Dashboard => draw_member_dashboard(f, root[1], app),
        Tab::Transactions => draw_transactions(f, root[1], app, true),
        Tab::Donations => draw_transactions(f, root[1], app, false),
        Tab::Services => draw_services(f, root[1], app),
        Tab::Members => draw_members(f, root[1], app),
        Tab::Committee if app.is_admin() => draw_committee_admin(f, root[1], app),
        Tab::Committee => draw_committee_member(f, root[1], app),
        Tab::Help => draw_help(f, root[1], app.is_admin()),
    }

    f.render_widget(Paragraph::new(app.status.clone()), root[2]);

    if app.form.is_some() {
        draw_form(f, root[1], app);
    }
}

fn table_block(title: String) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title)
}

fn highlight() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

// Dashboards

fn draw_admin_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let Some(d) = &app.admin_dash else {
        f.render_widget(Paragraph::new("Loading...").block(table_block("Dashboard".into())), area);
        return;
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(4)])
        .split(area);

    let s = &d.stats;
    let summary = vec![
        format!("Approved : {:>5}   {}", s.approved.count, fmt_money(&s.approved.amount)),
        format!("Pending  : {:>5}   {}", s.pending.count, fmt_money(&s.pending.amount)),
        format!("Rejected : {:>5}   {}", s.rejected.count, fmt_money(&s.rejected.amount)),
        format!("Active services: {} of {}", d.active_services, d.services.len()),
    ]
    .join("\n");
    f.render_widget(Paragraph::new(summary).block(table_block("Donations".into())), rows[0]);

    let body: Vec<Row> = d
        .services
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.name.clone()),
                Cell::from(fmt_money(&s.current_amount)),
                Cell::from(s.target_amount.as_ref().map(fmt_money).unwrap_or_else(|| "-".into())),
                Cell::from(
                    s.progress_percent()
                        .map(|p| format!("{}%", p.round_dp(0)))
                        .unwrap_or_else(|| "-".into()),
                ),
            ])
        })
        .collect();
    let table = Table::new(
        body,
        [
            Constraint::Percentage(40),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Service", "Raised", "Target", "Progress"]))
    .block(table_block("Services".into()));
    f.render_widget(table, rows[1]);
}

fn draw_member_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let Some(d) = &app.member_dash else {
        f.render_widget(Paragraph::new("Loading...").block(table_block("Dashboard".into())), area);
        return;
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(4)])
        .split(area);

    let summary = vec![
        format!("Total donated   : {}", fmt_money(&d.total_donated)),
        format!("Pending         : {}", d.pending_count),
        format!("Active services : {}", d.active_services),
    ]
    .join("\n");
    f.render_widget(Paragraph::new(summary).block(table_block("Overview".into())), rows[0]);

    let body: Vec<Row> = d
        .recent
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(fmt_date(&t.created_at)),
                Cell::from(t.service_name.clone()),
                Cell::from(fmt_money(&t.amount)),
                Cell::from(t.status.as_str()),
            ])
        })
        .collect();
    let table = Table::new(
        body,
        [
            Constraint::Length(12),
            Constraint::Percentage(50),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["Date", "Service", "Amount", "Status"]))
    .block(table_block("Recent donations".into()));
    f.render_widget(table, rows[1]);
}

// Donations

fn draw_transactions(f: &mut Frame, area: Rect, app: &mut App, admin: bool) {
    let body: Vec<Row> = app
        .transactions
        .iter()
        .map(|t| {
            let mut cells = vec![Cell::from(fmt_date(&t.created_at))];
            if admin {
                cells.push(Cell::from(t.user_name.clone()));
            }
            cells.extend([
                Cell::from(t.service_name.clone()),
                Cell::from(fmt_money(&t.amount)),
                Cell::from(t.status.as_str()),
                Cell::from(if t.payment_proof.is_some() { "yes" } else { "-" }),
                Cell::from(t.notes.clone().unwrap_or_default()),
            ]);
            Row::new(cells)
        })
        .collect();

    let (header, widths, title) = if admin {
        let filter = app.tx_filter.map_or("ALL", |s| s.as_str());
        (
            vec!["Date", "Member", "Service", "Amount", "Status", "Proof", "Notes"],
            vec![
                Constraint::Length(12),
                Constraint::Length(18),
                Constraint::Length(20),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Min(10),
            ],
            format!("Transactions [{filter}]  (a=approve, x=reject, f=filter, r=refresh)"),
        )
    } else {
        (
            vec!["Date", "Service", "Amount", "Status", "Proof", "Notes"],
            vec![
                Constraint::Length(12),
                Constraint::Length(24),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Min(10),
            ],
            "My donations".to_string(),
        )
    };

    let table = Table::new(body, widths)
        .header(Row::new(header))
        .block(table_block(title))
        .highlight_style(highlight());
    f.render_stateful_widget(table, area, &mut app.sel);
}

fn draw_services(f: &mut Frame, area: Rect, app: &mut App) {
    let body: Vec<Row> = app
        .services
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.name.clone()),
                Cell::from(s.service_type.as_str()),
                Cell::from(fmt_money(&s.current_amount)),
                Cell::from(s.target_amount.as_ref().map(fmt_money).unwrap_or_else(|| "-".into())),
                Cell::from(if s.is_active { "active" } else { "inactive" }),
                Cell::from(s.transaction_count.to_string()),
                Cell::from(s.description.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let title = if app.is_admin() {
        "Services  (n=new, e=edit, t=toggle active, d=delete)"
    } else {
        "Services  (Enter/d=donate)"
    };
    let table = Table::new(
        body,
        [
            Constraint::Length(22),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .header(Row::new(vec!["Name", "Type", "Raised", "Target", "State", "Count", "Description"]))
    .block(table_block(title.into()))
    .highlight_style(highlight());
    f.render_stateful_widget(table, area, &mut app.sel);
}

fn draw_members(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(dir) = &app.members else {
        f.render_widget(Paragraph::new("Loading...").block(table_block("Members".into())), area);
        return;
    };
    let body: Vec<Row> = dir
        .members
        .iter()
        .chain(dir.admins.iter())
        .map(|u| {
            Row::new(vec![
                Cell::from(u.name.clone()),
                Cell::from(u.email.clone()),
                Cell::from(u.role.as_str()),
                Cell::from(u.phone.clone().unwrap_or_default()),
                Cell::from(u.transaction_count.to_string()),
                Cell::from(fmt_date(&u.created_at)),
            ])
        })
        .collect();
    let title = format!(
        "Members: {}  Admins: {}  Donations: {}  (n=new)",
        dir.total_members, dir.total_admins, dir.total_donations
    );
    let table = Table::new(
        body,
        [
            Constraint::Length(20),
            Constraint::Length(28),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(12),
        ],
    )
    .header(Row::new(vec!["Name", "Email", "Role", "Phone", "Donations", "Joined"]))
    .block(table_block(title))
    .highlight_style(highlight());
    f.render_stateful_widget(table, area, &mut app.sel);
}

// Death committee

fn draw_committee_admin(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(area);

    let health = app
        .health
        .map(|h| {
            format!(
                "Collected {} ({} payments) | Paid out {} ({} payouts) | Net {}",
                fmt_money(&h.total_collected),
                h.subscription_count,
                fmt_money(&h.total_paid_out),
                h.payout_count,
                fmt_money(&h.net_balance)
            )
        })
        .unwrap_or_default();
    f.render_widget(Paragraph::new(health).block(table_block("Financial health".into())), rows[0]);

    let body: Vec<Row> = app
        .committee
        .iter()
        .map(|c| {
            let pending = c
                .detail
                .subscriptions
                .iter()
                .filter(|s| !s.is_paid && s.payment_proof.is_some())
                .count();
            let deceased = if c.detail.member.deceased_status == DeceasedStatus::Deceased {
                "DECEASED"
            } else {
                ""
            };
            Row::new(vec![
                Cell::from(c.detail.user_name.clone()),
                Cell::from(c.detail.user_email.clone()),
                Cell::from(fmt_money(&c.detail.member.monthly_fee)),
                Cell::from(c.detail.member.status.as_str()),
                Cell::from(pending.to_string()),
                Cell::from(c.detail.dependents.len().to_string()),
                Cell::from(c.payout_count.to_string()),
                Cell::from(deceased),
            ])
        })
        .collect();

    let filter = app.committee_filter.map_or("ALL", |s| s.as_str());
    let table = Table::new(
        body,
        [
            Constraint::Length(20),
            Constraint::Length(26),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(8),
        ],
    )
    .header(Row::new(vec![
        "Name", "Email", "Fee", "Status", "Pending", "Dependents", "Payouts", "",
    ]))
    .block(table_block(format!(
        "Members [{filter}]  (f=filter, a=approve payment, e=fee, p=payout)"
    )))
    .highlight_style(highlight());
    f.render_stateful_widget(table, rows[1], &mut app.sel);
}

fn draw_committee_member(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(mine) = &app.my_committee else {
        f.render_widget(Paragraph::new("Loading...").block(table_block("Death Committee".into())), area);
        return;
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let this_month = match &mine.current_subscription {
        Some(s) if s.is_paid => "paid".to_string(),
        Some(_) => "proof uploaded, waiting for approval".to_string(),
        None => "not paid".to_string(),
    };
    let mut lines = vec![
        format!("Monthly fee : {}", fmt_money(&mine.member.member.monthly_fee)),
        format!("Status      : {}", mine.balance.derived_status().as_str()),
        format!("Outstanding : {}", fmt_money(&mine.balance.total_outstanding)),
        format!("Overdue     : {} month(s)", mine.balance.overdue_count),
        format!("{}    : {}", fmt_month(mine.current_month), this_month),
        String::new(),
        "Dependents:".to_string(),
    ];
    lines.extend(mine.member.dependents.iter().map(|d| {
        let mark = if d.deceased_status == DeceasedStatus::Deceased { " (deceased)" } else { "" };
        format!("  {} - {}, {}{}", d.name, d.relation, d.age, mark)
    }));
    lines.push(String::new());
    lines.push("u=upload proof for this month, n=add dependent".into());

    let info = Paragraph::new(lines.join("\n"))
        .block(table_block("My membership".into()))
        .wrap(Wrap { trim: false });
    f.render_widget(info, cols[0]);

    let body: Vec<Row> = mine
        .member
        .subscriptions
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(format!("{} {}", month_name(s.month), s.year)),
                Cell::from(fmt_money(&s.amount)),
                Cell::from(if s.is_paid { "paid" } else { "pending" }),
                Cell::from(s.paid_at.as_ref().map(fmt_date).unwrap_or_default()),
            ])
        })
        .collect();
    let table = Table::new(
        body,
        [
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Min(10),
        ],
    )
    .header(Row::new(vec!["Month", "Amount", "State", "Paid on"]))
    .block(table_block("Subscriptions".into()))
    .highlight_style(highlight());
    f.render_stateful_widget(table, cols[1], &mut app.sel);
}

fn draw_form(f: &mut Frame, area: Rect, app: &App) {
    let Some(form) = &app.form else { return };
    let height = form.fields.len() as u16 + 6;
    let area = center_rect(area, 70, height);
    f.render_widget(Clear, area);

    let mut lines: Vec<String> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, fld)| {
            let marker = if i == form.focus { ">" } else { " " };
            format!("{marker} {:<30}: {}", fld.label, fld.input.rendered())
        })
        .collect();
    lines.push(String::new());
    lines.push("Tab/Up/Down: field | Enter: save | Esc: cancel".into());
    lines.push(form.error.clone().unwrap_or_default());

    let p = Paragraph::new(lines.join("\n")).block(table_block(form.title.clone()));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect, admin: bool) {
    let mut text = vec![
        "Global keys:",
        "  Tab / Left / Right : switch tabs",
        "  Up / Down          : move selection",
        "  r                  : refresh",
        "  o                  : sign out",
        "  q                  : quit",
        "",
    ];
    if admin {
        text.extend([
            "Transactions: a approve, x reject, f cycle status filter",
            "Services    : n new, e edit, t toggle active, d delete",
            "Members     : n new member or admin",
            "Committee   : f filter, a approve oldest pending payment,",
            "              e edit monthly fee, p record funeral payout",
        ]);
    } else {
        text.extend([
            "Services  : Enter or d to donate to the selected service",
            "Committee : u upload payment proof for this month, n add dependent",
        ]);
    }

    let p = Paragraph::new(text.join("\n")).block(table_block("Help & Keybindings".into()));
    f.render_widget(p, area);
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect {
        x,
        y,
        width: w.min(rect.width),
        height: h.min(rect.height),
    }
}
