use crate::session::{format_size, ConnectionState, Device, JobAction};
use crate::ui::app::{App, FocusPane, FormField, InputMode};
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// How many activity entries fit the bottom pane.
const ACTIVITY_ROWS: u16 = 6;

pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.bg).fg(theme.fg)),
        frame.area(),
    );

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                 // Header
            Constraint::Min(8),                    // Body
            Constraint::Length(3),                 // Progress
            Constraint::Length(1),                 // Status line
            Constraint::Length(ACTIVITY_ROWS + 2), // Activity
            Constraint::Length(1),                 // Footer
        ])
        .split(frame.area());

    render_header(frame, app, main_chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(main_chunks[1]);

    render_devices(frame, app, body_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(body_chunks[1]);

    render_form(frame, app, right_chunks[0]);
    render_device_details(frame, app, right_chunks[1]);
    render_progress(frame, app, main_chunks[2]);
    render_status(frame, app, main_chunks[3]);
    render_activity(frame, app, main_chunks[4]);
    render_footer(frame, app, main_chunks[5]);

    match app.mode {
        InputMode::Confirm(action) => render_confirm(frame, app, action),
        InputMode::Help => render_help(frame, theme),
        InputMode::Normal | InputMode::EditingImage => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let state = app.console.connection_state();

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "  WebBoot Console  ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.endpoint.clone(), Style::default().fg(theme.fg_dim)),
        Span::raw("  "),
        Span::styled(
            format!("● {}", state),
            Style::default()
                .fg(theme.connection_color(state))
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent)),
    );

    frame.render_widget(header, area);
}

fn border_style(theme: &Theme, focused: bool) -> Style {
    if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.fg_dim)
    }
}

fn device_line(device: &Device) -> String {
    let mut line = device.name.clone();
    if let Some(size) = device.size {
        line.push_str(&format!("  {}", format_size(size)));
    }
    if let Some(label) = &device.label {
        line.push_str(&format!("  [{}]", label));
    }
    line
}

fn render_devices(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let catalog = app.console.catalog();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" USB Devices ({}) ", catalog.devices().len()))
        .border_style(border_style(theme, app.focus == FocusPane::Devices));

    if catalog.is_empty() {
        let hint = if catalog.snapshots() == 0 {
            "Waiting for the companion to report devices..."
        } else {
            "No USB devices detected"
        };
        let empty = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(theme.fg_dim),
        )))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = catalog
        .devices()
        .iter()
        .map(|device| {
            let mut spans = vec![Span::raw(device_line(device))];
            if device.is_mounted() {
                spans.push(Span::styled(
                    "  mounted",
                    Style::default().fg(theme.warning),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(theme.fg))
        .highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = ListState::default().with_selected(catalog.selected_index());
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let form = app.console.form();
    let focused = app.focus == FocusPane::Form;

    let field_style = |field: FormField| {
        if focused && app.form_field == field {
            Style::default()
                .fg(theme.highlight)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.fg)
        }
    };
    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.fg_dim));

    let image_line = if app.mode == InputMode::EditingImage {
        Line::from(vec![
            label("ISO image:   "),
            Span::styled(
                format!("{}▏", app.image_input),
                Style::default().fg(theme.highlight),
            ),
        ])
    } else {
        Line::from(vec![
            label("ISO image:   "),
            Span::styled(
                form.image().unwrap_or("(none)").to_string(),
                field_style(FormField::Image),
            ),
        ])
    };

    let mut lines = vec![
        image_line,
        Line::from(vec![
            label("Filesystem:  "),
            Span::styled(form.filesystem.label(), field_style(FormField::Filesystem)),
        ]),
        Line::from(vec![
            label("Partition:   "),
            Span::styled(form.scheme.label(), field_style(FormField::Scheme)),
        ]),
    ];

    match &app.input_error {
        Some(error) => lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        ))),
        None => {
            let (text, color) = if app.console.actions_enabled() {
                ("[c] Create bootable USB  [r] Restore USB", theme.success)
            } else {
                ("Create / Restore unavailable", theme.fg_dim)
            };
            lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
        }
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Job ")
            .border_style(border_style(theme, focused)),
    );

    frame.render_widget(paragraph, area);
}

fn render_device_details(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let dim = Style::default().fg(theme.fg_dim);

    let lines = match app.console.selected_device() {
        None => vec![Line::from(Span::styled("No device selected", dim))],
        Some(device) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    device.name.clone(),
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![Span::styled("Id:       ", dim), Span::raw(device.id.clone())]),
            ];
            if let (Some(vendor), Some(product)) = (device.vendor_id, device.product_id) {
                lines.push(Line::from(vec![
                    Span::styled("USB:      ", dim),
                    Span::raw(format!("{:04x}:{:04x}", vendor, product)),
                ]));
            }
            if let Some(mount_point) = &device.mount_point {
                lines.push(Line::from(vec![
                    Span::styled("Mounted:  ", dim),
                    Span::styled(mount_point.clone(), Style::default().fg(theme.warning)),
                ]));
            }
            lines.push(Line::from(""));
            lines.extend(verification_lines(app));
            lines
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Device ")
                .border_style(Style::default().fg(theme.fg_dim)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn verification_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let dim = Style::default().fg(theme.fg_dim);

    if app.console.is_verifying() {
        return vec![Line::from(Span::styled(
            "Verifying device...",
            Style::default().fg(theme.warning),
        ))];
    }
    if let Some(error) = app.console.verification_failure() {
        return vec![Line::from(Span::styled(
            format!("Verification failed: {}", error),
            Style::default().fg(theme.warning),
        ))];
    }
    let Some(info) = app.console.device_info() else {
        return Vec::new();
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Verified: ", dim),
            Span::styled(info.path.clone(), Style::default().fg(theme.success)),
        ]),
        Line::from(vec![
            Span::styled("Size:     ", dim),
            Span::raw(format_size(info.size)),
        ]),
        Line::from(vec![
            Span::styled("Format:   ", dim),
            Span::raw(info.filesystem.clone().unwrap_or_else(|| "unknown".to_string())),
        ]),
    ];
    if info.mounted {
        lines.push(Line::from(Span::styled(
            format!("In use at {}", info.mount_points.join(", ")),
            Style::default().fg(theme.warning),
        )));
    }
    lines
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let progress = app.console.progress();

    let label = if progress.operation.is_empty() {
        format!("{}%", progress.percent)
    } else {
        format!("{}  {}%", progress.operation, progress.percent)
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Progress ")
                .border_style(Style::default().fg(theme.fg_dim)),
        )
        .gauge_style(Style::default().fg(theme.highlight).bg(theme.selection_bg))
        .ratio(progress.ratio())
        .label(label);

    frame.render_widget(gauge, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let color = match app.console.connection_state() {
        ConnectionState::Errored => theme.error,
        _ => theme.fg,
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" Status: ", Style::default().fg(theme.fg_dim)),
        Span::styled(app.console.status().to_string(), Style::default().fg(color)),
    ]));
    frame.render_widget(status, area);
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let items: Vec<ListItem> = app
        .console
        .activity()
        .recent()
        .take(usize::from(ACTIVITY_ROWS))
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    entry.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(theme.fg_dim),
                ),
                Span::styled(
                    entry.message.clone(),
                    Style::default().fg(theme.activity_color(entry.kind)),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(theme.fg_dim)),
    );
    frame.render_widget(list, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.mode {
        InputMode::EditingImage => "[Enter] Accept  [Esc] Cancel  (path to an .iso file)",
        InputMode::Confirm(_) => "[y] Confirm  [n/Esc] Cancel",
        InputMode::Help => "[any key] Close help",
        InputMode::Normal => match app.focus {
            FocusPane::Devices => {
                "[↑↓/jk] Device  [Tab] Form  [i] Image  [f] Filesystem  [s] Scheme  [c] Create  [r] Restore  [R] Reconnect  [?] Help  [q] Quit"
            }
            FocusPane::Form => {
                "[↑↓/jk] Field  [Enter] Edit  [Tab] Devices  [c] Create  [r] Restore  [?] Help  [q] Quit"
            }
        },
    };

    let footer = Paragraph::new(help_text).style(Style::default().fg(app.theme.fg_dim));
    frame.render_widget(footer, area);
}

/// A rectangle of the given size centered in `area`, clipped to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_confirm(frame: &mut Frame, app: &App, action: JobAction) {
    let theme = &app.theme;
    let dim = Style::default().fg(theme.fg_dim);
    let area = centered_rect(64, 12, frame.area());

    let (title, verb) = match action {
        JobAction::Create => (" Create bootable USB ", "ERASE and write the image to"),
        JobAction::Restore => (" Restore USB ", "ERASE and reformat"),
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("This will {}:", verb),
        Style::default().fg(theme.fg),
    ))];

    if let Some(device) = app.console.selected_device() {
        lines.push(Line::from(Span::styled(
            format!("  {}", device_line(device)),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![Span::styled("  Id: ", dim), Span::raw(device.id.clone())]));
        let mounted = device.is_mounted()
            || app.console.device_info().is_some_and(|info| info.mounted);
        if mounted {
            lines.push(Line::from(Span::styled(
                "  Warning: this device is mounted and will be refused until unmounted",
                Style::default().fg(theme.warning),
            )));
        }
    }

    let form = app.console.form();
    lines.push(Line::from(""));
    if action.requires_image() {
        lines.push(Line::from(vec![
            Span::styled("Image:      ", dim),
            Span::raw(form.image().unwrap_or_default().to_string()),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Filesystem: ", dim),
        Span::raw(format!("{} / {}", form.filesystem, form.scheme)),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "All data on the device will be lost. Continue? [y/n]",
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
    )));

    let modal = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme.error))
                .style(Style::default().bg(theme.bg)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(modal, area);
}

fn render_help(frame: &mut Frame, theme: &Theme) {
    let area = centered_rect(56, 17, frame.area());
    let key = |k: &'static str| Span::styled(k, Style::default().fg(theme.accent));

    let rows = [
        ("  j/k, ↑/↓  ", "Select device / form field"),
        ("  Tab       ", "Switch between devices and form"),
        ("  Enter     ", "Edit the focused form field"),
        ("  i         ", "Enter the ISO image path"),
        ("  f         ", "Cycle filesystem"),
        ("  s         ", "Cycle partition scheme"),
        ("  c         ", "Create bootable USB"),
        ("  r         ", "Restore USB to a plain drive"),
        ("  R         ", "Reconnect to the companion"),
        ("  ?         ", "Toggle this help"),
        ("  q         ", "Quit"),
    ];

    let mut lines = vec![Line::from("")];
    lines.extend(
        rows.iter()
            .map(|(k, desc)| Line::from(vec![key(*k), Span::raw(*desc)])),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  The companion app must be running to write devices.",
        Style::default().fg(theme.fg_dim),
    )));

    let modal = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Keys ")
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.bg).fg(theme.fg)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(modal, area);
}
