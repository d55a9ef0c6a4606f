use iced::widget::{
    button, column, container, horizontal_rule, pick_list, row, scrollable, text, text_input,
    Column, Row, Space,
};
use iced::{alignment, Color, Element, Font, Length};

use crate::export::ExportFormat;
use crate::layout::{LayoutMode, Presentation, RenderPlan};
use crate::logging;
use crate::markdown::{self, Block};
use crate::model::{AnalysisReport, DrivingForce, Market, StockSuggestion};
use crate::prompts::PRESET_QUERIES;
use crate::state::RadarState;
use crate::Message;

const GOLD: Color = Color::from_rgb(0.79, 0.54, 0.09);
const MUTED: Color = Color::from_rgb(0.63, 0.63, 0.67);
const DANGER: Color = Color::from_rgb(0.94, 0.33, 0.31);

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn force_color(force: DrivingForce) -> Color {
    match force {
        DrivingForce::Energy => Color::from_rgb8(0xfd, 0xba, 0x74),
        DrivingForce::Labor => Color::from_rgb8(0x7d, 0xd3, 0xfc),
        DrivingForce::Geopolitics => Color::from_rgb8(0xf8, 0x71, 0x71),
        DrivingForce::Assets => Color::from_rgb8(0x6e, 0xe7, 0xb7),
        DrivingForce::Agency => Color::from_rgb8(0xc4, 0xb5, 0xfd),
    }
}

fn section_label(label: &str) -> Element<'_, Message> {
    text(label).size(12).color(GOLD).into()
}

fn panel<'a>(content: impl Into<Element<'a, Message>>, plan: &RenderPlan) -> Element<'a, Message> {
    container(content)
        .padding(plan.padding)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

/// Lay items out in rows of `columns`.
fn grid<'a>(items: Vec<Element<'a, Message>>, columns: usize) -> Element<'a, Message> {
    let columns = columns.max(1);
    let mut rows = Column::new().spacing(12);
    let mut current = Row::new().spacing(12);
    let mut count = 0;

    for item in items {
        current = current.push(container(item).width(Length::FillPortion(1)));
        count += 1;
        if count == columns {
            rows = rows.push(current);
            current = Row::new().spacing(12);
            count = 0;
        }
    }
    if count > 0 {
        for _ in count..columns {
            current = current.push(Space::with_width(Length::FillPortion(1)));
        }
        rows = rows.push(current);
    }
    rows.into()
}

fn spinner<'a>(frame: usize, caption: &'a str) -> Element<'a, Message> {
    container(
        column![
            text(SPINNER[frame % SPINNER.len()]).size(32).color(GOLD),
            text(caption).size(14).color(GOLD),
        ]
        .spacing(10)
        .align_x(alignment::Horizontal::Center),
    )
    .width(Length::Fill)
    .padding(80)
    .align_x(alignment::Horizontal::Center)
    .into()
}

pub fn header<'a>(state: &'a RadarState, plan: &RenderPlan) -> Element<'a, Message> {
    let title = column![
        text("GLOBAL TREND RADAR").size(11).color(GOLD).font(Font::MONOSPACE),
        text("全球趨勢雷達").size(plan.title_size),
        text("格柵思維 · 戰略分析系統").size(12).color(MUTED),
    ]
    .spacing(4);

    let mode = pick_list(LayoutMode::ALL, Some(state.layout_mode), Message::LayoutModeSelected)
        .text_size(13);

    let current = match plan.presentation {
        Presentation::Desktop => "版面 · 桌面",
        Presentation::Mobile => "版面 · 行動",
    };

    row![title, Space::with_width(Length::Fill), text(current).size(13).color(MUTED), mode]
        .spacing(10)
        .align_y(alignment::Vertical::Center)
        .into()
}

fn input_panel<'a>(state: &'a RadarState, plan: &RenderPlan) -> Element<'a, Message> {
    let input = text_input("在此輸入您觀察到的市場趨勢、技術變化或關鍵信號...", &state.query)
        .on_input(Message::QueryChanged)
        .on_submit(Message::Submit)
        .padding(14)
        .size(plan.body_size + 2.0);

    let scan_label = if state.scanning { "數據解構中..." } else { "啟動深度掃描" };
    let scan = button(text(scan_label).size(16))
        .on_press_maybe((!state.scanning).then_some(Message::Submit))
        .padding(12)
        .width(Length::Fill)
        .style(button::primary);

    let presets = PRESET_QUERIES.iter().enumerate().fold(
        Column::new().spacing(6),
        |col, (i, q)| {
            col.push(
                button(text(*q).size(13))
                    .on_press(Message::PresetSelected(i))
                    .width(Length::Fill)
                    .padding(10)
                    .style(button::secondary),
            )
        },
    );

    column![
        section_label("輸入趨勢信號"),
        input,
        scan,
        Space::with_height(8),
        section_label("掃描範本"),
        presets,
        Space::with_height(8),
        history_panel(state),
    ]
    .spacing(10)
    .into()
}

fn history_panel(state: &RadarState) -> Element<'_, Message> {
    let history = state.history();
    let heading = row![
        text(format!("歷史紀錄 ({}/{})", history.len(), crate::history::HISTORY_LIMIT))
            .size(12)
            .color(GOLD),
        Space::with_width(Length::Fill),
        button(text("清除").size(12))
            .on_press_maybe((!history.is_empty()).then_some(Message::ClearHistory))
            .style(button::text),
    ]
    .align_y(alignment::Vertical::Center);

    if history.is_empty() {
        return column![heading, text("尚無掃描紀錄").size(13).color(MUTED)]
            .spacing(6)
            .into();
    }

    let active = state.result.as_ref().map(|r| r.id.as_str());
    let entries = history.entries().iter().fold(Column::new().spacing(4), |col, report| {
        let stamp = report
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%m/%d %H:%M")
            .to_string();
        let style = if active == Some(report.id.as_str()) {
            button::primary
        } else {
            button::secondary
        };
        col.push(
            row![
                button(
                    column![
                        text(report.title.as_str()).size(13),
                        text(stamp).size(11).font(Font::MONOSPACE),
                    ]
                    .spacing(2)
                )
                .on_press(Message::SelectHistory(report.id.clone()))
                .width(Length::Fill)
                .padding(8)
                .style(style),
                button(text("✕").size(12))
                    .on_press(Message::RemoveHistory(report.id.clone()))
                    .padding(8)
                    .style(button::text),
            ]
            .spacing(4)
            .align_y(alignment::Vertical::Center),
        )
    });

    column![heading, entries].spacing(6).into()
}

fn thought_panel<'a>(report: &'a AnalysisReport, state: &'a RadarState, plan: &RenderPlan) -> Element<'a, Message> {
    let arrow = if state.show_thought { "▲" } else { "▼" };
    let toggle = button(
        row![
            text("格柵思維推演過程 (REASONING)").size(12).color(GOLD),
            Space::with_width(Length::Fill),
            text(arrow).size(12).color(GOLD),
        ]
    )
    .on_press(Message::ToggleThought)
    .width(Length::Fill)
    .style(button::text);

    let mut content = column![toggle].spacing(12);
    if state.show_thought {
        content = content.push(horizontal_rule(1));
        content = content.push(text(report.thought.as_str()).size(plan.body_size));
    }
    panel(content, plan)
}

fn stock_card<'a>(stock: &'a StockSuggestion, plan: &RenderPlan) -> Element<'a, Message> {
    let body = column![
        row![
            column![
                text(stock.ticker.as_str()).size(28).color(GOLD),
                text(stock.name.as_str()).size(16),
            ]
            .spacing(2),
            Space::with_width(Length::Fill),
            text(format!("風險等級: {}", stock.risk_level)).size(12).color(DANGER),
        ],
        text(stock.logic.as_str()).size(plan.body_size),
        text(stock.correlated_force.label()).size(12).color(force_color(stock.correlated_force)),
        horizontal_rule(1),
        text(format!("⚠ {}", stock.risk)).size(13).color(MUTED),
    ]
    .spacing(10);
    panel(body, plan)
}

fn report_view<'a>(report: &'a AnalysisReport, state: &'a RadarState, plan: &RenderPlan) -> Element<'a, Message> {
    let mut sections = Column::new().spacing(18);

    if !report.thought.is_empty() {
        sections = sections.push(thought_panel(report, state, plan));
    }

    let forces: Vec<Element<Message>> = report
        .forces
        .iter()
        .map(|(force, detail)| {
            button(
                column![
                    text(force.label()).size(13).color(force_color(force)),
                    text(detail.description.as_str()).size(plan.body_size - 1.0).color(MUTED),
                ]
                .spacing(8),
            )
            .on_press(Message::SelectForce(force))
            .width(Length::Fill)
            .padding(14)
            .style(button::secondary)
            .into()
        })
        .collect();

    let article_label = if state.article.content.is_some() {
        "進入深度趨勢專題"
    } else {
        "生成深度趨勢專題"
    };
    let mut article_row = column![button(text(article_label).size(16))
        .on_press(Message::GenerateArticle)
        .padding(14)
        .style(button::primary)]
    .spacing(6)
    .align_x(alignment::Horizontal::Center);
    if state.article.content.is_some() {
        article_row = article_row.push(text("專題已編織完成").size(12).color(GOLD));
    }

    let insight = column![
        row![
            text(format!("新鮮度: {} / 10", report.data_freshness.score)).size(12).color(GOLD),
            text(
                report
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%Y/%m/%d 系統快照")
                    .to_string()
            )
            .size(12)
            .color(MUTED)
            .font(Font::MONOSPACE),
        ]
        .spacing(16),
        text(format!(
            "{} · {}",
            report.data_freshness.reason, report.data_freshness.last_updated_info
        ))
        .size(12)
        .color(MUTED),
        text(report.title.as_str()).size(plan.title_size),
        text(report.summary.as_str()).size(plan.body_size + 3.0),
        grid(forces, plan.force_columns),
        container(article_row).width(Length::Fill).align_x(alignment::Horizontal::Center),
    ]
    .spacing(16);
    sections = sections.push(panel(insight, plan));

    let tabs = Market::ALL.iter().fold(Row::new().spacing(6), |r, market| {
        let style = if *market == state.market { button::primary } else { button::secondary };
        r.push(
            button(text(market.label()).size(14))
                .on_press(Message::SelectMarket(*market))
                .padding([6, 18])
                .style(style),
        )
    });
    let stocks: Vec<Element<Message>> = report
        .investments
        .for_market(state.market)
        .iter()
        .map(|s| stock_card(s, plan))
        .collect();
    let stocks = if stocks.is_empty() {
        text("此市場暫無建議標的").size(13).color(MUTED).into()
    } else {
        grid(stocks, plan.stock_columns)
    };
    let allocation = column![
        row![
            column![
                text("核心戰略佈局").size(24),
                text("Strategic Allocation").size(11).color(GOLD),
            ],
            Space::with_width(Length::Fill),
            tabs,
        ]
        .align_y(alignment::Vertical::Center),
        text(report.investments.strategic_summary.as_str()).size(plan.body_size),
        stocks,
    ]
    .spacing(16);
    sections = sections.push(panel(allocation, plan));

    let inversion = vec![
        panel(
            column![
                text("證偽協議 (INVERSION)").size(12).color(DANGER),
                text(report.inversion.falsification.as_str()).size(plan.body_size + 1.0),
            ]
            .spacing(10),
            plan,
        ),
        panel(
            column![
                text("邊界約束 (CONSTRAINTS)").size(12).color(GOLD),
                text(report.inversion.physical_limits.as_str()).size(plan.body_size + 1.0),
            ]
            .spacing(10),
            plan,
        ),
    ];
    sections = sections.push(grid(inversion, plan.force_columns));

    if !report.sources.is_empty() {
        let sources = report.sources.iter().fold(Column::new().spacing(4), |col, source| {
            let title = source.title.as_deref().unwrap_or_default();
            let uri = source.uri.clone().unwrap_or_default();
            col.push(
                button(
                    column![
                        text(title).size(13),
                        text(uri.clone()).size(11).color(MUTED).font(Font::MONOSPACE),
                    ]
                    .spacing(2),
                )
                .on_press(Message::CopyText(uri))
                .width(Length::Fill)
                .style(button::text),
            )
        });
        sections = sections.push(panel(
            column![section_label("搜尋接地來源 (點擊複製連結)"), sources].spacing(10),
            plan,
        ));
    }

    sections.into()
}

fn results_panel<'a>(state: &'a RadarState, plan: &RenderPlan, frame: usize) -> Element<'a, Message> {
    let mut content = Column::new().spacing(16);

    if let Some(error) = &state.error {
        content = content.push(
            container(text(error.as_str()).size(15).color(DANGER))
                .padding(16)
                .width(Length::Fill)
                .style(container::bordered_box),
        );
    }

    if state.scanning {
        content = content.push(spinner(frame, "格柵思維引擎分析中..."));
    } else if let Some(report) = &state.result {
        content = content.push(report_view(report, state, plan));
    } else {
        content = content.push(
            container(text("請輸入信號，開啟趨勢解構").size(13).color(MUTED))
                .width(Length::Fill)
                .padding(80)
                .align_x(alignment::Horizontal::Center),
        );
    }

    content.into()
}

pub fn dashboard<'a>(state: &'a RadarState, plan: &RenderPlan, frame: usize) -> Element<'a, Message> {
    let body: Element<Message> = if plan.side_panel {
        row![
            container(input_panel(state, plan)).width(Length::FillPortion(4)),
            container(results_panel(state, plan, frame)).width(Length::FillPortion(8)),
        ]
        .spacing(24)
        .into()
    } else {
        column![input_panel(state, plan), results_panel(state, plan, frame)]
            .spacing(20)
            .into()
    };

    scrollable(container(body).padding([0.0, plan.padding / 2.0]))
        .height(Length::Fill)
        .into()
}

pub fn force_detail<'a>(
    report: &'a AnalysisReport,
    force: DrivingForce,
    plan: &RenderPlan,
) -> Element<'a, Message> {
    let detail = report.forces.get(force);
    let close = button(text("✕ 返回").size(14))
        .on_press(Message::CloseModals)
        .style(button::text);

    let evidence = vec![
        column![
            section_label("實證數據"),
            text(detail.empirical_data.as_str()).size(plan.body_size).color(MUTED),
        ]
        .spacing(8)
        .into(),
        column![
            section_label("演進路徑"),
            text(detail.future_path.as_str()).size(plan.body_size).color(MUTED),
        ]
        .spacing(8)
        .into(),
    ];

    let content = column![
        row![
            text(force.label()).size(plan.title_size).color(force_color(force)),
            Space::with_width(Length::Fill),
            close,
        ]
        .align_y(alignment::Vertical::Center),
        horizontal_rule(1),
        section_label("底層邏輯解構"),
        text(detail.detailed_analysis.as_str()).size(plan.body_size + 4.0),
        horizontal_rule(1),
        grid(evidence, plan.force_columns),
    ]
    .spacing(18);

    scrollable(panel(content, plan)).height(Length::Fill).into()
}

fn article_blocks<'a>(article: &str, plan: &RenderPlan) -> Element<'a, Message> {
    markdown::blocks(article)
        .into_iter()
        .fold(Column::new().spacing(14), |col, block| {
            let element: Element<Message> = match block {
                Block::Heading(level, t) => {
                    let size = match level {
                        1 => plan.title_size,
                        2 => plan.title_size * 0.75,
                        _ => plan.body_size + 3.0,
                    };
                    text(t).size(size).color(if level == 1 { Color::WHITE } else { GOLD }).into()
                }
                Block::Paragraph(t) => text(t).size(plan.body_size + 1.0).into(),
                Block::Quote(t) => container(text(t).size(plan.body_size + 1.0).color(MUTED))
                    .padding([8, 16])
                    .width(Length::Fill)
                    .style(container::bordered_box)
                    .into(),
                Block::ListItem(t) => row![text("•").color(GOLD), text(t).size(plan.body_size + 1.0)]
                    .spacing(8)
                    .into(),
                Block::Rule => horizontal_rule(1).into(),
            };
            col.push(element)
        })
        .into()
}

pub fn article<'a>(state: &'a RadarState, plan: &RenderPlan, frame: usize) -> Element<'a, Message> {
    let mut actions = Row::new().spacing(12).align_y(alignment::Vertical::Center);
    actions = actions.push(
        button(text("← 返回面板").size(14))
            .on_press(Message::CloseModals)
            .style(button::text),
    );
    actions = actions.push(Space::with_width(Length::Fill));
    if state.article.content.is_some() {
        actions = actions
            .push(button(text("複製").size(13)).on_press(Message::CopyArticle).style(button::secondary))
            .push(
                button(text("下載 Word (.doc)").size(13))
                    .on_press(Message::ExportArticle(ExportFormat::Word))
                    .style(button::secondary),
            )
            .push(
                button(text("下載純文字 (.txt)").size(13))
                    .on_press(Message::ExportArticle(ExportFormat::PlainText))
                    .style(button::secondary),
            );
    }

    let heading = column![
        text("深度趨勢專題報告").size(plan.title_size * 0.8),
        text("Synthesis Analysis Report").size(11).color(GOLD).font(Font::MONOSPACE),
    ]
    .spacing(4);

    let body: Element<Message> = match (&state.article.content, state.article.generating) {
        (Some(content), _) => column![
            article_blocks(content, plan),
            horizontal_rule(1),
            container(text("閱讀完畢 · 建議即刻進行戰略反思").size(14).color(MUTED))
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
        ]
        .spacing(24)
        .into(),
        (None, true) => spinner(frame, "正在編織深度論述，請稍候..."),
        (None, false) => {
            let failure = state.article_failure();
            let retry_label = if failure.is_some() { "重新生成" } else { "生成專題" };
            let mut idle = Column::new().spacing(16).align_x(alignment::Horizontal::Center);
            idle = match failure {
                Some(error) => idle.push(text(error).size(15).color(DANGER)),
                None => idle.push(text("專題尚未生成").size(14).color(MUTED)),
            };
            idle = idle.push(
                button(text(retry_label).size(14))
                    .on_press_maybe(state.result.is_some().then_some(Message::GenerateArticle))
                    .padding([8, 20])
                    .style(button::primary),
            );
            container(idle)
                .width(Length::Fill)
                .padding(40)
                .align_x(alignment::Horizontal::Center)
                .into()
        }
    };

    column![
        actions,
        heading,
        horizontal_rule(1),
        scrollable(container(body).padding(plan.padding)).height(Length::Fill),
    ]
    .spacing(12)
    .into()
}

pub fn status_bar<'a>() -> Element<'a, Message> {
    let line = logging::recent(1)
        .first()
        .map(logging::Entry::status_line)
        .unwrap_or_else(|| "搜尋接地：開啟 · 偵測模式：即時數據".to_string());
    text(line).size(11).color(MUTED).font(Font::MONOSPACE).into()
}
