use std::collections::HashSet;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{GameOverReason, GameSnapshot, Lifecycle, Position};
use crate::metrics::GameMetrics;

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Head,
    Body,
    Target,
    Empty,
}

/// Classify every cell of a snapshot, row by row
pub fn cell_grid(snapshot: &GameSnapshot) -> Vec<Vec<Cell>> {
    let body: HashSet<Position> = snapshot.body.iter().copied().collect();
    let head = snapshot.head();

    (0..snapshot.grid_height as i32)
        .map(|y| {
            (0..snapshot.grid_width as i32)
                .map(|x| {
                    let pos = Position::new(x, y);
                    if Some(pos) == head {
                        Cell::Head
                    } else if body.contains(&pos) {
                        Cell::Body
                    } else if Some(pos) == snapshot.target {
                        Cell::Target
                    } else {
                        Cell::Empty
                    }
                })
                .collect()
        })
        .collect()
}

/// Key hints for the controls that make sense in `lifecycle`
pub fn controls_for(lifecycle: Lifecycle) -> &'static [(&'static str, &'static str)] {
    match lifecycle {
        Lifecycle::Running => &[
            ("↑↓←→/WASD", "move"),
            ("Space", "pause"),
            ("X", "stop"),
            ("Q", "quit"),
        ],
        Lifecycle::Paused => &[
            ("↑↓←→/WASD", "steer"),
            ("Space", "resume"),
            ("X", "stop"),
            ("Q", "quit"),
        ],
        Lifecycle::Idle | Lifecycle::Stopped => &[("N", "new game"), ("Q", "quit")],
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame; `ended` is why the last game finished, if it did on its own
    pub fn render(
        &self,
        frame: &mut Frame,
        snapshot: &GameSnapshot,
        metrics: &GameMetrics,
        ended: Option<GameOverReason>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(snapshot, metrics);
        frame.render_widget(stats, chunks[0]);

        let game_area = centered(chunks[1], snapshot);

        match (snapshot.lifecycle, ended) {
            (Lifecycle::Idle, _) => frame.render_widget(self.render_welcome(), game_area),
            (Lifecycle::Stopped, Some(reason)) => {
                frame.render_widget(self.render_game_over(snapshot, reason), game_area)
            }
            _ => frame.render_widget(self.render_grid(snapshot), game_area),
        }

        let controls = self.render_controls(snapshot.lifecycle);
        frame.render_widget(controls, chunks[2]);
    }

    fn render_grid(&self, snapshot: &GameSnapshot) -> Paragraph<'_> {
        let lines: Vec<Line> = cell_grid(snapshot)
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|cell| match cell {
                            Cell::Head => Span::styled(
                                "■ ",
                                Style::default()
                                    .fg(Color::Yellow)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Cell::Body => Span::styled("■ ", Style::default().fg(Color::Green)),
                            Cell::Target => Span::styled(
                                "● ",
                                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                            ),
                            Cell::Empty => {
                                Span::styled("· ", Style::default().fg(Color::DarkGray))
                            }
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let (title, border) = match snapshot.lifecycle {
            Lifecycle::Paused => (" Snake · PAUSED ", Color::Yellow),
            Lifecycle::Stopped => (" Snake · STOPPED ", Color::Gray),
            _ => (" Snake ", Color::White),
        };

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(border))
                .title(title),
        )
    }

    fn render_stats(&self, snapshot: &GameSnapshot, metrics: &GameMetrics) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let text = vec![Line::from(vec![
            Span::styled("Length: ", label),
            Span::styled(
                snapshot.length().to_string(),
                value.add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(metrics.best_length.to_string(), value),
            Span::raw("    "),
            Span::styled("Tick: ", label),
            Span::styled(format!("{}ms", snapshot.tick_interval.as_millis()), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(metrics.format_time(), value),
            Span::raw("    "),
            Span::styled("Games: ", label),
            Span::styled(metrics.games_played.to_string(), value),
        ])];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM))
    }

    fn render_welcome(&self) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "SNAKE",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("The edges wrap around. Don't bite yourself."),
            Line::from("Press your current direction again to dash."),
            Line::from(""),
            press_to(&[("N", Color::Green, "start"), ("Q", Color::Red, "quit")]),
        ];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }

    fn render_game_over(&self, snapshot: &GameSnapshot, reason: GameOverReason) -> Paragraph<'_> {
        let (headline, color) = match reason {
            GameOverReason::Collision => ("GAME OVER", Color::Red),
            GameOverReason::BoardFilled => ("BOARD FILLED - YOU WIN", Color::Green),
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                headline,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Length: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    snapshot.length().to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            press_to(&[("N", Color::Green, "play again"), ("Q", Color::Red, "quit")]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
    }

    fn render_controls(&self, lifecycle: Lifecycle) -> Paragraph<'_> {
        let mut spans = Vec::new();
        for (i, (key, action)) in controls_for(lifecycle).iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" | "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(format!(" {action}")));
        }

        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// "Press N to start or Q to quit"
fn press_to(keys: &[(&'static str, Color, &'static str)]) -> Line<'static> {
    let mut spans = vec![Span::styled("Press ", Style::default().fg(Color::Gray))];
    for (i, (key, color, action)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" or ", Style::default().fg(Color::Gray)));
        }
        spans.push(Span::styled(
            *key,
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" to {action}"),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

/// Fit the board (two columns per cell plus borders) in the middle of `area`
fn centered(area: Rect, snapshot: &GameSnapshot) -> Rect {
    let width = (snapshot.grid_width as u16 * 2 + 2).min(area.width);
    let height = (snapshot.grid_height as u16 + 2).min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Direction;
    use std::time::Duration;

    fn snapshot(lifecycle: Lifecycle) -> GameSnapshot {
        GameSnapshot {
            body: vec![Position::new(2, 1), Position::new(1, 1), Position::new(0, 1)],
            target: Some(Position::new(3, 3)),
            heading: Direction::Right,
            lifecycle,
            tick_interval: Duration::from_millis(390),
            grid_width: 10,
            grid_height: 10,
            targets_reached: 0,
            steps: 0,
            game_over: None,
        }
    }

    #[test]
    fn test_cell_grid_marks_head_body_and_target() {
        let grid = cell_grid(&snapshot(Lifecycle::Running));
        assert_eq!(grid.len(), 10);
        assert_eq!(grid[0].len(), 10);

        assert_eq!(grid[1][2], Cell::Head);
        assert_eq!(grid[1][1], Cell::Body);
        assert_eq!(grid[1][0], Cell::Body);
        assert_eq!(grid[3][3], Cell::Target);
        assert_eq!(grid[0][0], Cell::Empty);

        let heads = grid.iter().flatten().filter(|c| **c == Cell::Head).count();
        assert_eq!(heads, 1);
    }

    #[test]
    fn test_cell_grid_without_target() {
        let mut snap = snapshot(Lifecycle::Stopped);
        snap.target = None;
        let grid = cell_grid(&snap);
        assert!(!grid.iter().flatten().any(|c| *c == Cell::Target));
    }

    #[test]
    fn test_controls_follow_lifecycle() {
        fn keys(lifecycle: Lifecycle) -> Vec<&'static str> {
            controls_for(lifecycle).iter().map(|(key, _)| *key).collect()
        }

        assert_eq!(keys(Lifecycle::Idle), vec!["N", "Q"]);
        assert_eq!(keys(Lifecycle::Stopped), vec!["N", "Q"]);
        assert!(keys(Lifecycle::Running).contains(&"X"));
        assert!(!keys(Lifecycle::Running).contains(&"N"));
        assert!(keys(Lifecycle::Paused).contains(&"Space"));
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let snap = snapshot(Lifecycle::Running);
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered(area, &snap);
        assert_eq!(rect.width, 22);
        assert_eq!(rect.height, 12);
        assert_eq!(rect.x, 39);

        let tiny = Rect::new(0, 0, 10, 5);
        let rect = centered(tiny, &snap);
        assert_eq!(rect, tiny);
    }
}
