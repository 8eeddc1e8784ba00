use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::Shortcut;

/// Draw the header bar with title, API host, page and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  api_url: &str,
  page: &str,
  shortcuts: &[Shortcut],
) {
  let domain = extract_domain(api_url);

  let mut spans = vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];
  // The title defaults to the API host
  if domain != title {
    spans.push(Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)));
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
  }
  spans.push(Span::styled(format!(" {} ", page), Style::default().fg(Color::Yellow).bold()));
  spans.push(Span::raw(" "));

  // Keys highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host part of the API endpoint
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(
      extract_domain("https://api.readflow.app/graphql"),
      "api.readflow.app"
    );
    assert_eq!(extract_domain("http://localhost:8080/graphql"), "localhost:8080");
    assert_eq!(extract_domain("readflow.local"), "readflow.local");
  }
}
