/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "articles",
    aliases: &["a", "unread"],
    description: "Articles to read",
  },
  Command {
    name: "history",
    aliases: &["h", "read"],
    description: "Articles already read",
  },
  Command {
    name: "article",
    aliases: &["open"],
    description: "Open an article by id (article <id>)",
  },
  Command {
    name: "categories",
    aliases: &["c", "category"],
    description: "Manage categories",
  },
  Command {
    name: "rules",
    aliases: &["r", "rule", "settings"],
    description: "Manage classification rules",
  },
  Command {
    name: "reset",
    aliases: &["clear"],
    description: "Clear the local cache and reload",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit readflow-tui",
  },
];

/// Split command input into the command word and its argument
pub fn split_input(input: &str) -> (&str, &str) {
  let input = input.trim();
  match input.split_once(char::is_whitespace) {
    Some((cmd, arg)) => (cmd, arg.trim()),
    None => (input, ""),
  }
}

/// Get autocomplete suggestions for a given input.
///
/// Only the command word is matched; anything after it is an argument.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = split_input(input).0.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("categories");
    assert_eq!(suggestions[0].name, "categories");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("c")[0].name, "categories");
    assert_eq!(get_suggestions("settings")[0].name, "rules");
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(get_suggestions("hist")[0].name, "history");
  }

  #[test]
  fn test_exact_name_beats_prefix() {
    let suggestions = get_suggestions("article");
    assert_eq!(suggestions[0].name, "article");
    assert_eq!(suggestions[1].name, "articles");
  }

  #[test]
  fn test_argument_is_ignored_for_matching() {
    let suggestions = get_suggestions("article 42");
    assert_eq!(suggestions[0].name, "article");
  }

  #[test]
  fn test_split_input() {
    assert_eq!(split_input("  article   42 "), ("article", "42"));
    assert_eq!(split_input("rules"), ("rules", ""));
  }
}
